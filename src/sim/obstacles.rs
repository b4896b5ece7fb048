//! Obstacle lifecycle: spawn, advance, prune
//!
//! The live set is kept in spawn order. Since every obstacle scrolls at the
//! same speed, spawn order is also descending `y`: the first obstacle in a
//! lane is the one closest to the player.

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use super::state::Obstacle;
use crate::sprites::{SpriteCatalog, SpriteId};

/// Create an obstacle in a uniformly random lane with a uniformly random
/// sprite, starting at `spawn_y` (above the visible area).
pub fn spawn<R: Rng + ?Sized>(
    rng: &mut R,
    id: u32,
    lanes: usize,
    catalog: &SpriteCatalog,
    spawn_y: f32,
) -> Obstacle {
    let sprites = catalog.obstacles();
    let lane = rng.random_range(0..lanes.max(1));
    let sprite = sprites[rng.random_range(0..sprites.len())].clone();
    Obstacle {
        id,
        lane,
        y: spawn_y,
        sprite,
    }
}

/// Move every obstacle down by `speed`
pub fn advance(obstacles: &[Obstacle], speed: f32) -> Vec<Obstacle> {
    obstacles
        .iter()
        .map(|o| Obstacle {
            y: o.y + speed,
            ..o.clone()
        })
        .collect()
}

/// Drop obstacles whose `y` exceeds `visible_height + margin`, keeping order
pub fn prune(mut obstacles: Vec<Obstacle>, visible_height: f32, margin: f32) -> Vec<Obstacle> {
    let limit = visible_height + margin;
    obstacles.retain(|o| o.y <= limit);
    obstacles
}

/// Owns the live obstacle set and the random source used to spawn into it
#[derive(Debug, Clone)]
pub struct ObstacleManager<R = Pcg32> {
    live: Vec<Obstacle>,
    rng: R,
    next_id: u32,
}

impl ObstacleManager<Pcg32> {
    /// Manager with an RNG seeded from `seed`
    pub fn seeded(seed: u64) -> Self {
        Self::with_rng(Pcg32::seed_from_u64(seed))
    }
}

impl<R: Rng> ObstacleManager<R> {
    pub fn with_rng(rng: R) -> Self {
        Self {
            live: Vec::new(),
            rng,
            next_id: 1,
        }
    }

    /// Read view of the live set, in spawn order
    pub fn live(&self) -> &[Obstacle] {
        &self.live
    }

    pub fn len(&self) -> usize {
        self.live.len()
    }

    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    /// Spawn a new obstacle at the back of the live set; returns a copy of it
    pub fn spawn(&mut self, lanes: usize, catalog: &SpriteCatalog, spawn_y: f32) -> Obstacle {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        let obstacle = spawn(&mut self.rng, id, lanes, catalog, spawn_y);
        log::debug!(
            "Spawned obstacle {} in lane {} ({})",
            obstacle.id,
            obstacle.lane,
            obstacle.sprite
        );
        self.live.push(obstacle.clone());
        obstacle
    }

    /// The live set after one frame of scrolling, without committing it
    pub fn stepped(&self, speed: f32, visible_height: f32, margin: f32) -> Vec<Obstacle> {
        prune(advance(&self.live, speed), visible_height, margin)
    }

    /// Replace the live set with one produced by `stepped`
    pub fn commit(&mut self, obstacles: Vec<Obstacle>) {
        self.live = obstacles;
    }

    /// Insert an obstacle directly (scripted scenarios and tests)
    pub fn push(&mut self, lane: usize, y: f32, sprite: SpriteId) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1);
        self.live.push(Obstacle { id, lane, y, sprite });
        id
    }

    pub fn clear(&mut self) {
        self.live.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn obstacle(id: u32, lane: usize, y: f32) -> Obstacle {
        Obstacle {
            id,
            lane,
            y,
            sprite: SpriteId::from("car.png"),
        }
    }

    #[test]
    fn test_spawn_stays_in_range() {
        let catalog = SpriteCatalog::default();
        let mut rng = Pcg32::seed_from_u64(7);
        for id in 0..500 {
            let o = spawn(&mut rng, id, 3, &catalog, -120.0);
            assert!(o.lane < 3);
            assert_eq!(o.y, -120.0);
            assert!(catalog.obstacles().contains(&o.sprite));
        }
    }

    #[test]
    fn test_spawn_covers_every_lane_and_sprite() {
        let catalog = SpriteCatalog::default();
        let mut rng = Pcg32::seed_from_u64(12345);
        let mut lanes = [false; 3];
        let mut sprites = std::collections::HashSet::new();
        for id in 0..600 {
            let o = spawn(&mut rng, id, 3, &catalog, -120.0);
            lanes[o.lane] = true;
            sprites.insert(o.sprite);
        }
        assert!(lanes.iter().all(|&seen| seen));
        assert_eq!(sprites.len(), catalog.obstacles().len());
    }

    #[test]
    fn test_same_seed_same_sequence() {
        let catalog = SpriteCatalog::default();
        let mut a = ObstacleManager::seeded(99);
        let mut b = ObstacleManager::seeded(99);
        for _ in 0..20 {
            a.spawn(3, &catalog, -120.0);
            b.spawn(3, &catalog, -120.0);
        }
        assert_eq!(a.live(), b.live());
    }

    #[test]
    fn test_spawn_returns_the_stored_obstacle() {
        let catalog = SpriteCatalog::default();
        let mut manager = ObstacleManager::seeded(5);
        let first = manager.spawn(3, &catalog, -120.0);
        let second = manager.spawn(3, &catalog, -120.0);
        assert_ne!(first.id, second.id);
        assert_eq!(manager.live(), &[first, second][..]);
    }

    #[test]
    fn test_advance_is_uniform() {
        let before = vec![obstacle(1, 0, -120.0), obstacle(2, 2, 300.0)];
        let after = advance(&before, 4.5);
        assert_eq!(after[0].y, -115.5);
        assert_eq!(after[1].y, 304.5);
        // Input untouched
        assert_eq!(before[0].y, -120.0);
    }

    #[test]
    fn test_prune_boundary_is_inclusive() {
        let kept = prune(
            vec![obstacle(1, 0, 1200.0), obstacle(2, 1, 1200.5)],
            1000.0,
            200.0,
        );
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].id, 1);
    }

    #[test]
    fn test_stepped_does_not_commit() {
        let mut manager = ObstacleManager::seeded(1);
        manager.push(1, 0.0, SpriteId::from("car.png"));
        let next = manager.stepped(5.0, 600.0, 200.0);
        assert_eq!(manager.live()[0].y, 0.0);
        manager.commit(next);
        assert_eq!(manager.live()[0].y, 5.0);
    }

    proptest! {
        #[test]
        fn test_prune_removes_exactly_past_limit(
            ys in proptest::collection::vec(-500.0f32..2000.0, 0..40),
            height in 100.0f32..1600.0,
            margin in 0.0f32..300.0,
        ) {
            let input: Vec<Obstacle> = ys
                .iter()
                .enumerate()
                .map(|(i, &y)| obstacle(i as u32, i % 3, y))
                .collect();
            let limit = height + margin;

            let kept = prune(input.clone(), height, margin);

            let expected: Vec<u32> = input.iter().filter(|o| o.y <= limit).map(|o| o.id).collect();
            let actual: Vec<u32> = kept.iter().map(|o| o.id).collect();
            prop_assert_eq!(actual, expected);
        }
    }
}

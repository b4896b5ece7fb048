//! Collision detection between the player and obstacles
//!
//! Lanes are discrete horizontal bins, so lane equality stands in for
//! horizontal overlap; only the vertical spans are compared.

use super::state::Obstacle;

/// A closed vertical interval `[top, top + height]`
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalSpan {
    pub top: f32,
    pub height: f32,
}

impl VerticalSpan {
    pub fn new(top: f32, height: f32) -> Self {
        Self { top, height }
    }

    #[inline]
    pub fn bottom(&self) -> f32 {
        self.top + self.height
    }

    /// Inclusive overlap: touching edges count
    #[inline]
    pub fn overlaps(&self, other: &VerticalSpan) -> bool {
        self.bottom() >= other.top && self.top <= other.bottom()
    }
}

/// True when the obstacle shares the player's lane and its vertical span
/// overlaps the player's `[player_top, player_top + player_height]`.
pub fn collides(
    player_lane: usize,
    player_top: f32,
    player_height: f32,
    obstacle: &Obstacle,
    obstacle_height: f32,
) -> bool {
    obstacle.lane == player_lane
        && VerticalSpan::new(obstacle.y, obstacle_height)
            .overlaps(&VerticalSpan::new(player_top, player_height))
}

/// First obstacle (in live-set order) hitting the player, if any
pub fn first_collision<'a, F>(
    player_lane: usize,
    player: VerticalSpan,
    obstacles: &'a [Obstacle],
    mut obstacle_height: F,
) -> Option<&'a Obstacle>
where
    F: FnMut(&Obstacle) -> f32,
{
    obstacles.iter().find(|o| {
        let height = obstacle_height(o);
        collides(player_lane, player.top, player.height, o, height)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sprites::SpriteId;

    fn obstacle(lane: usize, y: f32) -> Obstacle {
        Obstacle {
            id: 1,
            lane,
            y,
            sprite: SpriteId::from("car.png"),
        }
    }

    #[test]
    fn test_touching_from_above_collides() {
        // Player band [500, 580], obstacle height 80 ending exactly at 500
        assert!(collides(1, 500.0, 80.0, &obstacle(1, 420.0), 80.0));
    }

    #[test]
    fn test_one_pixel_gap_misses() {
        assert!(!collides(1, 500.0, 80.0, &obstacle(1, 419.0), 80.0));
    }

    #[test]
    fn test_touching_from_below_collides() {
        assert!(collides(1, 500.0, 80.0, &obstacle(1, 580.0), 80.0));
        assert!(!collides(1, 500.0, 80.0, &obstacle(1, 580.5), 80.0));
    }

    #[test]
    fn test_other_lane_never_collides() {
        assert!(!collides(0, 500.0, 80.0, &obstacle(1, 510.0), 80.0));
        assert!(!collides(2, 500.0, 80.0, &obstacle(1, 510.0), 80.0));
    }

    #[test]
    fn test_first_collision_in_order() {
        let mut a = obstacle(1, 450.0);
        a.id = 7;
        let mut b = obstacle(1, 520.0);
        b.id = 8;
        let obstacles = [obstacle(0, 500.0), a, b];

        let hit = first_collision(1, VerticalSpan::new(500.0, 80.0), &obstacles, |_| 80.0);
        assert_eq!(hit.map(|o| o.id), Some(7));
    }

    #[test]
    fn test_no_collision_in_empty_set() {
        assert!(first_collision(1, VerticalSpan::new(500.0, 80.0), &[], |_| 80.0).is_none());
    }
}

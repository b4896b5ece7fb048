//! Sprite identifiers and the catalog of known sprite sizes
//!
//! Images themselves live with the platform layer; the simulation only needs
//! stable identifiers and, once an image has loaded, its natural pixel size.

use std::collections::HashMap;
use std::fmt;

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default obstacle sprite files
pub const DEFAULT_OBSTACLE_SPRITES: [&str; 6] = [
    "ambulance.png",
    "black_viper.png",
    "car.png",
    "mini_truck.png",
    "mini_van.png",
    "police.png",
];

/// Default player sprite file
pub const DEFAULT_PLAYER_SPRITE: &str = "audi.png";

/// Identifier of a sprite image (its file name)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpriteId(String);

impl SpriteId {
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SpriteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SpriteId {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Natural pixel size of a loaded sprite
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpriteSize {
    pub width: f32,
    pub height: f32,
}

impl SpriteSize {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    pub fn as_vec2(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CatalogError {
    #[error("obstacle sprite catalog is empty")]
    NoObstacleSprites,
}

/// Player sprite, obstacle sprites and the sizes of those loaded so far
#[derive(Debug, Clone)]
pub struct SpriteCatalog {
    player: SpriteId,
    obstacles: Vec<SpriteId>,
    sizes: HashMap<SpriteId, SpriteSize>,
}

impl SpriteCatalog {
    /// Build a catalog; at least one obstacle sprite is required
    pub fn new(player: SpriteId, obstacles: Vec<SpriteId>) -> Result<Self, CatalogError> {
        if obstacles.is_empty() {
            return Err(CatalogError::NoObstacleSprites);
        }
        Ok(Self {
            player,
            obstacles,
            sizes: HashMap::new(),
        })
    }

    pub fn player(&self) -> &SpriteId {
        &self.player
    }

    /// Obstacle sprites in catalog order (never empty)
    pub fn obstacles(&self) -> &[SpriteId] {
        &self.obstacles
    }

    /// Record the natural size of a sprite once its image has loaded
    pub fn set_size(&mut self, id: &SpriteId, size: SpriteSize) {
        self.sizes.insert(id.clone(), size);
    }

    /// Natural size, if the image is loaded
    pub fn size(&self, id: &SpriteId) -> Option<SpriteSize> {
        self.sizes.get(id).copied()
    }

    /// Every sprite the catalog references, player first
    pub fn all(&self) -> impl Iterator<Item = &SpriteId> {
        std::iter::once(&self.player).chain(self.obstacles.iter())
    }
}

impl Default for SpriteCatalog {
    fn default() -> Self {
        Self {
            player: SpriteId::from(DEFAULT_PLAYER_SPRITE),
            obstacles: DEFAULT_OBSTACLE_SPRITES
                .iter()
                .map(|name| SpriteId::from(*name))
                .collect(),
            sizes: HashMap::new(),
        }
    }
}

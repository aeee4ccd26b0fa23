//! Formation Invaders - a fixed-formation arcade shooter
//!
//! Core modules:
//! - `sim`: Tick-driven simulation (formation, collisions, game state)
//! - `settings`: Runner configuration loaded from JSON

pub mod settings;
pub mod sim;

pub use settings::{Settings, SettingsError};

use glam::IVec2;

/// Game configuration constants
pub mod consts {
    /// Screen dimensions (pixels, y grows downward)
    pub const SCREEN_WIDTH: i32 = 800;
    pub const SCREEN_HEIGHT: i32 = 600;

    /// Formation layout
    pub const FORMATION_ROWS: usize = 3;
    pub const FORMATION_COLUMNS: usize = 10;
    pub const FORMATION_LEFT: i32 = 157;
    pub const COLUMN_SPACING: i32 = 50;
    pub const ROW_SPACING: i32 = 45;
    /// Default vertical offset of the top formation row
    pub const ENEMY_DEFAULT_POSITION: i32 = 60;
    /// Vertical drop on reversal (also the per-round offset increase)
    pub const ENEMY_MOVE_DOWN: i32 = 30;
    /// Horizontal shift per lateral step (multiplied by direction)
    pub const ENEMY_STEP: i32 = 10;

    /// Step budget
    pub const BASE_STEP_LIMIT: u32 = 30;
    pub const FLANK_STEP_BONUS: u32 = 5;
    /// The formation spawns centered, so the first sweep is half-length
    pub const INITIAL_MOVE_COUNTER: u32 = 15;

    /// Thresholds on the formation's bottom edge
    pub const BLOCKERS_POSITION: i32 = 440;
    pub const INVASION_LINE: i32 = 540;

    /// Entity sizes (width, height)
    pub const ENEMY_SIZE: (i32, i32) = (40, 35);
    pub const SHIP_SIZE: (i32, i32) = (50, 48);
    pub const LASER_SIZE: (i32, i32) = (5, 15);
    pub const MYSTERY_SIZE: (i32, i32) = (75, 35);
    pub const BLOCK_SIZE: i32 = 10;

    /// Player ship
    pub const SHIP_START: (i32, i32) = (385, 550);
    pub const SHIP_SPEED: i32 = 4;
    pub const SHIP_MIN_X: i32 = 10;
    pub const SHIP_MAX_X: i32 = 740;
    pub const START_LIVES: usize = 4;

    /// Bullets
    pub const PLAYER_BULLET_SPEED: i32 = 15;
    pub const ENEMY_BULLET_SPEED: i32 = 5;
    pub const BULLET_MIN_Y: i32 = 15;
    /// Score at which the player fires two bullets per shot
    pub const DOUBLE_SHOT_SCORE: u32 = 1000;

    /// Timings (milliseconds)
    pub const ENEMY_FIRE_INTERVAL_MS: u64 = 700;
    pub const RESPAWN_DELAY_MS: u64 = 900;
    pub const ROUND_TRANSITION_MS: u64 = 3000;
    pub const GAME_OVER_SCREEN_MS: u64 = 3000;
    pub const MYSTERY_WAIT_MS: u64 = 25_000;

    /// Barriers
    pub const BARRIER_COUNT: i32 = 4;
    pub const BARRIER_ROWS: i32 = 4;
    pub const BARRIER_COLUMNS: i32 = 9;
}

/// Axis-aligned rectangle in screen pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Aabb {
    pub min: IVec2,
    pub size: IVec2,
}

impl Aabb {
    #[inline]
    pub fn new(pos: IVec2, (w, h): (i32, i32)) -> Self {
        Self {
            min: pos,
            size: IVec2::new(w, h),
        }
    }

    #[inline]
    pub fn max(&self) -> IVec2 {
        self.min + self.size
    }

    /// Strict overlap: rectangles sharing only an edge do not collide
    #[inline]
    pub fn overlaps(&self, other: &Aabb) -> bool {
        let a_max = self.max();
        let b_max = other.max();
        self.min.x < b_max.x
            && other.min.x < a_max.x
            && self.min.y < b_max.y
            && other.min.y < a_max.y
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_aabb_overlap() {
        let a = Aabb::new(IVec2::new(0, 0), (10, 10));
        assert!(a.overlaps(&Aabb::new(IVec2::new(5, 5), (10, 10))));
        assert!(a.overlaps(&Aabb::new(IVec2::new(-5, -5), (30, 30))));
        // Touching edges is not an overlap
        assert!(!a.overlaps(&Aabb::new(IVec2::new(10, 0), (10, 10))));
        assert!(!a.overlaps(&Aabb::new(IVec2::new(0, 10), (10, 10))));
    }
}

//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Caller-supplied timestamps only
//! - Seeded RNG only
//! - Stable iteration order (row-major formation grid)
//! - No rendering or audio dependencies

pub mod autopilot;
pub mod collision;
pub mod entity;
pub mod formation;
pub mod movement;
pub mod snapshot;
pub mod state;
pub mod tick;

pub use collision::{CollisionReport, group_collide};
pub use entity::{Advance, Lifecycle, TickContext};
pub use formation::{FormationError, FormationGrid};
pub use movement::{MovementController, Step};
pub use snapshot::Snapshot;
pub use state::{
    Bullet, Direction, Effect, EffectKind, Enemy, FormationRow, GameEvent, GamePhase, GameState,
    MysteryShip, Playfield, ScoreSource, Ship,
};
pub use tick::{TickInput, tick};

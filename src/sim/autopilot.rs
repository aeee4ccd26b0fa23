//! Demo-mode driver
//!
//! Derives a `TickInput` from the current state so the game plays itself.
//! Dodges incoming fire first, otherwise lines up under the nearest target.

use super::state::{GamePhase, GameState, Side};
use super::tick::TickInput;
use crate::consts::*;

/// Incoming bullets below this line are worth dodging
const DANGER_Y: i32 = 420;
/// Horizontal slack when lining up a shot
const AIM_TOLERANCE: i32 = 12;

/// Choose this tick's input for `state`
pub fn drive(state: &GameState) -> TickInput {
    let mut input = TickInput::default();

    match state.phase {
        GamePhase::Menu => {
            input.start = true;
            return input;
        }
        GamePhase::Playing => {}
        _ => return input,
    }

    let field = &state.field;
    let Some(ship) = &field.player else {
        return input;
    };
    let ship_center = ship.pos.x + SHIP_SIZE.0 / 2;

    // Closest threat above the ship's column, if any
    let threat = field
        .enemy_bullets
        .iter()
        .filter(|b| b.side == Side::Enemy && b.pos.y > DANGER_Y && b.pos.y < ship.pos.y)
        .filter(|b| {
            b.pos.x + LASER_SIZE.0 > ship.pos.x - 10 && b.pos.x < ship.pos.x + SHIP_SIZE.0 + 10
        })
        .max_by_key(|b| b.pos.y);

    if let Some(bullet) = threat {
        // Step away from the side the bullet is on, unless pinned to a wall
        let go_left = bullet.pos.x >= ship_center;
        if go_left && ship.pos.x > SHIP_MIN_X {
            input.left = true;
        } else if !go_left && ship.pos.x < SHIP_MAX_X {
            input.right = true;
        } else {
            input.left = !go_left;
            input.right = go_left;
        }
        return input;
    }

    // Prefer the mystery ship while it is on screen, else the nearest enemy
    let mystery_center = field.mystery.pos.x + MYSTERY_SIZE.0 / 2;
    let target = if (0..SCREEN_WIDTH).contains(&field.mystery.pos.x) {
        Some(mystery_center)
    } else {
        field
            .formation
            .iter()
            .map(|e| e.pos.x + ENEMY_SIZE.0 / 2)
            .min_by_key(|x| (x - ship_center).abs())
    };

    if let Some(target_x) = target {
        let offset = target_x - ship_center;
        if offset < -AIM_TOLERANCE {
            input.left = true;
        } else if offset > AIM_TOLERANCE {
            input.right = true;
        } else if field.player_bullets.is_empty() {
            input.fire = true;
        }
    }
    input
}

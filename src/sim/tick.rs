//! Per-tick orchestration
//!
//! One input snapshot and one timestamp drive every system for the tick.
//! While playing, movement is fully applied before collisions are resolved.

use glam::IVec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::collision;
use super::entity::{Advance, TickContext, advance_all};
use super::state::{Bullet, GameEvent, GamePhase, GameState, Muzzle, Playfield, Ship};
use crate::consts::*;

/// Input commands for a single tick
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TickInput {
    /// Held movement controls
    pub left: bool,
    pub right: bool,
    /// Fire pressed this tick
    pub fire: bool,
    /// Start pressed this tick (leaves the menu)
    pub start: bool,
}

/// Advance the game by one tick at `now_ms`
pub fn tick(state: &mut GameState, input: &TickInput, now_ms: u64) {
    state.field.events.clear();

    match state.phase {
        GamePhase::Menu => {
            if input.start {
                state.start_game(now_ms);
            }
        }
        GamePhase::Playing => play(state, input, now_ms),
        GamePhase::RoundTransition { cleared_at } => {
            if now_ms.saturating_sub(cleared_at) > ROUND_TRANSITION_MS {
                state.field.advance_round(now_ms);
                state.round += 1;
                state.phase = GamePhase::Playing;
                log::info!(
                    "Round {} begins (score {}, lives {})",
                    state.round,
                    state.field.score,
                    state.field.lives.len()
                );
            }
        }
        GamePhase::GameOver { since } => {
            if now_ms.saturating_sub(since) > GAME_OVER_SCREEN_MS {
                state.phase = GamePhase::Menu;
            }
        }
    }
}

fn play(state: &mut GameState, input: &TickInput, now_ms: u64) {
    let ctx = TickContext { input, now_ms };
    let field = &mut state.field;

    if input.fire {
        fire(field);
    }

    if let Some((_, note)) = field.movement.advance(&mut field.formation, now_ms) {
        field.events.push(GameEvent::MarchNote(note));
    }

    if let Some(ship) = field.player.as_mut() {
        ship.advance(&ctx, &mut field.events);
    }
    advance_all(&mut field.player_bullets, &ctx, &mut field.events);
    advance_all(&mut field.enemy_bullets, &ctx, &mut field.events);
    field.mystery.advance(&ctx, &mut field.events);
    advance_all(&mut field.effects, &ctx, &mut field.events);

    collision::resolve(field, now_ms, &mut state.rng);

    if field.game_over {
        state.phase = GamePhase::GameOver { since: now_ms };
        field.base_y = ENEMY_DEFAULT_POSITION;
        log::info!(
            "Game over in round {} with score {}",
            state.round,
            field.score
        );
        return;
    }

    respawn_player(field, now_ms);
    enemy_fire(field, now_ms, &mut state.rng);

    if field.is_cleared() {
        state.phase = GamePhase::RoundTransition {
            cleared_at: field.last_kill_ms,
        };
        log::info!("Round {} cleared", state.round);
    }
}

/// Fire-tier rule: one shot below 1000 points, two from the wing ports above
fn fire(field: &mut Playfield) {
    let Some(ship) = &field.player else {
        return;
    };
    if !field.player_bullets.is_empty() {
        return;
    }
    let muzzle_y = ship.pos.y + 5;
    if field.score < DOUBLE_SHOT_SCORE {
        field.player_bullets.push(Bullet::player(
            IVec2::new(ship.pos.x + 23, muzzle_y),
            Muzzle::Center,
        ));
        field.events.push(GameEvent::Shoot);
    } else {
        field.player_bullets.push(Bullet::player(
            IVec2::new(ship.pos.x + 8, muzzle_y),
            Muzzle::Left,
        ));
        field.player_bullets.push(Bullet::player(
            IVec2::new(ship.pos.x + 38, muzzle_y),
            Muzzle::Right,
        ));
        field.events.push(GameEvent::DoubleShoot);
    }
}

fn respawn_player(field: &mut Playfield, now_ms: u64) {
    if let Some(hit_ms) = field.respawn_from {
        if now_ms.saturating_sub(hit_ms) > RESPAWN_DELAY_MS {
            field.player = Some(Ship::default());
            field.respawn_from = None;
        }
    }
}

/// The lowest enemy of a random live column shoots every 700ms
fn enemy_fire<R: Rng + ?Sized>(field: &mut Playfield, now_ms: u64, rng: &mut R) {
    if now_ms.saturating_sub(field.enemy_fire_ms) <= ENEMY_FIRE_INTERVAL_MS {
        return;
    }
    if let Some(shooter) = field.formation.random_bottom_alien(rng) {
        let pos = shooter.pos + IVec2::new(14, 20);
        field.enemy_bullets.push(Bullet::enemy(pos));
        field.enemy_fire_ms = now_ms;
    }
}

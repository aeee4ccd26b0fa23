//! Per-entity tick contract
//!
//! Every free-moving entity kind advances through the same `Advance` call
//! against one shared `TickContext` (a single input snapshot and timestamp).

use super::state::{Bullet, Direction, Effect, GameEvent, MysteryShip, Ship};
use super::tick::TickInput;
use crate::consts::*;

/// Input and time sampled once for the whole tick
#[derive(Debug, Clone, Copy)]
pub struct TickContext<'a> {
    pub input: &'a TickInput,
    pub now_ms: u64,
}

/// Whether an entity survives the tick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Lifecycle {
    Alive,
    Expired,
}

pub trait Advance {
    fn advance(&mut self, ctx: &TickContext, events: &mut Vec<GameEvent>) -> Lifecycle;
}

impl Advance for Ship {
    fn advance(&mut self, ctx: &TickContext, _events: &mut Vec<GameEvent>) -> Lifecycle {
        if ctx.input.left && self.pos.x > SHIP_MIN_X {
            self.pos.x -= SHIP_SPEED;
        }
        if ctx.input.right && self.pos.x < SHIP_MAX_X {
            self.pos.x += SHIP_SPEED;
        }
        Lifecycle::Alive
    }
}

impl Advance for Bullet {
    fn advance(&mut self, _ctx: &TickContext, _events: &mut Vec<GameEvent>) -> Lifecycle {
        self.pos.y += self.speed * self.direction();
        if self.pos.y < BULLET_MIN_Y || self.pos.y > SCREEN_HEIGHT {
            Lifecycle::Expired
        } else {
            Lifecycle::Alive
        }
    }
}

impl Advance for MysteryShip {
    /// Parks off-screen for 25s, then glides across and turns around
    fn advance(&mut self, ctx: &TickContext, events: &mut Vec<GameEvent>) -> Lifecycle {
        if ctx.now_ms.saturating_sub(self.timer_ms) <= MYSTERY_WAIT_MS {
            return Lifecycle::Alive;
        }

        if (self.pos.x < 0 || self.pos.x > SCREEN_WIDTH) && self.announce {
            events.push(GameEvent::MysteryEntered);
            self.announce = false;
        }
        match self.direction {
            Direction::Right if self.pos.x < 840 => self.pos.x += Self::SPEED,
            Direction::Left if self.pos.x > -100 => self.pos.x -= Self::SPEED,
            _ => {}
        }

        if self.pos.x > 830 {
            self.announce = true;
            self.direction = Direction::Left;
            self.timer_ms = ctx.now_ms;
        } else if self.pos.x < -90 {
            self.announce = true;
            self.direction = Direction::Right;
            self.timer_ms = ctx.now_ms;
        }
        Lifecycle::Alive
    }
}

impl Advance for Effect {
    fn advance(&mut self, ctx: &TickContext, _events: &mut Vec<GameEvent>) -> Lifecycle {
        if self.expired(ctx.now_ms) {
            Lifecycle::Expired
        } else {
            Lifecycle::Alive
        }
    }
}

/// Advance every entity in `items`, dropping the ones that expire
pub fn advance_all<T: Advance>(items: &mut Vec<T>, ctx: &TickContext, events: &mut Vec<GameEvent>) {
    items.retain_mut(|item| item.advance(ctx, events) == Lifecycle::Alive);
}

//! Formation motion state machine
//!
//! The formation is always MOVING in one direction. When the step budget for
//! that direction is spent it reverses and drops in the same tick; there is no
//! separate dropping state held across ticks.

use serde::{Deserialize, Serialize};

use super::formation::FormationGrid;
use super::state::{Direction, PerDirection};
use crate::consts::*;

/// What the formation did on a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Step {
    Lateral,
    ReverseAndDrop,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MovementController {
    direction: Direction,
    move_counter: u32,
    step_limit: PerDirection<u32>,
    /// Fixed-phase step clock
    last_move_ms: u64,
    /// Next march beat to play, cycling 0..4
    note: u8,
}

impl MovementController {
    pub fn new(now_ms: u64) -> Self {
        Self {
            direction: Direction::Right,
            move_counter: INITIAL_MOVE_COUNTER,
            step_limit: PerDirection::splat(BASE_STEP_LIMIT),
            last_move_ms: now_ms,
            note: 0,
        }
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn move_counter(&self) -> u32 {
        self.move_counter
    }

    pub fn step_limit(&self, dir: Direction) -> u32 {
        self.step_limit[dir]
    }

    pub fn last_move_ms(&self) -> u64 {
        self.last_move_ms
    }

    /// Beat the next step will play
    pub fn note(&self) -> u8 {
        self.note
    }

    /// Steps allowed in the current direction before reversing
    pub fn budget(&self, grid: &FormationGrid) -> u32 {
        self.step_limit[self.direction] + grid.step_bonus(self.direction)
    }

    /// Advance the formation if its step interval has elapsed.
    ///
    /// Returns the step taken and the beat it plays.
    pub fn advance(&mut self, grid: &mut FormationGrid, now_ms: u64) -> Option<(Step, u8)> {
        let interval = grid.move_interval_ms();
        if now_ms.saturating_sub(self.last_move_ms) <= interval {
            return None;
        }

        let step = if self.move_counter >= self.budget(grid) {
            self.direction = self.direction.reversed();
            self.move_counter = 0;
            // Both limits re-base off the bonus of the new direction
            let limit = BASE_STEP_LIMIT + grid.step_bonus(self.direction);
            self.step_limit = PerDirection::splat(limit);
            grid.drop_down(ENEMY_MOVE_DOWN);
            log::debug!(
                "Formation reversed {:?}, limit {}, lowest y {}",
                self.direction,
                limit,
                grid.lowest_y()
            );
            Step::ReverseAndDrop
        } else {
            grid.shift_lateral(ENEMY_STEP * self.direction.sign());
            self.move_counter += 1;
            Step::Lateral
        };

        self.last_move_ms += interval;
        let note = self.note;
        self.note = (note + 1) % 4;
        Some((step, note))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::state::FormationRow;

    fn grid() -> FormationGrid {
        FormationGrid::populate(FORMATION_ROWS, FORMATION_COLUMNS, ENEMY_DEFAULT_POSITION)
    }

    fn step(mc: &mut MovementController, g: &mut FormationGrid, now: u64) -> Option<Step> {
        mc.advance(g, now).map(|(step, _)| step)
    }

    #[test]
    fn test_waits_for_interval() {
        let mut g = grid();
        let mut mc = MovementController::new(0);
        assert_eq!(step(&mut mc, &mut g, 600), None);
        assert_eq!(step(&mut mc, &mut g, 601), Some(Step::Lateral));
        assert_eq!(mc.move_counter(), INITIAL_MOVE_COUNTER + 1);
        assert_eq!(g.get(FormationRow::Top, 0).unwrap().pos.x, FORMATION_LEFT + 10);
        assert_eq!(g.get(FormationRow::Top, 0).unwrap().frame(), 1);
    }

    #[test]
    fn test_clock_keeps_fixed_phase() {
        let mut g = grid();
        let mut mc = MovementController::new(0);
        // Processed late: the clock advances by the interval, not to now
        assert!(step(&mut mc, &mut g, 1000).is_some());
        assert_eq!(mc.last_move_ms(), 600);
        assert!(step(&mut mc, &mut g, 1201).is_some());
        assert_eq!(mc.last_move_ms(), 1200);
    }

    #[test]
    fn test_reverse_after_budget() {
        let mut g = grid();
        let mut mc = MovementController::new(0);
        let mut now = 0;
        // 15 steps right remain from the centred start
        for _ in 0..15 {
            now += 601;
            assert_eq!(step(&mut mc, &mut g, now), Some(Step::Lateral));
        }
        let x_before = g.get(FormationRow::Top, 0).unwrap().pos.x;
        let lowest_before = g.lowest_y();
        now += 601;
        assert_eq!(step(&mut mc, &mut g, now), Some(Step::ReverseAndDrop));
        assert_eq!(mc.direction(), Direction::Left);
        assert_eq!(mc.move_counter(), 0);
        let top = g.get(FormationRow::Top, 0).unwrap();
        assert_eq!(top.pos.x, x_before);
        assert_eq!(top.pos.y, ENEMY_DEFAULT_POSITION + ENEMY_MOVE_DOWN);
        assert_eq!(g.lowest_y(), lowest_before + ENEMY_MOVE_DOWN);

        now += 601;
        assert_eq!(step(&mut mc, &mut g, now), Some(Step::Lateral));
        assert_eq!(g.get(FormationRow::Top, 0).unwrap().pos.x, x_before - 10);
    }

    #[test]
    fn test_reversal_rebases_both_limits_from_new_direction_bonus() {
        let mut g = grid();
        // Clear the left flank column: left bonus +5
        for row in FormationRow::ALL {
            g.remove(row, 0);
        }
        assert_eq!(g.step_bonus(Direction::Left), 5);
        let mut mc = MovementController::new(0);
        let mut now = 0;
        loop {
            now += 601;
            if step(&mut mc, &mut g, now) == Some(Step::ReverseAndDrop) {
                break;
            }
        }
        assert_eq!(mc.direction(), Direction::Left);
        assert_eq!(mc.step_limit(Direction::Left), 35);
        assert_eq!(mc.step_limit(Direction::Right), 35);
        assert_eq!(mc.budget(&g), 40);
    }

    #[test]
    fn test_one_drop_per_reversal() {
        let mut g = grid();
        let mut mc = MovementController::new(0);
        let mut now = 0;
        let mut drops = 0;
        for _ in 0..100 {
            now += 601;
            if step(&mut mc, &mut g, now) == Some(Step::ReverseAndDrop) {
                drops += 1;
                assert_eq!(mc.move_counter(), 0);
            }
        }
        // 15 right, drop, 30 left, drop, 30 right, drop, 22 left
        assert_eq!(drops, 3);
        assert_eq!(
            g.get(FormationRow::Top, 0).unwrap().pos.y,
            ENEMY_DEFAULT_POSITION + 3 * ENEMY_MOVE_DOWN
        );
    }

    #[test]
    fn test_note_cycles_from_first_beat() {
        let mut g = grid();
        let mut mc = MovementController::new(0);
        assert_eq!(mc.note(), 0);
        let mut now = 0;
        for expected in [0, 1, 2, 3, 0] {
            now += 601;
            let (_, played) = mc.advance(&mut g, now).unwrap();
            assert_eq!(played, expected);
            assert_eq!(mc.note(), (expected + 1) % 4);
        }
    }
}

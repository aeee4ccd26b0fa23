//! Enemy formation grid
//!
//! A fixed rows x columns arena of optional enemies. The grid owns every
//! enemy record by slot and keeps column liveness, the two flank columns and
//! the per-direction step bonuses in sync with removals.

use std::collections::BTreeSet;

use glam::IVec2;
use rand::Rng;
use rand::seq::IteratorRandom;
use thiserror::Error;

use super::state::{Direction, Enemy, FormationRow, PerDirection};
use crate::consts::*;

/// Placement failures. These only arise from faulty construction code.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum FormationError {
    #[error("formation slot ({row}, {column}) is already occupied")]
    SlotOccupied { row: usize, column: usize },
    #[error("column {column} is outside a formation {columns} columns wide")]
    OutOfBounds { column: usize, columns: usize },
    #[error("row {row} is outside a formation {rows} rows deep")]
    RowOutOfBounds { row: usize, rows: usize },
}

/// The enemy formation
#[derive(Debug, Clone)]
pub struct FormationGrid {
    rows: usize,
    columns: usize,
    /// Row-major cells
    cells: Vec<Option<Enemy>>,
    live: usize,
    alive_columns: BTreeSet<usize>,
    leftmost_alive_column: usize,
    rightmost_alive_column: usize,
    /// Extra lateral steps earned as flank columns empty
    step_bonus: PerDirection<u32>,
    /// Bottom edge of the lowest enemy, refreshed on every drop
    lowest_y: i32,
}

impl FormationGrid {
    /// An empty grid
    pub fn new(rows: usize, columns: usize) -> Self {
        Self {
            rows,
            columns,
            cells: vec![None; rows * columns],
            live: 0,
            alive_columns: BTreeSet::new(),
            leftmost_alive_column: columns,
            rightmost_alive_column: 0,
            step_bonus: PerDirection::default(),
            lowest_y: 0,
        }
    }

    /// Fill every slot, row-major, with the top row at `base_y`
    pub fn populate(rows: usize, columns: usize, base_y: i32) -> Self {
        let mut grid = Self::new(rows, columns);
        if let Err(err) = grid.fill(base_y) {
            debug_assert!(false, "formation layout failed: {err}");
            log::error!("Formation layout failed: {err}");
        }
        grid.lowest_y = base_y + (rows as i32 - 1) * ROW_SPACING + ENEMY_SIZE.1;
        grid
    }

    fn fill(&mut self, base_y: i32) -> Result<(), FormationError> {
        for row in FormationRow::ALL.into_iter().take(self.rows) {
            for column in 0..self.columns {
                let pos = IVec2::new(
                    FORMATION_LEFT + column as i32 * COLUMN_SPACING,
                    base_y + row.index() as i32 * ROW_SPACING,
                );
                self.place(Enemy::new(row, column, pos))?;
            }
        }
        Ok(())
    }

    #[inline]
    fn slot(&self, row: usize, column: usize) -> usize {
        row * self.columns + column
    }

    /// Insert an enemy at its (row, column)
    pub fn place(&mut self, enemy: Enemy) -> Result<(), FormationError> {
        let (row, column) = (enemy.row.index(), enemy.column);
        if row >= self.rows {
            return Err(FormationError::RowOutOfBounds {
                row,
                rows: self.rows,
            });
        }
        if column >= self.columns {
            return Err(FormationError::OutOfBounds {
                column,
                columns: self.columns,
            });
        }
        let slot = self.slot(row, column);
        if self.cells[slot].is_some() {
            return Err(FormationError::SlotOccupied { row, column });
        }
        self.cells[slot] = Some(enemy);

        if self.live == 0 {
            self.leftmost_alive_column = column;
            self.rightmost_alive_column = column;
        } else {
            self.leftmost_alive_column = self.leftmost_alive_column.min(column);
            self.rightmost_alive_column = self.rightmost_alive_column.max(column);
        }
        self.live += 1;
        self.alive_columns.insert(column);
        Ok(())
    }

    /// Clear a slot, returning its enemy
    ///
    /// Keeps `alive_columns` exact and walks the flank inward when the removed
    /// enemy sat in a flank column.
    pub fn remove(&mut self, row: FormationRow, column: usize) -> Option<Enemy> {
        if column >= self.columns || row.index() >= self.rows {
            return None;
        }
        let slot = self.slot(row.index(), column);
        let enemy = self.cells[slot].take()?;
        self.live -= 1;

        if self.is_column_dead(column) {
            self.alive_columns.remove(&column);
        }
        if column == self.rightmost_alive_column {
            self.adjust_rightmost_column();
        }
        if column == self.leftmost_alive_column {
            self.adjust_leftmost_column();
        }

        debug_assert!(self.invariants_hold(), "formation invariants broken: {self:?}");
        Some(enemy)
    }

    /// True iff no row holds an enemy in `column`
    pub fn is_column_dead(&self, column: usize) -> bool {
        debug_assert!(column < self.columns, "column {column} out of range");
        (0..self.rows).all(|row| self.cells[self.slot(row, column)].is_none())
    }

    /// Walk the right flank inward past dead columns, +5 right steps each
    pub fn adjust_rightmost_column(&mut self) {
        while self.rightmost_alive_column > 0 && self.is_column_dead(self.rightmost_alive_column) {
            self.rightmost_alive_column -= 1;
            self.step_bonus.right += FLANK_STEP_BONUS;
            log::debug!(
                "Right flank now column {} (bonus {})",
                self.rightmost_alive_column,
                self.step_bonus.right
            );
        }
    }

    /// Walk the left flank inward past dead columns, +5 left steps each
    pub fn adjust_leftmost_column(&mut self) {
        while self.leftmost_alive_column < self.columns
            && self.is_column_dead(self.leftmost_alive_column)
        {
            self.leftmost_alive_column += 1;
            self.step_bonus.left += FLANK_STEP_BONUS;
            log::debug!(
                "Left flank now column {} (bonus {})",
                self.leftmost_alive_column,
                self.step_bonus.left
            );
        }
    }

    /// Lowest enemy of a random live column (the enemy-fire rule)
    pub fn random_bottom_alien<R: Rng + ?Sized>(&self, rng: &mut R) -> Option<&Enemy> {
        let column = *self.alive_columns.iter().choose(rng)?;
        (0..self.rows)
            .rev()
            .find_map(|row| self.cells[self.slot(row, column)].as_ref())
    }

    /// Lateral step interval for the current population
    pub fn move_interval_ms(&self) -> u64 {
        match self.live {
            1 => 200,
            2..=10 => 400,
            _ => 600,
        }
    }

    /// Shift every enemy sideways, toggling its animation frame
    pub(super) fn shift_lateral(&mut self, dx: i32) {
        for enemy in self.cells.iter_mut().flatten() {
            enemy.pos.x += dx;
            enemy.toggle_frame();
        }
    }

    /// Drop every enemy, toggling frames, and re-measure the bottom edge
    pub(super) fn drop_down(&mut self, dy: i32) {
        self.lowest_y = 0;
        for enemy in self.cells.iter_mut().flatten() {
            enemy.pos.y += dy;
            enemy.toggle_frame();
            self.lowest_y = self.lowest_y.max(enemy.bottom());
        }
    }

    pub fn get(&self, row: FormationRow, column: usize) -> Option<&Enemy> {
        if column >= self.columns || row.index() >= self.rows {
            return None;
        }
        self.cells[self.slot(row.index(), column)].as_ref()
    }

    /// Live enemies, row-major
    pub fn iter(&self) -> impl Iterator<Item = &Enemy> {
        self.cells.iter().flatten()
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn columns(&self) -> usize {
        self.columns
    }

    pub fn alive_columns(&self) -> &BTreeSet<usize> {
        &self.alive_columns
    }

    pub fn leftmost_alive_column(&self) -> usize {
        self.leftmost_alive_column
    }

    pub fn rightmost_alive_column(&self) -> usize {
        self.rightmost_alive_column
    }

    pub fn step_bonus(&self, dir: Direction) -> u32 {
        self.step_bonus[dir]
    }

    pub fn lowest_y(&self) -> i32 {
        self.lowest_y
    }

    /// Check the liveness bookkeeping against the cells
    pub fn invariants_hold(&self) -> bool {
        let counted = self.cells.iter().flatten().count();
        if counted != self.live {
            return false;
        }
        let live_columns: BTreeSet<usize> = (0..self.columns)
            .filter(|&column| !self.is_column_dead(column))
            .collect();
        if live_columns != self.alive_columns {
            return false;
        }
        match (live_columns.first(), live_columns.last()) {
            (Some(&first), Some(&last)) => {
                !self.is_column_dead(self.leftmost_alive_column)
                    && !self.is_column_dead(self.rightmost_alive_column)
                    && self.leftmost_alive_column <= first
                    && self.rightmost_alive_column >= last
            }
            _ => true,
        }
    }
}

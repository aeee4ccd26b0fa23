//! Game state and entity records
//!
//! Entities hold only their own data; systems receive the `Playfield` they
//! mutate explicitly instead of reaching for an ambient game object.

use std::ops::{Index, IndexMut};

use glam::IVec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::formation::FormationGrid;
use super::movement::MovementController;
use crate::Aabb;
use crate::consts::*;

/// Current phase of the game
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Title screen, waiting for a start press
    Menu,
    /// Active gameplay
    Playing,
    /// Formation cleared; next round starts 3s after the final kill
    RoundTransition { cleared_at: u64 },
    /// Run ended; returns to the menu after 3s
    GameOver { since: u64 },
}

/// Formation row. Determines sprite variant, explosion colour and score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormationRow {
    Top,
    Middle,
    Bottom,
}

impl FormationRow {
    pub const ALL: [FormationRow; FORMATION_ROWS] =
        [FormationRow::Top, FormationRow::Middle, FormationRow::Bottom];

    pub fn index(self) -> usize {
        match self {
            FormationRow::Top => 0,
            FormationRow::Middle => 1,
            FormationRow::Bottom => 2,
        }
    }

    pub fn points(self) -> u32 {
        match self {
            FormationRow::Top => 30,
            FormationRow::Middle | FormationRow::Bottom => 20,
        }
    }

    pub fn explosion_color(self) -> ExplosionColor {
        match self {
            FormationRow::Top => ExplosionColor::Purple,
            FormationRow::Middle | FormationRow::Bottom => ExplosionColor::Green,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ExplosionColor {
    Purple,
    Green,
}

/// Mystery ship rewards, drawn uniformly at collision time
pub const MYSTERY_REWARDS: [u32; 4] = [50, 100, 150, 300];

/// Everything that can be shot for points
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoreSource {
    Formation(FormationRow),
    /// Sentinel row of the bonus ship, outside the formation
    Mystery,
}

impl ScoreSource {
    /// Points for destroying this target. The mystery reward is drawn from `rng`.
    pub fn points<R: rand::Rng + ?Sized>(self, rng: &mut R) -> u32 {
        match self {
            ScoreSource::Formation(row) => row.points(),
            ScoreSource::Mystery => MYSTERY_REWARDS[rng.random_range(0..MYSTERY_REWARDS.len())],
        }
    }
}

/// A formation enemy
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Enemy {
    pub row: FormationRow,
    pub column: usize,
    pub pos: IVec2,
    /// Two-frame animation phase (0 or 1)
    frame: u8,
}

impl Enemy {
    pub fn new(row: FormationRow, column: usize, pos: IVec2) -> Self {
        Self {
            row,
            column,
            pos,
            frame: 0,
        }
    }

    pub fn frame(&self) -> u8 {
        self.frame
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, ENEMY_SIZE)
    }

    pub fn bottom(&self) -> i32 {
        self.pos.y + ENEMY_SIZE.1
    }

    /// Only ever driven by formation movement
    pub(super) fn toggle_frame(&mut self) {
        self.frame ^= 1;
    }
}

/// Horizontal travel direction of the formation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    Right,
    Left,
}

impl Direction {
    pub fn sign(self) -> i32 {
        match self {
            Direction::Right => 1,
            Direction::Left => -1,
        }
    }

    pub fn reversed(self) -> Self {
        match self {
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
        }
    }
}

/// A value kept separately for each direction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PerDirection<T> {
    pub right: T,
    pub left: T,
}

impl<T: Copy> PerDirection<T> {
    pub fn splat(value: T) -> Self {
        Self {
            right: value,
            left: value,
        }
    }
}

impl<T> Index<Direction> for PerDirection<T> {
    type Output = T;

    fn index(&self, dir: Direction) -> &T {
        match dir {
            Direction::Right => &self.right,
            Direction::Left => &self.left,
        }
    }
}

impl<T> IndexMut<Direction> for PerDirection<T> {
    fn index_mut(&mut self, dir: Direction) -> &mut T {
        match dir {
            Direction::Right => &mut self.right,
            Direction::Left => &mut self.left,
        }
    }
}

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    Player,
    Enemy,
}

/// Which gun port a bullet left from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Muzzle {
    Center,
    Left,
    Right,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: IVec2,
    /// Speed magnitude in pixels per tick
    pub speed: i32,
    pub side: Side,
    pub muzzle: Muzzle,
}

impl Bullet {
    pub fn player(pos: IVec2, muzzle: Muzzle) -> Self {
        Self {
            pos,
            speed: PLAYER_BULLET_SPEED,
            side: Side::Player,
            muzzle,
        }
    }

    pub fn enemy(pos: IVec2) -> Self {
        Self {
            pos,
            speed: ENEMY_BULLET_SPEED,
            side: Side::Enemy,
            muzzle: Muzzle::Center,
        }
    }

    /// -1 for player shots (up), +1 for enemy shots (down)
    pub fn direction(&self) -> i32 {
        match self.side {
            Side::Player => -1,
            Side::Enemy => 1,
        }
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, LASER_SIZE)
    }
}

/// The player's ship
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ship {
    pub pos: IVec2,
}

impl Default for Ship {
    fn default() -> Self {
        Self {
            pos: IVec2::new(SHIP_START.0, SHIP_START.1),
        }
    }
}

impl Ship {
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, SHIP_SIZE)
    }
}

/// The bonus ship patrolling above the formation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MysteryShip {
    pub pos: IVec2,
    pub direction: Direction,
    /// Start of the current wait period
    pub timer_ms: u64,
    /// Whether the entry cue may fire on the next off-screen move
    pub(super) announce: bool,
}

impl MysteryShip {
    pub const START: (i32, i32) = (-80, 45);
    pub const SPEED: i32 = 2;

    pub fn new(now_ms: u64) -> Self {
        Self {
            pos: IVec2::new(Self::START.0, Self::START.1),
            direction: Direction::Right,
            timer_ms: now_ms,
            announce: true,
        }
    }

    pub fn source(&self) -> ScoreSource {
        ScoreSource::Mystery
    }

    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, MYSTERY_SIZE)
    }
}

/// One destructible tile of a barrier
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BarrierBlock {
    pub barrier: u8,
    pub row: u8,
    pub column: u8,
    pub pos: IVec2,
}

impl BarrierBlock {
    pub fn aabb(&self) -> Aabb {
        Aabb::new(self.pos, (BLOCK_SIZE, BLOCK_SIZE))
    }
}

/// Build the four barriers, tile by tile
pub fn build_barriers() -> Vec<BarrierBlock> {
    let mut blocks = Vec::with_capacity((BARRIER_COUNT * BARRIER_ROWS * BARRIER_COLUMNS) as usize);
    for barrier in 0..BARRIER_COUNT {
        for row in 0..BARRIER_ROWS {
            for column in 0..BARRIER_COLUMNS {
                blocks.push(BarrierBlock {
                    barrier: barrier as u8,
                    row: row as u8,
                    column: column as u8,
                    pos: IVec2::new(
                        50 + 200 * barrier + column * BLOCK_SIZE,
                        BLOCKERS_POSITION + row * BLOCK_SIZE,
                    ),
                });
            }
        }
    }
    blocks
}

/// Transient visual effect kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EffectKind {
    EnemyExplosion { row: FormationRow },
    PlayerExplosion,
    MysteryScore { value: u32 },
}

/// What an effect shows at a given moment
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectVisual {
    pub pos: IVec2,
    /// Second, larger explosion frame
    pub large: bool,
}

/// A self-expiring effect driven purely by elapsed time
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Effect {
    pub kind: EffectKind,
    pub pos: IVec2,
    pub created_ms: u64,
}

impl Effect {
    pub fn new(kind: EffectKind, pos: IVec2, created_ms: u64) -> Self {
        Self {
            kind,
            pos,
            created_ms,
        }
    }

    pub fn ttl_ms(&self) -> u64 {
        match self.kind {
            EffectKind::EnemyExplosion { .. } => 400,
            EffectKind::PlayerExplosion => 900,
            EffectKind::MysteryScore { .. } => 600,
        }
    }

    pub fn expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.created_ms) > self.ttl_ms()
    }

    /// Blink schedule; `None` while the effect is in a hidden phase
    pub fn visual(&self, now_ms: u64) -> Option<EffectVisual> {
        if self.expired(now_ms) {
            return None;
        }
        let elapsed = now_ms.saturating_sub(self.created_ms);
        match self.kind {
            EffectKind::EnemyExplosion { .. } => Some(if elapsed <= 100 {
                EffectVisual {
                    pos: self.pos,
                    large: false,
                }
            } else {
                EffectVisual {
                    pos: self.pos - IVec2::new(6, 6),
                    large: true,
                }
            }),
            EffectKind::PlayerExplosion => {
                (elapsed > 300 && elapsed <= 600).then_some(EffectVisual {
                    pos: self.pos,
                    large: false,
                })
            }
            EffectKind::MysteryScore { .. } => {
                (elapsed <= 200 || (elapsed > 400 && elapsed <= 600)).then_some(EffectVisual {
                    pos: self.pos + IVec2::new(20, 6),
                    large: false,
                })
            }
        }
    }
}

/// A single life token; `slot` is its HUD position, left to right
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LifeToken {
    pub slot: u8,
}

/// Remaining lives, consumed last-added first
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LifePool {
    tokens: Vec<LifeToken>,
}

impl LifePool {
    pub fn new(count: usize) -> Self {
        Self {
            tokens: (0..count).map(|slot| LifeToken { slot: slot as u8 }).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    pub fn tokens(&self) -> &[LifeToken] {
        &self.tokens
    }

    /// Remove the rightmost remaining token
    pub fn consume(&mut self) -> Option<LifeToken> {
        self.tokens.pop()
    }
}

/// Audio and gameplay cues for the presentation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameEvent {
    Shoot,
    DoubleShoot,
    EnemyKilled { row: FormationRow },
    MysteryKilled { score: u32 },
    PlayerDestroyed,
    MysteryEntered,
    /// Formation march beat, cycling 0..4
    MarchNote(u8),
}

/// Everything a round mutates; passed explicitly into each system
#[derive(Debug, Clone)]
pub struct Playfield {
    pub formation: FormationGrid,
    pub movement: MovementController,
    pub player: Option<Ship>,
    /// Time the player was destroyed, while a respawn is pending
    pub respawn_from: Option<u64>,
    pub player_bullets: Vec<Bullet>,
    pub enemy_bullets: Vec<Bullet>,
    pub mystery: MysteryShip,
    pub barriers: Vec<BarrierBlock>,
    pub effects: Vec<Effect>,
    pub score: u32,
    pub lives: LifePool,
    /// Vertical offset of the top formation row this round
    pub base_y: i32,
    pub enemy_fire_ms: u64,
    /// Time of the most recent formation kill (drives the round transition)
    pub last_kill_ms: u64,
    pub game_over: bool,
    /// Cues raised during the current tick
    pub events: Vec<GameEvent>,
}

impl Playfield {
    /// A fresh game: full lives, new barriers, default formation offset
    pub fn new_game(now_ms: u64) -> Self {
        Self::round(
            now_ms,
            ENEMY_DEFAULT_POSITION,
            0,
            LifePool::new(START_LIVES),
            build_barriers(),
        )
    }

    /// Build a round at `base_y`, carrying score, lives and barriers
    pub fn round(
        now_ms: u64,
        base_y: i32,
        score: u32,
        lives: LifePool,
        barriers: Vec<BarrierBlock>,
    ) -> Self {
        Self {
            formation: FormationGrid::populate(FORMATION_ROWS, FORMATION_COLUMNS, base_y),
            movement: MovementController::new(now_ms),
            player: Some(Ship::default()),
            respawn_from: None,
            player_bullets: Vec::new(),
            enemy_bullets: Vec::new(),
            mystery: MysteryShip::new(now_ms),
            barriers,
            effects: Vec::new(),
            score,
            lives,
            base_y,
            enemy_fire_ms: now_ms,
            last_kill_ms: now_ms,
            game_over: false,
            events: Vec::new(),
        }
    }

    /// Rebuild for the next round one drop lower; consumed lives stay consumed
    pub fn advance_round(&mut self, now_ms: u64) {
        *self = Self::round(
            now_ms,
            self.base_y + ENEMY_MOVE_DOWN,
            self.score,
            std::mem::take(&mut self.lives),
            std::mem::take(&mut self.barriers),
        );
    }

    /// Round clears once the formation is gone and every effect has expired
    pub fn is_cleared(&self) -> bool {
        self.formation.is_empty() && self.effects.is_empty()
    }
}

/// Complete game state
#[derive(Debug, Clone)]
pub struct GameState {
    /// Run seed for reproducibility
    pub seed: u64,
    pub phase: GamePhase,
    /// Current round (1-based; 0 before the first game)
    pub round: u32,
    pub field: Playfield,
    /// Seeded source for enemy targeting and mystery rewards
    pub(super) rng: Pcg32,
}

impl GameState {
    /// Create a new game state sitting at the menu
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            phase: GamePhase::Menu,
            round: 0,
            field: Playfield::new_game(0),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    /// Start a fresh run: score 0, full lives, new barriers
    pub fn start_game(&mut self, now_ms: u64) {
        self.field = Playfield::new_game(now_ms);
        self.round = 1;
        self.phase = GamePhase::Playing;
        log::info!("New game started (seed {})", self.seed);
    }

    pub fn score(&self) -> u32 {
        self.field.score
    }

    pub fn lives(&self) -> usize {
        self.field.lives.len()
    }
}

//! Post-tick render view
//!
//! Read-only: builds everything a presentation layer needs to draw one frame
//! and play its cues, without touching the state.

use glam::IVec2;
use serde::{Deserialize, Serialize};

use super::state::{
    Bullet, Effect, EffectKind, FormationRow, GameEvent, GamePhase, GameState, Muzzle, Side,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemyView {
    pub pos: IVec2,
    pub row: FormationRow,
    pub frame: u8,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BulletView {
    pub pos: IVec2,
    pub side: Side,
    pub muzzle: Muzzle,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectView {
    pub kind: EffectKind,
    pub pos: IVec2,
    /// Second, larger explosion frame
    pub large: bool,
}

/// Everything visible after a tick
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    pub now_ms: u64,
    pub phase: GamePhase,
    pub round: u32,
    pub score: u32,
    pub lives: usize,
    pub enemies: Vec<EnemyView>,
    pub player: Option<IVec2>,
    pub bullets: Vec<BulletView>,
    pub mystery: IVec2,
    pub barrier_tiles: Vec<IVec2>,
    /// Effects in a visible blink phase only
    pub effects: Vec<EffectView>,
    pub game_over_text: bool,
    pub events: Vec<GameEvent>,
}

/// Build the view of `state` at `now_ms`
pub fn build(state: &GameState, now_ms: u64) -> Snapshot {
    let field = &state.field;

    Snapshot {
        now_ms,
        phase: state.phase,
        round: state.round,
        score: field.score,
        lives: field.lives.len(),
        enemies: field
            .formation
            .iter()
            .map(|e| EnemyView {
                pos: e.pos,
                row: e.row,
                frame: e.frame(),
            })
            .collect(),
        player: field.player.as_ref().map(|ship| ship.pos),
        bullets: field
            .player_bullets
            .iter()
            .chain(&field.enemy_bullets)
            .map(bullet_view)
            .collect(),
        mystery: field.mystery.pos,
        barrier_tiles: field.barriers.iter().map(|b| b.pos).collect(),
        effects: field
            .effects
            .iter()
            .filter_map(|fx| effect_view(fx, now_ms))
            .collect(),
        game_over_text: game_over_text_visible(state.phase, now_ms),
        events: field.events.clone(),
    }
}

fn bullet_view(bullet: &Bullet) -> BulletView {
    BulletView {
        pos: bullet.pos,
        side: bullet.side,
        muzzle: bullet.muzzle,
    }
}

fn effect_view(effect: &Effect, now_ms: u64) -> Option<EffectView> {
    effect.visual(now_ms).map(|visual| EffectView {
        kind: effect.kind,
        pos: visual.pos,
        large: visual.large,
    })
}

/// "GAME OVER" blinks twice before the menu returns
pub fn game_over_text_visible(phase: GamePhase, now_ms: u64) -> bool {
    let GamePhase::GameOver { since } = phase else {
        return false;
    };
    matches!(now_ms.saturating_sub(since), 0..750 | 1500..2250)
}

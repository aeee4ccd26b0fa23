//! Per-tick collision and scoring
//!
//! Resolution runs in a fixed order. Each step removes what it destroyed
//! before the next step looks, so no pair is ever counted twice.

use rand::Rng;

use super::state::{Bullet, Effect, EffectKind, FormationRow, GameEvent, MysteryShip, Playfield};
use crate::Aabb;
use crate::consts::*;

/// A formation whose bottom edge reaches this line has landed
const SCREEN_BOTTOM: i32 = SCREEN_HEIGHT;

/// Outcome of one resolution pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CollisionReport {
    pub bullets_cancelled: usize,
    pub enemies_killed: Vec<(FormationRow, usize)>,
    pub mystery_reward: Option<u32>,
    pub player_hit: bool,
    pub blocks_destroyed: usize,
    pub game_over: bool,
}

/// Every overlapping pair between two groups.
///
/// Returns hit flags for `a` and `b`. One member may hit several members of
/// the other group.
pub fn group_collide(a: &[Aabb], b: &[Aabb]) -> (Vec<bool>, Vec<bool>) {
    let mut a_hit = vec![false; a.len()];
    let mut b_hit = vec![false; b.len()];
    for (i, ra) in a.iter().enumerate() {
        for (j, rb) in b.iter().enumerate() {
            if ra.overlaps(rb) {
                a_hit[i] = true;
                b_hit[j] = true;
            }
        }
    }
    (a_hit, b_hit)
}

/// Drop every element whose flag is set
fn remove_flagged<T>(items: &mut Vec<T>, flags: &[bool]) -> usize {
    let mut idx = 0;
    let before = items.len();
    items.retain(|_| {
        let keep = !flags[idx];
        idx += 1;
        keep
    });
    before - items.len()
}

fn boxes(bullets: &[Bullet]) -> Vec<Aabb> {
    bullets.iter().map(Bullet::aabb).collect()
}

/// Resolve all interactions for this tick
pub fn resolve<R: Rng + ?Sized>(
    field: &mut Playfield,
    now_ms: u64,
    rng: &mut R,
) -> CollisionReport {
    let mut report = CollisionReport::default();

    cancel_bullets(field, &mut report);
    shoot_formation(field, now_ms, &mut report);
    shoot_mystery(field, now_ms, rng, &mut report);
    hit_player(field, now_ms, &mut report);
    check_invasion(field);
    erode_barriers_by_bullets(field, &mut report);
    erode_barriers_by_formation(field, &mut report);

    report.game_over = field.game_over;
    report
}

/// 1. Player and enemy bullets cancel each other out
fn cancel_bullets(field: &mut Playfield, report: &mut CollisionReport) {
    let (player_hit, enemy_hit) =
        group_collide(&boxes(&field.player_bullets), &boxes(&field.enemy_bullets));
    report.bullets_cancelled = remove_flagged(&mut field.player_bullets, &player_hit);
    remove_flagged(&mut field.enemy_bullets, &enemy_hit);
}

/// 2. Player bullets destroy formation enemies
fn shoot_formation(field: &mut Playfield, now_ms: u64, report: &mut CollisionReport) {
    let targets: Vec<(FormationRow, usize, Aabb)> = field
        .formation
        .iter()
        .map(|e| (e.row, e.column, e.aabb()))
        .collect();
    let target_boxes: Vec<Aabb> = targets.iter().map(|t| t.2).collect();
    let (enemy_hit, bullet_hit) = group_collide(&target_boxes, &boxes(&field.player_bullets));

    for (&(row, column, _), _) in targets.iter().zip(&enemy_hit).filter(|(_, hit)| **hit) {
        let Some(enemy) = field.formation.remove(row, column) else {
            continue;
        };
        field.score += row.points();
        field.effects.push(Effect::new(
            EffectKind::EnemyExplosion { row },
            enemy.pos,
            now_ms,
        ));
        field.events.push(GameEvent::EnemyKilled { row });
        field.last_kill_ms = now_ms;
        report.enemies_killed.push((row, column));
    }
    remove_flagged(&mut field.player_bullets, &bullet_hit);
}

/// 3. Player bullets destroy the mystery ship, which respawns at once
fn shoot_mystery<R: Rng + ?Sized>(
    field: &mut Playfield,
    now_ms: u64,
    rng: &mut R,
    report: &mut CollisionReport,
) {
    let (ship_hit, bullet_hit) =
        group_collide(&[field.mystery.aabb()], &boxes(&field.player_bullets));
    if !ship_hit[0] {
        return;
    }
    remove_flagged(&mut field.player_bullets, &bullet_hit);

    let reward = field.mystery.source().points(rng);
    field.score += reward;
    field.effects.push(Effect::new(
        EffectKind::MysteryScore { value: reward },
        field.mystery.pos,
        now_ms,
    ));
    field.events.push(GameEvent::MysteryKilled { score: reward });
    field.mystery = MysteryShip::new(now_ms);
    report.mystery_reward = Some(reward);
    log::debug!("Mystery ship destroyed for {reward}");
}

/// 4. Enemy bullets destroy the player and cost a life
fn hit_player(field: &mut Playfield, now_ms: u64, report: &mut CollisionReport) {
    let Some(ship) = field.player.as_ref() else {
        return;
    };
    let (ship_hit, bullet_hit) = group_collide(&[ship.aabb()], &boxes(&field.enemy_bullets));
    if !ship_hit[0] {
        return;
    }
    remove_flagged(&mut field.enemy_bullets, &bullet_hit);

    let pos = ship.pos;
    field.player = None;
    report.player_hit = true;
    field.effects.push(Effect::new(EffectKind::PlayerExplosion, pos, now_ms));
    field.events.push(GameEvent::PlayerDestroyed);

    match field.lives.consume() {
        Some(_) => {
            field.respawn_from = Some(now_ms);
            log::debug!("Player hit, {} lives left", field.lives.len());
        }
        None => {
            field.game_over = true;
            field.respawn_from = None;
            log::info!("Player hit with no lives left");
        }
    }
}

/// 5. A formation near the bottom crushes the player, losing the enemies
/// that touched it (no score)
fn check_invasion(field: &mut Playfield) {
    let lowest_y = field.formation.lowest_y();
    if lowest_y < INVASION_LINE {
        return;
    }
    if let Some(ship) = &field.player {
        let ship_box = ship.aabb();
        let crushed: Vec<(FormationRow, usize)> = field
            .formation
            .iter()
            .filter(|e| e.aabb().overlaps(&ship_box))
            .map(|e| (e.row, e.column))
            .collect();
        if !crushed.is_empty() {
            for (row, column) in crushed {
                field.formation.remove(row, column);
            }
            field.player = None;
        }
    }
    if field.player.is_none() || lowest_y >= SCREEN_BOTTOM {
        if !field.game_over {
            log::info!("Formation reached the ground (lowest y {lowest_y})");
        }
        field.game_over = true;
    }
}

/// 6. Any bullet erodes the barrier tiles it touches
fn erode_barriers_by_bullets(field: &mut Playfield, report: &mut CollisionReport) {
    for side in [&mut field.player_bullets, &mut field.enemy_bullets] {
        let block_boxes: Vec<Aabb> = field.barriers.iter().map(|b| b.aabb()).collect();
        let (bullet_hit, block_hit) = group_collide(&boxes(side.as_slice()), &block_boxes);
        remove_flagged(side, &bullet_hit);
        report.blocks_destroyed += remove_flagged(&mut field.barriers, &block_hit);
    }
}

/// 7. The formation erases barriers once it reaches them
fn erode_barriers_by_formation(field: &mut Playfield, report: &mut CollisionReport) {
    if field.formation.lowest_y() < BLOCKERS_POSITION {
        return;
    }
    let enemy_boxes: Vec<Aabb> = field.formation.iter().map(|e| e.aabb()).collect();
    let block_boxes: Vec<Aabb> = field.barriers.iter().map(|b| b.aabb()).collect();
    let (_, block_hit) = group_collide(&enemy_boxes, &block_boxes);
    report.blocks_destroyed += remove_flagged(&mut field.barriers, &block_hit);
}

#[cfg(test)]
mod tests {
    use glam::IVec2;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    use super::*;
    use crate::sim::state::{FormationRow, MYSTERY_REWARDS, Muzzle, Ship};

    fn field() -> Playfield {
        let mut field = Playfield::new_game(0);
        field.barriers.clear();
        field
    }

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(42)
    }

    fn shot_at(pos: IVec2) -> Bullet {
        Bullet::player(pos, Muzzle::Center)
    }

    #[test]
    fn test_group_collide_all_pairs() {
        let a = [Aabb::new(IVec2::new(0, 0), (10, 10))];
        let b = [
            Aabb::new(IVec2::new(5, 5), (10, 10)),
            Aabb::new(IVec2::new(-5, 0), (6, 6)),
            Aabb::new(IVec2::new(50, 50), (10, 10)),
        ];
        let (a_hit, b_hit) = group_collide(&a, &b);
        assert_eq!(a_hit, vec![true]);
        assert_eq!(b_hit, vec![true, true, false]);
    }

    #[test]
    fn test_bullets_cancel_without_score() {
        let mut f = field();
        f.player_bullets.push(shot_at(IVec2::new(300, 300)));
        f.enemy_bullets.push(Bullet::enemy(IVec2::new(302, 305)));
        let report = resolve(&mut f, 10, &mut rng());
        assert_eq!(report.bullets_cancelled, 1);
        assert!(f.player_bullets.is_empty());
        assert!(f.enemy_bullets.is_empty());
        assert_eq!(f.score, 0);
        assert_eq!(f.formation.len(), 30);
    }

    #[test]
    fn test_cancelled_bullet_cannot_also_kill() {
        let mut f = field();
        let top_left = f.formation.get(FormationRow::Bottom, 0).unwrap().pos;
        let pos = top_left + IVec2::new(10, 10);
        f.player_bullets.push(shot_at(pos));
        f.enemy_bullets.push(Bullet::enemy(pos));
        let report = resolve(&mut f, 10, &mut rng());
        assert!(report.enemies_killed.is_empty());
        assert_eq!(f.formation.len(), 30);
    }

    #[test]
    fn test_kill_scores_by_row() {
        let mut f = field();
        let top = f.formation.get(FormationRow::Top, 4).unwrap().pos;
        let bottom = f.formation.get(FormationRow::Bottom, 7).unwrap().pos;
        f.player_bullets.push(shot_at(top + IVec2::new(10, 10)));
        f.player_bullets.push(shot_at(bottom + IVec2::new(10, 10)));
        let report = resolve(&mut f, 1234, &mut rng());
        assert_eq!(report.enemies_killed.len(), 2);
        assert_eq!(f.score, 50);
        assert_eq!(f.formation.len(), 28);
        assert!(f.player_bullets.is_empty());
        assert_eq!(f.last_kill_ms, 1234);
        assert_eq!(f.effects.len(), 2);
        assert_eq!(f.effects[0].pos, top);
        assert!(matches!(
            f.effects[0].kind,
            EffectKind::EnemyExplosion {
                row: FormationRow::Top
            }
        ));
        assert!(f.events.contains(&GameEvent::EnemyKilled {
            row: FormationRow::Top
        }));
    }

    #[test]
    fn test_mystery_kill_respawns_one_ship() {
        let mut f = field();
        // Left of the formation so the shot only meets the ship
        f.mystery.pos = IVec2::new(0, 45);
        f.player_bullets.push(shot_at(IVec2::new(20, 50)));
        let report = resolve(&mut f, 30_000, &mut rng());
        let reward = report.mystery_reward.unwrap();
        assert!(MYSTERY_REWARDS.contains(&reward));
        assert_eq!(f.score, reward);
        assert_eq!(f.mystery.pos, IVec2::new(-80, 45));
        assert_eq!(f.mystery.timer_ms, 30_000);
        assert_eq!(f.effects[0].pos, IVec2::new(0, 45));
        assert!(matches!(f.effects[0].kind, EffectKind::MysteryScore { value } if value == reward));
    }

    #[test]
    fn test_player_hit_consumes_life_and_schedules_respawn() {
        let mut f = field();
        let ship = f.player.clone().unwrap();
        f.enemy_bullets.push(Bullet::enemy(ship.pos + IVec2::new(20, 10)));
        let report = resolve(&mut f, 5000, &mut rng());
        assert!(report.player_hit);
        assert!(f.player.is_none());
        assert_eq!(f.lives.len(), START_LIVES - 1);
        assert_eq!(f.respawn_from, Some(5000));
        assert!(!f.game_over);
        assert!(f.enemy_bullets.is_empty());
        assert!(matches!(f.effects[0].kind, EffectKind::PlayerExplosion));
    }

    #[test]
    fn test_hit_with_no_lives_is_game_over() {
        let mut f = field();
        while f.lives.consume().is_some() {}
        let ship = f.player.clone().unwrap();
        f.enemy_bullets.push(Bullet::enemy(ship.pos + IVec2::new(20, 10)));
        let report = resolve(&mut f, 5000, &mut rng());
        assert!(report.game_over);
        assert!(f.game_over);
        assert_eq!(f.respawn_from, None);
    }

    #[test]
    fn test_invasion_line() {
        let mut f = field();
        // Drop the formation onto the player's row
        for _ in 0..13 {
            f.formation.drop_down(ENEMY_MOVE_DOWN);
        }
        assert!(f.formation.lowest_y() >= INVASION_LINE);
        // Park the ship under a live column
        let x = f.formation.get(FormationRow::Bottom, 5).unwrap().pos.x;
        let ship = Ship {
            pos: IVec2::new(x, SHIP_START.1),
        };
        let ship_box = ship.aabb();
        let touching: Vec<(FormationRow, usize)> = f
            .formation
            .iter()
            .filter(|e| e.aabb().overlaps(&ship_box))
            .map(|e| (e.row, e.column))
            .collect();
        assert!(!touching.is_empty());
        f.player = Some(ship);

        let report = resolve(&mut f, 0, &mut rng());
        assert!(f.player.is_none());
        assert!(report.game_over);
        // Contact costs the enemies too, without scoring
        for (row, column) in touching.iter().copied() {
            assert!(f.formation.get(row, column).is_none());
        }
        assert_eq!(f.formation.len(), 30 - touching.len());
        assert!(f.formation.invariants_hold());
        assert_eq!(f.score, 0);
    }

    #[test]
    fn test_formation_at_screen_bottom_ends_game() {
        let mut f = field();
        for _ in 0..14 {
            f.formation.drop_down(ENEMY_MOVE_DOWN);
        }
        assert!(f.formation.lowest_y() >= SCREEN_BOTTOM);
        // Clear of every enemy, so only the screen bottom rule applies
        f.player = Some(Ship {
            pos: IVec2::new(740, SHIP_START.1),
        });
        let report = resolve(&mut f, 0, &mut rng());
        assert!(report.game_over);
        assert!(f.player.is_some());
        assert_eq!(f.formation.len(), 30);
    }

    #[test]
    fn test_invasion_during_respawn_ends_game() {
        let mut f = field();
        for _ in 0..12 {
            f.formation.drop_down(ENEMY_MOVE_DOWN);
        }
        let lowest = f.formation.lowest_y();
        assert!((INVASION_LINE..SCREEN_BOTTOM).contains(&lowest));
        f.player = None;
        f.respawn_from = Some(0);
        let report = resolve(&mut f, 100, &mut rng());
        assert!(report.game_over);
        assert!(f.game_over);
    }

    #[test]
    fn test_invasion_without_contact_spares_player() {
        let mut f = field();
        for _ in 0..12 {
            f.formation.drop_down(ENEMY_MOVE_DOWN);
        }
        let lowest = f.formation.lowest_y();
        assert!((INVASION_LINE..SCREEN_BOTTOM).contains(&lowest));
        // Far right of the formation, clear of every enemy
        f.player = Some(Ship {
            pos: IVec2::new(740, SHIP_START.1),
        });
        resolve(&mut f, 0, &mut rng());
        assert!(f.player.is_some());
        assert!(!f.game_over);
    }

    #[test]
    fn test_bullets_erode_barrier_tiles() {
        let mut f = Playfield::new_game(0);
        let total = f.barriers.len();
        // Straddles two tiles of the top barrier row
        f.player_bullets.push(shot_at(IVec2::new(57, 431)));
        f.enemy_bullets.push(Bullet::enemy(IVec2::new(250, 431)));
        let report = resolve(&mut f, 0, &mut rng());
        assert_eq!(report.blocks_destroyed, 2 + 1);
        assert_eq!(f.barriers.len(), total - 3);
        assert!(f.player_bullets.is_empty());
        assert!(f.enemy_bullets.is_empty());
    }

    #[test]
    fn test_formation_erases_barriers_once_low_enough() {
        let mut f = Playfield::new_game(0);
        let total = f.barriers.len();
        resolve(&mut f, 0, &mut rng());
        assert_eq!(f.barriers.len(), total);

        for _ in 0..9 {
            f.formation.drop_down(ENEMY_MOVE_DOWN);
        }
        assert!(f.formation.lowest_y() >= BLOCKERS_POSITION);
        let enemies = f.formation.len();
        resolve(&mut f, 0, &mut rng());
        assert!(f.barriers.len() < total);
        assert_eq!(f.formation.len(), enemies);
    }
}

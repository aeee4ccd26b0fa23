//! Formation Invaders headless runner
//!
//! Drives the simulation on a fixed-step virtual clock and prints JSON
//! snapshots to stdout. Settings come from the file named by
//! `INVADERS_SETTINGS` or the first argument.

use std::env;
use std::path::PathBuf;

use formation_invaders::Settings;
use formation_invaders::sim::{GamePhase, GameState, TickInput, autopilot, snapshot, tick};

fn settings_path() -> Option<PathBuf> {
    env::var_os("INVADERS_SETTINGS")
        .or_else(|| env::args_os().nth(1))
        .map(PathBuf::from)
}

fn main() {
    env_logger::init();
    log::info!("Formation Invaders (headless) starting...");

    let settings = Settings::load_or_default(settings_path().as_deref());
    log::debug!("{settings:?}");

    let mut state = GameState::new(settings.seed);
    let mut now_ms = 0u64;
    let mut games_finished = 0u32;

    for tick_no in 1..=settings.max_ticks {
        now_ms += settings.tick_ms;

        let input = if settings.autopilot {
            autopilot::drive(&state)
        } else {
            TickInput::default()
        };
        let before = state.phase;
        tick(&mut state, &input, now_ms);

        if std::mem::discriminant(&before) != std::mem::discriminant(&state.phase) {
            log::debug!("Phase {:?} -> {:?} at {}ms", before, state.phase, now_ms);
            if matches!(state.phase, GamePhase::GameOver { .. }) {
                games_finished += 1;
                log::info!(
                    "Game {} over: score {} in round {}",
                    games_finished,
                    state.score(),
                    state.round
                );
            }
        }

        if settings.snapshot_every > 0 && tick_no % settings.snapshot_every == 0 {
            match serde_json::to_string(&snapshot::build(&state, now_ms)) {
                Ok(json) => println!("{json}"),
                Err(err) => log::error!("Failed to serialize snapshot: {err}"),
            }
        }

        if settings.max_games > 0 && games_finished >= settings.max_games {
            break;
        }
    }

    log::info!(
        "Stopped at {}ms: {} game(s) finished, score {}, round {}",
        now_ms,
        games_finished,
        state.score(),
        state.round
    );
}

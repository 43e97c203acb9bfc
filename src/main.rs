//! Scroll Strike headless driver
//!
//! Runs the simulation with a scripted autopilot and logs what happens.
//! Usage: `scroll-strike [seed] [max_frames] [--settings FILE] [--levels FILE] [--weapons FILE]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::fs;

    use anyhow::{Context, Result, bail};
    use scroll_strike::sim::{GamePhase, GameState, SimEvent, TickInput, WeaponCatalog};
    use scroll_strike::sim::{advance_level, tick};
    use scroll_strike::{LevelCatalog, Settings};

    const FRAME_MS: f64 = 1000.0 / 60.0;
    const DEFAULT_SEED: u64 = 0x5C2011;
    const DEFAULT_MAX_FRAMES: u64 = 60 * 60 * 5;

    struct Options {
        seed: u64,
        max_frames: u64,
        settings: Settings,
        levels: LevelCatalog,
        weapons: WeaponCatalog,
    }

    fn read(path: &str) -> Result<String> {
        fs::read_to_string(path).with_context(|| format!("reading {path}"))
    }

    fn parse_args() -> Result<Options> {
        let mut opts = Options {
            seed: DEFAULT_SEED,
            max_frames: DEFAULT_MAX_FRAMES,
            settings: Settings::default(),
            levels: LevelCatalog::default(),
            weapons: WeaponCatalog::default(),
        };
        let mut positional = 0;
        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--settings" | "--levels" | "--weapons" => {
                    let Some(path) = args.next() else {
                        bail!("{arg} needs a file path");
                    };
                    let json = read(&path)?;
                    match arg.as_str() {
                        "--settings" => opts.settings = Settings::from_json(&json)?,
                        "--levels" => opts.levels = LevelCatalog::from_json(&json)?,
                        _ => opts.weapons = WeaponCatalog::from_json(&json)?,
                    }
                }
                _ => {
                    let value: u64 = arg
                        .parse()
                        .with_context(|| format!("invalid number '{arg}'"))?;
                    match positional {
                        0 => opts.seed = value,
                        1 => opts.max_frames = value,
                        _ => bail!("unexpected argument '{arg}'"),
                    }
                    positional += 1;
                }
            }
        }
        Ok(opts)
    }

    /// Walk right shooting, hopping obstacles and firing abilities when ready
    fn autopilot(state: &GameState) -> TickInput {
        let player = &state.player;
        let ahead = state
            .enemies
            .iter()
            .filter(|e| e.pos.x > player.pos.x)
            .map(|e| e.pos.x - player.pos.x)
            .fold(f32::INFINITY, f32::min);
        let blocked = state.obstacles.iter().any(|o| {
            o.rect.x > player.pos.x && o.rect.x - player.pos.x < 60.0 && o.rect.y < player.pos.y + 40.0
        });
        let wounded = player.health < player.max_health * 0.5;

        TickInput {
            right: ahead > 250.0 || wounded,
            jump: blocked,
            shoot: ahead < 600.0,
            dash: ahead < 150.0,
            multi_shot: ahead < 400.0,
            rage: ahead < 300.0,
            next_weapon: player.ammo == 0,
            ..Default::default()
        }
    }

    pub fn run() -> Result<()> {
        let opts = parse_args()?;
        log::info!(
            "Scroll Strike starting: seed {}, quality {}, {} levels",
            opts.seed,
            opts.settings.quality.as_str(),
            opts.levels.len()
        );

        let mut state = GameState::with_config(opts.seed, opts.settings, opts.levels, opts.weapons);
        let mut now_ms = 0.0;
        let mut frames = 0u64;
        let mut kills = 0u32;

        while frames < opts.max_frames {
            let input = autopilot(&state);
            tick(&mut state, &input, now_ms);
            now_ms += FRAME_MS;
            frames += 1;

            for event in &state.events {
                match event {
                    SimEvent::EnemyKilled { .. } => kills += 1,
                    SimEvent::BossSpawned { name } => log::info!("{name} appears!"),
                    SimEvent::ObjectiveCompleted { id } => log::info!("Objective '{id}' done"),
                    _ => log::trace!("{event:?}"),
                }
            }

            if state.phase == GamePhase::LevelComplete {
                advance_level(&mut state);
            } else if state.phase.is_terminal() {
                break;
            }
        }

        log::info!(
            "Finished after {} frames: {:?} on level {} ({}), score {}, {} kills",
            frames,
            state.phase,
            state.level.index,
            state.level.name,
            state.score,
            kills
        );
        println!("{:?} score={} frames={}", state.phase, state.score, frames);
        Ok(())
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> anyhow::Result<()> {
    env_logger::init();
    native::run()
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // Hosts embed the library directly; there is no wasm driver
}

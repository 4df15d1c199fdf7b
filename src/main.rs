//! Orbit Pinball entry point
//!
//! Headless demo: builds the classic table on the reference world, lets the
//! autopilot play and prints the final snapshot as JSON.
//!
//! Usage: `orbit-pinball [steps] [seed] [preset | tuning.json]`

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use std::collections::BTreeMap;
    use std::path::Path;

    use orbit_pinball::sim::{ArcadeWorld, Table, TickInput};
    use orbit_pinball::{TablePreset, TableResult, Tuning};

    const DEFAULT_STEPS: u64 = 60 * 60 * 3;

    /// Demo options from the command line
    pub struct Options {
        pub steps: u64,
        pub seed: u64,
        pub tuning: Option<String>,
    }

    impl Options {
        pub fn from_args(mut args: impl Iterator<Item = String>) -> Self {
            let steps = args.next().and_then(|s| s.parse().ok()).unwrap_or(DEFAULT_STEPS);
            let seed = args.next().and_then(|s| s.parse().ok()).unwrap_or(0);
            Self {
                steps,
                seed,
                tuning: args.next(),
            }
        }
    }

    /// A preset name or the path of a tuning document
    fn load_tuning(source: Option<&str>) -> TableResult<Tuning> {
        let Some(source) = source else {
            return Ok(Tuning::default());
        };
        if let Some(preset) = TablePreset::from_str(source) {
            return Ok(Tuning::from_preset(preset));
        }
        if Path::new(source).exists() {
            return Tuning::from_file(source);
        }
        Err(orbit_pinball::TableError::UnknownPreset {
            name: source.to_string(),
        })
    }

    pub fn run(options: Options) -> TableResult<String> {
        let tuning = load_tuning(options.tuning.as_deref())?;
        let world = ArcadeWorld::new(tuning.gravity);
        let mut table = Table::new(world, tuning)?.with_autopilot_seed(options.seed);
        log::info!("Autoplay: {} steps, seed {}", options.steps, options.seed);

        let input = TickInput {
            autoplay: true,
            ..Default::default()
        };
        let mut cue_counts: BTreeMap<&'static str, u64> = BTreeMap::new();
        let mut played = 0;
        for _ in 0..options.steps {
            table.tick(&input);
            for request in table.drain_cues() {
                *cue_counts.entry(request.cue.name()).or_default() += 1;
            }
            played += 1;
            if table.state().is_game_over() {
                break;
            }
        }

        log::info!(
            "Played {} steps ({:.1}s simulated), score {}",
            played,
            table.now() / 1000.0,
            table.state().score
        );
        for (cue, count) in &cue_counts {
            log::debug!("  {:<20} {}", cue, count);
        }
        table.snapshot_json()
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn main() -> std::process::ExitCode {
    env_logger::init();
    log::info!("Orbit Pinball (headless) starting...");

    let options = native::Options::from_args(std::env::args().skip(1));
    match native::run(options) {
        Ok(json) => {
            println!("{}", json);
            std::process::ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("{}", e);
            eprintln!("error: {}", e);
            std::process::ExitCode::FAILURE
        }
    }
}

#[cfg(target_arch = "wasm32")]
fn main() {
    // The table is a library on the web; the host page drives it
}

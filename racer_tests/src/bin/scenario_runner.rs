//! Ship scenario runner with JSON report output.
//!
//! Runs the fixed ship scenarios plus a seeded random-input soak and writes
//! `ship-scenarios.json` to the output directory (first argument, default
//! `scenario-reports`). Set `SCENARIO_SEED` to replay a soak.

use std::path::PathBuf;
use std::time::Instant;

use anyhow::Context;
use rand::{rngs::StdRng, Rng, SeedableRng};
use racer_host::GameHost;
use racer_shared::{
    config::{GameConfig, RefillPolicy, ShipTuning},
    host::ActorClass,
    report::{Outcome, ScenarioReport, ScenarioResult},
};
use racer_ship::{Action, InputEvent};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_SEED: u64 = 0x5EED;
const SOAK_TICKS: u32 = 5_000;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let output_dir = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("scenario-reports"));
    let seed = match std::env::var("SCENARIO_SEED") {
        Ok(s) => s.parse().with_context(|| format!("invalid SCENARIO_SEED {s:?}"))?,
        Err(_) => DEFAULT_SEED,
    };

    println!("Ship Scenario Runner");
    println!("====================\n");

    std::fs::create_dir_all(&output_dir)
        .with_context(|| format!("create {}", output_dir.display()))?;

    let mut report = ScenarioReport::new("Ship Control Scenarios", seed);

    println!("Running fuel scenarios...");
    run_fuel_scenarios(&mut report);

    println!("Running weapon scenarios...");
    run_weapon_scenarios(&mut report);

    println!("Running control gate scenarios...");
    run_gate_scenarios(&mut report);

    println!("Running soak with seed {seed:#x}...");
    run_soak(&mut report, seed);

    let tally = report.tally();
    println!("\n====================");
    for (category, t) in report.tally_by_category() {
        println!("{category:<14} {}/{}", t.passed, t.total());
    }
    println!("Total:   {}", tally.total());
    println!("Passed:  {} ✓", tally.passed);
    println!("Failed:  {} ✗", tally.failed);
    println!("Pass Rate: {:.1}%", tally.pass_rate());
    println!("Duration: {:.2}s", report.total_duration().as_secs_f64());
    for failure in report.failures() {
        if let Outcome::Failed { reason } = &failure.outcome {
            println!("  {} {} {}: {}", failure.outcome.icon(), failure.id, failure.name, reason);
        }
    }

    let json_path = output_dir.join("ship-scenarios.json");
    report.write_json(&json_path)?;
    println!("\nReport saved to {}", json_path.display());

    if !report.all_passed() {
        std::process::exit(1);
    }
    Ok(())
}

/// Runs one scenario and captures its result.
fn run_scenario<F>(id: &str, name: &str, category: &str, description: &str, f: F) -> ScenarioResult
where
    F: FnOnce() -> Result<u32, String>,
{
    let start = Instant::now();
    let result = f();
    let duration = start.elapsed();

    ScenarioResult::new(id, name, category)
        .describe(description)
        .finish(duration, result)
}

fn racing_host(ship: ShipTuning) -> GameHost {
    GameHost::new(GameConfig {
        countdown_seconds: 0,
        ship,
        ..GameConfig::default()
    })
}

fn step(host: &mut GameHost) -> Result<(), String> {
    let dt = host.cfg.tick_dt();
    host.step(dt).map_err(|e| e.to_string())
}

fn run_fuel_scenarios(report: &mut ScenarioReport) {
    const CATEGORY: &str = "Boost Fuel";

    report.push(run_scenario(
        "FUEL-001",
        "Boost Exhaustion",
        CATEGORY,
        "Holding boost from a full tank runs dry after about 100 ticks",
        || {
            let mut host = racing_host(ShipTuning::default());
            host.push_input(InputEvent::Pressed(Action::Boost));
            for tick in 1..=120 {
                step(&mut host)?;
                if !host.ship().state().is_boosting {
                    if !(100..=102).contains(&tick) {
                        return Err(format!("boost ended at tick {tick}"));
                    }
                    return Ok(tick);
                }
            }
            Err("boost still active after 120 ticks".to_string())
        },
    ));

    report.push(run_scenario(
        "FUEL-002",
        "Empty Tank Refuses Boost",
        CATEGORY,
        "Pressing boost with no fuel leaves the ship unboosted",
        || {
            let mut host = racing_host(ShipTuning {
                max_fuel: 0.0,
                ..ShipTuning::default()
            });
            host.exec_console("+boost").map_err(|e| e.to_string())?;
            step(&mut host)?;
            if host.ship().state().is_boosting {
                return Err("boost started on an empty tank".to_string());
            }
            Ok(1)
        },
    ));

    report.push(run_scenario(
        "FUEL-003",
        "Metered Refill",
        CATEGORY,
        "Metered refill adds one step per timer period",
        || {
            let mut host = racing_host(ShipTuning {
                refill_policy: RefillPolicy::Metered,
                ..ShipTuning::default()
            });
            host.push_input(InputEvent::Pressed(Action::Boost));
            step(&mut host)?;
            host.push_input(InputEvent::Released(Action::Boost));
            let drained = host.ship().state().boost_fuel;
            let ticks = 250;
            for _ in 0..ticks {
                step(&mut host)?;
            }
            let gained = host.ship().state().boost_fuel - drained;
            if !(0.015..=0.025).contains(&gained) {
                return Err(format!("expected two refill steps, gained {gained:.4}"));
            }
            Ok(ticks + 1)
        },
    ));
}

fn run_weapon_scenarios(report: &mut ScenarioReport) {
    const CATEGORY: &str = "Weapons";

    report.push(run_scenario(
        "WPN-001",
        "Magazine Runs Out",
        CATEGORY,
        "Three rounds and four trigger pulls spawn three projectiles",
        || {
            let mut host = racing_host(ShipTuning {
                start_ammo: 3,
                ..ShipTuning::default()
            });
            for _ in 0..4 {
                host.push_input(InputEvent::Pressed(Action::Fire));
            }
            step(&mut host)?;
            let spawned = host.actors().count(ActorClass::Projectile);
            let ammo = host.ship().state().ammo_count;
            if spawned != 3 || ammo != 0 {
                return Err(format!("spawned {spawned}, ammo left {ammo}"));
            }
            Ok(1)
        },
    ));
}

fn run_gate_scenarios(report: &mut ScenarioReport) {
    const CATEGORY: &str = "Control Gate";

    report.push(run_scenario(
        "GATE-001",
        "Countdown Freezes Drive",
        CATEGORY,
        "Drive presses during the start countdown are ignored",
        || {
            let mut host = GameHost::new(GameConfig::default());
            host.push_input(InputEvent::Pressed(Action::Drive));
            step(&mut host)?;
            if host.ship().state().is_driving {
                return Err("drive accepted before GO".to_string());
            }
            Ok(1)
        },
    ));

    report.push(run_scenario(
        "GATE-002",
        "Pause Cvar",
        CATEGORY,
        "sv_paused freezes control after the race has started",
        || {
            let mut host = racing_host(ShipTuning::default());
            host.exec_console("sv_paused 1").map_err(|e| e.to_string())?;
            host.push_input(InputEvent::Pressed(Action::Fire));
            step(&mut host)?;
            if host.actors().count(ActorClass::Projectile) != 0 {
                return Err("fired while paused".to_string());
            }
            Ok(1)
        },
    ));
}

/// Random presses, releases and axis samples. Fuel and ammo must stay in range.
fn run_soak(report: &mut ScenarioReport, seed: u64) {
    report.push(run_scenario(
        "SOAK-001",
        "Random Input Soak",
        "Soak",
        "Seeded random input keeps fuel and ammo within bounds",
        || {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut host = racing_host(ShipTuning::default());
            let max_fuel = host.cfg.ship.max_fuel;
            let start_ammo = host.cfg.ship.start_ammo;

            for tick in 0..SOAK_TICKS {
                if rng.gen_bool(0.2) {
                    let action = Action::ALL[rng.gen_range(0..Action::ALL.len())];
                    let event = if rng.gen_bool(0.5) {
                        InputEvent::Pressed(action)
                    } else {
                        InputEvent::Released(action)
                    };
                    host.push_input(event);
                }
                if rng.gen_bool(0.05) {
                    host.push_input(InputEvent::Axis(rng.gen_range(-1.0..=1.0)));
                }
                step(&mut host)?;

                let state = host.ship().state();
                if !(0.0..=max_fuel).contains(&state.boost_fuel) {
                    return Err(format!("tick {tick}: fuel {} out of range", state.boost_fuel));
                }
                if state.ammo_count > start_ammo {
                    return Err(format!("tick {tick}: ammo {} above start", state.ammo_count));
                }
            }
            info!(seed, ticks = SOAK_TICKS, "soak finished");
            Ok(SOAK_TICKS)
        },
    ));
}

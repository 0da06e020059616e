//! Standalone headless host binary.
//!
//! Usage:
//!   cargo run -p racer_host -- [--config race.json] [--tick-hz 60] [--ticks 600] [--name Ace]
//!
//! Runs the race session at a fixed tick rate. Without `--ticks` it runs
//! until `quit`.
//!
//! Console commands:
//!   +drive / -drive, +brake / -brake, +boost / -boost, fire, turn <v>
//!   status         - Show ship state
//!   status json    - Ship state as JSON
//!   save <path>    - Save player transform
//!   load <path>    - Restore player transform
//!   sv_paused 1    - Freeze ship control
//!   quit           - Shutdown host

use std::env;
use std::io::{BufRead, Write};
use std::path::PathBuf;

use anyhow::Context;
use racer_host::GameHost;
use racer_shared::config::GameConfig;
use tokio::sync::mpsc;
use tracing::{info, warn};

#[derive(Default)]
struct Args {
    config: Option<PathBuf>,
    tick_hz: Option<u32>,
    ticks: Option<u32>,
    name: Option<String>,
}

impl Args {
    /// Flags take one value each. Unknown flags are skipped with a warning.
    fn parse(mut argv: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut args = Args::default();
        while let Some(flag) = argv.next() {
            let mut value = || argv.next().with_context(|| format!("{flag} needs a value"));
            match flag.as_str() {
                "--config" => args.config = Some(PathBuf::from(value()?)),
                "--tick-hz" => args.tick_hz = Some(value()?.parse().context("--tick-hz")?),
                "--ticks" => args.ticks = Some(value()?.parse().context("--ticks")?),
                "--name" => args.name = Some(value()?),
                other => warn!(flag = other, "ignoring unknown argument"),
            }
        }
        Ok(args)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let args = Args::parse(env::args().skip(1))?;
    let mut cfg = match &args.config {
        Some(path) => GameConfig::load(path).context("load config")?,
        None => GameConfig::default(),
    };
    if let Some(hz) = args.tick_hz {
        cfg.tick_hz = hz;
    }
    if let Some(name) = args.name {
        cfg.player_name = name;
    }
    info!(tick_hz = cfg.tick_hz, player = %cfg.player_name, "Starting host");

    let mut host = GameHost::new(cfg);

    if let Some(ticks) = args.ticks {
        host.run_for_ticks(ticks).await?;
        for line in host.status_lines() {
            println!("{}", line);
        }
        return Ok(());
    }

    let (console_tx, console_rx) = mpsc::channel::<String>(32);
    host.set_console_input(console_rx);

    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        let mut stdout = std::io::stdout();
        loop {
            print!("] ");
            let _ = stdout.flush();
            let mut line = String::new();
            match stdin.lock().read_line(&mut line) {
                Ok(0) | Err(_) => break,
                Ok(_) => {}
            }
            let line = line.trim().to_string();
            if !line.is_empty() && console_tx.blocking_send(line).is_err() {
                break;
            }
        }
    });

    println!("Host ready. Type '+drive', 'fire', 'turn 0.5', 'status', or 'quit'.");
    println!();

    let tick_interval = std::time::Duration::from_secs_f32(host.cfg.tick_dt());
    let mut next_tick = tokio::time::Instant::now();
    while !host.quit_requested() {
        host.step(tick_interval.as_secs_f32())?;
        next_tick += tick_interval;
        tokio::time::sleep_until(next_tick).await;
    }
    Ok(())
}

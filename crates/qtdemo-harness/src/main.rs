#![forbid(unsafe_code)]

//! Scripted, headless run of the demo menu.
//!
//! # Running
//!
//! ```sh
//! QTDEMO_SCRIPT="b2,w800,more,w800,b1,w500,k:esc" cargo run -p qtdemo-harness
//! ```
//!
//! # Environment
//!
//! - `QTDEMO_MENU_FILE`: JSON menu description (built-in sample when unset)
//! - `QTDEMO_SCRIPT`: command script, see the library docs
//! - `QTDEMO_SETTLE_MS`: time to run after the script (default 3000)
//! - `QTDEMO_*`: every menu knob read by `MenuConfig::from_env`
//! - `RUST_LOG`: log filter (default `info`)
//!
//! The run summary is printed to stdout as one JSON line. Exit code 2 means
//! the configuration, description or script was rejected.

use std::process::ExitCode;
use std::time::Duration;

use qtdemo_harness::{parse_script, run};
use qtdemo_menu::{MenuConfig, MenuController, MenuDescription, MenuError};
use tracing_subscriber::EnvFilter;

const DEFAULT_SETTLE: Duration = Duration::from_secs(3);

fn env_string(name: &str) -> Option<String> {
    std::env::var(name).ok().and_then(|value| {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    })
}

fn env_u64(name: &str) -> Option<u64> {
    env_string(name).and_then(|value| value.parse::<u64>().ok())
}

fn load_controller(config: &MenuConfig) -> Result<MenuController, MenuError> {
    let desc = match env_string("QTDEMO_MENU_FILE") {
        Some(path) => MenuDescription::load(path)?,
        None => MenuDescription::sample(),
    };
    MenuController::from_description(&desc, config)
}

fn main() -> ExitCode {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let parsed = MenuConfig::from_env_with_diagnostics();
    if !parsed.errors.is_empty() {
        let err = MenuError::Config(parsed.errors);
        tracing::error!(error = %err, "configuration rejected");
        return ExitCode::from(2);
    }
    let config = parsed.config;

    let commands = match parse_script(&env_string("QTDEMO_SCRIPT").unwrap_or_default()) {
        Ok(commands) => commands,
        Err(err) => {
            tracing::error!(error = %err, "script rejected");
            return ExitCode::from(2);
        }
    };

    let mut controller = match load_controller(&config) {
        Ok(controller) => controller,
        Err(err) => {
            tracing::error!(error = %err, "menu rejected");
            return ExitCode::from(2);
        }
    };

    let settle = env_u64("QTDEMO_SETTLE_MS").map_or(DEFAULT_SETTLE, Duration::from_millis);
    let report = run(&mut controller, &commands, config.fps, settle);
    tracing::info!(
        state = %report.final_state,
        frames = report.frames,
        ticker = report.ticker,
        animations = report.animations,
        "run finished"
    );
    match serde_json::to_string(&report) {
        Ok(line) => {
            println!("{line}");
            ExitCode::SUCCESS
        }
        Err(err) => {
            tracing::error!(error = %err, "cannot encode report");
            ExitCode::FAILURE
        }
    }
}

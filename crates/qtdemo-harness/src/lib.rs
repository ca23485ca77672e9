#![forbid(unsafe_code)]

//! Headless driver for the demo menu.
//!
//! A script is a comma-separated list of commands played against a
//! [`MenuController`] under synthetic time:
//!
//! | Command      | Meaning                                   |
//! |--------------|-------------------------------------------|
//! | `b3`         | press item button 3                       |
//! | `back`       | press the back button                     |
//! | `more`       | press the more button                     |
//! | `prev`       | press the previous-page button            |
//! | `t`          | fire the timeout trigger                  |
//! | `k:esc`      | press a key (see below)                   |
//! | `c120:230`   | click at scene coordinates                |
//! | `w500`       | let 500 ms of frames pass                 |
//!
//! Key names are `esc`, `bs`, `up`, `down`, `pgup`, `pgdn`, `left`, `right`
//! and `enter`; any other single character is pressed as itself.

use std::fmt;
use std::time::Duration;

use serde::Serialize;

use qtdemo_core::TickClock;
use qtdemo_menu::{ButtonId, Features, KeyCode, MenuController, MenuEvent, Transform, Trigger};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Command {
    Fire(Trigger),
    Click { x: f32, y: f32 },
    Wait(Duration),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptError {
    pub position: usize,
    pub token: String,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unrecognised script command #{} `{}`", self.position + 1, self.token)
    }
}

impl std::error::Error for ScriptError {}

/// Parse a comma-separated script. Blank tokens are skipped.
pub fn parse_script(script: &str) -> Result<Vec<Command>, ScriptError> {
    script
        .split(',')
        .map(str::trim)
        .enumerate()
        .filter(|(_, token)| !token.is_empty())
        .map(|(position, token)| {
            parse_command(token).ok_or_else(|| ScriptError {
                position,
                token: token.to_string(),
            })
        })
        .collect()
}

fn parse_command(token: &str) -> Option<Command> {
    let button = |b| Some(Command::Fire(Trigger::ButtonPress(b)));
    match token {
        "back" => return button(ButtonId::BACK),
        "more" => return button(ButtonId::MORE),
        "prev" => return button(ButtonId::PREVIOUS),
        "t" | "timeout" => return Some(Command::Fire(Trigger::Timeout)),
        _ => {}
    }
    if let Some(key) = token.strip_prefix("k:") {
        return parse_key(key).map(|k| Command::Fire(Trigger::KeyPress(k)));
    }
    if let Some(rest) = token.strip_prefix('c') {
        let (x, y) = rest.split_once(':')?;
        return Some(Command::Click {
            x: x.parse().ok()?,
            y: y.parse().ok()?,
        });
    }
    if let Some(ms) = token.strip_prefix('w') {
        return ms.parse().ok().map(|ms| Command::Wait(Duration::from_millis(ms)));
    }
    let index = token.strip_prefix('b')?.parse().ok()?;
    button(ButtonId(index))
}

fn parse_key(key: &str) -> Option<KeyCode> {
    let code = match key {
        "esc" | "escape" => KeyCode::Escape,
        "bs" | "backspace" => KeyCode::Backspace,
        "up" => KeyCode::Up,
        "down" => KeyCode::Down,
        "left" => KeyCode::Left,
        "right" => KeyCode::Right,
        "pgup" => KeyCode::PageUp,
        "pgdn" => KeyCode::PageDown,
        "enter" => KeyCode::Enter,
        _ => {
            let mut chars = key.chars();
            let c = chars.next()?;
            if chars.next().is_some() {
                return None;
            }
            KeyCode::Char(c)
        }
    };
    Some(code)
}

// ---------------------------------------------------------------------------
// Running
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct AdaptationReport {
    pub fps: Option<f64>,
    pub ticker_disabled: bool,
    pub animations_disabled: bool,
}

/// Summary of one scripted session, printed as JSON by the binary.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RunReport {
    pub final_state: String,
    pub visited: Vec<String>,
    pub rejected_triggers: usize,
    pub frames: u64,
    pub medians: usize,
    pub adaptation: Option<AdaptationReport>,
    pub ticker: bool,
    pub animations: bool,
    pub renders: u64,
    pub cache_hits: u64,
}

/// Play `commands`, then let `settle` more time pass, painting every frame.
pub fn run(
    controller: &mut MenuController,
    commands: &[Command],
    fps: u32,
    settle: Duration,
) -> RunReport {
    let mut clock = TickClock::from_fps(fps);
    let mut rejected = 0;
    let mut events = controller.drain_events();

    for command in commands {
        let handled = match *command {
            Command::Fire(trigger) => controller.handle(trigger),
            Command::Click { x, y } => controller.click(x, y),
            Command::Wait(wait) => {
                advance(controller, &mut clock, wait);
                true
            }
        };
        if !handled {
            tracing::info!(?command, state = controller.current_name(), "command had no effect");
            rejected += 1;
        }
        events.extend(controller.drain_events());
    }
    advance(controller, &mut clock, settle);
    events.extend(controller.drain_events());

    let mut visited = Vec::new();
    let mut medians = 0;
    let mut adaptation = None;
    for event in events {
        match event {
            MenuEvent::StateEntered { name, .. } => visited.push(name),
            MenuEvent::MedianUpdated(_) => medians += 1,
            MenuEvent::Adapted(outcome) => {
                adaptation = Some(AdaptationReport {
                    fps: outcome.median.map(|m| m.fps),
                    ticker_disabled: outcome.disabled.contains(Features::TICKER),
                    animations_disabled: outcome.disabled.contains(Features::ANIMATIONS),
                });
            }
        }
    }
    let features = controller.features();
    let stats = controller.cache().stats();
    RunReport {
        final_state: controller.current_name().to_string(),
        visited,
        rejected_triggers: rejected,
        frames: clock.ticks(),
        medians,
        adaptation,
        ticker: features.contains(Features::TICKER),
        animations: features.contains(Features::ANIMATIONS),
        renders: stats.renders,
        cache_hits: stats.hits,
    }
}

/// Feed `wait` to the clock one interval at a time so no backlog is dropped.
fn advance(controller: &mut MenuController, clock: &mut TickClock, wait: Duration) {
    let interval = clock.interval();
    let mut left = wait;
    while !left.is_zero() {
        let step = left.min(interval);
        left -= step;
        for _ in 0..clock.advance(step) {
            controller.tick(interval);
            controller.prepare_paint(&Transform::IDENTITY);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_every_command_kind() {
        let commands = parse_script("b2, more ,prev,back,t,k:esc,k:q,c10.5:20,w250").unwrap();
        assert_eq!(
            commands,
            vec![
                Command::Fire(Trigger::ButtonPress(ButtonId(2))),
                Command::Fire(Trigger::ButtonPress(ButtonId::MORE)),
                Command::Fire(Trigger::ButtonPress(ButtonId::PREVIOUS)),
                Command::Fire(Trigger::ButtonPress(ButtonId::BACK)),
                Command::Fire(Trigger::Timeout),
                Command::Fire(Trigger::KeyPress(KeyCode::Escape)),
                Command::Fire(Trigger::KeyPress(KeyCode::Char('q'))),
                Command::Click { x: 10.5, y: 20.0 },
                Command::Wait(Duration::from_millis(250)),
            ]
        );
    }

    #[test]
    fn empty_script_is_empty() {
        assert_eq!(parse_script(" , ").unwrap(), vec![]);
    }

    #[test]
    fn reports_bad_token_position() {
        let err = parse_script("b1,zzz").unwrap_err();
        assert_eq!(err.position, 1);
        assert_eq!(err.token, "zzz");
        assert!(parse_script("k:tab").is_err());
        assert!(parse_script("c1").is_err());
    }
}

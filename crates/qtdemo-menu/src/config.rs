#![forbid(unsafe_code)]

//! Menu configuration: defaults, environment overrides, validation.
//!
//! Every knob has a compiled-in default. [`MenuConfig::from_env`] layers
//! `QTDEMO_*` environment variables on top; unparsable values are reported
//! as [`ConfigError`]s and the default is kept.

use std::env;
use std::fmt;
use std::time::Duration;

use crate::frame_monitor::AdaptationPolicy;

pub const ENV_PAGE_SIZE: &str = "QTDEMO_PAGE_SIZE";
pub const ENV_FRAME_WINDOW: &str = "QTDEMO_FRAME_WINDOW";
pub const ENV_TICKER_FPS: &str = "QTDEMO_TICKER_FPS";
pub const ENV_ANIMATION_FPS: &str = "QTDEMO_ANIMATION_FPS";
pub const ENV_ADAPT_DELAY_MS: &str = "QTDEMO_ADAPT_DELAY_MS";
pub const ENV_NO_ADAPT: &str = "QTDEMO_NO_ADAPT";
pub const ENV_NO_TICKER: &str = "QTDEMO_NO_TICKER";
pub const ENV_NO_ANIMATIONS: &str = "QTDEMO_NO_ANIMATIONS";
pub const ENV_FPS: &str = "QTDEMO_FPS";
pub const ENV_TRANSITION_MS: &str = "QTDEMO_TRANSITION_MS";
pub const ENV_STAGGER_MS: &str = "QTDEMO_STAGGER_MS";

/// Frame rate below which the ticker is switched off.
pub const DEFAULT_TICKER_FPS: f64 = 30.0;
/// Frame rate below which keyframed animations are switched off.
pub const DEFAULT_ANIMATION_FPS: f64 = 20.0;
/// Delay between start-up and the one-shot adaptation check.
pub const DEFAULT_ADAPT_DELAY: Duration = Duration::from_secs(2);
pub const DEFAULT_PAGE_SIZE: usize = 8;
pub const DEFAULT_FRAME_WINDOW: usize = 10;

/// Tunables for the menu system.
#[derive(Debug, Clone, PartialEq)]
pub struct MenuConfig {
    /// Buttons per category page before pagination kicks in.
    pub page_size: usize,
    /// Capacity of the frame-delta ring.
    pub frame_window: usize,
    pub adaptation: AdaptationPolicy,
    /// Start with the ticker switched off.
    pub no_ticker: bool,
    /// Start with keyframed animations switched off.
    pub no_animations: bool,
    /// Tick rate of the fixed-step clock.
    pub fps: u32,
    /// Base duration of a button's entrance or exit.
    pub transition: Duration,
    /// Delay between consecutive buttons on a page.
    pub stagger: Duration,
}

impl Default for MenuConfig {
    fn default() -> Self {
        Self {
            page_size: DEFAULT_PAGE_SIZE,
            frame_window: DEFAULT_FRAME_WINDOW,
            adaptation: AdaptationPolicy::default(),
            no_ticker: false,
            no_animations: false,
            fps: 60,
            transition: Duration::from_millis(600),
            stagger: Duration::from_millis(40),
        }
    }
}

/// Config plus the diagnostics gathered while reading it.
#[derive(Debug, Clone)]
pub struct MenuConfigParse {
    pub config: MenuConfig,
    pub errors: Vec<ConfigError>,
}

/// A rejected configuration value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigError {
    pub field: &'static str,
    pub value: String,
    pub message: String,
}

impl ConfigError {
    fn new(field: &'static str, value: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field,
            value: value.into(),
            message: message.into(),
        }
    }
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}={} ({})", self.field, self.value, self.message)
    }
}

impl std::error::Error for ConfigError {}

impl MenuConfig {
    /// Read overrides from the process environment, dropping diagnostics.
    #[must_use]
    pub fn from_env() -> MenuConfig {
        Self::from_env_with_diagnostics().config
    }

    /// Read overrides from the process environment.
    #[must_use]
    pub fn from_env_with_diagnostics() -> MenuConfigParse {
        Self::from_env_with(|key| env::var(key).ok())
    }

    /// Read overrides through `get`, which maps a variable name to its value.
    pub fn from_env_with<F>(mut get: F) -> MenuConfigParse
    where
        F: FnMut(&str) -> Option<String>,
    {
        let mut config = MenuConfig::default();
        let mut errors = Vec::new();
        let mut read = |key: &str, field: &'static str, expected: &str| {
            get(key).map(|v| (v, field, expected.to_string()))
        };

        if let Some(raw) = read(ENV_PAGE_SIZE, "page_size", "expected positive integer") {
            override_with(raw, parse_usize, &mut errors, |v| config.page_size = v);
        }
        if let Some(raw) = read(ENV_FRAME_WINDOW, "frame_window", "expected positive integer") {
            override_with(raw, parse_usize, &mut errors, |v| config.frame_window = v);
        }
        if let Some(raw) = read(ENV_TICKER_FPS, "ticker_fps", "expected number") {
            override_with(raw, parse_f64, &mut errors, |v| config.adaptation.ticker_fps = v);
        }
        if let Some(raw) = read(ENV_ANIMATION_FPS, "animation_fps", "expected number") {
            override_with(raw, parse_f64, &mut errors, |v| {
                config.adaptation.animation_fps = v;
            });
        }
        if let Some(raw) = read(ENV_ADAPT_DELAY_MS, "adapt_delay_ms", "expected milliseconds") {
            override_with(raw, parse_millis, &mut errors, |v| config.adaptation.delay = v);
        }
        if let Some(raw) = read(ENV_NO_ADAPT, "no_adapt", "expected bool (1/0/true/false)") {
            override_with(raw, parse_bool, &mut errors, |v| config.adaptation.enabled = !v);
        }
        if let Some(raw) = read(ENV_NO_TICKER, "no_ticker", "expected bool (1/0/true/false)") {
            override_with(raw, parse_bool, &mut errors, |v| config.no_ticker = v);
        }
        if let Some(raw) = read(
            ENV_NO_ANIMATIONS,
            "no_animations",
            "expected bool (1/0/true/false)",
        ) {
            override_with(raw, parse_bool, &mut errors, |v| config.no_animations = v);
        }
        if let Some(raw) = read(ENV_FPS, "fps", "expected positive integer") {
            override_with(raw, |s| s.trim().parse::<u32>().ok(), &mut errors, |v| config.fps = v);
        }
        if let Some(raw) = read(ENV_TRANSITION_MS, "transition_ms", "expected milliseconds") {
            override_with(raw, parse_millis, &mut errors, |v| config.transition = v);
        }
        if let Some(raw) = read(ENV_STAGGER_MS, "stagger_ms", "expected milliseconds") {
            override_with(raw, parse_millis, &mut errors, |v| config.stagger = v);
        }

        if let Err(mut violations) = config.validate() {
            errors.append(&mut violations);
        }
        MenuConfigParse { config, errors }
    }

    /// Check cross-field constraints and return every violation.
    pub fn validate(&self) -> Result<(), Vec<ConfigError>> {
        let mut errors = Vec::new();
        if self.page_size == 0 {
            errors.push(ConfigError::new("page_size", "0", "must be positive"));
        }
        if self.frame_window == 0 {
            errors.push(ConfigError::new("frame_window", "0", "must be positive"));
        }
        if self.fps == 0 {
            errors.push(ConfigError::new("fps", "0", "must be positive"));
        }
        let policy = &self.adaptation;
        if !(policy.ticker_fps.is_finite() && policy.ticker_fps >= 0.0) {
            errors.push(ConfigError::new(
                "ticker_fps",
                policy.ticker_fps.to_string(),
                "must be a non-negative number",
            ));
        }
        if !(policy.animation_fps.is_finite() && policy.animation_fps >= 0.0) {
            errors.push(ConfigError::new(
                "animation_fps",
                policy.animation_fps.to_string(),
                "must be a non-negative number",
            ));
        }
        if policy.animation_fps > policy.ticker_fps {
            errors.push(ConfigError::new(
                "animation_fps",
                policy.animation_fps.to_string(),
                "must not exceed ticker_fps",
            ));
        }
        if errors.is_empty() { Ok(()) } else { Err(errors) }
    }
}

fn override_with<T>(
    (value, field, expected): (String, &'static str, String),
    parse: impl Fn(&str) -> Option<T>,
    errors: &mut Vec<ConfigError>,
    apply: impl FnOnce(T),
) {
    match parse(&value) {
        Some(parsed) => apply(parsed),
        None => errors.push(ConfigError::new(field, value, expected)),
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[inline]
fn parse_usize(value: &str) -> Option<usize> {
    value.trim().parse::<usize>().ok()
}

#[inline]
fn parse_f64(value: &str) -> Option<f64> {
    value.trim().parse::<f64>().ok().filter(|v| v.is_finite())
}

#[inline]
fn parse_millis(value: &str) -> Option<Duration> {
    value.trim().parse::<u64>().ok().map(Duration::from_millis)
}

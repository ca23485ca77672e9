#![forbid(unsafe_code)]

//! The scrolling ticker shown on the root menu.
//!
//! ```text
//!   Hidden --show--> Intro --fade done--> Running
//!     ^                |                     |
//!     |               hide                  hide
//!     |                v                     v
//!     +--fade done-- Outro <-----------------+
//! ```
//!
//! Once [`Ticker::disable`] has been called the ticker stays hidden for good.

use std::time::Duration;

use qtdemo_core::animation::{ease_in, ease_out};
use qtdemo_core::property::{expect_bool, expect_f32};
use qtdemo_core::{
    Animation, AnimationStep, DispatchTable, GroupId, Keyframes, ObjectId, PropertyChange,
    PropertyError, PropertyKind, Pulse, Scheduler,
};

/// Object id of the ticker in property changes. Tiles never use it.
pub const TICKER_OBJECT: ObjectId = ObjectId(u32::MAX);

const FADE_IN: Duration = Duration::from_millis(400);
const FADE_OUT: Duration = Duration::from_millis(300);
const WOBBLE_HZ: f32 = 0.5;
/// Horizontal distance covered by one wobble period.
const TRAVEL: f32 = 24.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickerState {
    Hidden,
    Intro,
    Running,
    Outro,
}

#[derive(Debug)]
pub struct Ticker {
    text: String,
    state: TickerState,
    look: Look,
    disabled: bool,
    wobble: Pulse,
    group: Option<GroupId>,
    table: DispatchTable<Look>,
}

/// The animatable part of the ticker.
#[derive(Debug, Clone, Copy, Default)]
struct Look {
    opacity: f32,
    visible: bool,
}

impl Ticker {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            state: TickerState::Hidden,
            look: Look::default(),
            disabled: false,
            wobble: Pulse::new(WOBBLE_HZ),
            group: None,
            table: DispatchTable::<Look>::new()
                .with(PropertyKind::Opacity, |t, v| {
                    t.opacity = expect_f32(PropertyKind::Opacity, v)?.clamp(0.0, 1.0);
                    Ok(())
                })
                .with(PropertyKind::Visible, |t, v| {
                    t.visible = expect_bool(PropertyKind::Visible, v)?;
                    Ok(())
                }),
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn state(&self) -> TickerState {
        self.state
    }

    pub fn opacity(&self) -> f32 {
        self.look.opacity
    }

    pub fn is_visible(&self) -> bool {
        self.look.visible
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Horizontal wobble offset of the text.
    pub fn offset(&self) -> f32 {
        (self.wobble.value() - 0.5) * TRAVEL
    }

    /// Start the intro fade. No-op while already showing or when disabled.
    ///
    /// With `animate == false` the ticker jumps straight to `Running`.
    pub fn show(&mut self, scheduler: &mut Scheduler, animate: bool) {
        if self.disabled || matches!(self.state, TickerState::Intro | TickerState::Running) {
            return;
        }
        self.stop(scheduler);
        self.look.visible = true;
        if animate {
            let step = AnimationStep::new(
                TICKER_OBJECT,
                PropertyKind::Opacity,
                Keyframes::tween(self.look.opacity, 1.0),
                FADE_IN,
            )
            .easing(ease_out);
            self.group = Some(scheduler.start(&[step]));
            self.state = TickerState::Intro;
        } else {
            self.look.opacity = 1.0;
            self.state = TickerState::Running;
        }
        tracing::debug!(state = ?self.state, "ticker shown");
    }

    /// Start the outro fade. No-op while hidden or already leaving.
    pub fn hide(&mut self, scheduler: &mut Scheduler, animate: bool) {
        if matches!(self.state, TickerState::Hidden | TickerState::Outro) {
            return;
        }
        self.stop(scheduler);
        if animate {
            let step = AnimationStep::new(
                TICKER_OBJECT,
                PropertyKind::Opacity,
                Keyframes::tween(self.look.opacity, 0.0),
                FADE_OUT,
            )
            .easing(ease_in);
            self.group = Some(scheduler.start(&[step]));
            self.state = TickerState::Outro;
        } else {
            self.settle_hidden();
        }
        tracing::debug!(state = ?self.state, "ticker hiding");
    }

    /// Hide immediately and refuse every later `show`.
    pub fn disable(&mut self, scheduler: &mut Scheduler) {
        self.stop(scheduler);
        self.settle_hidden();
        self.disabled = true;
        tracing::info!("ticker disabled");
    }

    /// Advance the wobble and settle finished fades.
    pub fn tick(&mut self, dt: Duration, scheduler: &Scheduler) {
        if self.state != TickerState::Hidden {
            self.wobble.tick(dt);
        }
        let fading = self.group.is_some_and(|g| scheduler.is_running(g));
        if fading {
            return;
        }
        self.group = None;
        match self.state {
            TickerState::Intro => self.state = TickerState::Running,
            TickerState::Outro => self.settle_hidden(),
            TickerState::Hidden | TickerState::Running => {}
        }
    }

    /// Apply a scheduler change addressed to [`TICKER_OBJECT`].
    pub fn apply(&mut self, change: PropertyChange) -> Result<(), PropertyError> {
        if change.target != TICKER_OBJECT {
            return Err(PropertyError::UnknownTarget(change.target));
        }
        self.table.apply(&mut self.look, change.property, change.value)
    }

    fn stop(&mut self, scheduler: &mut Scheduler) {
        if let Some(group) = self.group.take() {
            scheduler.stop_group(group);
        }
    }

    fn settle_hidden(&mut self) {
        self.state = TickerState::Hidden;
        self.look.opacity = 0.0;
        self.look.visible = false;
        self.wobble.reset();
    }
}

#![forbid(unsafe_code)]

//! Time-based animation primitives for the demo menu.
//!
//! Every primitive produces a normalized `f32` progress in [0.0, 1.0] and is
//! advanced explicitly with [`Animation::tick`]. Nothing here reads a clock;
//! the caller owns time, so a whole menu session can be replayed headlessly.
//!
//! Property values are derived from progress through [`Keyframes`], which
//! map a progress value to an arbitrary `f32` (a position, an opacity, a
//! scale factor).

pub mod stagger;

use std::time::Duration;

// ---------------------------------------------------------------------------
// Easing functions
// ---------------------------------------------------------------------------

/// Easing function signature: maps `t` in [0, 1] to output in [0, 1].
pub type EasingFn = fn(f32) -> f32;

/// Identity easing (constant velocity).
#[inline]
pub fn linear(t: f32) -> f32 {
    t.clamp(0.0, 1.0)
}

/// Quadratic ease-in (slow start).
#[inline]
pub fn ease_in(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t
}

/// Quadratic ease-out (slow end).
#[inline]
pub fn ease_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t) * (1.0 - t)
}

/// Quadratic ease-in-out (slow start and end).
#[inline]
pub fn ease_in_out(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    if t < 0.5 {
        2.0 * t * t
    } else {
        1.0 - (-2.0 * t + 2.0).powi(2) / 2.0
    }
}

/// Cubic ease-in. Menu buttons leaving the screen use this.
#[inline]
pub fn ease_in_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    t * t * t
}

/// Cubic ease-out. Menu buttons arriving on screen use this.
#[inline]
pub fn ease_out_cubic(t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    1.0 - (1.0 - t).powi(3)
}

// ---------------------------------------------------------------------------
// Animation trait
// ---------------------------------------------------------------------------

/// A time-based animation producing values in [0.0, 1.0].
pub trait Animation {
    /// Advance the animation by `dt`.
    fn tick(&mut self, dt: Duration);

    /// Whether the animation has reached its end.
    fn is_complete(&self) -> bool;

    /// Current output value, clamped to [0.0, 1.0].
    fn value(&self) -> f32;

    /// Reset the animation to its initial state.
    fn reset(&mut self);

    /// Time elapsed past completion, forwarded by wrappers such as
    /// [`Delayed`]. Animations that never complete return zero.
    fn overshoot(&self) -> Duration {
        Duration::ZERO
    }
}

// ---------------------------------------------------------------------------
// Fade
// ---------------------------------------------------------------------------

/// Progression from 0.0 to 1.0 over a duration, with configurable easing.
///
/// Elapsed time is kept as a [`Duration`] so long runs of small ticks do not
/// drift.
#[derive(Debug, Clone, Copy)]
pub struct Fade {
    elapsed: Duration,
    duration: Duration,
    easing: EasingFn,
}

impl Fade {
    /// Create a fade with the given duration and linear easing.
    ///
    /// A zero duration is bumped to one nanosecond so the fade completes on
    /// the first tick instead of dividing by zero.
    pub fn new(duration: Duration) -> Self {
        Self {
            elapsed: Duration::ZERO,
            duration: if duration.is_zero() {
                Duration::from_nanos(1)
            } else {
                duration
            },
            easing: linear,
        }
    }

    /// Set the easing function.
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// Configured duration.
    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Raw linear progress (before easing), in [0.0, 1.0].
    pub fn raw_progress(&self) -> f32 {
        let t = self.elapsed.as_secs_f64() / self.duration.as_secs_f64();
        (t as f32).clamp(0.0, 1.0)
    }
}

impl Animation for Fade {
    fn tick(&mut self, dt: Duration) {
        self.elapsed = self.elapsed.saturating_add(dt);
    }

    fn is_complete(&self) -> bool {
        self.elapsed >= self.duration
    }

    fn value(&self) -> f32 {
        (self.easing)(self.raw_progress())
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
    }

    fn overshoot(&self) -> Duration {
        self.elapsed.saturating_sub(self.duration)
    }
}

// ---------------------------------------------------------------------------
// Pulse
// ---------------------------------------------------------------------------

/// Continuous sine-wave oscillation. Never completes.
///
/// Drives the scrolling wobble of the root-menu ticker.
#[derive(Debug, Clone, Copy)]
pub struct Pulse {
    frequency: f32,
    phase: f32,
}

impl Pulse {
    /// Create a pulse at the given frequency in Hz.
    pub fn new(frequency: f32) -> Self {
        Self {
            frequency: frequency.abs().max(f32::MIN_POSITIVE),
            phase: 0.0,
        }
    }

    /// Current phase in radians.
    pub fn phase(&self) -> f32 {
        self.phase
    }
}

impl Animation for Pulse {
    fn tick(&mut self, dt: Duration) {
        self.phase += std::f32::consts::TAU * self.frequency * dt.as_secs_f32();
        // Bounded phase keeps precision over long sessions.
        self.phase %= std::f32::consts::TAU;
    }

    fn is_complete(&self) -> bool {
        false
    }

    fn value(&self) -> f32 {
        (self.phase.sin() + 1.0) / 2.0
    }

    fn reset(&mut self) {
        self.phase = 0.0;
    }
}

// ---------------------------------------------------------------------------
// Delayed
// ---------------------------------------------------------------------------

/// Wait for a delay, then play the inner animation.
#[derive(Debug, Clone, Copy)]
pub struct Delayed<A> {
    delay: Duration,
    elapsed: Duration,
    inner: A,
    started: bool,
}

impl<A: Animation> Delayed<A> {
    /// Create a delayed animation that waits `delay` before starting `inner`.
    pub fn new(delay: Duration, inner: A) -> Self {
        Self {
            delay,
            elapsed: Duration::ZERO,
            inner,
            started: false,
        }
    }

    /// Whether the delay has elapsed and the inner animation is playing.
    pub fn has_started(&self) -> bool {
        self.started
    }

    /// Access the inner animation.
    pub fn inner(&self) -> &A {
        &self.inner
    }
}

impl<A: Animation> Animation for Delayed<A> {
    fn tick(&mut self, dt: Duration) {
        if !self.started {
            self.elapsed = self.elapsed.saturating_add(dt);
            if self.elapsed >= self.delay {
                self.started = true;
                let os = self.elapsed.saturating_sub(self.delay);
                if !os.is_zero() {
                    self.inner.tick(os);
                }
            }
        } else {
            self.inner.tick(dt);
        }
    }

    fn is_complete(&self) -> bool {
        self.started && self.inner.is_complete()
    }

    fn value(&self) -> f32 {
        if self.started {
            self.inner.value()
        } else {
            0.0
        }
    }

    fn reset(&mut self) {
        self.elapsed = Duration::ZERO;
        self.started = false;
        self.inner.reset();
    }

    fn overshoot(&self) -> Duration {
        if self.started {
            self.inner.overshoot()
        } else {
            Duration::ZERO
        }
    }
}

/// Create a [`Delayed`] animation.
pub fn delay<A: Animation>(d: Duration, a: A) -> Delayed<A> {
    Delayed::new(d, a)
}

// ---------------------------------------------------------------------------
// Keyframes
// ---------------------------------------------------------------------------

/// A single key: property `value` at normalized progress `at`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keyframe {
    pub at: f32,
    pub value: f32,
}

/// Ordered keyframes sampled with piecewise-linear interpolation.
///
/// # Invariants
///
/// 1. Keys are sorted by `at` and every `at` is clamped to [0.0, 1.0].
/// 2. Sampling before the first key yields the first value; after the last
///    key, the last value.
/// 3. An empty set samples to `None`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Keyframes {
    keys: Vec<Keyframe>,
}

impl Keyframes {
    /// Build from `(at, value)` pairs in any order.
    #[must_use]
    pub fn new(pairs: impl IntoIterator<Item = (f32, f32)>) -> Self {
        let mut keys: Vec<Keyframe> = pairs
            .into_iter()
            .map(|(at, value)| Keyframe {
                at: at.clamp(0.0, 1.0),
                value,
            })
            .collect();
        keys.sort_by(|a, b| a.at.total_cmp(&b.at));
        Self { keys }
    }

    /// Two-key tween from `from` to `to`.
    #[must_use]
    pub fn tween(from: f32, to: f32) -> Self {
        Self::new([(0.0, from), (1.0, to)])
    }

    /// Single constant value.
    #[must_use]
    pub fn constant(value: f32) -> Self {
        Self::new([(1.0, value)])
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn keys(&self) -> &[Keyframe] {
        &self.keys
    }

    /// Value of the last key, i.e. where the track comes to rest.
    pub fn final_value(&self) -> Option<f32> {
        self.keys.last().map(|k| k.value)
    }

    /// Interpolated value at `progress`.
    pub fn sample(&self, progress: f32) -> Option<f32> {
        let first = self.keys.first()?;
        let last = self.keys.last()?;
        let p = progress.clamp(0.0, 1.0);
        if p <= first.at {
            return Some(first.value);
        }
        if p >= last.at {
            return Some(last.value);
        }
        for pair in self.keys.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if p <= b.at {
                let span = b.at - a.at;
                if span <= f32::EPSILON {
                    return Some(b.value);
                }
                let t = (p - a.at) / span;
                return Some(a.value + (b.value - a.value) * t);
            }
        }
        Some(last.value)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

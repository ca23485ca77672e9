#![forbid(unsafe_code)]

//! Frame-rate benchmarking and the one-shot feature adaptation.
//!
//! [`FrameRateMonitor`] keeps a fixed-capacity ring of frame deltas. Each time
//! the ring fills, the median delta is computed, published, and the ring is
//! cleared. [`Adaptation`] looks at that median once, a fixed delay after the
//! menu starts, and switches decorative features off when the machine cannot
//! keep up.
//!
//! # Invariants
//!
//! 1. The first sample after construction or [`reset`](FrameRateMonitor::reset)
//!    only arms the timestamp; it contributes no delta.
//! 2. Exactly one median is produced per `capacity` deltas.
//! 3. The median of an even count is the mean of the two middle deltas.
//! 4. [`Adaptation::check`] decides at most once per session, and features it
//!    clears are never set again.

use std::time::Duration;

use bitflags::bitflags;

use crate::config::{DEFAULT_ADAPT_DELAY, DEFAULT_ANIMATION_FPS, DEFAULT_TICKER_FPS};

/// Median of one benchmark window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FrameMedian {
    /// Median frame delta in seconds.
    pub delta_secs: f64,
    /// Frames per second implied by the median delta.
    pub fps: f64,
}

impl FrameMedian {
    fn from_delta(delta_secs: f64) -> Self {
        let fps = if delta_secs > 0.0 {
            1.0 / delta_secs
        } else {
            f64::INFINITY
        };
        Self { delta_secs, fps }
    }
}

/// Ring buffer of frame deltas with median extraction.
#[derive(Debug, Clone)]
pub struct FrameRateMonitor {
    deltas: Vec<f64>,
    capacity: usize,
    last: Option<Duration>,
    median: Option<FrameMedian>,
    windows: u64,
}

impl FrameRateMonitor {
    /// Monitor with a ring of `capacity` deltas (at least 1).
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            deltas: Vec::with_capacity(capacity),
            capacity,
            last: None,
            median: None,
            windows: 0,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Deltas currently buffered.
    pub fn len(&self) -> usize {
        self.deltas.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty()
    }

    /// Most recent median, full window or forced.
    pub fn median(&self) -> Option<FrameMedian> {
        self.median
    }

    /// Number of full windows completed so far.
    pub fn windows(&self) -> u64 {
        self.windows
    }

    /// Record a frame presented at `now` (monotonic time since start).
    ///
    /// Returns the new median when this sample completes a window.
    pub fn sample(&mut self, now: Duration) -> Option<FrameMedian> {
        let last = self.last.replace(now)?;
        self.record(now.saturating_sub(last).as_secs_f64())
    }

    /// Record a raw delta in seconds, bypassing the timestamp.
    pub fn record(&mut self, delta_secs: f64) -> Option<FrameMedian> {
        self.deltas.push(delta_secs.max(0.0));
        if self.deltas.len() < self.capacity {
            return None;
        }
        let median = statistical_median(&mut self.deltas).map(FrameMedian::from_delta);
        self.deltas.clear();
        self.windows += 1;
        if median.is_some() {
            self.median = median;
        }
        median
    }

    /// Compute a median from the partial window without waiting for it to fill.
    ///
    /// Used when the benchmark deadline arrives before a full window was
    /// collected. The buffered deltas are consumed. An empty ring yields `None`
    /// and leaves any earlier median untouched.
    pub fn force_median_now(&mut self) -> Option<FrameMedian> {
        let median = statistical_median(&mut self.deltas).map(FrameMedian::from_delta)?;
        self.deltas.clear();
        self.median = Some(median);
        Some(median)
    }

    /// Drop buffered deltas and the armed timestamp.
    ///
    /// Called on every menu transition: transition frames are expected to be
    /// slow and must not skew the benchmark.
    pub fn reset(&mut self) {
        self.deltas.clear();
        self.last = None;
    }
}

/// Median of `values`, sorting them in place.
fn statistical_median(values: &mut [f64]) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 1 {
        Some(values[mid])
    } else {
        Some((values[mid - 1] + values[mid]) / 2.0)
    }
}

// ---------------------------------------------------------------------------
// Adaptation
// ---------------------------------------------------------------------------

bitflags! {
    /// Optional visual features the adaptation may switch off.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct Features: u8 {
        /// The scrolling ticker on the root menu.
        const TICKER = 0b01;
        /// Keyframed button animations.
        const ANIMATIONS = 0b10;
    }
}

/// Thresholds and timing of the adaptation check.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptationPolicy {
    /// Below this many fps the ticker is switched off.
    pub ticker_fps: f64,
    /// Below this many fps animations are switched off.
    pub animation_fps: f64,
    /// Time after start at which the check runs.
    pub delay: Duration,
    pub enabled: bool,
}

impl Default for AdaptationPolicy {
    fn default() -> Self {
        Self {
            ticker_fps: DEFAULT_TICKER_FPS,
            animation_fps: DEFAULT_ANIMATION_FPS,
            delay: DEFAULT_ADAPT_DELAY,
            enabled: true,
        }
    }
}

/// Result of the adaptation check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AdaptOutcome {
    /// Median the decision was based on; `None` when nothing was measured.
    pub median: Option<FrameMedian>,
    /// Features switched off by this check.
    pub disabled: Features,
    /// Features left on afterwards.
    pub remaining: Features,
}

/// One-shot adaptation state.
#[derive(Debug, Clone)]
pub struct Adaptation {
    policy: AdaptationPolicy,
    features: Features,
    done: bool,
}

impl Adaptation {
    pub fn new(policy: AdaptationPolicy, initial: Features) -> Self {
        Self {
            done: !policy.enabled,
            policy,
            features: initial,
        }
    }

    pub fn policy(&self) -> &AdaptationPolicy {
        &self.policy
    }

    pub fn features(&self) -> Features {
        self.features
    }

    /// Whether the check already ran (or adaptation is disabled).
    pub fn is_done(&self) -> bool {
        self.done
    }

    /// Run the check if `elapsed` has reached the policy delay.
    ///
    /// Uses the latest full-window median, or forces one from the partial
    /// window. With no samples at all the check completes without disabling
    /// anything.
    pub fn check(
        &mut self,
        elapsed: Duration,
        monitor: &mut FrameRateMonitor,
    ) -> Option<AdaptOutcome> {
        if self.done || elapsed < self.policy.delay {
            return None;
        }
        self.done = true;

        let median = monitor.median().or_else(|| monitor.force_median_now());
        let mut disabled = Features::empty();
        if let Some(m) = median {
            if m.fps < self.policy.ticker_fps {
                disabled |= Features::TICKER;
            }
            if m.fps < self.policy.animation_fps {
                disabled |= Features::ANIMATIONS;
            }
        }
        disabled &= self.features;
        self.features.remove(disabled);

        tracing::info!(
            fps = ?median.map(|m| m.fps),
            disabled = ?disabled,
            remaining = ?self.features,
            "frame-rate adaptation"
        );
        Some(AdaptOutcome {
            median,
            disabled,
            remaining: self.features,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn first_sample_only_arms() {
        let mut m = FrameRateMonitor::new(3);
        assert_eq!(m.sample(ms(0)), None);
        assert!(m.is_empty());
        m.sample(ms(16));
        assert_eq!(m.len(), 1);
    }

    #[test]
    fn full_window_publishes_median_and_clears() {
        let mut m = FrameRateMonitor::new(3);
        m.sample(ms(0));
        assert_eq!(m.sample(ms(10)), None);
        assert_eq!(m.sample(ms(40)), None);
        let median = m.sample(ms(60)).unwrap();
        // deltas 10, 30, 20 -> 20ms
        assert!((median.delta_secs - 0.020).abs() < 1e-9);
        assert!((median.fps - 50.0).abs() < 1e-6);
        assert!(m.is_empty());
        assert_eq!(m.windows(), 1);
    }

    #[test]
    fn even_window_averages_middle_pair() {
        let mut m = FrameRateMonitor::new(4);
        for d in [0.01, 0.04, 0.02, 0.03] {
            m.record(d);
        }
        assert!((m.median().unwrap().delta_secs - 0.025).abs() < 1e-12);
    }

    #[test]
    fn forced_median_uses_partial_window() {
        let mut m = FrameRateMonitor::new(10);
        m.record(0.05);
        m.record(0.07);
        m.record(0.06);
        let forced = m.force_median_now().unwrap();
        assert!((forced.delta_secs - 0.06).abs() < 1e-12);
        assert!(m.is_empty());
    }

    #[test]
    fn forced_median_on_empty_ring_is_none() {
        let mut m = FrameRateMonitor::new(10);
        assert_eq!(m.force_median_now(), None);
        assert_eq!(m.median(), None);
    }

    #[test]
    fn reset_drops_partial_window_and_timestamp() {
        let mut m = FrameRateMonitor::new(4);
        m.sample(ms(0));
        m.sample(ms(16));
        m.reset();
        assert!(m.is_empty());
        assert_eq!(m.sample(ms(500)), None);
        assert!(m.is_empty());
    }

    #[test]
    fn zero_delta_is_infinite_fps() {
        let mut m = FrameRateMonitor::new(1);
        let median = m.record(0.0).unwrap();
        assert!(median.fps.is_infinite());
    }

    fn adaptation() -> Adaptation {
        Adaptation::new(AdaptationPolicy::default(), Features::all())
    }

    #[test]
    fn waits_for_delay() {
        let mut a = adaptation();
        let mut m = FrameRateMonitor::new(1);
        m.record(0.1);
        assert!(a.check(ms(1999), &mut m).is_none());
        assert!(!a.is_done());
        assert!(a.check(ms(2000), &mut m).is_some());
    }

    #[test]
    fn slow_median_disables_ticker_only() {
        let mut a = adaptation();
        let mut m = FrameRateMonitor::new(1);
        m.record(1.0 / 25.0);
        let out = a.check(ms(2000), &mut m).unwrap();
        assert_eq!(out.disabled, Features::TICKER);
        assert_eq!(a.features(), Features::ANIMATIONS);
    }

    #[test]
    fn very_slow_median_disables_everything() {
        let mut a = adaptation();
        let mut m = FrameRateMonitor::new(1);
        m.record(1.0 / 10.0);
        let out = a.check(ms(2000), &mut m).unwrap();
        assert_eq!(out.disabled, Features::all());
        assert!(a.features().is_empty());
    }

    #[test]
    fn fast_median_keeps_everything() {
        let mut a = adaptation();
        let mut m = FrameRateMonitor::new(1);
        m.record(1.0 / 60.0);
        let out = a.check(ms(2000), &mut m).unwrap();
        assert!(out.disabled.is_empty());
        assert_eq!(out.remaining, Features::all());
    }

    #[test]
    fn check_runs_once() {
        let mut a = adaptation();
        let mut m = FrameRateMonitor::new(1);
        m.record(1.0 / 10.0);
        a.check(ms(2000), &mut m);
        m.record(1.0 / 120.0);
        assert!(a.check(ms(5000), &mut m).is_none());
        assert!(a.features().is_empty());
    }

    #[test]
    fn partial_window_is_forced_at_deadline() {
        let mut a = adaptation();
        let mut m = FrameRateMonitor::new(10);
        m.record(0.1);
        m.record(0.1);
        let out = a.check(ms(2000), &mut m).unwrap();
        assert!(out.median.is_some());
        assert_eq!(out.disabled, Features::all());
    }

    #[test]
    fn no_samples_disables_nothing() {
        let mut a = adaptation();
        let mut m = FrameRateMonitor::new(10);
        let out = a.check(ms(2000), &mut m).unwrap();
        assert_eq!(out.median, None);
        assert!(out.disabled.is_empty());
        assert!(a.is_done());
    }

    #[test]
    fn disabled_policy_never_runs() {
        let policy = AdaptationPolicy {
            enabled: false,
            ..AdaptationPolicy::default()
        };
        let mut a = Adaptation::new(policy, Features::all());
        let mut m = FrameRateMonitor::new(1);
        m.record(1.0);
        assert!(a.is_done());
        assert!(a.check(ms(10_000), &mut m).is_none());
        assert_eq!(a.features(), Features::all());
    }

    #[test]
    fn already_disabled_feature_is_not_reported() {
        let mut a = Adaptation::new(AdaptationPolicy::default(), Features::ANIMATIONS);
        let mut m = FrameRateMonitor::new(1);
        m.record(1.0 / 25.0);
        let out = a.check(ms(2000), &mut m).unwrap();
        assert!(out.disabled.is_empty());
    }
}

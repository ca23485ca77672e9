#![forbid(unsafe_code)]

//! Index-keyed delay ramps for menu item entrance and exit.
//!
//! Buttons on a menu page do not arrive all at once: item `i` starts its
//! entrance `offset[i]` after the transition begins, and leaves in the
//! opposite order so the last button in is the first one out.
//!
//! # Invariants
//!
//! 1. `stagger_offsets(0, ..)` returns an empty vec.
//! 2. The first entrance offset is always `Duration::ZERO`.
//! 3. Offsets are monotonically non-decreasing in every mode.
//! 4. For `Linear`, offset[i] = i * step exactly.
//! 5. Offsets depend only on `(count, step, mode)`; there is no randomness.
//! 6. `exit_offsets` is the entrance ramp reversed.

use std::time::Duration;

use super::{EasingFn, ease_in, ease_in_out, ease_out};

/// How to distribute delay offsets across items.
#[derive(Debug, Clone, Copy)]
pub enum StaggerMode {
    /// Equal spacing: offset[i] = i * step.
    Linear,
    /// Accelerating gaps.
    EaseIn,
    /// Decelerating gaps.
    EaseOut,
    /// Slow start and end, faster middle.
    EaseInOut,
    /// Custom easing applied to the normalized index.
    Custom(EasingFn),
}

/// Entrance delay offsets for `count` items.
///
/// The total span is `(count - 1) * step`; eased modes redistribute the
/// points along that span.
#[must_use]
pub fn stagger_offsets(count: usize, step: Duration, mode: StaggerMode) -> Vec<Duration> {
    if count == 0 {
        return Vec::new();
    }
    if count == 1 {
        return vec![Duration::ZERO];
    }

    let easing: EasingFn = match mode {
        // Integer arithmetic, no float drift.
        StaggerMode::Linear => {
            return (0..count)
                .map(|i| step.saturating_mul(u32::try_from(i).unwrap_or(u32::MAX)))
                .collect();
        }
        StaggerMode::EaseIn => ease_in,
        StaggerMode::EaseOut => ease_out,
        StaggerMode::EaseInOut => ease_in_out,
        StaggerMode::Custom(f) => f,
    };

    let total_nanos = step.as_nanos() as f64 * (count - 1) as f64;
    (0..count)
        .map(|i| {
            let t = i as f32 / (count - 1) as f32;
            Duration::from_nanos((total_nanos * f64::from(easing(t))) as u64)
        })
        .collect()
}

/// Exit delay offsets: the entrance ramp in reverse order.
#[must_use]
pub fn exit_offsets(count: usize, step: Duration, mode: StaggerMode) -> Vec<Duration> {
    let mut offsets = stagger_offsets(count, step, mode);
    offsets.reverse();
    offsets
}

#[cfg(test)]
mod tests {
    use super::*;

    const MS_50: Duration = Duration::from_millis(50);

    #[test]
    fn zero_count_returns_empty() {
        assert!(stagger_offsets(0, MS_50, StaggerMode::Linear).is_empty());
        assert!(exit_offsets(0, MS_50, StaggerMode::Linear).is_empty());
    }

    #[test]
    fn single_item_returns_zero() {
        assert_eq!(
            stagger_offsets(1, MS_50, StaggerMode::EaseIn),
            vec![Duration::ZERO]
        );
    }

    #[test]
    fn linear_equal_spacing() {
        let offsets = stagger_offsets(4, MS_50, StaggerMode::Linear);
        assert_eq!(
            offsets,
            vec![
                Duration::ZERO,
                MS_50,
                Duration::from_millis(100),
                Duration::from_millis(150)
            ]
        );
    }

    #[test]
    fn exit_is_reversed_entrance() {
        let exit = exit_offsets(3, MS_50, StaggerMode::Linear);
        assert_eq!(exit, vec![Duration::from_millis(100), MS_50, Duration::ZERO]);
    }

    #[test]
    fn eased_modes_share_span() {
        for mode in [
            StaggerMode::EaseIn,
            StaggerMode::EaseOut,
            StaggerMode::EaseInOut,
        ] {
            let offsets = stagger_offsets(5, MS_50, mode);
            assert_eq!(offsets[0], Duration::ZERO);
            assert_eq!(offsets[4], Duration::from_millis(200));
        }
    }

    #[test]
    fn monotonic_every_mode() {
        for mode in [
            StaggerMode::Linear,
            StaggerMode::EaseIn,
            StaggerMode::EaseOut,
            StaggerMode::EaseInOut,
        ] {
            let offsets = stagger_offsets(10, MS_50, mode);
            for w in offsets.windows(2) {
                assert!(w[1] >= w[0]);
            }
        }
    }

    #[test]
    fn repeated_calls_are_identical() {
        let a = stagger_offsets(7, MS_50, StaggerMode::EaseInOut);
        let b = stagger_offsets(7, MS_50, StaggerMode::EaseInOut);
        assert_eq!(a, b);
    }
}

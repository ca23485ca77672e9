#![forbid(unsafe_code)]

//! Headless animation scheduler.
//!
//! The scheduler owns every in-flight property track and is advanced by one
//! explicit [`Scheduler::tick`] call per frame. It never touches the animated
//! objects itself: each tick returns the [`PropertyChange`]s to apply, and the
//! owner routes them through its dispatch tables.
//!
//! # Invariants
//!
//! 1. At most one track exists per `(target, property)`. Starting a track for
//!    a pair that is already animating replaces the old track
//!    (last-writer-wins per property).
//! 2. Tracks on different properties play concurrently, whichever group
//!    started them. Nothing is cancelled implicitly beyond invariant 1.
//! 3. Tracks are advanced in insertion order, so the changes of one tick are
//!    emitted in a deterministic order.
//! 4. A completed track emits its final keyframe value exactly once and is
//!    then dropped.
//! 5. A track still inside its start delay emits nothing.

use std::time::Duration;

use crate::animation::{Animation, Delayed, EasingFn, Fade, Keyframes, delay, linear};
use crate::property::{ObjectId, PropertyChange, PropertyKind, Value};

/// Handle to the set of tracks started by one [`Scheduler::start`] call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GroupId(pub u64);

/// Declarative description of one animated property.
#[derive(Debug, Clone)]
pub struct AnimationStep {
    pub target: ObjectId,
    pub property: PropertyKind,
    pub keyframes: Keyframes,
    pub duration: Duration,
    pub delay: Duration,
    pub easing: EasingFn,
}

impl AnimationStep {
    /// Step with linear easing and no delay.
    pub fn new(
        target: ObjectId,
        property: PropertyKind,
        keyframes: Keyframes,
        duration: Duration,
    ) -> Self {
        Self {
            target,
            property,
            keyframes,
            duration,
            delay: Duration::ZERO,
            easing: linear,
        }
    }

    #[must_use]
    pub fn delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    #[must_use]
    pub fn easing(mut self, easing: EasingFn) -> Self {
        self.easing = easing;
        self
    }

    /// The change this step settles on, if it has keyframes.
    pub fn final_change(&self) -> Option<PropertyChange> {
        self.keyframes
            .final_value()
            .map(|v| PropertyChange::float(self.target, self.property, v))
    }

    /// Total time from start to rest.
    pub fn span(&self) -> Duration {
        self.delay.saturating_add(self.duration)
    }
}

#[derive(Debug)]
struct Track {
    group: GroupId,
    target: ObjectId,
    property: PropertyKind,
    keyframes: Keyframes,
    timing: Delayed<Fade>,
}

impl Track {
    fn from_step(group: GroupId, step: &AnimationStep) -> Self {
        Self {
            group,
            target: step.target,
            property: step.property,
            keyframes: step.keyframes.clone(),
            timing: delay(step.delay, Fade::new(step.duration).easing(step.easing)),
        }
    }

    fn sample(&self, progress: f32) -> Option<PropertyChange> {
        self.keyframes.sample(progress).map(|v| PropertyChange {
            target: self.target,
            property: self.property,
            value: Value::Float(v),
        })
    }

    fn final_change(&self) -> Option<PropertyChange> {
        self.sample(1.0)
    }
}

/// Fixed-order track scheduler. See the module docs for invariants.
#[derive(Debug, Default)]
pub struct Scheduler {
    tracks: Vec<Track>,
    next_group: u64,
}

impl Scheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Start one track per step and return the group handle.
    ///
    /// Steps with empty keyframes or a non-continuous property are skipped.
    pub fn start(&mut self, steps: &[AnimationStep]) -> GroupId {
        let group = GroupId(self.next_group);
        self.next_group += 1;
        for step in steps {
            if step.keyframes.is_empty() || !step.property.is_continuous() {
                continue;
            }
            let superseded = self.remove_track(step.target, step.property);
            if superseded {
                crate::trace!(
                    object = %step.target,
                    property = ?step.property,
                    "track superseded"
                );
            }
            self.tracks.push(Track::from_step(group, step));
        }
        crate::trace!(group = group.0, tracks = self.tracks.len(), "animation group started");
        group
    }

    fn remove_track(&mut self, target: ObjectId, property: PropertyKind) -> bool {
        let before = self.tracks.len();
        self.tracks
            .retain(|t| !(t.target == target && t.property == property));
        self.tracks.len() < before
    }

    /// Drop every track of `group` where it stands. Returns how many were dropped.
    pub fn stop_group(&mut self, group: GroupId) -> usize {
        let before = self.tracks.len();
        self.tracks.retain(|t| t.group != group);
        before - self.tracks.len()
    }

    /// Drop every track and return the values they would have settled on.
    pub fn finish_all(&mut self) -> Vec<PropertyChange> {
        self.tracks
            .drain(..)
            .filter_map(|t| t.final_change())
            .collect()
    }

    /// Whether any track of `group` is still in flight.
    pub fn is_running(&self, group: GroupId) -> bool {
        self.tracks.iter().any(|t| t.group == group)
    }

    /// Whether `(target, property)` is being animated.
    pub fn is_animating(&self, target: ObjectId, property: PropertyKind) -> bool {
        self.tracks
            .iter()
            .any(|t| t.target == target && t.property == property)
    }

    pub fn active_tracks(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_idle(&self) -> bool {
        self.tracks.is_empty()
    }

    /// Advance every track by `dt` and collect the resulting changes.
    pub fn tick(&mut self, dt: Duration) -> Vec<PropertyChange> {
        let mut changes = Vec::with_capacity(self.tracks.len());
        for track in &mut self.tracks {
            track.timing.tick(dt);
            if !track.timing.has_started() {
                continue;
            }
            let change = if track.timing.is_complete() {
                track.final_change()
            } else {
                track.sample(track.timing.value())
            };
            if let Some(change) = change {
                changes.push(change);
            }
        }
        self.tracks.retain(|t| !t.timing.is_complete());
        changes
    }
}

// ---------------------------------------------------------------------------
// Fixed-step clock
// ---------------------------------------------------------------------------

/// Converts real elapsed time into a whole number of fixed-interval ticks.
///
/// Ticks are strictly sequential: the remainder carries over to the next
/// [`advance`](TickClock::advance) call. A backlog larger than `max_catch_up`
/// intervals is dropped so a stalled host does not replay a burst of frames.
#[derive(Debug, Clone, Copy)]
pub struct TickClock {
    interval: Duration,
    pending: Duration,
    max_catch_up: u32,
    ticks: u64,
}

impl TickClock {
    /// Clock firing at `fps` ticks per second (at least 1).
    pub fn from_fps(fps: u32) -> Self {
        let fps = fps.max(1);
        Self::new(Duration::from_secs(1) / fps)
    }

    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_micros(1)),
            pending: Duration::ZERO,
            max_catch_up: 5,
            ticks: 0,
        }
    }

    #[must_use]
    pub fn max_catch_up(mut self, max: u32) -> Self {
        self.max_catch_up = max.max(1);
        self
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Total ticks produced since creation.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Add `elapsed` wall time; return how many ticks to run now.
    pub fn advance(&mut self, elapsed: Duration) -> u32 {
        self.pending = self.pending.saturating_add(elapsed);
        let due = self.pending.as_nanos() / self.interval.as_nanos();
        let due = u32::try_from(due).unwrap_or(u32::MAX);
        let run = due.min(self.max_catch_up);
        if due > run {
            crate::debug!(dropped = due - run, "tick backlog dropped");
            self.pending = Duration::ZERO;
        } else {
            self.pending = self.pending.saturating_sub(self.interval * run);
        }
        self.ticks += u64::from(run);
        run
    }
}

#![forbid(unsafe_code)]

//! Core: toolkit-free animation primitives, the property model and the
//! headless scheduler that drive the demo menu.

pub mod animation;
pub mod logging;
pub mod property;
pub mod scheduler;

pub use animation::{Animation, EasingFn, Fade, Keyframes, Pulse};
pub use property::{DispatchTable, ObjectId, PropertyChange, PropertyError, PropertyKind, Value};
pub use scheduler::{AnimationStep, GroupId, Scheduler, TickClock};

// With tracing on, the macros live at the crate root just like the no-op ones.
#[cfg(feature = "tracing")]
pub use logging::{debug, info, trace, warn};

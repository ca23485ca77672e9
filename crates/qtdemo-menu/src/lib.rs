#![forbid(unsafe_code)]

//! Adaptive demo-browser menu.
//!
//! A [`MenuDescription`] is turned into an immutable [`MenuGraph`] of root,
//! category and leaf states. A [`MenuController`] walks that graph, drives
//! tile and ticker animations through the core scheduler, and benchmarks the
//! frame rate to switch expensive features off on slow hosts.
//!
//! ```
//! use qtdemo_menu::{ButtonId, MenuConfig, MenuController, MenuDescription};
//! use std::time::Duration;
//!
//! let config = MenuConfig::default();
//! let mut menu = MenuController::from_description(&MenuDescription::sample(), &config)?;
//! assert!(menu.handle_button(ButtonId(0)));
//! for _ in 0..60 {
//!     menu.tick(Duration::from_millis(16));
//! }
//! assert_eq!(menu.current_name(), "dialogs");
//! # Ok::<(), qtdemo_menu::MenuError>(())
//! ```

pub mod cache;
pub mod config;
pub mod controller;
pub mod description;
pub mod error;
pub mod frame_monitor;
pub mod graph;
pub mod ticker;
pub mod tile;

pub use cache::{ContentId, Image, ImageCache, ImageHandle, Transform};
pub use config::{ConfigError, MenuConfig};
pub use controller::{MenuController, MenuEvent};
pub use description::{MenuDescription, MenuRecord};
pub use error::MenuError;
pub use frame_monitor::{
    AdaptOutcome, Adaptation, AdaptationPolicy, Features, FrameMedian, FrameRateMonitor,
};
pub use graph::{
    AnimationDescriptor, ButtonId, GraphBuilder, GraphError, KeyCode, MenuGraph, MenuNode, StateId,
    StateKind, StateSpec, TileSpec, Transition, Trigger,
};
pub use ticker::{Ticker, TickerState};
pub use tile::{DemoTile, TileSet};

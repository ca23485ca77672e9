#![forbid(unsafe_code)]

//! The menu controller: owns the graph, the tiles and every animation, and
//! turns triggers and frame ticks into state changes.
//!
//! The host drives it with [`MenuController::tick`] once per frame and feeds
//! input through the `handle_*` methods. Observers poll
//! [`MenuController::drain_events`] instead of registering callbacks.
//!
//! # Invariants
//!
//! 1. Exactly one current state. Entry assignments of the target are applied
//!    before its entry animation starts, so a transition is never half-visible.
//! 2. Tiles of a state that was left become invisible once their exit
//!    animation has finished, unless the current state owns them again.
//! 3. Frame history is reset on every transition.
//! 4. Adaptation runs at most once; features it disables stay off.
//! 5. With animations off, every transition lands on the settled values
//!    immediately.

use std::time::Duration;

use qtdemo_core::{GroupId, ObjectId, PropertyChange, PropertyKind, Scheduler};

use crate::cache::{Image, ImageCache, Transform};
use crate::config::MenuConfig;
use crate::description::MenuDescription;
use crate::error::MenuError;
use crate::frame_monitor::{AdaptOutcome, Adaptation, Features, FrameMedian, FrameRateMonitor};
use crate::graph::{ButtonId, KeyCode, MenuGraph, MenuNode, StateId, Trigger};
use crate::ticker::{TICKER_OBJECT, Ticker};
use crate::tile::{DemoTile, TileSet};

/// Something observers may want to react to.
#[derive(Debug, Clone, PartialEq)]
pub enum MenuEvent {
    /// A state became current. `trigger` is `None` for the initial state.
    StateEntered {
        state: StateId,
        name: String,
        trigger: Option<Trigger>,
    },
    /// A full benchmark window produced a new median.
    MedianUpdated(FrameMedian),
    /// The one-shot adaptation check ran.
    Adapted(AdaptOutcome),
}

#[derive(Debug)]
pub struct MenuController {
    graph: MenuGraph,
    current: StateId,
    tiles: TileSet,
    scheduler: Scheduler,
    ticker: Ticker,
    monitor: FrameRateMonitor,
    adaptation: Adaptation,
    cache: ImageCache,
    /// Exit groups whose tiles get hidden once the group is done.
    pending_hides: Vec<(GroupId, Vec<ObjectId>)>,
    elapsed: Duration,
    events: Vec<MenuEvent>,
}

impl MenuController {
    /// Controller positioned on the graph's root state.
    pub fn new(graph: MenuGraph, config: &MenuConfig) -> Self {
        let mut tiles = TileSet::new();
        for spec in graph.tile_specs() {
            tiles.push(
                DemoTile::new(
                    spec.object,
                    spec.content.clone(),
                    spec.label.clone(),
                    spec.width,
                    spec.height,
                )
                .at(spec.x, spec.y)
                .with_index(spec.index),
            );
        }

        let mut features = Features::all();
        if config.no_ticker {
            features.remove(Features::TICKER);
        }
        if config.no_animations {
            features.remove(Features::ANIMATIONS);
        }

        let root = graph.root();
        let ticker = Ticker::new(graph.node(root).title.clone());
        let mut controller = Self {
            current: root,
            tiles,
            scheduler: Scheduler::new(),
            ticker,
            monitor: FrameRateMonitor::new(config.frame_window),
            adaptation: Adaptation::new(config.adaptation.clone(), features),
            cache: ImageCache::new(),
            pending_hides: Vec::new(),
            elapsed: Duration::ZERO,
            events: Vec::new(),
            graph,
        };

        let node = controller.graph.node(root);
        let entry = node.entry.clone();
        let settled = node.settled();
        controller.apply_changes(entry);
        controller.apply_changes(settled);
        controller.update_ticker();
        controller.events.push(MenuEvent::StateEntered {
            state: root,
            name: controller.graph.name(root).to_string(),
            trigger: None,
        });
        tracing::info!(
            states = controller.graph.len(),
            tiles = controller.tiles.len(),
            features = ?features,
            "menu controller ready"
        );
        controller
    }

    /// Build the graph for `desc` and a controller on its root.
    pub fn from_description(
        desc: &MenuDescription,
        config: &MenuConfig,
    ) -> Result<Self, MenuError> {
        let graph = MenuGraph::from_description(desc, config)?;
        Ok(Self::new(graph, config))
    }

    // -----------------------------------------------------------------------
    // Input
    // -----------------------------------------------------------------------

    /// Fire `trigger` from the current state. Returns whether a transition ran.
    pub fn handle(&mut self, trigger: Trigger) -> bool {
        let Some(transition) = self.graph.transition(self.current, trigger).cloned() else {
            tracing::trace!(state = %self.graph.name(self.current), %trigger, "no transition");
            return false;
        };
        let from = transition.from;
        let to = transition.to;

        let entering = self.graph.node(to);
        let entry = entering.entry.clone();
        let leaving: Vec<ObjectId> = self
            .graph
            .node(from)
            .tiles
            .iter()
            .map(|t| t.object)
            .filter(|&object| !entering.owns(object))
            .collect();

        self.apply_changes(entry);
        self.current = to;
        if self.animations_enabled() {
            let group = self.scheduler.start(&transition.animation.steps);
            if !leaving.is_empty() {
                self.pending_hides.push((group, leaving));
            }
        } else {
            let settled = self.graph.node(to).settled();
            self.apply_changes(settled);
            self.hide_all(&leaving);
        }
        self.monitor.reset();
        self.update_ticker();

        tracing::debug!(
            from = %self.graph.name(from),
            to = %self.graph.name(to),
            %trigger,
            duration_ms = transition.animation.duration.as_millis() as u64,
            "menu transition"
        );
        self.events.push(MenuEvent::StateEntered {
            state: to,
            name: self.graph.name(to).to_string(),
            trigger: Some(trigger),
        });
        true
    }

    pub fn handle_button(&mut self, button: ButtonId) -> bool {
        self.handle(Trigger::ButtonPress(button))
    }

    pub fn handle_timeout(&mut self) -> bool {
        self.handle(Trigger::Timeout)
    }

    pub fn handle_key(&mut self, key: KeyCode) -> bool {
        self.handle(Trigger::KeyPress(key))
    }

    /// Press the current state's tile under `(x, y)`, if any.
    pub fn click(&mut self, x: f32, y: f32) -> bool {
        let node = self.graph.node(self.current);
        // Tiles still leaving the previous state never take the press.
        let Some(tile) = self.tiles.tile_at_where(x, y, |t| node.owns(t.id)) else {
            return false;
        };
        let button = ButtonId(tile.index as u32);
        self.handle_button(button)
    }

    // -----------------------------------------------------------------------
    // Frame loop
    // -----------------------------------------------------------------------

    /// Advance one frame of `dt`.
    pub fn tick(&mut self, dt: Duration) {
        self.elapsed += dt;

        if let Some(median) = self.monitor.sample(self.elapsed) {
            tracing::trace!(fps = median.fps, "frame median");
            self.events.push(MenuEvent::MedianUpdated(median));
        }
        if let Some(outcome) = self.adaptation.check(self.elapsed, &mut self.monitor) {
            self.adapt(outcome);
        }

        let changes = self.scheduler.tick(dt);
        self.apply_changes(changes);
        self.ticker.tick(dt, &self.scheduler);
        self.settle_hides(false);
    }

    fn adapt(&mut self, outcome: AdaptOutcome) {
        if outcome.disabled.contains(Features::TICKER) {
            self.ticker.disable(&mut self.scheduler);
        }
        if outcome.disabled.contains(Features::ANIMATIONS) {
            let finished = self.scheduler.finish_all();
            self.apply_changes(finished);
            self.settle_hides(true);
        }
        self.events.push(MenuEvent::Adapted(outcome));
    }

    fn update_ticker(&mut self) {
        let animate = self.animations_enabled();
        let wanted =
            self.current == self.graph.root() && self.features().contains(Features::TICKER);
        if wanted {
            self.ticker.show(&mut self.scheduler, animate);
        } else {
            self.ticker.hide(&mut self.scheduler, animate);
        }
    }

    fn settle_hides(&mut self, force: bool) {
        let scheduler = &self.scheduler;
        let (done, running): (Vec<_>, Vec<_>) = std::mem::take(&mut self.pending_hides)
            .into_iter()
            .partition(|(group, _)| force || !scheduler.is_running(*group));
        self.pending_hides = running;
        for (_, objects) in done {
            self.hide_all(&objects);
        }
    }

    fn hide_all(&mut self, objects: &[ObjectId]) {
        let node = self.graph.node(self.current);
        let hides: Vec<PropertyChange> = objects
            .iter()
            .filter(|&&object| !node.owns(object))
            .map(|&object| PropertyChange::flag(object, PropertyKind::Visible, false))
            .collect();
        self.apply_changes(hides);
    }

    fn apply_changes(&mut self, changes: impl IntoIterator<Item = PropertyChange>) {
        for change in changes {
            let result = if change.target == TICKER_OBJECT {
                self.ticker.apply(change)
            } else {
                self.tiles.apply(change)
            };
            if let Err(err) = result {
                tracing::warn!(object = %change.target, error = %err, "property change rejected");
            }
        }
    }

    // -----------------------------------------------------------------------
    // Painting
    // -----------------------------------------------------------------------

    /// Make sure every visible tile has a raster for `view`; hidden tiles give
    /// theirs back. Returns the number of visible tiles.
    pub fn prepare_paint(&mut self, view: &Transform) -> usize {
        let mut shown = 0;
        for tile in self.tiles.iter_mut() {
            if !tile.visible {
                tile.release_image(&mut self.cache);
                continue;
            }
            let (width, height) = (tile.width, tile.height);
            let argb = tint(tile.content.as_str());
            tile.validate_image(&mut self.cache, view, |t| {
                Image::filled(
                    (width * t.scale_x).ceil().max(1.0) as u32,
                    (height * t.scale_y).ceil().max(1.0) as u32,
                    argb,
                )
            });
            shown += 1;
        }
        shown
    }

    // -----------------------------------------------------------------------
    // Accessors
    // -----------------------------------------------------------------------

    pub fn graph(&self) -> &MenuGraph {
        &self.graph
    }

    pub fn current_state(&self) -> StateId {
        self.current
    }

    pub fn current_name(&self) -> &str {
        self.graph.name(self.current)
    }

    pub fn current_node(&self) -> &MenuNode {
        self.graph.node(self.current)
    }

    pub fn tiles(&self) -> &TileSet {
        &self.tiles
    }

    pub fn ticker(&self) -> &Ticker {
        &self.ticker
    }

    pub fn cache(&self) -> &ImageCache {
        &self.cache
    }

    pub fn monitor(&self) -> &FrameRateMonitor {
        &self.monitor
    }

    pub fn features(&self) -> Features {
        self.adaptation.features()
    }

    pub fn animations_enabled(&self) -> bool {
        self.features().contains(Features::ANIMATIONS)
    }

    /// Whether any transition or ticker fade is still in flight.
    pub fn is_animating(&self) -> bool {
        !self.scheduler.is_idle()
    }

    /// Time accumulated through [`tick`](Self::tick).
    pub fn elapsed(&self) -> Duration {
        self.elapsed
    }

    /// Events since the last drain, oldest first.
    pub fn drain_events(&mut self) -> Vec<MenuEvent> {
        std::mem::take(&mut self.events)
    }
}

/// Stable placeholder colour per content id.
fn tint(content: &str) -> u32 {
    let hash = content
        .bytes()
        .fold(0x811c_9dc5_u32, |h, b| (h ^ u32::from(b)).wrapping_mul(0x0100_0193));
    0xff00_0000 | (hash & 0x00ff_ffff)
}

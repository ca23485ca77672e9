#![forbid(unsafe_code)]

//! The menu state graph.
//!
//! States are the root menu, category pages and leaf info panels. They are
//! connected by transitions labelled with a [`Trigger`]. The graph is built
//! once, either by hand through [`GraphBuilder`] or from a
//! [`MenuDescription`], and is immutable afterwards.
//!
//! # Invariants
//!
//! 1. State names are unique and there is exactly one root state.
//! 2. Every transition's endpoints exist, and `(from, trigger)` is unique.
//! 3. Parents are stored as ids owned by the graph; nodes never own each other.
//! 4. A category with more than `page_size` children is split into linked
//!    pages. `more` of the last page and `back` of the first page are `None`.
//! 5. Tile delays are a pure function of the tile index (linear ramp).
//!
//! # Failure Modes
//!
//! Every structural defect is a [`GraphError`] returned by `build`; a graph
//! that builds is always navigable.

use std::collections::{HashMap, HashSet};
use std::fmt;
use std::time::Duration;

use qtdemo_core::animation::stagger::{StaggerMode, exit_offsets, stagger_offsets};
use qtdemo_core::animation::{EasingFn, Keyframes, ease_in_cubic, ease_out_cubic};
use qtdemo_core::{AnimationStep, ObjectId, PropertyChange, PropertyKind};

use crate::cache::ContentId;
use crate::config::MenuConfig;
use crate::description::MenuDescription;

// ---------------------------------------------------------------------------
// Layout
// ---------------------------------------------------------------------------

const BUTTON_X: f32 = 60.0;
const MENU_TOP: f32 = 100.0;
const BUTTON_STRIDE: f32 = 40.0;
const BUTTON_WIDTH: f32 = 380.0;
const BUTTON_HEIGHT: f32 = 34.0;
const INFO_X: f32 = 480.0;
const INFO_Y: f32 = 100.0;
const INFO_WIDTH: f32 = 420.0;
const INFO_HEIGHT: f32 = 360.0;
/// Buttons rise into place from this far below their home position.
const ENTRY_RISE: f32 = 420.0;
/// Buttons slide this far left when leaving.
const EXIT_SLIDE: f32 = 520.0;

// ---------------------------------------------------------------------------
// Ids and triggers
// ---------------------------------------------------------------------------

/// Index of a state in its graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateId(pub u32);

impl StateId {
    fn index(self) -> usize {
        self.0 as usize
    }
}

/// Button identifier. Item buttons use their index on the page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ButtonId(pub u32);

impl ButtonId {
    /// Up one menu level.
    pub const BACK: ButtonId = ButtonId(u32::MAX);
    /// Next page of a category.
    pub const MORE: ButtonId = ButtonId(u32::MAX - 1);
    /// Previous page of a category.
    pub const PREVIOUS: ButtonId = ButtonId(u32::MAX - 2);

    pub const fn is_reserved(self) -> bool {
        self.0 >= u32::MAX - 2
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeyCode {
    Up,
    Down,
    Left,
    Right,
    PageUp,
    PageDown,
    Enter,
    Escape,
    Backspace,
    Char(char),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Trigger {
    ButtonPress(ButtonId),
    Timeout,
    KeyPress(KeyCode),
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Trigger::ButtonPress(ButtonId::BACK) => write!(f, "button(back)"),
            Trigger::ButtonPress(ButtonId::MORE) => write!(f, "button(more)"),
            Trigger::ButtonPress(ButtonId::PREVIOUS) => write!(f, "button(previous)"),
            Trigger::ButtonPress(b) => write!(f, "button({})", b.0),
            Trigger::Timeout => write!(f, "timeout"),
            Trigger::KeyPress(k) => write!(f, "key({k:?})"),
        }
    }
}

// ---------------------------------------------------------------------------
// Nodes and transitions
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StateKind {
    Root,
    /// Page `page` (0-based) of the category built from record `node`.
    Category { node: String, page: usize },
    Leaf { node: String },
}

/// A tile owned by a state, with its home position and delay ramp.
#[derive(Debug, Clone, PartialEq)]
pub struct TileSpec {
    pub object: ObjectId,
    pub content: ContentId,
    pub label: String,
    pub index: usize,
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
    pub enter_delay: Duration,
    pub exit_delay: Duration,
}

#[derive(Debug, Clone)]
pub struct MenuNode {
    pub id: StateId,
    pub name: String,
    pub title: String,
    pub kind: StateKind,
    pub parent: Option<StateId>,
    /// Targets of the item buttons, in button order.
    pub children: Vec<StateId>,
    pub tiles: Vec<TileSpec>,
    pub info: Option<String>,
    pub back: Option<StateId>,
    pub more: Option<StateId>,
    /// Assignments applied atomically when the state is entered.
    pub entry: Vec<PropertyChange>,
}

impl MenuNode {
    /// Values the state's tiles come to rest on.
    pub fn settled(&self) -> Vec<PropertyChange> {
        self.tiles
            .iter()
            .flat_map(|t| {
                [
                    PropertyChange::float(t.object, PropertyKind::X, t.x),
                    PropertyChange::float(t.object, PropertyKind::Y, t.y),
                    PropertyChange::float(t.object, PropertyKind::Opacity, 1.0),
                ]
            })
            .collect()
    }

    pub fn owns(&self, object: ObjectId) -> bool {
        self.tiles.iter().any(|t| t.object == object)
    }
}

/// Duration, easing and property steps played by a transition.
#[derive(Debug, Clone)]
pub struct AnimationDescriptor {
    /// Time until the last step comes to rest.
    pub duration: Duration,
    pub easing: EasingFn,
    pub steps: Vec<AnimationStep>,
}

impl AnimationDescriptor {
    /// Exit choreography for `from`'s tiles plus entrance for `to`'s tiles.
    ///
    /// Tiles shared by both states only get the entrance so they never fade
    /// out and back in.
    fn between(from: &MenuNode, to: &MenuNode, duration: Duration) -> Self {
        let mut steps = Vec::new();
        for tile in from.tiles.iter().filter(|t| !to.owns(t.object)) {
            steps.push(
                AnimationStep::new(
                    tile.object,
                    PropertyKind::Opacity,
                    Keyframes::tween(1.0, 0.0),
                    duration,
                )
                .delay(tile.exit_delay)
                .easing(ease_in_cubic),
            );
            steps.push(
                AnimationStep::new(
                    tile.object,
                    PropertyKind::X,
                    Keyframes::tween(tile.x, tile.x - EXIT_SLIDE),
                    duration,
                )
                .delay(tile.exit_delay)
                .easing(ease_in_cubic),
            );
        }
        for tile in &to.tiles {
            // Settle slightly above home before resting, like a dropped card.
            let rise = Keyframes::new([
                (0.0, tile.y + ENTRY_RISE),
                (0.85, tile.y - 6.0),
                (1.0, tile.y),
            ]);
            steps.push(
                AnimationStep::new(tile.object, PropertyKind::Y, rise, duration)
                    .delay(tile.enter_delay)
                    .easing(ease_out_cubic),
            );
            steps.push(
                AnimationStep::new(
                    tile.object,
                    PropertyKind::Opacity,
                    Keyframes::tween(0.0, 1.0),
                    duration,
                )
                .delay(tile.enter_delay)
                .easing(ease_out_cubic),
            );
            // Supersedes any exit slide still running on this tile.
            steps.push(
                AnimationStep::new(
                    tile.object,
                    PropertyKind::X,
                    Keyframes::constant(tile.x),
                    duration,
                )
                .delay(tile.enter_delay),
            );
        }
        let span = steps.iter().map(AnimationStep::span).max().unwrap_or_default();
        Self {
            duration: span,
            easing: ease_out_cubic,
            steps,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

#[derive(Debug, Clone)]
pub struct Transition {
    pub from: StateId,
    pub to: StateId,
    pub trigger: Trigger,
    pub animation: AnimationDescriptor,
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphError {
    EmptyId,
    DuplicateState(String),
    UnknownState(String),
    DuplicateTransition { from: String, trigger: Trigger },
    MissingRoot,
    MultipleRoots { first: String, second: String },
    UnknownChild { parent: String, child: String },
    SharedChild { child: String, first: String, second: String },
    ZeroPageSize,
}

impl fmt::Display for GraphError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyId => write!(f, "menu entry with an empty id"),
            Self::DuplicateState(name) => write!(f, "duplicate menu state `{name}`"),
            Self::UnknownState(name) => write!(f, "reference to unknown menu state `{name}`"),
            Self::DuplicateTransition { from, trigger } => {
                write!(f, "state `{from}` has two transitions for {trigger}")
            }
            Self::MissingRoot => write!(f, "menu has no root state"),
            Self::MultipleRoots { first, second } => {
                write!(f, "menu has two root states: `{first}` and `{second}`")
            }
            Self::UnknownChild { parent, child } => {
                write!(f, "`{parent}` lists unknown child `{child}`")
            }
            Self::SharedChild { child, first, second } => {
                write!(f, "`{child}` is listed by both `{first}` and `{second}`")
            }
            Self::ZeroPageSize => write!(f, "menu page size must be positive"),
        }
    }
}

impl std::error::Error for GraphError {}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Declaration of one state, referenced by name until `build`.
#[derive(Debug, Clone)]
pub struct StateSpec {
    name: String,
    title: String,
    kind: StateKind,
    buttons: Vec<String>,
    info: Option<String>,
    parent: Option<String>,
    back: Option<String>,
    more: Option<String>,
}

impl StateSpec {
    fn new(name: impl Into<String>, kind: StateKind) -> Self {
        let name = name.into();
        Self {
            title: name.clone(),
            name,
            kind,
            buttons: Vec::new(),
            info: None,
            parent: None,
            back: None,
            more: None,
        }
    }

    pub fn root(name: impl Into<String>) -> Self {
        Self::new(name, StateKind::Root)
    }

    pub fn category(name: impl Into<String>, node: impl Into<String>, page: usize) -> Self {
        Self::new(
            name,
            StateKind::Category {
                node: node.into(),
                page,
            },
        )
    }

    /// Leaf info state; it gets a single info-panel tile.
    pub fn leaf(name: impl Into<String>, node: impl Into<String>) -> Self {
        Self::new(name, StateKind::Leaf { node: node.into() })
    }

    #[must_use]
    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    #[must_use]
    pub fn button(mut self, label: impl Into<String>) -> Self {
        self.buttons.push(label.into());
        self
    }

    #[must_use]
    pub fn info(mut self, text: impl Into<String>) -> Self {
        self.info = Some(text.into());
        self
    }

    #[must_use]
    pub fn parent(mut self, name: impl Into<String>) -> Self {
        self.parent = Some(name.into());
        self
    }

    #[must_use]
    pub fn back(mut self, name: impl Into<String>) -> Self {
        self.back = Some(name.into());
        self
    }

    #[must_use]
    pub fn more(mut self, name: impl Into<String>) -> Self {
        self.more = Some(name.into());
        self
    }
}

/// Collects state and transition declarations and validates them in `build`.
#[derive(Debug, Clone)]
pub struct GraphBuilder {
    states: Vec<StateSpec>,
    transitions: Vec<(String, Trigger, String)>,
    transition_duration: Duration,
    stagger: Duration,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self::with_config(&MenuConfig::default())
    }
}

impl GraphBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder using the timing knobs of `config`.
    pub fn with_config(config: &MenuConfig) -> Self {
        Self {
            states: Vec::new(),
            transitions: Vec::new(),
            transition_duration: config.transition,
            stagger: config.stagger,
        }
    }

    #[must_use]
    pub fn state(mut self, spec: StateSpec) -> Self {
        self.states.push(spec);
        self
    }

    #[must_use]
    pub fn transition(
        mut self,
        from: impl Into<String>,
        trigger: Trigger,
        to: impl Into<String>,
    ) -> Self {
        self.transitions.push((from.into(), trigger, to.into()));
        self
    }

    fn push_state(&mut self, spec: StateSpec) {
        self.states.push(spec);
    }

    fn push_transition(&mut self, from: &str, trigger: Trigger, to: &str) {
        self.transitions.push((from.to_string(), trigger, to.to_string()));
    }

    /// Validate the declarations and produce the graph.
    pub fn build(self) -> Result<MenuGraph, GraphError> {
        let mut ids: HashMap<String, StateId> = HashMap::with_capacity(self.states.len());
        let mut root: Option<(StateId, &str)> = None;
        for (i, spec) in self.states.iter().enumerate() {
            if spec.name.is_empty() {
                return Err(GraphError::EmptyId);
            }
            let id = StateId(i as u32);
            if ids.insert(spec.name.clone(), id).is_some() {
                return Err(GraphError::DuplicateState(spec.name.clone()));
            }
            if spec.kind == StateKind::Root {
                if let Some((_, first)) = root {
                    return Err(GraphError::MultipleRoots {
                        first: first.to_string(),
                        second: spec.name.clone(),
                    });
                }
                root = Some((id, spec.name.as_str()));
            }
        }
        let root = root.ok_or(GraphError::MissingRoot)?.0;

        let resolve = |name: &Option<String>| -> Result<Option<StateId>, GraphError> {
            name.as_ref()
                .map(|n| ids.get(n).copied().ok_or_else(|| GraphError::UnknownState(n.clone())))
                .transpose()
        };

        let mut next_object = 0u32;
        let mut nodes = Vec::with_capacity(self.states.len());
        for (i, spec) in self.states.iter().enumerate() {
            let tiles = self.layout_tiles(spec, &mut next_object);
            let entry = tiles
                .iter()
                .flat_map(|t| {
                    [
                        PropertyChange::flag(t.object, PropertyKind::Visible, true),
                        PropertyChange::float(t.object, PropertyKind::X, t.x),
                        PropertyChange::float(t.object, PropertyKind::Y, t.y + ENTRY_RISE),
                        PropertyChange::float(t.object, PropertyKind::Opacity, 0.0),
                    ]
                })
                .collect();
            nodes.push(MenuNode {
                id: StateId(i as u32),
                name: spec.name.clone(),
                title: spec.title.clone(),
                kind: spec.kind.clone(),
                parent: resolve(&spec.parent)?,
                children: Vec::new(),
                tiles,
                info: spec.info.clone(),
                back: resolve(&spec.back)?,
                more: resolve(&spec.more)?,
                entry,
            });
        }

        let mut transitions: Vec<Transition> = Vec::with_capacity(self.transitions.len());
        let mut edges: HashMap<(StateId, Trigger), usize> =
            HashMap::with_capacity(self.transitions.len());
        let mut item_targets: Vec<Vec<(u32, StateId)>> = vec![Vec::new(); nodes.len()];
        for (from_name, trigger, to_name) in &self.transitions {
            let from = *ids
                .get(from_name)
                .ok_or_else(|| GraphError::UnknownState(from_name.clone()))?;
            let to = *ids
                .get(to_name)
                .ok_or_else(|| GraphError::UnknownState(to_name.clone()))?;
            if edges.contains_key(&(from, *trigger)) {
                return Err(GraphError::DuplicateTransition {
                    from: from_name.clone(),
                    trigger: *trigger,
                });
            }
            if let Trigger::ButtonPress(button) = trigger {
                if !button.is_reserved() {
                    item_targets[from.index()].push((button.0, to));
                }
            }
            let animation = AnimationDescriptor::between(
                &nodes[from.index()],
                &nodes[to.index()],
                self.transition_duration,
            );
            edges.insert((from, *trigger), transitions.len());
            transitions.push(Transition {
                from,
                to,
                trigger: *trigger,
                animation,
            });
        }
        for (node, mut targets) in nodes.iter_mut().zip(item_targets) {
            targets.sort_by_key(|(button, _)| *button);
            node.children = targets.into_iter().map(|(_, to)| to).collect();
        }

        tracing::debug!(
            states = nodes.len(),
            transitions = transitions.len(),
            tiles = next_object,
            "menu graph built"
        );
        Ok(MenuGraph {
            nodes,
            transitions,
            edges,
            names: ids,
            root,
            tile_count: next_object as usize,
        })
    }

    fn layout_tiles(&self, spec: &StateSpec, next_object: &mut u32) -> Vec<TileSpec> {
        let mut alloc = || {
            let id = ObjectId(*next_object);
            *next_object += 1;
            id
        };
        if let StateKind::Leaf { node } = &spec.kind {
            return vec![TileSpec {
                object: alloc(),
                content: ContentId::new(format!("info:{node}")),
                label: spec.title.clone(),
                index: 0,
                x: INFO_X,
                y: INFO_Y,
                width: INFO_WIDTH,
                height: INFO_HEIGHT,
                enter_delay: Duration::ZERO,
                exit_delay: Duration::ZERO,
            }];
        }
        let n = spec.buttons.len();
        let enter = stagger_offsets(n, self.stagger, StaggerMode::Linear);
        let exit = exit_offsets(n, self.stagger, StaggerMode::Linear);
        spec.buttons
            .iter()
            .enumerate()
            .map(|(i, label)| TileSpec {
                object: alloc(),
                // Buttons with the same label share one raster.
                content: ContentId::new(format!("button:{label}")),
                label: label.clone(),
                index: i,
                x: BUTTON_X,
                y: MENU_TOP + BUTTON_STRIDE * i as f32,
                width: BUTTON_WIDTH,
                height: BUTTON_HEIGHT,
                enter_delay: enter[i],
                exit_delay: exit[i],
            })
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Graph
// ---------------------------------------------------------------------------

/// Immutable, validated menu graph.
#[derive(Debug, Clone)]
pub struct MenuGraph {
    nodes: Vec<MenuNode>,
    transitions: Vec<Transition>,
    edges: HashMap<(StateId, Trigger), usize>,
    names: HashMap<String, StateId>,
    root: StateId,
    tile_count: usize,
}

impl MenuGraph {
    pub fn builder() -> GraphBuilder {
        GraphBuilder::default()
    }

    /// Build the full navigable menu for `desc`.
    ///
    /// The root record becomes the root state; records with children become
    /// (possibly paginated) categories and records without children become
    /// leaf info states. Records unreachable from the root are ignored.
    pub fn from_description(
        desc: &MenuDescription,
        config: &MenuConfig,
    ) -> Result<Self, GraphError> {
        if config.page_size == 0 {
            return Err(GraphError::ZeroPageSize);
        }
        let mut records = HashMap::with_capacity(desc.entries.len());
        for record in &desc.entries {
            if record.id.is_empty() {
                return Err(GraphError::EmptyId);
            }
            if records.insert(record.id.as_str(), record).is_some() {
                return Err(GraphError::DuplicateState(record.id.clone()));
            }
        }
        let root = *records.get(desc.root.as_str()).ok_or(GraphError::MissingRoot)?;

        let mut listed_by: HashMap<&str, &str> = HashMap::new();
        for record in &desc.entries {
            for child in &record.children {
                if !records.contains_key(child.as_str()) {
                    return Err(GraphError::UnknownChild {
                        parent: record.id.clone(),
                        child: child.clone(),
                    });
                }
                if child == &desc.root {
                    return Err(GraphError::SharedChild {
                        child: child.clone(),
                        first: "<root>".to_string(),
                        second: record.id.clone(),
                    });
                }
                if let Some(first) = listed_by.insert(child.as_str(), record.id.as_str()) {
                    return Err(GraphError::SharedChild {
                        child: child.clone(),
                        first: first.to_string(),
                        second: record.id.clone(),
                    });
                }
            }
        }

        let mut builder = GraphBuilder::with_config(config);
        let mut reached: HashSet<&str> = HashSet::new();
        // (record, state name of the page listing it)
        let mut queue: Vec<(&str, Option<String>)> = vec![(root.id.as_str(), None)];
        while let Some((id, listed_on)) = queue.pop() {
            if !reached.insert(id) {
                continue;
            }
            let record = records[id];
            let is_root = id == root.id;

            if record.children.is_empty() && !is_root {
                let mut spec = StateSpec::leaf(record.id.clone(), record.id.clone())
                    .title(record.display_name.clone());
                if let Some(info) = &record.info {
                    spec = spec.info(info.clone());
                }
                if let Some(up) = &listed_on {
                    spec = spec.parent(up.clone());
                    for trigger in up_triggers() {
                        builder.push_transition(&record.id, trigger, up);
                    }
                }
                builder.push_state(spec);
                continue;
            }

            let pages: Vec<&[String]> = if record.children.is_empty() {
                vec![&record.children[..]]
            } else {
                record.children.chunks(config.page_size).collect()
            };
            let page_names: Vec<String> = (0..pages.len())
                .map(|p| page_name(&record.id, p))
                .collect();
            for (p, items) in pages.iter().enumerate() {
                let name = &page_names[p];
                // Later root pages are ordinary pages of the root record.
                let mut spec = if is_root && p == 0 {
                    StateSpec::root(name.clone())
                } else {
                    StateSpec::category(name.clone(), record.id.clone(), p)
                };
                spec = spec.title(record.display_name.clone());
                if let Some(up) = &listed_on {
                    spec = spec.parent(up.clone());
                    for trigger in up_triggers() {
                        builder.push_transition(name, trigger, up);
                    }
                }
                if p > 0 {
                    let prev = &page_names[p - 1];
                    spec = spec.back(prev.clone());
                    for trigger in previous_triggers() {
                        builder.push_transition(name, trigger, prev);
                    }
                }
                if let Some(next) = page_names.get(p + 1) {
                    spec = spec.more(next.clone());
                    for trigger in more_triggers() {
                        builder.push_transition(name, trigger, next);
                    }
                }
                for (i, child_id) in items.iter().enumerate() {
                    let child = records[child_id.as_str()];
                    spec = spec.button(child.display_name.clone());
                    let target = page_name(&child.id, 0);
                    let press = Trigger::ButtonPress(ButtonId(i as u32));
                    builder.push_transition(name, press, &target);
                    queue.push((child.id.as_str(), Some(name.clone())));
                }
                builder.push_state(spec);
            }
        }
        for record in &desc.entries {
            if !reached.contains(record.id.as_str()) {
                tracing::warn!(id = %record.id, "menu entry unreachable from root; ignored");
            }
        }
        builder.build()
    }

    pub fn root(&self) -> StateId {
        self.root
    }

    pub fn node(&self, id: StateId) -> &MenuNode {
        &self.nodes[id.index()]
    }

    pub fn get(&self, id: StateId) -> Option<&MenuNode> {
        self.nodes.get(id.index())
    }

    pub fn find(&self, name: &str) -> Option<StateId> {
        self.names.get(name).copied()
    }

    pub fn name(&self, id: StateId) -> &str {
        &self.node(id).name
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn states(&self) -> impl Iterator<Item = &MenuNode> {
        self.nodes.iter()
    }

    /// Edge leaving `from` on `trigger`, if declared.
    pub fn transition(&self, from: StateId, trigger: Trigger) -> Option<&Transition> {
        self.edges
            .get(&(from, trigger))
            .map(|&i| &self.transitions[i])
    }

    pub fn transitions(&self) -> &[Transition] {
        &self.transitions
    }

    pub fn transitions_from(&self, from: StateId) -> impl Iterator<Item = &Transition> {
        self.transitions.iter().filter(move |t| t.from == from)
    }

    /// Number of tiles across all states; object ids are `0..tile_count`.
    pub fn tile_count(&self) -> usize {
        self.tile_count
    }

    pub fn tile_specs(&self) -> impl Iterator<Item = &TileSpec> {
        self.nodes.iter().flat_map(|n| n.tiles.iter())
    }
}

fn page_name(node: &str, page: usize) -> String {
    if page == 0 {
        node.to_string()
    } else {
        format!("{node}#{}", page + 1)
    }
}

fn up_triggers() -> [Trigger; 3] {
    [
        Trigger::ButtonPress(ButtonId::BACK),
        Trigger::KeyPress(KeyCode::Escape),
        Trigger::KeyPress(KeyCode::Backspace),
    ]
}

fn more_triggers() -> [Trigger; 3] {
    [
        Trigger::ButtonPress(ButtonId::MORE),
        Trigger::KeyPress(KeyCode::Down),
        Trigger::KeyPress(KeyCode::PageDown),
    ]
}

fn previous_triggers() -> [Trigger; 3] {
    [
        Trigger::ButtonPress(ButtonId::PREVIOUS),
        Trigger::KeyPress(KeyCode::Up),
        Trigger::KeyPress(KeyCode::PageUp),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::description::MenuRecord;

    fn category_with(n: usize) -> MenuDescription {
        let items: Vec<String> = (0..n).map(|i| format!("item{i}")).collect();
        let mut desc = MenuDescription::new("root")
            .entry(MenuRecord::new("root", "Root").children(["cat"]))
            .entry(MenuRecord::new("cat", "Category").children(items.clone()));
        for id in items {
            desc = desc.entry(MenuRecord::new(id.clone(), id.to_uppercase()));
        }
        desc
    }

    #[test]
    fn hand_built_graph() {
        let graph = MenuGraph::builder()
            .state(StateSpec::root("Root").button("go"))
            .state(StateSpec::category("A", "a", 0))
            .state(StateSpec::category("B", "b", 0))
            .transition("Root", Trigger::ButtonPress(ButtonId(1)), "A")
            .transition("A", Trigger::Timeout, "Root")
            .build()
            .unwrap();
        let root = graph.root();
        let a = graph.find("A").unwrap();
        assert_eq!(graph.transition(root, Trigger::ButtonPress(ButtonId(1))).unwrap().to, a);
        assert_eq!(graph.transition(a, Trigger::Timeout).unwrap().to, root);
        assert!(graph.transition(root, Trigger::Timeout).is_none());
        assert_eq!(graph.node(root).children, vec![a]);
    }

    #[test]
    fn duplicate_state_is_rejected() {
        let err = MenuGraph::builder()
            .state(StateSpec::root("r"))
            .state(StateSpec::leaf("r", "r"))
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::DuplicateState("r".into()));
    }

    #[test]
    fn transition_to_unknown_state_is_rejected() {
        let err = MenuGraph::builder()
            .state(StateSpec::root("r"))
            .transition("r", Trigger::Timeout, "nowhere")
            .build()
            .unwrap_err();
        assert_eq!(err, GraphError::UnknownState("nowhere".into()));
    }

    #[test]
    fn duplicate_edge_is_rejected() {
        let err = MenuGraph::builder()
            .state(StateSpec::root("r"))
            .state(StateSpec::leaf("x", "x"))
            .transition("r", Trigger::Timeout, "x")
            .transition("r", Trigger::Timeout, "r")
            .build()
            .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateTransition { .. }));
    }

    #[test]
    fn root_is_required_and_unique() {
        let none = MenuGraph::builder()
            .state(StateSpec::leaf("x", "x"))
            .build()
            .unwrap_err();
        assert_eq!(none, GraphError::MissingRoot);
        let two = MenuGraph::builder()
            .state(StateSpec::root("a"))
            .state(StateSpec::root("b"))
            .build()
            .unwrap_err();
        assert!(matches!(two, GraphError::MultipleRoots { .. }));
    }

    #[test]
    fn twenty_items_make_three_linked_pages() {
        let graph =
            MenuGraph::from_description(&category_with(20), &MenuConfig::default()).unwrap();
        let p1 = graph.find("cat").unwrap();
        let p2 = graph.find("cat#2").unwrap();
        let p3 = graph.find("cat#3").unwrap();
        assert!(graph.find("cat#4").is_none());

        assert_eq!(graph.node(p1).more, Some(p2));
        assert_eq!(graph.node(p1).back, None);
        assert_eq!(graph.node(p2).back, Some(p1));
        assert_eq!(graph.node(p2).more, Some(p3));
        assert_eq!(graph.node(p3).back, Some(p2));
        assert_eq!(graph.node(p3).more, None);

        assert_eq!(graph.node(p1).tiles.len(), 8);
        assert_eq!(graph.node(p2).tiles.len(), 8);
        assert_eq!(graph.node(p3).tiles.len(), 4);

        assert_eq!(
            graph.transition(p1, Trigger::ButtonPress(ButtonId::MORE)).unwrap().to,
            p2
        );
        assert_eq!(
            graph.transition(p2, Trigger::KeyPress(KeyCode::Up)).unwrap().to,
            p1
        );
        assert!(graph.transition(p3, Trigger::ButtonPress(ButtonId::MORE)).is_none());
    }

    #[test]
    fn staggered_delays_follow_index() {
        let config = MenuConfig::default();
        let graph = MenuGraph::from_description(&category_with(5), &config).unwrap();
        let page = graph.node(graph.find("cat").unwrap());
        for (i, tile) in page.tiles.iter().enumerate() {
            assert_eq!(tile.enter_delay, config.stagger * i as u32);
            assert_eq!(tile.exit_delay, config.stagger * (4 - i) as u32);
        }
    }

    #[test]
    fn leaf_returns_to_listing_page() {
        let graph =
            MenuGraph::from_description(&category_with(10), &MenuConfig::default()).unwrap();
        let page2 = graph.find("cat#2").unwrap();
        let leaf = graph.find("item9").unwrap();
        assert_eq!(graph.node(leaf).parent, Some(page2));
        assert_eq!(
            graph.transition(leaf, Trigger::KeyPress(KeyCode::Escape)).unwrap().to,
            page2
        );
        assert_eq!(graph.node(leaf).kind, StateKind::Leaf { node: "item9".into() });
        assert_eq!(graph.node(leaf).tiles.len(), 1);
    }

    #[test]
    fn long_root_paginates_with_one_root_state() {
        let items: Vec<String> = (0..9).map(|i| format!("demo{i}")).collect();
        let mut desc = MenuDescription::new("root")
            .entry(MenuRecord::new("root", "Root").children(items.clone()));
        for id in items {
            desc = desc.entry(MenuRecord::new(id.clone(), id.to_uppercase()));
        }
        let graph = MenuGraph::from_description(&desc, &MenuConfig::default()).unwrap();
        let first = graph.find("root").unwrap();
        let second = graph.find("root#2").unwrap();
        assert_eq!(graph.root(), first);
        assert_eq!(graph.node(first).kind, StateKind::Root);
        assert_eq!(
            graph.node(second).kind,
            StateKind::Category { node: "root".into(), page: 1 }
        );
        let roots = graph
            .states()
            .filter(|node| node.kind == StateKind::Root)
            .count();
        assert_eq!(roots, 1);

        assert_eq!(
            graph.transition(first, Trigger::ButtonPress(ButtonId::MORE)).unwrap().to,
            second
        );
        assert_eq!(
            graph.transition(second, Trigger::ButtonPress(ButtonId::PREVIOUS)).unwrap().to,
            first
        );
        assert_eq!(graph.node(second).back, Some(first));
        assert_eq!(graph.node(second).tiles.len(), 1);
        let leaf = graph.find("demo8").unwrap();
        assert_eq!(
            graph.transition(second, Trigger::ButtonPress(ButtonId(0))).unwrap().to,
            leaf
        );
        assert_eq!(graph.node(leaf).parent, Some(second));
    }

    #[test]
    fn unknown_child_is_rejected() {
        let desc = MenuDescription::new("r").entry(MenuRecord::new("r", "R").children(["ghost"]));
        let err = MenuGraph::from_description(&desc, &MenuConfig::default()).unwrap_err();
        assert!(matches!(err, GraphError::UnknownChild { .. }));
    }

    #[test]
    fn shared_child_is_rejected() {
        let desc = MenuDescription::new("r")
            .entry(MenuRecord::new("r", "R").children(["a", "b"]))
            .entry(MenuRecord::new("a", "A").children(["x"]))
            .entry(MenuRecord::new("b", "B").children(["x"]))
            .entry(MenuRecord::new("x", "X"));
        let err = MenuGraph::from_description(&desc, &MenuConfig::default()).unwrap_err();
        assert!(matches!(err, GraphError::SharedChild { .. }));
    }

    #[test]
    fn duplicate_record_is_rejected() {
        let desc = MenuDescription::new("r")
            .entry(MenuRecord::new("r", "R"))
            .entry(MenuRecord::new("r", "again"));
        let err = MenuGraph::from_description(&desc, &MenuConfig::default()).unwrap_err();
        assert_eq!(err, GraphError::DuplicateState("r".into()));
    }

    #[test]
    fn zero_page_size_is_rejected() {
        let config = MenuConfig {
            page_size: 0,
            ..MenuConfig::default()
        };
        let err = MenuGraph::from_description(&category_with(3), &config).unwrap_err();
        assert_eq!(err, GraphError::ZeroPageSize);
    }

    #[test]
    fn transition_carries_exit_and_entry_steps() {
        let graph = MenuGraph::from_description(&category_with(3), &MenuConfig::default()).unwrap();
        let root = graph.root();
        let t = graph.transition(root, Trigger::ButtonPress(ButtonId(0))).unwrap();
        // root: 1 button exiting (opacity + x); cat: 3 buttons entering (y + opacity + x)
        assert_eq!(t.animation.steps.len(), 2 + 3 * 3);
        assert!(t.animation.duration >= MenuConfig::default().transition);
    }

    #[test]
    fn object_ids_are_dense() {
        let graph =
            MenuGraph::from_description(&MenuDescription::sample(), &MenuConfig::default())
                .unwrap();
        let mut ids: Vec<u32> = graph.tile_specs().map(|t| t.object.0).collect();
        ids.sort_unstable();
        let expected: Vec<u32> = (0..graph.tile_count() as u32).collect();
        assert_eq!(ids, expected);
    }
}

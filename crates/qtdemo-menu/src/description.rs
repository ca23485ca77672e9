#![forbid(unsafe_code)]

//! Declarative menu description: the parsed tree the graph is built from.
//!
//! The on-disk form is JSON:
//!
//! ```json
//! {
//!   "root": "qtdemo",
//!   "entries": [
//!     { "id": "qtdemo", "name": "Qt Examples and Demos", "children": ["gv"] },
//!     { "id": "gv", "name": "Graphics View", "children": ["mice"] },
//!     { "id": "mice", "name": "Colliding Mice", "info": "Mice that avoid each other." }
//!   ]
//! }
//! ```
//!
//! Structural checks (unknown children, shared children, duplicates) happen in
//! [`MenuGraph::from_description`](crate::graph::MenuGraph::from_description).

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::MenuError;

/// One node of the description.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuRecord {
    pub id: String,
    #[serde(rename = "name")]
    pub display_name: String,
    #[serde(default)]
    pub children: Vec<String>,
    /// Text shown on the leaf info panel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub info: Option<String>,
}

impl MenuRecord {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            display_name: display_name.into(),
            children: Vec::new(),
            info: None,
        }
    }

    #[must_use]
    pub fn children<I, S>(mut self, children: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.children = children.into_iter().map(Into::into).collect();
        self
    }

    #[must_use]
    pub fn info(mut self, text: impl Into<String>) -> Self {
        self.info = Some(text.into());
        self
    }
}

/// Flat list of records plus the id of the root record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MenuDescription {
    pub root: String,
    pub entries: Vec<MenuRecord>,
}

impl MenuDescription {
    pub fn new(root: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            entries: Vec::new(),
        }
    }

    #[must_use]
    pub fn entry(mut self, record: MenuRecord) -> Self {
        self.entries.push(record);
        self
    }

    pub fn find(&self, id: &str) -> Option<&MenuRecord> {
        self.entries.iter().find(|r| r.id == id)
    }

    pub fn from_json_str(json: &str) -> Result<Self, MenuError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Read and parse a description file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, MenuError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| MenuError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let desc = Self::from_json_str(&text)?;
        tracing::debug!(
            path = %path.display(),
            entries = desc.entries.len(),
            "menu description loaded"
        );
        Ok(desc)
    }

    pub fn to_json_string(&self) -> Result<String, MenuError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Built-in description modelled on the classic demo browser layout.
    pub fn sample() -> Self {
        let mut desc = Self::new("qtdemo");
        let categories: [(&str, &str, &[(&str, &str)]); 5] = [
            (
                "dialogs",
                "Dialogs",
                &[
                    ("classwizard", "Class Wizard"),
                    ("configdialog", "Config Dialog"),
                    ("findfiles", "Find Files"),
                    ("standarddialogs", "Standard Dialogs"),
                    ("tabdialog", "Tab Dialog"),
                ],
            ),
            (
                "draganddrop",
                "Drag and Drop",
                &[
                    ("draggableicons", "Draggable Icons"),
                    ("draggabletext", "Draggable Text"),
                    ("fridgemagnets", "Fridge Magnets"),
                    ("puzzle", "Drag and Drop Puzzle"),
                ],
            ),
            (
                "graphicsview",
                "Graphics View",
                &[
                    ("collidingmice", "Colliding Mice"),
                    ("diagramscene", "Diagram Scene"),
                    ("elasticnodes", "Elastic Nodes"),
                    ("padnavigator", "Pad Navigator"),
                    ("anchorlayout", "Anchor Layout"),
                    ("basicgraphicslayouts", "Basic Graphics Layouts"),
                    ("dragdroprobot", "Drag and Drop Robot"),
                    ("embeddeddialogs", "Embedded Dialogs"),
                    ("portedcanvas", "Ported Canvas"),
                    ("portedasteroids", "Ported Asteroids"),
                ],
            ),
            (
                "painting",
                "Painting",
                &[
                    ("basicdrawing", "Basic Drawing"),
                    ("concentriccircles", "Concentric Circles"),
                    ("painterpaths", "Painter Paths"),
                    ("transformations", "Transformations"),
                ],
            ),
            (
                "tools",
                "Tools",
                &[
                    ("calculator", "Calculator"),
                    ("settingseditor", "Settings Editor"),
                    ("textedit", "Text Edit"),
                ],
            ),
        ];

        let root = MenuRecord::new("qtdemo", "Qt Examples and Demos")
            .children(categories.iter().map(|(id, _, _)| *id));
        desc.entries.push(root);
        for (id, name, items) in categories {
            desc.entries.push(
                MenuRecord::new(id, name).children(items.iter().map(|(item, _)| *item)),
            );
            for (item, item_name) in items {
                desc.entries.push(
                    MenuRecord::new(*item, *item_name)
                        .info(format!("{item_name}: part of the {name} examples.")),
                );
            }
        }
        desc
    }
}

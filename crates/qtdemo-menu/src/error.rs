#![forbid(unsafe_code)]

//! Errors surfaced while loading and assembling a menu.

use std::fmt;
use std::path::PathBuf;

use crate::config::ConfigError;
use crate::graph::GraphError;

#[derive(Debug)]
pub enum MenuError {
    /// The description file could not be read.
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    /// The description is not valid JSON for the expected shape.
    Json(serde_json::Error),
    /// The description parsed but does not form a valid graph.
    Graph(GraphError),
    /// One or more environment overrides were rejected.
    Config(Vec<ConfigError>),
}

impl fmt::Display for MenuError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io { path, source } => {
                write!(f, "cannot read menu description {}: {source}", path.display())
            }
            Self::Json(err) => write!(f, "malformed menu description: {err}"),
            Self::Graph(err) => write!(f, "invalid menu: {err}"),
            Self::Config(errors) => {
                write!(f, "invalid configuration:")?;
                for err in errors {
                    write!(f, " {err};")?;
                }
                Ok(())
            }
        }
    }
}

impl std::error::Error for MenuError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io { source, .. } => Some(source),
            Self::Json(err) => Some(err),
            Self::Graph(err) => Some(err),
            Self::Config(_) => None,
        }
    }
}

impl From<serde_json::Error> for MenuError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl From<GraphError> for MenuError {
    fn from(err: GraphError) -> Self {
        Self::Graph(err)
    }
}

impl From<Vec<ConfigError>> for MenuError {
    fn from(errors: Vec<ConfigError>) -> Self {
        Self::Config(errors)
    }
}

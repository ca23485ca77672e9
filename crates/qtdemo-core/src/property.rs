#![forbid(unsafe_code)]

//! Tagged property changes and per-type setter tables.
//!
//! Animated menu objects never receive arbitrary named attributes. A change
//! is a [`PropertyChange`] naming its target, a [`PropertyKind`] and a
//! [`Value`]; each target type publishes a [`DispatchTable`] mapping the kinds
//! it understands to a setter.
//!
//! # Failure Modes
//!
//! - Kind not registered for the target type: [`PropertyError::Unsupported`].
//! - Value variant not accepted by the setter: [`PropertyError::TypeMismatch`].
//! - Target id not present in the owning arena: [`PropertyError::UnknownTarget`].

use std::collections::HashMap;
use std::fmt;

/// Identifier of an animatable object (a tile, the ticker).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectId(pub u32);

impl fmt::Display for ObjectId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Property that an animation step or a state entry may set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PropertyKind {
    X,
    Y,
    Opacity,
    Scale,
    Visible,
    Z,
}

impl PropertyKind {
    pub const ALL: [PropertyKind; 6] = [
        PropertyKind::X,
        PropertyKind::Y,
        PropertyKind::Opacity,
        PropertyKind::Scale,
        PropertyKind::Visible,
        PropertyKind::Z,
    ];

    /// Whether the property takes [`Value::Float`] values and can be tweened.
    pub const fn is_continuous(self) -> bool {
        !matches!(self, PropertyKind::Visible)
    }
}

/// A property value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    Float(f32),
    Bool(bool),
}

impl Value {
    pub fn as_f32(self) -> Option<f32> {
        match self {
            Value::Float(v) => Some(v),
            Value::Bool(_) => None,
        }
    }

    pub fn as_bool(self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(b),
            Value::Float(_) => None,
        }
    }
}

/// A single property assignment for one object.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PropertyChange {
    pub target: ObjectId,
    pub property: PropertyKind,
    pub value: Value,
}

impl PropertyChange {
    pub fn float(target: ObjectId, property: PropertyKind, value: f32) -> Self {
        Self {
            target,
            property,
            value: Value::Float(value),
        }
    }

    pub fn flag(target: ObjectId, property: PropertyKind, value: bool) -> Self {
        Self {
            target,
            property,
            value: Value::Bool(value),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PropertyError {
    Unsupported(PropertyKind),
    TypeMismatch { property: PropertyKind, value: Value },
    UnknownTarget(ObjectId),
}

impl fmt::Display for PropertyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsupported(kind) => write!(f, "property {kind:?} is not supported"),
            Self::TypeMismatch { property, value } => {
                write!(f, "property {property:?} cannot take {value:?}")
            }
            Self::UnknownTarget(id) => write!(f, "no animatable object {id}"),
        }
    }
}

impl std::error::Error for PropertyError {}

/// Setter signature stored in a [`DispatchTable`].
pub type Setter<T> = fn(&mut T, Value) -> Result<(), PropertyError>;

/// Explicit map from [`PropertyKind`] to a setter for target type `T`.
pub struct DispatchTable<T> {
    setters: HashMap<PropertyKind, Setter<T>>,
}

impl<T> fmt::Debug for DispatchTable<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut kinds: Vec<_> = self.setters.keys().collect();
        kinds.sort();
        f.debug_struct("DispatchTable").field("kinds", &kinds).finish()
    }
}

impl<T> Default for DispatchTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> DispatchTable<T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            setters: HashMap::new(),
        }
    }

    /// Register a setter (builder). A later registration for the same kind wins.
    #[must_use]
    pub fn with(mut self, kind: PropertyKind, setter: Setter<T>) -> Self {
        self.setters.insert(kind, setter);
        self
    }

    pub fn supports(&self, kind: PropertyKind) -> bool {
        self.setters.contains_key(&kind)
    }

    /// Apply `value` to `target` through the registered setter.
    pub fn apply(
        &self,
        target: &mut T,
        kind: PropertyKind,
        value: Value,
    ) -> Result<(), PropertyError> {
        let setter = self
            .setters
            .get(&kind)
            .ok_or(PropertyError::Unsupported(kind))?;
        setter(target, value)
    }
}

/// Helper for setters that expect a float.
pub fn expect_f32(property: PropertyKind, value: Value) -> Result<f32, PropertyError> {
    value
        .as_f32()
        .ok_or(PropertyError::TypeMismatch { property, value })
}

/// Helper for setters that expect a bool.
pub fn expect_bool(property: PropertyKind, value: Value) -> Result<bool, PropertyError> {
    value
        .as_bool()
        .ok_or(PropertyError::TypeMismatch { property, value })
}

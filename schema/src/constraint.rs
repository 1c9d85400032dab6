//! Constraint values that are either declared statically or computed from
//! the document being written.
//!
//! Every constraint in a document definition goes through
//! [`Constraint::resolve`]; call sites never branch on the variant.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::de::{Deserialize, Deserializer};
use serde_json::Value;

/// Inputs available to a dynamically computed constraint.
#[derive(Debug, Clone, Copy)]
pub struct ConstraintArgs<'a> {
    /// The document being written.
    pub doc: &'a Value,
    /// The revision being replaced or deleted, if any.
    pub old_doc: Option<&'a Value>,
    /// The value of the item the constraint belongs to.
    pub value: Option<&'a Value>,
    /// The prior value of that item.
    pub old_value: Option<&'a Value>,
}

impl<'a> ConstraintArgs<'a> {
    /// Arguments for a document-level constraint, where the item is the
    /// document itself.
    #[must_use]
    pub fn for_document(doc: &'a Value, old_doc: Option<&'a Value>) -> Self {
        Self {
            doc,
            old_doc,
            value: Some(doc),
            old_value: old_doc,
        }
    }
}

type DynamicFn<T> = dyn Fn(&ConstraintArgs<'_>) -> T + Send + Sync;

/// A constraint declared as a fixed value or as a function of the write.
pub enum Constraint<T> {
    /// A value fixed at definition time.
    Static(T),
    /// A value computed from `(doc, old_doc, value, old_value)` on each use.
    Dynamic(Arc<DynamicFn<T>>),
}

impl<T> Constraint<T> {
    /// Wraps a closure as a dynamic constraint.
    pub fn dynamic<F>(f: F) -> Self
    where
        F: Fn(&ConstraintArgs<'_>) -> T + Send + Sync + 'static,
    {
        Self::Dynamic(Arc::new(f))
    }

    /// Returns true for constraints computed at validation time.
    #[must_use]
    pub fn is_dynamic(&self) -> bool {
        matches!(self, Self::Dynamic(_))
    }
}

impl<T: Clone> Constraint<T> {
    /// Resolves the constraint for one use. Static values are borrowed;
    /// dynamic values are computed and owned.
    pub fn resolve(&self, args: &ConstraintArgs<'_>) -> Cow<'_, T> {
        match self {
            Self::Static(value) => Cow::Borrowed(value),
            Self::Dynamic(f) => Cow::Owned(f(args)),
        }
    }
}

impl<T> From<T> for Constraint<T> {
    fn from(value: T) -> Self {
        Self::Static(value)
    }
}

impl<T: Default> Default for Constraint<T> {
    fn default() -> Self {
        Self::Static(T::default())
    }
}

impl<T: Clone> Clone for Constraint<T> {
    fn clone(&self) -> Self {
        match self {
            Self::Static(value) => Self::Static(value.clone()),
            Self::Dynamic(f) => Self::Dynamic(Arc::clone(f)),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for Constraint<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Static(value) => f.debug_tuple("Static").field(value).finish(),
            Self::Dynamic(_) => f.write_str("Dynamic(<fn>)"),
        }
    }
}

/// Only static constraints can be expressed in serialized definitions.
impl<'de, T: Deserialize<'de>> Deserialize<'de> for Constraint<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        T::deserialize(deserializer).map(Self::Static)
    }
}

/// A single name or a list of names, as accepted in serialized definitions.
#[derive(serde::Deserialize)]
#[serde(untagged)]
enum OneOrMany {
    One(String),
    Many(Vec<String>),
}

impl From<OneOrMany> for Vec<String> {
    fn from(names: OneOrMany) -> Self {
        match names {
            OneOrMany::One(name) => vec![name],
            OneOrMany::Many(names) => names,
        }
    }
}

/// Deserializes a string-or-array field into a list of names.
pub(crate) fn names<'de, D>(deserializer: D) -> Result<Option<Vec<String>>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<OneOrMany>::deserialize(deserializer).map(|names| names.map(Vec::from))
}

/// Deserializes a string-or-array field into a static name-list constraint.
pub(crate) fn names_constraint<'de, D>(
    deserializer: D,
) -> Result<Option<Constraint<Vec<String>>>, D::Error>
where
    D: Deserializer<'de>,
{
    names(deserializer).map(|names| names.map(Constraint::Static))
}

/// Deserializes a field whose explicit `null` is meaningful, so that a
/// present `null` becomes `Some(Static(Null))` rather than `None`.
pub(crate) fn explicit<'de, D>(deserializer: D) -> Result<Option<Constraint<Value>>, D::Error>
where
    D: Deserializer<'de>,
{
    Value::deserialize(deserializer).map(|value| Some(Constraint::Static(value)))
}

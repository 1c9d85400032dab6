//! Content validation: per-item property checks, document-level
//! constraints and attachment limits.
//!
//! All three write into one [`ViolationList`](crate::report::ViolationList)
//! owned by the caller. Only configuration defects abort a run early.

pub mod attachment;
pub mod document;
pub mod property;

use std::borrow::Cow;

use serde_json::Value;
use syncguard_schema::{Constraint, ConstraintArgs};

pub use attachment::validate_attachments;
pub use document::validate_document_constraints;
pub use property::{AttachmentReferences, PropertyValidator, ReferenceLimits};

/// Resolves an optional constraint.
pub(crate) fn resolved<'c, T: Clone>(
    constraint: &'c Option<Constraint<T>>,
    args: &ConstraintArgs<'_>,
) -> Option<Cow<'c, T>> {
    constraint.as_ref().map(|constraint| constraint.resolve(args))
}

/// Resolves an optional boolean constraint; undeclared is `false`.
pub(crate) fn enabled(constraint: &Option<Constraint<bool>>, args: &ConstraintArgs<'_>) -> bool {
    resolved(constraint, args).is_some_and(|flag| *flag)
}

/// Renders a constraint value for a message: strings bare, everything else
/// as JSON.
pub(crate) fn display(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Joins names for a message, as in `png,jpg`.
pub(crate) fn list(names: &[String]) -> String {
    names.join(",")
}

/// Case-insensitive membership for extensions and content types.
pub(crate) fn contains_ignore_case(names: &[String], candidate: &str) -> bool {
    names.iter().any(|name| name.eq_ignore_ascii_case(candidate))
}

//! Write authorization and channel assignment.

use std::collections::HashSet;

use serde_json::Value;
use syncguard_schema::{
    document, Constraint, ConstraintArgs, DocumentDefinition, Operation, PermissionSet,
    RequiredAccess,
};

use crate::validators::resolved;

/// The channel a document of unknown type is exposed to on deletion.
pub const PUBLIC_CHANNEL: &str = "!";

/// Classifies a write against its prior revision.
#[must_use]
pub fn operation(doc: &Value, old_doc: Option<&Value>) -> Operation {
    if document::is_deleted(doc) {
        Operation::Remove
    } else if document::is_missing_or_deleted(old_doc) {
        Operation::Add
    } else {
        Operation::Replace
    }
}

/// Collects the channels, roles and users allowed to perform `operation`.
///
/// An entry is present only when the definition declares it for the
/// operation; an empty result means the write is public.
#[must_use]
pub fn required_access(
    definition: &DocumentDefinition,
    operation: Operation,
    args: &ConstraintArgs<'_>,
) -> RequiredAccess {
    RequiredAccess {
        channels: entries(definition.channels.as_ref(), operation, args),
        roles: entries(definition.authorized_roles.as_ref(), operation, args),
        users: entries(definition.authorized_users.as_ref(), operation, args),
    }
}

fn entries(
    permissions: Option<&Constraint<PermissionSet>>,
    operation: Operation,
    args: &ConstraintArgs<'_>,
) -> Option<Vec<String>> {
    permissions.and_then(|permissions| permissions.resolve(args).required_for(operation))
}

/// Every channel named by the definition's channel permissions, first
/// occurrence first.
#[must_use]
pub fn channel_union(definition: &DocumentDefinition, args: &ConstraintArgs<'_>) -> Vec<String> {
    let Some(channels) = resolved(&definition.channels, args) else {
        return Vec::new();
    };
    let mut seen = HashSet::new();
    channels
        .all()
        .filter(|channel| seen.insert(*channel))
        .cloned()
        .collect()
}

//! Access grants issued when a document is written.

use std::borrow::Cow;

use syncguard_schema::{
    AccessAssignment, AccessGrant, AssignmentKind, Constraint, ConstraintArgs, DocumentDefinition,
    ROLE_PREFIX,
};

use crate::validators::resolved;

/// Evaluates the definition's access-assignment rules for one write.
///
/// Each rule yields at most one grant. A channel rule needs channels and at
/// least one user or role; a role rule needs both users and roles. Rules
/// missing their targets are skipped.
#[must_use]
pub fn access_grants(
    definition: &DocumentDefinition,
    args: &ConstraintArgs<'_>,
) -> Vec<AccessGrant> {
    resolved(&definition.access_assignments, args)
        .map(|rules| rules.iter().filter_map(|rule| grant(rule, args)).collect())
        .unwrap_or_default()
}

fn names(constraint: &Option<Constraint<Vec<String>>>, args: &ConstraintArgs<'_>) -> Vec<String> {
    resolved(constraint, args)
        .map(Cow::into_owned)
        .unwrap_or_default()
}

fn grant(rule: &AccessAssignment, args: &ConstraintArgs<'_>) -> Option<AccessGrant> {
    let users = names(&rule.users, args);
    let roles: Vec<String> = names(&rule.roles, args)
        .into_iter()
        .map(|role| format!("{ROLE_PREFIX}{role}"))
        .collect();

    match rule.kind {
        AssignmentKind::Channel => {
            let channels = names(&rule.channels, args);
            if channels.is_empty() || (users.is_empty() && roles.is_empty()) {
                return None;
            }
            let mut assignees = users;
            assignees.extend(roles);
            Some(AccessGrant::Channels {
                assignees,
                channels,
            })
        }
        AssignmentKind::Role => {
            (!users.is_empty() && !roles.is_empty()).then_some(AccessGrant::Roles { users, roles })
        }
    }
}

//! Values the engine hands to the host and to lifecycle hooks.

use std::fmt;

use thiserror::Error;

/// Prefix that marks a role name when roles and users share one assignee list.
pub const ROLE_PREFIX: &str = "role:";

/// The kind of write being attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    /// Creation, or recreation over a deleted revision.
    Add,
    /// Replacement of a live revision.
    Replace,
    /// Deletion.
    Remove,
}

impl Operation {
    /// Returns the permission key for this operation.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Add => "add",
            Self::Replace => "replace",
            Self::Remove => "remove",
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authorizations a write requires. Only declared entries are present;
/// the host grants the write if any present entry is satisfied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredAccess {
    /// Channels, any of which grants the write.
    pub channels: Option<Vec<String>>,
    /// Roles, any of which grants the write.
    pub roles: Option<Vec<String>>,
    /// Users, any of whom may perform the write.
    pub users: Option<Vec<String>>,
}

impl RequiredAccess {
    /// Returns true when nothing is required.
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.channels.is_none() && self.roles.is_none() && self.users.is_none()
    }
}

/// One access grant issued to the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessGrant {
    /// Grants channel access to users and prefixed roles.
    Channels {
        /// Users and `role:`-prefixed roles receiving access.
        assignees: Vec<String>,
        /// Channels being granted.
        channels: Vec<String>,
    },
    /// Grants roles to users.
    Roles {
        /// Users receiving the roles.
        users: Vec<String>,
        /// `role:`-prefixed roles being granted.
        roles: Vec<String>,
    },
}

/// A resolved document lifetime.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expiry {
    /// An integer as declared: an offset in seconds, or an absolute epoch
    /// time when large enough for the host to treat it as one.
    Offset(i64),
    /// An absolute ISO 8601 timestamp.
    Timestamp(String),
    /// A point in time normalized to Unix epoch seconds.
    EpochSeconds(i64),
}

/// A refusal raised by the host's authorization check or by a lifecycle
/// hook. Propagated to the caller unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct Rejection {
    /// Human-readable reason.
    pub message: String,
}

impl Rejection {
    /// Creates a rejection with the given message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Context accumulated across the stages of one write and passed to each
/// lifecycle hook.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActionContext {
    /// Name of the matched document definition.
    pub doc_type: String,
    /// What the authorization stage required, once it has run.
    pub authorization: Option<RequiredAccess>,
    /// Grants issued by the access-assignment stage.
    pub access_assignments: Vec<AccessGrant>,
    /// Expiry set by the expiry stage.
    pub expiry: Option<Expiry>,
    /// Channels assigned to the document.
    pub channels: Vec<String>,
}

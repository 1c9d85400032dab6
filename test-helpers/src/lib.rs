//! Test-only helpers for exercising the syncguard engine.
//!
//! [`RecordingHost`] stands in for the host: it records every call the
//! engine makes and can be told to refuse authorization. The fixture
//! functions build registries from `serde_json::json!` values.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

use serde_json::Value;
use syncguard::Host;
use syncguard_schema::{
    AccessGrant, DefinitionRegistry, DocumentDefinition, Expiry, Rejection, RegistryError,
    RequiredAccess,
};

/// One call the engine made into the host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HostCall {
    /// An authorization check.
    RequireAccess(RequiredAccess),
    /// A channel assignment.
    AssignChannels(Vec<String>),
    /// An access grant.
    GrantAccess(AccessGrant),
    /// An expiry update.
    SetExpiry(Expiry),
}

/// A host double that records calls in order.
#[derive(Debug, Clone, Default)]
pub struct RecordingHost {
    /// Every call, in the order the engine made them.
    pub calls: Vec<HostCall>,
    denial: Option<String>,
}

impl RecordingHost {
    /// A host that authorizes every write.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A host whose authorization check refuses with `message`.
    #[must_use]
    pub fn denying(message: impl Into<String>) -> Self {
        Self {
            denial: Some(message.into()),
            ..Self::default()
        }
    }

    /// Authorization checks performed.
    #[must_use]
    pub fn access_checks(&self) -> Vec<&RequiredAccess> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                HostCall::RequireAccess(required) => Some(required),
                _ => None,
            })
            .collect()
    }

    /// The channels assigned by the last channel assignment.
    #[must_use]
    pub fn assigned_channels(&self) -> Option<&[String]> {
        self.calls.iter().rev().find_map(|call| match call {
            HostCall::AssignChannels(channels) => Some(channels.as_slice()),
            _ => None,
        })
    }

    /// Grants issued, in order.
    #[must_use]
    pub fn grants(&self) -> Vec<&AccessGrant> {
        self.calls
            .iter()
            .filter_map(|call| match call {
                HostCall::GrantAccess(grant) => Some(grant),
                _ => None,
            })
            .collect()
    }

    /// The expiry set, if any.
    #[must_use]
    pub fn expiry(&self) -> Option<&Expiry> {
        self.calls.iter().find_map(|call| match call {
            HostCall::SetExpiry(expiry) => Some(expiry),
            _ => None,
        })
    }

    /// Forgets recorded calls, keeping the denial setting.
    pub fn clear(&mut self) {
        self.calls.clear();
    }
}

impl Host for RecordingHost {
    fn require_access(&mut self, required: &RequiredAccess) -> Result<(), Rejection> {
        self.calls.push(HostCall::RequireAccess(required.clone()));
        match &self.denial {
            Some(message) => Err(Rejection::new(message.clone())),
            None => Ok(()),
        }
    }

    fn assign_channels(&mut self, channels: &[String]) {
        self.calls.push(HostCall::AssignChannels(channels.to_vec()));
    }

    fn grant_access(&mut self, grant: &AccessGrant) {
        self.calls.push(HostCall::GrantAccess(grant.clone()));
    }

    fn set_expiry(&mut self, expiry: &Expiry) {
        self.calls.push(HostCall::SetExpiry(expiry.clone()));
    }
}

/// Builds a registry from a JSON array of `{ "name", "definition" }`
/// entries.
///
/// # Errors
///
/// Returns the loader's error for malformed definitions.
pub fn registry(definitions: &Value) -> Result<DefinitionRegistry, RegistryError> {
    DefinitionRegistry::from_json_str(&definitions.to_string())
}

/// Builds a registry holding one definition.
///
/// # Errors
///
/// Returns the loader's error for a malformed definition.
pub fn single_type(name: &str, definition: Value) -> Result<DefinitionRegistry, RegistryError> {
    let definition: DocumentDefinition =
        serde_json::from_value(definition).map_err(RegistryError::from)?;
    Ok(DefinitionRegistry::new().with_definition(name, definition))
}

//! Document definitions: the schema and policy for one document type.

use std::fmt;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::de::{Deserialize, Deserializer};
use serde_json::Value;

use crate::constraint::{self, Constraint};
use crate::model::{Pattern, PropertySchema};
use crate::outcome::{ActionContext, Operation, Rejection};

type FilterFn = dyn Fn(&Value, Option<&Value>, &str) -> bool + Send + Sync;

/// Decides whether a definition governs a document.
#[derive(Clone, Default)]
pub enum TypeFilter {
    /// Matches on the document's `type` property (and the prior revision's,
    /// when there is one).
    #[default]
    Simple,
    /// Matches with a predicate over `(doc, old_doc, type_name)`.
    Custom(Arc<FilterFn>),
}

impl TypeFilter {
    /// Wraps a predicate over `(doc, old_doc, type_name)`.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&Value, Option<&Value>, &str) -> bool + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }
}

impl fmt::Debug for TypeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Simple => f.write_str("Simple"),
            Self::Custom(_) => f.write_str("Custom(<fn>)"),
        }
    }
}

/// Channels, roles or users keyed by operation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PermissionSet {
    /// Grants read visibility only.
    pub view: Option<Vec<String>>,
    /// Required to create.
    pub add: Option<Vec<String>>,
    /// Required to replace.
    pub replace: Option<Vec<String>>,
    /// Required to delete.
    pub remove: Option<Vec<String>>,
    /// Required for every write operation.
    pub write: Option<Vec<String>>,
}

impl PermissionSet {
    /// A set whose entries apply to every write.
    pub fn write<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            write: Some(names.into_iter().map(Into::into).collect()),
            ..Self::default()
        }
    }

    /// Returns the `write` entries followed by the entries specific to
    /// `operation`, or `None` when neither is declared.
    #[must_use]
    pub fn required_for(&self, operation: Operation) -> Option<Vec<String>> {
        let specific = match operation {
            Operation::Add => &self.add,
            Operation::Replace => &self.replace,
            Operation::Remove => &self.remove,
        };
        match (&self.write, specific) {
            (None, None) => None,
            (write, specific) => Some(
                write
                    .iter()
                    .chain(specific.iter())
                    .flatten()
                    .cloned()
                    .collect(),
            ),
        }
    }

    /// Iterates every declared name in view, add, replace, remove, write order.
    pub fn all(&self) -> impl Iterator<Item = &String> {
        [&self.view, &self.add, &self.replace, &self.remove, &self.write]
            .into_iter()
            .flatten()
            .flatten()
    }
}

#[derive(serde::Deserialize)]
#[serde(deny_unknown_fields)]
struct PermissionMap {
    #[serde(default, deserialize_with = "constraint::names")]
    view: Option<Vec<String>>,
    #[serde(default, deserialize_with = "constraint::names")]
    add: Option<Vec<String>>,
    #[serde(default, deserialize_with = "constraint::names")]
    replace: Option<Vec<String>>,
    #[serde(default, deserialize_with = "constraint::names")]
    remove: Option<Vec<String>>,
    #[serde(default, deserialize_with = "constraint::names")]
    write: Option<Vec<String>>,
}

#[derive(serde::Deserialize)]
#[serde(untagged)]
enum PermissionRepr {
    One(String),
    Many(Vec<String>),
    Map(PermissionMap),
}

/// A bare string or list means `write`; a map is keyed by operation.
impl<'de> Deserialize<'de> for PermissionSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match PermissionRepr::deserialize(deserializer)? {
            PermissionRepr::One(name) => Self::write([name]),
            PermissionRepr::Many(names) => Self::write(names),
            PermissionRepr::Map(map) => Self {
                view: map.view,
                add: map.add,
                replace: map.replace,
                remove: map.remove,
                write: map.write,
            },
        })
    }
}

/// Document-level attachment limits.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AttachmentConstraints {
    /// Maximum number of attachments.
    pub maximum_attachment_count: Option<usize>,
    /// Maximum size of any one attachment, in bytes.
    pub maximum_individual_size: Option<u64>,
    /// Maximum combined size, in bytes.
    pub maximum_total_size: Option<u64>,
    /// Allowed file extensions, compared case-insensitively.
    pub supported_extensions: Option<Vec<String>>,
    /// Allowed content types.
    pub supported_content_types: Option<Vec<String>>,
    /// Every attachment must be named by an attachment-reference property.
    pub require_attachment_references: bool,
    /// Every attachment name must match this pattern.
    pub filename_regex_pattern: Option<Pattern>,
}

/// What an access-assignment rule grants.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AssignmentKind {
    /// Grants channels to users and roles.
    #[default]
    Channel,
    /// Grants roles to users.
    Role,
}

/// A rule granting channel or role access when a document is written.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AccessAssignment {
    /// Rule kind.
    #[serde(rename = "type")]
    pub kind: AssignmentKind,
    /// Channels granted by a channel rule.
    #[serde(deserialize_with = "constraint::names_constraint")]
    pub channels: Option<Constraint<Vec<String>>>,
    /// Roles that receive channels, or roles granted to users.
    #[serde(deserialize_with = "constraint::names_constraint")]
    pub roles: Option<Constraint<Vec<String>>>,
    /// Users that receive channels or roles.
    #[serde(deserialize_with = "constraint::names_constraint")]
    pub users: Option<Constraint<Vec<String>>>,
}

/// The raw declared expiry, before normalization.
#[derive(Debug, Clone, PartialEq)]
pub enum ExpiryValue {
    /// A JSON value: an integer offset or an ISO 8601 timestamp string are
    /// accepted; anything else is a configuration defect.
    Json(Value),
    /// A point in time.
    Instant(DateTime<Utc>),
}

impl<'de> Deserialize<'de> for ExpiryValue {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Value::deserialize(deserializer).map(Self::Json)
    }
}

/// A lifecycle hook over `(doc, old_doc, context)`. Returning a rejection
/// aborts the write.
pub type Hook =
    Arc<dyn Fn(&Value, Option<&Value>, &ActionContext) -> Result<(), Rejection> + Send + Sync>;

/// Callbacks invoked after each successful stage of a write.
#[derive(Clone, Default)]
pub struct LifecycleHooks {
    /// After the definition has been selected.
    pub on_type_identification_succeeded: Option<Hook>,
    /// After the authorization check passed.
    pub on_authorization_succeeded: Option<Hook>,
    /// After content validation passed.
    pub on_validation_succeeded: Option<Hook>,
    /// After access grants were issued.
    pub on_access_assignments_succeeded: Option<Hook>,
    /// After the expiry was set.
    pub on_expiry_set_succeeded: Option<Hook>,
    /// After channels were assigned.
    pub on_document_channel_assignment_succeeded: Option<Hook>,
}

impl fmt::Debug for LifecycleHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LifecycleHooks")
            .field(
                "on_type_identification_succeeded",
                &self.on_type_identification_succeeded.is_some(),
            )
            .field("on_authorization_succeeded", &self.on_authorization_succeeded.is_some())
            .field("on_validation_succeeded", &self.on_validation_succeeded.is_some())
            .field(
                "on_access_assignments_succeeded",
                &self.on_access_assignments_succeeded.is_some(),
            )
            .field("on_expiry_set_succeeded", &self.on_expiry_set_succeeded.is_some())
            .field(
                "on_document_channel_assignment_succeeded",
                &self.on_document_channel_assignment_succeeded.is_some(),
            )
            .finish()
    }
}

/// The schema and policy for one document type.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct DocumentDefinition {
    /// Selects the documents this definition governs.
    #[serde(skip)]
    pub type_filter: TypeFilter,

    /// Channels required per operation; also the channels the document is
    /// assigned to.
    pub channels: Option<Constraint<PermissionSet>>,
    /// Roles that may perform each operation.
    pub authorized_roles: Option<Constraint<PermissionSet>>,
    /// Users that may perform each operation.
    pub authorized_users: Option<Constraint<PermissionSet>>,

    /// Root property schema.
    pub property_validators: Constraint<PropertySchema>,
    /// Tolerate undeclared root properties.
    pub allow_unknown_properties: Option<Constraint<bool>>,

    /// Existing documents can be neither replaced nor deleted.
    pub immutable: Option<Constraint<bool>>,
    /// Existing documents cannot be replaced.
    pub cannot_replace: Option<Constraint<bool>>,
    /// Existing documents cannot be deleted.
    pub cannot_delete: Option<Constraint<bool>>,
    /// New document identifiers must match this pattern.
    pub document_id_regex_pattern: Option<Constraint<Pattern>>,

    /// Binary attachments are permitted.
    pub allow_attachments: Option<Constraint<bool>>,
    /// Limits on binary attachments.
    pub attachment_constraints: Option<Constraint<AttachmentConstraints>>,

    /// Rules granting access when the document is written.
    pub access_assignments: Option<Constraint<Vec<AccessAssignment>>>,
    /// Document lifetime.
    pub expiry: Option<Constraint<ExpiryValue>>,

    /// Callbacks after each stage.
    #[serde(skip)]
    pub hooks: LifecycleHooks,
}

impl DocumentDefinition {
    /// A definition with the given root schema and no other settings.
    #[must_use]
    pub fn with_properties(properties: PropertySchema) -> Self {
        Self {
            property_validators: properties.into(),
            ..Self::default()
        }
    }
}

//! Declarative document definitions for the syncguard write validator.
//!
//! A [`DocumentDefinition`] describes one document type: which documents it
//! governs, who may write them, what their content must look like, who gains
//! access when they are written and how long they live. Definitions are
//! collected, in order, in a [`DefinitionRegistry`].
//!
//! # Entry Point
//!
//! ```
//! use syncguard_schema::{
//!     DefinitionRegistry, DocumentDefinition, ItemValidator, PermissionSet, ValueType,
//! };
//!
//! let mut properties = syncguard_schema::PropertySchema::new();
//! properties.insert(
//!     "count".into(),
//!     ItemValidator {
//!         minimum_value: Some(serde_json::json!(1).into()),
//!         ..ItemValidator::of(ValueType::Integer)
//!     },
//! );
//!
//! let registry = DefinitionRegistry::new().with_definition(
//!     "counter",
//!     DocumentDefinition {
//!         channels: Some(PermissionSet::write(["counters"]).into()),
//!         ..DocumentDefinition::with_properties(properties)
//!     },
//! );
//! assert_eq!(registry.len(), 1);
//! ```
//!
//! # Serialized Definitions
//!
//! Definitions whose constraints are all static can be loaded from JSON with
//! [`DefinitionRegistry::from_json_str`]. Dynamic constraints, custom type
//! filters, custom validation and lifecycle hooks are code-only.

#![deny(
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod constraint;
pub mod definition;
pub mod document;
pub mod model;
pub mod outcome;
pub mod registry;

pub use constraint::{Constraint, ConstraintArgs};
pub use definition::{
    AccessAssignment, AssignmentKind, AttachmentConstraints, DocumentDefinition, ExpiryValue,
    Hook, LifecycleHooks, PermissionSet, TypeFilter,
};
pub use model::{
    CustomValidation, ItemFrame, ItemValidator, KeyValidator, Pattern, PropertySchema, Segment,
    ValidationContext, ValueType,
};
pub use outcome::{
    AccessGrant, ActionContext, Expiry, Operation, Rejection, RequiredAccess, ROLE_PREFIX,
};
pub use registry::{DefinitionRegistry, RegistryError};

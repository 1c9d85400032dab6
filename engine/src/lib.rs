//! Schema-driven write validation for synchronized JSON documents.
//!
//! A [`SyncFunction`] holds an ordered [`DefinitionRegistry`] and decides
//! each write of a document over its prior revision: it picks the governing
//! definition, asks the [`Host`] to authorize the writer, collects every
//! content violation, issues access grants, sets the expiry and assigns the
//! document's channels.
//!
//! # Entry Point
//!
//! ```
//! use serde_json::json;
//! use syncguard::schema::{AccessGrant, DefinitionRegistry, Expiry, Rejection, RequiredAccess};
//! use syncguard::{Host, SyncFunction, WriteOutcome};
//!
//! #[derive(Default)]
//! struct Gateway {
//!     channels: Vec<String>,
//! }
//!
//! impl Host for Gateway {
//!     fn require_access(&mut self, _: &RequiredAccess) -> Result<(), Rejection> {
//!         Ok(())
//!     }
//!     fn assign_channels(&mut self, channels: &[String]) {
//!         self.channels = channels.to_vec();
//!     }
//!     fn grant_access(&mut self, _: &AccessGrant) {}
//!     fn set_expiry(&mut self, _: &Expiry) {}
//! }
//!
//! let registry = DefinitionRegistry::from_json_str(
//!     r#"[{
//!         "name": "counter",
//!         "definition": {
//!             "channels": { "write": "counters" },
//!             "propertyValidators": { "count": { "type": "integer", "minimumValue": 1 } }
//!         }
//!     }]"#,
//! )?;
//! let sync = SyncFunction::new(registry);
//! let mut gateway = Gateway::default();
//!
//! let doc = json!({ "_id": "c1", "type": "counter", "count": 5 });
//! let outcome = sync.evaluate(&doc, None, &mut gateway)?;
//! assert!(matches!(outcome, WriteOutcome::Accepted(_)));
//! assert_eq!(gateway.channels, ["counters"]);
//!
//! let bad = json!({ "_id": "c2", "type": "counter", "count": 0 });
//! let err = sync.evaluate(&bad, None, &mut gateway).unwrap_err();
//! assert_eq!(
//!     err.to_string(),
//!     "Invalid counter document: item \"count\" must not be less than 1"
//! );
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! # Failure Classes
//!
//! [`Error`] separates refusals (unknown type, host denial, content
//! violations, hook rejection) from configuration defects in the
//! definitions themselves; see [`Error::is_configuration_defect`].

#![deny(
    clippy::unwrap_used,
    clippy::panic,
    missing_docs,
    clippy::missing_errors_doc
)]

pub mod access;
pub mod authorization;
pub mod compare;
pub mod error;
pub mod expiry;
pub mod host;
pub mod orchestrator;
pub mod path;
pub mod report;
pub mod temporal;
pub mod type_resolver;
pub mod validators;

pub use syncguard_schema as schema;
pub use syncguard_schema::DefinitionRegistry;

pub use error::{Error, Result};
pub use host::Host;
pub use orchestrator::{validate_content, SyncFunction, WriteOutcome};
pub use report::ViolationList;

//! Failures surfaced by a write decision.

use syncguard_schema::Rejection;
use thiserror::Error;

/// Why a write was refused, or why it could not be evaluated.
///
/// `UnknownType`, `AccessDenied`, `Invalid` and `ActionRejected` are
/// forbidden results about the write itself. The remaining variants are
/// configuration defects in the document definitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[non_exhaustive]
pub enum Error {
    /// No definition's type filter accepted the document.
    #[error("Unknown document type")]
    UnknownType,

    /// The host's authorization check refused the write.
    #[error(transparent)]
    AccessDenied(Rejection),

    /// The document content broke one or more constraints.
    #[error("Invalid {doc_type} document: {}", violations.join("; "))]
    Invalid {
        /// Name of the matched definition.
        doc_type: String,
        /// Every violation found, in discovery order.
        violations: Vec<String>,
    },

    /// A lifecycle hook refused the write.
    #[error(transparent)]
    ActionRejected(Rejection),

    /// A validator has no type tag, or one this engine does not know.
    #[error("no recognized data type defined for validator of item \"{path}\"")]
    UnrecognizedType {
        /// Location of the offending item.
        path: String,
    },

    /// An `enum` validator declares no predefined values.
    #[error("predefined values must be a non-empty list for enum item \"{path}\"")]
    MissingPredefinedValues {
        /// Location of the offending item.
        path: String,
    },

    /// The resolved expiry is neither an integer, a timestamp nor an instant.
    #[error("malformed expiry value for document \"{doc_id}\": {raw}")]
    MalformedExpiry {
        /// Identifier of the document being written.
        doc_id: String,
        /// The resolved value, as JSON.
        raw: String,
    },
}

impl Error {
    /// Returns true for defects in the document definitions rather than in
    /// the document or the writer's permissions.
    #[must_use]
    pub fn is_configuration_defect(&self) -> bool {
        matches!(
            self,
            Self::UnrecognizedType { .. }
                | Self::MissingPredefinedValues { .. }
                | Self::MalformedExpiry { .. }
        )
    }

    /// Returns the forbidden message for refusals, or `None` for
    /// configuration defects.
    #[must_use]
    pub fn forbidden(&self) -> Option<String> {
        (!self.is_configuration_defect()).then(|| self.to_string())
    }
}

/// Result alias for write decisions.
pub type Result<T> = std::result::Result<T, Error>;

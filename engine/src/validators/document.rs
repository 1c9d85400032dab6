//! Whole-document constraints: immutability, replace and delete bans, and
//! the identifier pattern for new documents.

use serde_json::Value;
use syncguard_schema::{document, ConstraintArgs, DocumentDefinition};

use super::{enabled, resolved};
use crate::report::ViolationList;

/// Applies the document-level constraints of `definition` to a write.
pub fn validate_document_constraints(
    definition: &DocumentDefinition,
    doc: &Value,
    old_doc: Option<&Value>,
    violations: &mut ViolationList,
) {
    let args = ConstraintArgs::for_document(doc, old_doc);
    let deleting = document::is_deleted(doc);

    if !document::is_missing_or_deleted(old_doc) {
        if enabled(&definition.immutable, &args) {
            violations.push("documents of this type cannot be replaced or deleted");
        } else if deleting && enabled(&definition.cannot_delete, &args) {
            violations.push("documents of this type cannot be deleted");
        } else if !deleting && enabled(&definition.cannot_replace, &args) {
            violations.push("documents of this type cannot be replaced");
        }
        return;
    }

    if deleting {
        return;
    }
    if let Some(pattern) = resolved(&definition.document_id_regex_pattern, &args) {
        if !pattern.is_match(document::id(doc).unwrap_or_default()) {
            violations.push(format!(
                "document ID must conform to expected pattern {}",
                pattern.as_str()
            ));
        }
    }
}

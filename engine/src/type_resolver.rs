//! Selects the definition that governs a document.

use serde_json::Value;
use syncguard_schema::{document, DefinitionRegistry, DocumentDefinition, TypeFilter};

/// Returns the first definition, in declaration order, whose type filter
/// accepts the write.
#[must_use]
pub fn resolve_type<'r>(
    registry: &'r DefinitionRegistry,
    doc: &Value,
    old_doc: Option<&Value>,
) -> Option<(&'r str, &'r DocumentDefinition)> {
    registry
        .iter()
        .find(|(name, definition)| accepts(&definition.type_filter, doc, old_doc, name))
}

fn accepts(filter: &TypeFilter, doc: &Value, old_doc: Option<&Value>, name: &str) -> bool {
    match filter {
        TypeFilter::Simple => simple_filter(doc, old_doc, name),
        TypeFilter::Custom(predicate) => predicate(doc, old_doc, name),
    }
}

/// The default filter, keyed on the `type` property.
///
/// Against a live prior revision, a deletion matches on the prior's type
/// and any other write must keep the type unchanged. Otherwise the current
/// document's type decides.
#[must_use]
pub fn simple_filter(doc: &Value, old_doc: Option<&Value>, name: &str) -> bool {
    fn type_of(doc: &Value) -> Option<&str> {
        doc.get("type").and_then(Value::as_str)
    }
    match old_doc.filter(|old| !document::is_missing_or_deleted(Some(*old))) {
        Some(old) if document::is_deleted(doc) => type_of(old) == Some(name),
        Some(old) => type_of(doc) == Some(name) && type_of(old) == Some(name),
        None => type_of(doc) == Some(name),
    }
}

//! Accessors for the reserved parts of a document.

use serde_json::{Map, Value};

/// Root-level properties owned by the host rather than by a schema.
pub const RESERVED_PROPERTIES: &[&str] = &["_id", "_rev", "_deleted", "_revisions", "_attachments"];

/// Returns the document identifier.
#[must_use]
pub fn id(doc: &Value) -> Option<&str> {
    doc.get("_id").and_then(Value::as_str)
}

/// Returns true if the document is a deletion marker.
#[must_use]
pub fn is_deleted(doc: &Value) -> bool {
    doc.get("_deleted").and_then(Value::as_bool) == Some(true)
}

/// Returns true when there is no live prior revision.
#[must_use]
pub fn is_missing_or_deleted(doc: Option<&Value>) -> bool {
    doc.map_or(true, |doc| doc.is_null() || is_deleted(doc))
}

/// Returns true if `name` is a reserved root property.
#[must_use]
pub fn is_reserved(name: &str) -> bool {
    RESERVED_PROPERTIES.contains(&name)
}

/// Metadata for one binary attachment.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Attachment<'a> {
    /// Attachment name, usually a file name.
    pub name: &'a str,
    /// Declared MIME type, if any.
    pub content_type: Option<&'a str>,
    /// Size in bytes.
    pub length: u64,
}

impl<'a> Attachment<'a> {
    fn from_entry(name: &'a str, meta: &'a Value) -> Self {
        Self {
            name,
            content_type: meta.get("content_type").and_then(Value::as_str),
            length: meta.get("length").and_then(Value::as_u64).unwrap_or(0),
        }
    }

    /// Returns the lower-cased file extension, if the name has one.
    #[must_use]
    pub fn extension(&self) -> Option<String> {
        extension(self.name)
    }
}

/// Returns the lower-cased extension of a file name.
#[must_use]
pub fn extension(name: &str) -> Option<String> {
    name.rsplit_once('.').map(|(_, ext)| ext.to_ascii_lowercase())
}

fn attachment_map(doc: &Value) -> Option<&Map<String, Value>> {
    doc.get("_attachments").and_then(Value::as_object)
}

/// Returns every attachment on the document, in name order.
#[must_use]
pub fn attachments(doc: &Value) -> Vec<Attachment<'_>> {
    attachment_map(doc)
        .map(|map| {
            map.iter()
                .map(|(name, meta)| Attachment::from_entry(name, meta))
                .collect()
        })
        .unwrap_or_default()
}

/// Returns the named attachment, if present.
#[must_use]
pub fn attachment<'a>(doc: &'a Value, name: &'a str) -> Option<Attachment<'a>> {
    attachment_map(doc)?
        .get(name)
        .map(|meta| Attachment::from_entry(name, meta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deletion_and_missing_predicates() {
        let live = json!({ "_id": "a" });
        let tombstone = json!({ "_id": "a", "_deleted": true });
        assert!(!is_deleted(&live));
        assert!(is_deleted(&tombstone));
        assert!(is_missing_or_deleted(None));
        assert!(is_missing_or_deleted(Some(&tombstone)));
        assert!(is_missing_or_deleted(Some(&Value::Null)));
        assert!(!is_missing_or_deleted(Some(&live)));
        assert_eq!(id(&live), Some("a"));
    }

    #[test]
    fn attachment_metadata() {
        let doc = json!({
            "_attachments": {
                "logo.PNG": { "content_type": "image/png", "length": 2048 },
                "notes": { "length": 3 }
            }
        });
        let all = attachments(&doc);
        assert_eq!(all.len(), 2);
        let logo = attachment(&doc, "logo.PNG");
        assert_eq!(logo.map(|a| a.length), Some(2048));
        assert_eq!(logo.and_then(|a| a.extension()), Some("png".to_owned()));
        assert_eq!(attachment(&doc, "notes").and_then(|a| a.extension()), None);
        assert!(attachment(&doc, "missing").is_none());
    }
}

//! The ordered set of document definitions for one deployment.

use std::collections::HashSet;

use serde::Deserialize;
use thiserror::Error;

use crate::definition::DocumentDefinition;

/// Errors raised while loading a registry.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum RegistryError {
    /// The registry source is not valid JSON or does not match the
    /// definition shape.
    #[error("failed to parse document definitions: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two definitions share a name.
    #[error("document type \"{0}\" is defined more than once")]
    DuplicateType(String),
}

/// Document definitions in declaration order. Order decides which
/// definition governs a document when more than one type filter matches.
#[derive(Debug, Clone, Default)]
pub struct DefinitionRegistry {
    entries: Vec<(String, DocumentDefinition)>,
}

#[derive(Deserialize)]
struct NamedDefinition {
    name: String,
    definition: DocumentDefinition,
}

impl DefinitionRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a registry from a producer function.
    pub fn from_fn<F>(producer: F) -> Self
    where
        F: FnOnce() -> Self,
    {
        producer()
    }

    /// Loads a registry from a JSON array of `{ "name", "definition" }`
    /// objects. Serialized definitions use the simple type filter and carry
    /// only static constraints.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::Parse`] for malformed input and
    /// [`RegistryError::DuplicateType`] when a name repeats.
    pub fn from_json_str(source: &str) -> Result<Self, RegistryError> {
        let named: Vec<NamedDefinition> = serde_json::from_str(source)?;
        let mut seen = HashSet::new();
        let mut registry = Self::new();
        for entry in named {
            if !seen.insert(entry.name.clone()) {
                return Err(RegistryError::DuplicateType(entry.name));
            }
            registry.push(entry.name, entry.definition);
        }
        Ok(registry)
    }

    /// Appends a definition.
    #[must_use]
    pub fn with_definition(
        mut self,
        name: impl Into<String>,
        definition: DocumentDefinition,
    ) -> Self {
        self.push(name, definition);
        self
    }

    /// Appends a definition.
    pub fn push(&mut self, name: impl Into<String>, definition: DocumentDefinition) {
        self.entries.push((name.into(), definition));
    }

    /// Iterates definitions in declaration order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &DocumentDefinition)> {
        self.entries
            .iter()
            .map(|(name, definition)| (name.as_str(), definition))
    }

    /// Looks up a definition by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&DocumentDefinition> {
        self.iter()
            .find(|(candidate, _)| *candidate == name)
            .map(|(_, definition)| definition)
    }

    /// Returns the number of definitions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if there are no definitions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TWO_TYPES: &str = r#"[
        { "name": "invoice", "definition": { "channels": "billing", "propertyValidators": {} } },
        { "name": "note", "definition": { "channels": ["notes"], "allowUnknownProperties": true } }
    ]"#;

    #[test]
    fn json_registry_keeps_declaration_order() -> Result<(), RegistryError> {
        let registry = DefinitionRegistry::from_json_str(TWO_TYPES)?;
        let names: Vec<&str> = registry.iter().map(|(name, _)| name).collect();
        assert_eq!(names, ["invoice", "note"]);
        assert!(registry.get("note").is_some());
        assert!(registry.get("memo").is_none());
        Ok(())
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let source = r#"[
            { "name": "note", "definition": {} },
            { "name": "note", "definition": {} }
        ]"#;
        assert!(matches!(
            DefinitionRegistry::from_json_str(source),
            Err(RegistryError::DuplicateType(name)) if name == "note"
        ));
    }

    #[test]
    fn malformed_json_is_a_parse_error() {
        assert!(matches!(
            DefinitionRegistry::from_json_str("{"),
            Err(RegistryError::Parse(_))
        ));
    }

    #[test]
    fn producer_function() {
        let registry = DefinitionRegistry::from_fn(|| {
            DefinitionRegistry::new().with_definition("a", DocumentDefinition::default())
        });
        assert_eq!(registry.len(), 1);
        assert!(!registry.is_empty());
    }
}

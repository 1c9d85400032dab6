//! Item validator model.
//!
//! An [`ItemValidator`] is one node of a property schema tree. Its fields
//! mirror the constraint names used in serialized definitions
//! (`mustNotBeEmpty`, `minimumValue`, `arrayElementsValidator`, ...), and any
//! of them may be computed per write through [`Constraint`].

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use regex::Regex;
use serde::de::{self, Deserialize, Deserializer};
use serde_json::Value;

use crate::constraint::{self, Constraint};

/// Property name to validator mapping for one object level.
pub type PropertySchema = BTreeMap<String, ItemValidator>;

/// The type tag of an item validator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ValueType {
    /// Any string.
    String,
    /// A number with no fractional part.
    Integer,
    /// Any number.
    Float,
    /// `true` or `false`.
    Boolean,
    /// A calendar date string.
    Date,
    /// A date string with optional time and offset components.
    Datetime,
    /// A time-of-day string.
    Time,
    /// A UTC offset string.
    Timezone,
    /// One of a list of predefined values.
    Enum,
    /// A canonical 8-4-4-4-12 UUID string.
    Uuid,
    /// A map with its own property schema.
    Object,
    /// An ordered sequence.
    Array,
    /// A map with homogeneous keys and values.
    Hashtable,
    /// The name of a binary attachment on the same document.
    AttachmentReference,
    /// A tag not known to this engine. Validating against it is a
    /// configuration defect.
    #[serde(other)]
    Unrecognized,
}

impl ValueType {
    /// Returns the tag as written in serialized definitions.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::String => "string",
            Self::Integer => "integer",
            Self::Float => "float",
            Self::Boolean => "boolean",
            Self::Date => "date",
            Self::Datetime => "datetime",
            Self::Time => "time",
            Self::Timezone => "timezone",
            Self::Enum => "enum",
            Self::Uuid => "uuid",
            Self::Object => "object",
            Self::Array => "array",
            Self::Hashtable => "hashtable",
            Self::AttachmentReference => "attachmentReference",
            Self::Unrecognized => "unrecognized",
        }
    }

    /// Returns true for string types whose values compare by parsed
    /// representation rather than by exact text.
    #[must_use]
    pub fn is_semantic(self) -> bool {
        matches!(
            self,
            Self::Date | Self::Datetime | Self::Time | Self::Timezone | Self::Uuid
        )
    }
}

impl fmt::Display for ValueType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A compiled regular expression constraint.
#[derive(Clone)]
pub struct Pattern(Regex);

impl Pattern {
    /// Compiles a pattern.
    ///
    /// # Errors
    ///
    /// Returns the regex compilation error if `source` is not a valid pattern.
    pub fn new(source: &str) -> Result<Self, regex::Error> {
        Regex::new(source).map(Self)
    }

    /// Returns true if the pattern matches anywhere in `text`.
    #[must_use]
    pub fn is_match(&self, text: &str) -> bool {
        self.0.is_match(text)
    }

    /// Returns the pattern source.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl FromStr for Pattern {
    type Err = regex::Error;

    fn from_str(source: &str) -> Result<Self, Self::Err> {
        Self::new(source)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl fmt::Debug for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Pattern({:?})", self.as_str())
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Pattern {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let source = String::deserialize(deserializer)?;
        Self::new(&source).map_err(de::Error::custom)
    }
}

/// One step of the path from the document root to an item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    /// The document itself.
    Root,
    /// A named property of an object.
    Property(String),
    /// An array element.
    Index(usize),
    /// A hashtable entry.
    Key(String),
}

/// The traversal context for one item: its value, its prior value and the
/// segment that leads to it from its parent.
#[derive(Debug, Clone)]
pub struct ItemFrame<'a> {
    /// Current value; `None` when missing.
    pub value: Option<&'a Value>,
    /// Prior value; `None` when missing or when there is no prior document.
    pub old_value: Option<&'a Value>,
    /// Name of the item within its parent.
    pub segment: Segment,
}

/// Arguments handed to a custom validation callback.
#[derive(Debug, Clone, Copy)]
pub struct ValidationContext<'a> {
    /// The document being written.
    pub doc: &'a Value,
    /// The revision being replaced, if any.
    pub old_doc: Option<&'a Value>,
    /// The item under validation.
    pub item: &'a ItemFrame<'a>,
    /// Every enclosing frame, root first, excluding `item`.
    pub ancestors: &'a [ItemFrame<'a>],
}

type CustomFn = dyn Fn(&ValidationContext<'_>) -> Vec<String> + Send + Sync;

/// A custom validation callback. Returned messages are appended to the
/// violation list; other checks still run.
#[derive(Clone)]
pub struct CustomValidation(Arc<CustomFn>);

impl CustomValidation {
    /// Wraps a callback.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&ValidationContext<'_>) -> Vec<String> + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Runs the callback.
    #[must_use]
    pub fn call(&self, context: &ValidationContext<'_>) -> Vec<String> {
        (self.0)(context)
    }
}

impl fmt::Debug for CustomValidation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("CustomValidation(<fn>)")
    }
}

/// Constraints applied to hashtable keys.
#[derive(Debug, Clone, Default, PartialEq, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct KeyValidator {
    /// Rejects the empty string as a key.
    pub must_not_be_empty: bool,
    /// Every key must match this pattern.
    pub regex_pattern: Option<Pattern>,
}

/// One node of a property schema.
///
/// Constraint fields that do not apply to the declared type are ignored.
#[derive(Debug, Clone, Default, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ItemValidator {
    /// The type tag. A validator without one cannot be evaluated.
    #[serde(rename = "type")]
    pub kind: Option<Constraint<ValueType>>,

    /// Value must be neither null nor missing.
    pub required: Option<Constraint<bool>>,
    /// Value may be null but not missing.
    pub must_not_be_missing: Option<Constraint<bool>>,
    /// Value may be missing but not null.
    pub must_not_be_null: Option<Constraint<bool>>,
    /// Strings and arrays must not be empty.
    pub must_not_be_empty: Option<Constraint<bool>>,

    /// Inclusive lower bound.
    pub minimum_value: Option<Constraint<Value>>,
    /// Exclusive lower bound.
    pub minimum_value_exclusive: Option<Constraint<Value>>,
    /// Inclusive upper bound.
    pub maximum_value: Option<Constraint<Value>>,
    /// Exclusive upper bound.
    pub maximum_value_exclusive: Option<Constraint<Value>>,
    /// Minimum string or array length.
    pub minimum_length: Option<Constraint<usize>>,
    /// Maximum string or array length.
    pub maximum_length: Option<Constraint<usize>>,

    /// String values must match this pattern.
    pub regex_pattern: Option<Constraint<Pattern>>,
    /// String values must not carry leading or trailing whitespace.
    pub must_be_trimmed: Option<Constraint<bool>>,

    /// Value must equal this, using semantic equality for the declared type.
    /// An explicit `null` is a real expectation.
    #[serde(deserialize_with = "constraint::explicit")]
    pub must_equal: Option<Constraint<Value>>,
    /// Value must equal this exactly.
    #[serde(deserialize_with = "constraint::explicit")]
    pub must_equal_strict: Option<Constraint<Value>>,

    /// Value cannot change once the document exists.
    pub immutable: Option<Constraint<bool>>,
    /// As `immutable`, comparing specialized strings by exact text.
    pub immutable_strict: Option<Constraint<bool>>,
    /// Value cannot change once it has been set to something non-null.
    pub immutable_when_set: Option<Constraint<bool>>,
    /// As `immutable_when_set`, comparing specialized strings by exact text.
    pub immutable_when_set_strict: Option<Constraint<bool>>,

    /// Skip every check when the value equals its prior value.
    pub skip_validation_when_value_unchanged: Option<Constraint<bool>>,
    /// As above, comparing specialized strings by exact text.
    pub skip_validation_when_value_unchanged_strict: Option<Constraint<bool>>,

    /// Additional checks supplied in code.
    #[serde(skip)]
    pub custom_validation: Option<CustomValidation>,

    /// Nested schema for `object` values.
    pub property_validators: Option<Constraint<PropertySchema>>,
    /// Tolerate undeclared properties at this object level.
    pub allow_unknown_properties: Option<Constraint<bool>>,

    /// Validator applied to each element of an `array`.
    pub array_elements_validator: Option<Constraint<Box<ItemValidator>>>,

    /// Key constraints for a `hashtable`.
    pub hashtable_keys_validator: Option<Constraint<KeyValidator>>,
    /// Validator applied to each value of a `hashtable`.
    pub hashtable_values_validator: Option<Constraint<Box<ItemValidator>>>,
    /// Minimum hashtable entry count.
    pub minimum_size: Option<Constraint<usize>>,
    /// Maximum hashtable entry count, or maximum attachment size in bytes
    /// for an `attachmentReference`.
    pub maximum_size: Option<Constraint<u64>>,

    /// Allowed file extensions for an `attachmentReference`.
    pub supported_extensions: Option<Constraint<Vec<String>>>,
    /// Allowed content types for an `attachmentReference`.
    pub supported_content_types: Option<Constraint<Vec<String>>>,

    /// Allowed values for an `enum`.
    pub predefined_values: Option<Constraint<Vec<Value>>>,
}

impl ItemValidator {
    /// A validator of the given type with no other constraints.
    #[must_use]
    pub fn of(kind: ValueType) -> Self {
        Self {
            kind: Some(kind.into()),
            ..Self::default()
        }
    }

    /// Marks the item as required.
    #[must_use]
    pub fn required(mut self) -> Self {
        self.required = Some(true.into());
        self
    }

    /// Marks the item as immutable.
    #[must_use]
    pub fn immutable(mut self) -> Self {
        self.immutable = Some(true.into());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn deserializes_camel_case_constraints() -> Result<(), serde_json::Error> {
        let validator: ItemValidator = serde_json::from_value(json!({
            "type": "hashtable",
            "minimumSize": 1,
            "hashtableKeysValidator": { "mustNotBeEmpty": true, "regexPattern": "^[a-z]+$" },
            "hashtableValuesValidator": { "type": "integer", "maximumValue": 10 }
        }))?;

        assert!(matches!(validator.kind, Some(Constraint::Static(ValueType::Hashtable))));
        assert!(matches!(validator.minimum_size, Some(Constraint::Static(1))));
        let Some(Constraint::Static(keys)) = validator.hashtable_keys_validator else {
            unreachable!("key validator should be static");
        };
        assert!(keys.must_not_be_empty);
        assert_eq!(keys.regex_pattern.as_ref().map(Pattern::as_str), Some("^[a-z]+$"));
        Ok(())
    }

    #[test]
    fn unknown_type_tag_is_kept_as_unrecognized() -> Result<(), serde_json::Error> {
        let validator: ItemValidator = serde_json::from_value(json!({ "type": "money" }))?;
        assert!(matches!(validator.kind, Some(Constraint::Static(ValueType::Unrecognized))));
        Ok(())
    }

    #[test]
    fn explicit_null_expectation_is_preserved() -> Result<(), serde_json::Error> {
        let validator: ItemValidator =
            serde_json::from_value(json!({ "type": "string", "mustEqual": null }))?;
        assert!(matches!(validator.must_equal, Some(Constraint::Static(Value::Null))));
        assert!(validator.must_equal_strict.is_none());
        Ok(())
    }

    #[test]
    fn invalid_pattern_fails_to_load() {
        let result: Result<ItemValidator, _> =
            serde_json::from_value(json!({ "type": "string", "regexPattern": "(" }));
        assert!(result.is_err());
    }

    #[test]
    fn semantic_types() {
        assert!(ValueType::Datetime.is_semantic());
        assert!(ValueType::Uuid.is_semantic());
        assert!(!ValueType::String.is_semantic());
        assert_eq!(ValueType::AttachmentReference.to_string(), "attachmentReference");
    }
}

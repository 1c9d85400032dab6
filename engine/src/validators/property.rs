//! The recursive item validator.
//!
//! Each item (an object property, an array element or a hashtable entry) is
//! checked in a fixed order: skip-when-unchanged, custom validation,
//! immutability, equality, then either the present-value checks (length,
//! range, type) or the null-or-missing checks. Objects, arrays and
//! hashtables recurse with a new [`ItemStack`] for each child.

use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::BTreeMap;

use serde_json::Value;
use syncguard_schema::{
    document, Constraint, ConstraintArgs, DocumentDefinition, ItemFrame, ItemValidator,
    PropertySchema, Segment, TypeFilter, ValidationContext, ValueType,
};

use super::{contains_ignore_case, display, enabled, list, resolved};
use crate::compare::{ordering, values_equal, Semantics};
use crate::error::{Error, Result};
use crate::path::ItemStack;
use crate::report::ViolationList;
use crate::temporal;

/// The constraints an attachment-reference property places on the
/// attachment it names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReferenceLimits {
    /// Maximum attachment size in bytes.
    pub maximum_size: Option<u64>,
    /// Allowed file extensions.
    pub supported_extensions: Option<Vec<String>>,
    /// Allowed content types.
    pub supported_content_types: Option<Vec<String>>,
}

/// Attachment names claimed by attachment-reference properties during one
/// validation run.
#[derive(Debug, Clone, Default)]
pub struct AttachmentReferences {
    owners: BTreeMap<String, ReferenceLimits>,
}

impl AttachmentReferences {
    /// Returns the limits of the property that references `name`.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&ReferenceLimits> {
        self.owners.get(name)
    }

    /// Returns true if some property references `name`.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.owners.contains_key(name)
    }

    /// Returns the number of referenced attachments.
    #[must_use]
    pub fn len(&self) -> usize {
        self.owners.len()
    }

    /// Returns true if nothing was referenced.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.owners.is_empty()
    }

    // The first property to claim a name keeps it.
    fn register(&mut self, name: &str, limits: ReferenceLimits) {
        self.owners.entry(name.to_owned()).or_insert(limits);
    }
}

/// Builds the root property schema for a definition.
///
/// Definitions using the simple type filter get a `type` validator
/// (`string`, required, immutable) unless they declare their own.
#[must_use]
pub fn root_schema<'d>(
    definition: &'d DocumentDefinition,
    args: &ConstraintArgs<'_>,
) -> Cow<'d, PropertySchema> {
    let mut schema = definition.property_validators.resolve(args);
    if matches!(definition.type_filter, TypeFilter::Simple) && !schema.contains_key("type") {
        schema.to_mut().insert(
            "type".to_owned(),
            ItemValidator::of(ValueType::String).required().immutable(),
        );
    }
    schema
}

/// Walks a document against a property schema, collecting violations and
/// attachment references.
#[derive(Debug)]
pub struct PropertyValidator<'a> {
    doc: &'a Value,
    old_doc: Option<&'a Value>,
    violations: ViolationList,
    references: AttachmentReferences,
}

impl<'a> PropertyValidator<'a> {
    /// Creates a validator for one write.
    #[must_use]
    pub fn new(doc: &'a Value, old_doc: Option<&'a Value>) -> Self {
        Self {
            doc,
            old_doc,
            violations: ViolationList::new(),
            references: AttachmentReferences::default(),
        }
    }

    /// Validates the document root against `schema`.
    ///
    /// Reserved root properties (`_id`, `_rev`, ...) are never reported as
    /// unsupported.
    ///
    /// # Errors
    ///
    /// Returns a configuration defect ([`Error::UnrecognizedType`] or
    /// [`Error::MissingPredefinedValues`]) as soon as one is met. Ordinary
    /// violations are collected, not returned.
    pub fn validate_root(&mut self, schema: &PropertySchema, allow_unknown: bool) -> Result<()> {
        let stack = ItemStack::root(self.doc, self.live_prior());
        self.validate_object(&stack, schema, allow_unknown, true)
    }

    /// Consumes the validator, returning the violations and the attachment
    /// references it found.
    #[must_use]
    pub fn finish(self) -> (ViolationList, AttachmentReferences) {
        (self.violations, self.references)
    }

    fn live_prior(&self) -> Option<&'a Value> {
        self.old_doc
            .filter(|old| !document::is_missing_or_deleted(Some(*old)))
    }

    fn args(&self, frame: &ItemFrame<'a>) -> ConstraintArgs<'a> {
        ConstraintArgs {
            doc: self.doc,
            old_doc: self.old_doc,
            value: frame.value,
            old_value: frame.old_value,
        }
    }

    fn validate_object(
        &mut self,
        stack: &ItemStack<'a>,
        schema: &PropertySchema,
        allow_unknown: bool,
        at_root: bool,
    ) -> Result<()> {
        let frame = stack.top();
        let object = frame.value.and_then(Value::as_object);
        let old_object = frame.old_value.and_then(Value::as_object);

        for (name, validator) in schema {
            let child = stack.child(
                Segment::Property(name.clone()),
                object.and_then(|object| object.get(name)),
                old_object.and_then(|object| object.get(name)),
            );
            self.validate_item(&child, validator)?;
        }

        if allow_unknown {
            return Ok(());
        }
        for key in object.into_iter().flat_map(|object| object.keys()) {
            if schema.contains_key(key) || (at_root && document::is_reserved(key)) {
                continue;
            }
            let path = stack.path_with(&Segment::Property(key.clone()));
            self.violations.push(format!("property \"{path}\" is not supported"));
        }
        Ok(())
    }

    fn validate_item(&mut self, stack: &ItemStack<'a>, validator: &ItemValidator) -> Result<()> {
        let frame = stack.top();
        let (value, old_value) = (frame.value, frame.old_value);
        let args = self.args(frame);
        let kind = resolved(&validator.kind, &args).map(|kind| *kind);
        let has_prior = self.live_prior().is_some();
        let declared = Semantics::Declared { validator, args };

        if has_prior
            && ((enabled(&validator.skip_validation_when_value_unchanged, &args)
                && values_equal(value, old_value, declared))
                || (enabled(&validator.skip_validation_when_value_unchanged_strict, &args)
                    && values_equal(value, old_value, Semantics::Strict)))
        {
            return Ok(());
        }

        if let Some(custom) = &validator.custom_validation {
            let context = ValidationContext {
                doc: self.doc,
                old_doc: self.old_doc,
                item: frame,
                ancestors: stack.ancestors(),
            };
            self.violations.extend(custom.call(&context));
        }

        if has_prior && self.was_modified(validator, &args) {
            let path = stack.path();
            self.violations.push(format!("item \"{path}\" cannot be modified"));
        }

        let equality = [
            (&validator.must_equal, declared),
            (&validator.must_equal_strict, Semantics::Strict),
        ];
        for (constraint, semantics) in equality {
            let Some(expected) = resolved(constraint, &args) else {
                continue;
            };
            if !values_equal(value, Some(&*expected), semantics) {
                let path = stack.path();
                self.violations.push(format!("value of item \"{path}\" must equal {expected}"));
            }
        }

        match value.filter(|value| !value.is_null()) {
            Some(present) => self.validate_present(stack, validator, present, kind, &args),
            None => {
                self.validate_absent(stack, validator, &args);
                Ok(())
            }
        }
    }

    fn was_modified(&self, validator: &ItemValidator, args: &ConstraintArgs<'a>) -> bool {
        let declared = Semantics::Declared {
            validator,
            args: *args,
        };
        let changed = |semantics| !values_equal(args.value, args.old_value, semantics);
        let was_set = args.old_value.is_some_and(|old| !old.is_null());
        (enabled(&validator.immutable, args) && changed(declared))
            || (enabled(&validator.immutable_strict, args) && changed(Semantics::Strict))
            || (was_set && enabled(&validator.immutable_when_set, args) && changed(declared))
            || (was_set
                && enabled(&validator.immutable_when_set_strict, args)
                && changed(Semantics::Strict))
    }

    fn validate_absent(
        &mut self,
        stack: &ItemStack<'a>,
        validator: &ItemValidator,
        args: &ConstraintArgs<'a>,
    ) {
        let path = stack.path();
        if enabled(&validator.required, args) {
            self.violations.push(format!("item \"{path}\" must not be null or missing"));
        } else if enabled(&validator.must_not_be_missing, args) && args.value.is_none() {
            self.violations.push(format!("item \"{path}\" must not be missing"));
        } else if enabled(&validator.must_not_be_null, args) && args.value.is_some() {
            self.violations.push(format!("item \"{path}\" must not be null"));
        }
    }

    fn validate_present(
        &mut self,
        stack: &ItemStack<'a>,
        validator: &ItemValidator,
        present: &'a Value,
        kind: Option<ValueType>,
        args: &ConstraintArgs<'a>,
    ) -> Result<()> {
        let path = stack.path();
        let kind = kind.ok_or_else(|| Error::UnrecognizedType { path: path.clone() })?;

        self.check_length(validator, present, &path, args);
        self.check_range(validator, present, kind, &path, args);
        self.check_type(stack, validator, present, kind, path, args)
    }

    fn check_length(
        &mut self,
        validator: &ItemValidator,
        present: &Value,
        path: &str,
        args: &ConstraintArgs<'a>,
    ) {
        let length = match present {
            Value::String(text) => text.chars().count(),
            Value::Array(elements) => elements.len(),
            _ => return,
        };
        if length == 0 && enabled(&validator.must_not_be_empty, args) {
            self.violations.push(format!("item \"{path}\" must not be empty"));
        }
        if let Some(minimum) = resolved(&validator.minimum_length, args) {
            if length < *minimum {
                self.violations.push(format!(
                    "length of item \"{path}\" must not be less than {minimum}"
                ));
            }
        }
        if let Some(maximum) = resolved(&validator.maximum_length, args) {
            if length > *maximum {
                self.violations.push(format!(
                    "length of item \"{path}\" must not be greater than {maximum}"
                ));
            }
        }
    }

    fn check_range(
        &mut self,
        validator: &ItemValidator,
        present: &Value,
        kind: ValueType,
        path: &str,
        args: &ConstraintArgs<'a>,
    ) {
        let bounds: [(&Option<Constraint<Value>>, &[Ordering], &str); 4] = [
            (&validator.minimum_value, &[Ordering::Less], "must not be less than"),
            (
                &validator.minimum_value_exclusive,
                &[Ordering::Less, Ordering::Equal],
                "must be greater than",
            ),
            (&validator.maximum_value, &[Ordering::Greater], "must not be greater than"),
            (
                &validator.maximum_value_exclusive,
                &[Ordering::Greater, Ordering::Equal],
                "must be less than",
            ),
        ];
        for (constraint, failing, phrase) in bounds {
            let Some(bound) = resolved(constraint, args) else {
                continue;
            };
            if ordering(present, &bound, kind).is_some_and(|order| failing.contains(&order)) {
                self.violations.push(format!("item \"{path}\" {phrase} {}", display(&bound)));
            }
        }
    }

    fn check_type(
        &mut self,
        stack: &ItemStack<'a>,
        validator: &ItemValidator,
        present: &'a Value,
        kind: ValueType,
        path: String,
        args: &ConstraintArgs<'a>,
    ) -> Result<()> {
        let expectation = match kind {
            ValueType::String => {
                self.check_string(validator, present, &path, args);
                None
            }
            ValueType::Integer => (!is_integer(present)).then_some("must be an integer"),
            ValueType::Float => {
                (!present.is_number()).then_some("must be a floating point or integer number")
            }
            ValueType::Boolean => (!present.is_boolean()).then_some("must be a boolean"),
            ValueType::Date => (!string_matches(present, |text| {
                temporal::parse_date(text).is_some()
            }))
            .then_some("must be an ISO 8601 date string with no time or time zone components"),
            ValueType::Datetime => (!string_matches(present, |text| {
                temporal::parse_datetime(text).is_some()
            }))
            .then_some(
                "must be an ISO 8601 date string with optional time and time zone components",
            ),
            ValueType::Time => (!string_matches(present, |text| {
                temporal::parse_time(text).is_some()
            }))
            .then_some("must be an ISO 8601 time string with no date or time zone components"),
            ValueType::Timezone => (!string_matches(present, |text| {
                temporal::parse_timezone(text).is_some()
            }))
            .then_some("must be an ISO 8601 time zone"),
            ValueType::Uuid => {
                (!string_matches(present, temporal::is_uuid)).then_some("must be a UUID string")
            }
            ValueType::Enum => {
                self.check_enum(validator, present, &path, args)?;
                None
            }
            ValueType::Object => {
                if present.is_object() {
                    if let Some(schema) = resolved(&validator.property_validators, args) {
                        let allow_unknown = enabled(&validator.allow_unknown_properties, args);
                        self.validate_object(stack, &schema, allow_unknown, false)?;
                    }
                    None
                } else {
                    Some("must be an object")
                }
            }
            ValueType::Array => match present.as_array() {
                Some(elements) => {
                    if let Some(element_validator) =
                        resolved(&validator.array_elements_validator, args)
                    {
                        let old_elements = args.old_value.and_then(Value::as_array);
                        for (index, element) in elements.iter().enumerate() {
                            let child = stack.child(
                                Segment::Index(index),
                                Some(element),
                                old_elements.and_then(|old| old.get(index)),
                            );
                            self.validate_item(&child, &element_validator)?;
                        }
                    }
                    None
                }
                None => Some("must be an array"),
            },
            ValueType::Hashtable => {
                if present.is_object() {
                    self.check_hashtable(stack, validator, present, &path, args)?;
                    None
                } else {
                    Some("must be an object/hashtable")
                }
            }
            ValueType::AttachmentReference => match present.as_str() {
                Some(name) => {
                    self.check_attachment_reference(validator, name, &path, args);
                    None
                }
                None => Some("must be an attachment reference string"),
            },
            ValueType::Unrecognized => return Err(Error::UnrecognizedType { path }),
        };
        if let Some(expectation) = expectation {
            self.violations.push(format!("item \"{path}\" {expectation}"));
        }
        Ok(())
    }

    fn check_string(
        &mut self,
        validator: &ItemValidator,
        present: &Value,
        path: &str,
        args: &ConstraintArgs<'a>,
    ) {
        let Some(text) = present.as_str() else {
            self.violations.push(format!("item \"{path}\" must be a string"));
            return;
        };
        if let Some(pattern) = resolved(&validator.regex_pattern, args) {
            if !pattern.is_match(text) {
                self.violations.push(format!(
                    "item \"{path}\" must conform to expected format {}",
                    pattern.as_str()
                ));
            }
        }
        if enabled(&validator.must_be_trimmed, args) && text.trim() != text {
            self.violations.push(format!(
                "item \"{path}\" must not have any leading or trailing whitespace"
            ));
        }
    }

    fn check_enum(
        &mut self,
        validator: &ItemValidator,
        present: &Value,
        path: &str,
        args: &ConstraintArgs<'a>,
    ) -> Result<()> {
        let Some(predefined) =
            resolved(&validator.predefined_values, args).filter(|values| !values.is_empty())
        else {
            return Err(Error::MissingPredefinedValues {
                path: path.to_owned(),
            });
        };
        if !predefined
            .iter()
            .any(|candidate| values_equal(Some(present), Some(candidate), Semantics::Strict))
        {
            let allowed: Vec<String> = predefined.iter().map(display).collect();
            self.violations.push(format!(
                "item \"{path}\" must be one of the predefined values: {}",
                allowed.join(",")
            ));
        }
        Ok(())
    }

    fn check_hashtable(
        &mut self,
        stack: &ItemStack<'a>,
        validator: &ItemValidator,
        present: &'a Value,
        path: &str,
        args: &ConstraintArgs<'a>,
    ) -> Result<()> {
        let Some(entries) = present.as_object() else {
            return Ok(());
        };
        let keys_validator = resolved(&validator.hashtable_keys_validator, args);
        let values_validator = resolved(&validator.hashtable_values_validator, args);
        let old_entries = args.old_value.and_then(Value::as_object);

        for (key, entry) in entries {
            if let Some(keys) = &keys_validator {
                if keys.must_not_be_empty && key.is_empty() {
                    self.violations
                        .push(format!("empty hashtable key in item \"{path}\" is not allowed"));
                }
                if let Some(pattern) = &keys.regex_pattern {
                    if !pattern.is_match(key) {
                        let key_path = stack.path_with(&Segment::Key(key.clone()));
                        self.violations.push(format!(
                            "hashtable key \"{key_path}\" does not conform to expected format {}",
                            pattern.as_str()
                        ));
                    }
                }
            }
            if let Some(values) = &values_validator {
                let child = stack.child(
                    Segment::Key(key.clone()),
                    Some(entry),
                    old_entries.and_then(|old| old.get(key)),
                );
                self.validate_item(&child, values)?;
            }
        }

        let size = entries.len();
        if let Some(minimum) = resolved(&validator.minimum_size, args) {
            if size < *minimum {
                self.violations
                    .push(format!("hashtable \"{path}\" must not be smaller than {minimum}"));
            }
        }
        if let Some(maximum) = resolved(&validator.maximum_size, args) {
            if u64::try_from(size).map_or(true, |size| size > *maximum) {
                self.violations
                    .push(format!("hashtable \"{path}\" must not be larger than {maximum}"));
            }
        }
        Ok(())
    }

    /// Checks the referenced name and, when the attachment has already
    /// arrived, its metadata. The attachment may also arrive in a later
    /// write, so its absence is not a violation.
    fn check_attachment_reference(
        &mut self,
        validator: &ItemValidator,
        name: &str,
        path: &str,
        args: &ConstraintArgs<'a>,
    ) {
        let limits = ReferenceLimits {
            maximum_size: resolved(&validator.maximum_size, args).map(|size| *size),
            supported_extensions: resolved(&validator.supported_extensions, args)
                .map(Cow::into_owned),
            supported_content_types: resolved(&validator.supported_content_types, args)
                .map(Cow::into_owned),
        };

        if let Some(extensions) = &limits.supported_extensions {
            let supported = document::extension(name)
                .is_some_and(|extension| contains_ignore_case(extensions, &extension));
            if !supported {
                self.violations.push(format!(
                    "attachment reference \"{path}\" must have a supported file extension ({})",
                    list(extensions)
                ));
            }
        }

        if let Some(attachment) = document::attachment(self.doc, name) {
            if let Some(content_types) = &limits.supported_content_types {
                let supported = attachment
                    .content_type
                    .is_some_and(|content_type| contains_ignore_case(content_types, content_type));
                if !supported {
                    self.violations.push(format!(
                        "attachment reference \"{path}\" must have a supported content type ({})",
                        list(content_types)
                    ));
                }
            }
            if let Some(maximum) = limits.maximum_size {
                if attachment.length > maximum {
                    self.violations.push(format!(
                        "attachment reference \"{path}\" must not be larger than {maximum} bytes"
                    ));
                }
            }
        }

        self.references.register(name, limits);
    }
}

/// True for any number without a fractional part, including `5.0`.
fn is_integer(value: &Value) -> bool {
    match value {
        Value::Number(number) => {
            number.is_i64()
                || number.is_u64()
                || number.as_f64().is_some_and(|float| float.fract() == 0.0)
        }
        _ => false,
    }
}

fn string_matches(value: &Value, accepts: impl Fn(&str) -> bool) -> bool {
    value.as_str().is_some_and(accepts)
}

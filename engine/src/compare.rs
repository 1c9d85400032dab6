//! Type-aware equality and ordering of document values.
//!
//! Null and missing are interchangeable for equality. Arrays compare
//! element-wise in order; maps compare over the union of their keys. Under
//! [`Semantics::Declared`], strings whose validator declares a specialized
//! string type compare by parsed value at any depth, so
//! `2024-03-01T12:00Z` equals `2024-03-01T14:00+02:00` as datetimes.
//! [`Semantics::Strict`] compares exact text everywhere.

use std::cmp::Ordering;

use serde_json::{Number, Value};
use syncguard_schema::{ConstraintArgs, ItemValidator, ValueType};

use crate::temporal;
use crate::validators::resolved;

/// How strings inside the compared values are interpreted.
#[derive(Debug, Clone, Copy)]
pub enum Semantics<'a> {
    /// Exact text at every depth.
    Strict,
    /// The given type applies to the top-level value only.
    Kind(ValueType),
    /// Types come from the validator tree: element, member and hashtable
    /// value validators govern the values they describe.
    Declared {
        /// Validator of the compared item.
        validator: &'a ItemValidator,
        /// Arguments for resolving the validator's constraints.
        args: ConstraintArgs<'a>,
    },
}

impl Semantics<'_> {
    fn kind(self) -> Option<ValueType> {
        match self {
            Self::Strict => None,
            Self::Kind(kind) => Some(kind),
            Self::Declared { validator, args } => {
                resolved(&validator.kind, &args).map(|kind| *kind)
            }
        }
    }
}

/// Semantics for a child value: declared when the parent is declared and
/// a child validator exists, strict otherwise.
fn nested<'c>(
    parent: Semantics<'c>,
    validator: Option<&'c ItemValidator>,
    left: Option<&'c Value>,
    right: Option<&'c Value>,
) -> Semantics<'c> {
    match (parent, validator) {
        (Semantics::Declared { args, .. }, Some(validator)) => Semantics::Declared {
            validator,
            args: ConstraintArgs {
                value: left,
                old_value: right,
                ..args
            },
        },
        _ => Semantics::Strict,
    }
}

fn is_absent(value: Option<&Value>) -> bool {
    value.map_or(true, Value::is_null)
}

/// Deep equality of two possibly-missing values.
#[must_use]
pub fn values_equal(
    left: Option<&Value>,
    right: Option<&Value>,
    semantics: Semantics<'_>,
) -> bool {
    match (left, right) {
        (left, right) if is_absent(left) || is_absent(right) => {
            is_absent(left) && is_absent(right)
        }
        (Some(left), Some(right)) => present_equal(left, right, semantics),
        _ => false,
    }
}

fn present_equal(left: &Value, right: &Value, semantics: Semantics<'_>) -> bool {
    let kind = semantics.kind();
    match (left, right) {
        (Value::Array(left), Value::Array(right)) => {
            let elements = match semantics {
                Semantics::Declared { validator, args } if kind == Some(ValueType::Array) => {
                    resolved(&validator.array_elements_validator, &args)
                }
                _ => None,
            };
            let element = elements.as_deref().map(|element| &**element);
            left.len() == right.len()
                && left.iter().zip(right).all(|(l, r)| {
                    values_equal(Some(l), Some(r), nested(semantics, element, Some(l), Some(r)))
                })
        }
        (Value::Object(left), Value::Object(right)) => {
            let (schema, values) = match semantics {
                Semantics::Declared { validator, args } => (
                    if kind == Some(ValueType::Object) {
                        resolved(&validator.property_validators, &args)
                    } else {
                        None
                    },
                    if kind == Some(ValueType::Hashtable) {
                        resolved(&validator.hashtable_values_validator, &args)
                    } else {
                        None
                    },
                ),
                _ => (None, None),
            };
            let values = values.as_deref().map(|values| &**values);
            left.keys().chain(right.keys()).all(|key| {
                let member = schema.as_deref().and_then(|schema| schema.get(key)).or(values);
                let (l, r) = (left.get(key), right.get(key));
                values_equal(l, r, nested(semantics, member, l, r))
            })
        }
        (Value::String(left), Value::String(right)) => match kind {
            Some(kind) if kind.is_semantic() => strings_equivalent(left, right, kind),
            _ => left == right,
        },
        (Value::Number(left), Value::Number(right)) => {
            numeric_ordering(left, right) == Some(Ordering::Equal)
        }
        (left, right) => left == right,
    }
}

/// Semantic string equality; falls back to exact text when either side does
/// not parse.
fn strings_equivalent(left: &str, right: &str, kind: ValueType) -> bool {
    if kind == ValueType::Uuid {
        return if temporal::is_uuid(left) && temporal::is_uuid(right) {
            left.eq_ignore_ascii_case(right)
        } else {
            left == right
        };
    }
    match temporal::compare(kind, left, right) {
        Some(ordering) => ordering == Ordering::Equal,
        None => left == right,
    }
}

fn numeric_ordering(left: &Number, right: &Number) -> Option<Ordering> {
    match (left.as_i64(), right.as_i64()) {
        (Some(left), Some(right)) => Some(left.cmp(&right)),
        _ => match (left.as_u64(), right.as_u64()) {
            (Some(left), Some(right)) => Some(left.cmp(&right)),
            _ => left.as_f64()?.partial_cmp(&right.as_f64()?),
        },
    }
}

/// Orders a value against a range bound.
///
/// Numbers compare numerically. Temporal types compare parsed strings and
/// yield `None` when either side fails to parse, leaving the format error to
/// the type check. Other strings compare lexically. Mismatched kinds are
/// unordered.
#[must_use]
pub fn ordering(value: &Value, bound: &Value, kind: ValueType) -> Option<Ordering> {
    match (value, bound) {
        (Value::String(value), Value::String(bound)) => match kind {
            ValueType::Date | ValueType::Datetime | ValueType::Time | ValueType::Timezone => {
                temporal::compare(kind, value, bound)
            }
            _ => Some(value.as_str().cmp(bound.as_str())),
        },
        (Value::Number(value), Value::Number(bound)) => numeric_ordering(value, bound),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const STRICT: Semantics<'static> = Semantics::Strict;

    #[test]
    fn null_and_missing_are_equal() {
        assert!(values_equal(None, Some(&Value::Null), STRICT));
        assert!(values_equal(None, None, STRICT));
        assert!(!values_equal(None, Some(&json!(0)), STRICT));
    }

    #[test]
    fn arrays_are_order_sensitive() {
        let a = json!([1, 2, 3]);
        let b = json!([3, 2, 1]);
        assert!(values_equal(Some(&a), Some(&a.clone()), STRICT));
        assert!(!values_equal(Some(&a), Some(&b), STRICT));
        assert!(!values_equal(Some(&a), Some(&json!([1, 2])), STRICT));
    }

    #[test]
    fn objects_compare_over_key_union() {
        let a = json!({ "x": 1, "y": null });
        let b = json!({ "x": 1 });
        assert!(values_equal(Some(&a), Some(&b), STRICT));
        assert!(!values_equal(Some(&a), Some(&json!({ "x": 1, "z": 2 })), STRICT));
        assert!(!values_equal(Some(&json!([])), Some(&json!({})), STRICT));
    }

    #[test]
    fn numbers_compare_by_value_without_coercion() {
        assert!(values_equal(Some(&json!(1)), Some(&json!(1.0)), STRICT));
        assert!(!values_equal(Some(&json!(1)), Some(&json!("1")), STRICT));
    }

    #[test]
    fn semantic_datetime_equality_and_strict_override() {
        let utc = json!("2024-03-01T12:00:00Z");
        let plus_two = json!("2024-03-01T14:00:00+02:00");
        let datetime = Semantics::Kind(ValueType::Datetime);
        assert!(values_equal(Some(&utc), Some(&plus_two), datetime));
        assert!(!values_equal(Some(&utc), Some(&plus_two), STRICT));
        assert!(!values_equal(Some(&utc), Some(&plus_two), Semantics::Kind(ValueType::String)));
    }

    #[test]
    fn uuid_equality_ignores_case() {
        let lower = json!("1511fba4-e039-42cc-9ac2-9f2fa29eecfc");
        let upper = json!("1511FBA4-E039-42CC-9AC2-9F2FA29EECFC");
        assert!(values_equal(Some(&lower), Some(&upper), Semantics::Kind(ValueType::Uuid)));
        assert!(!values_equal(Some(&lower), Some(&upper), STRICT));
    }

    #[test]
    fn unparseable_semantic_strings_fall_back_to_text() {
        let bad = json!("yesterday");
        let date = Semantics::Kind(ValueType::Date);
        assert!(values_equal(Some(&bad), Some(&bad), date));
        assert!(!values_equal(Some(&bad), Some(&json!("today")), date));
    }

    #[test]
    fn bare_kind_does_not_reach_nested_strings() {
        let utc = json!(["2024-03-01T12:00:00Z"]);
        let plus_two = json!(["2024-03-01T14:00:00+02:00"]);
        let datetime = Semantics::Kind(ValueType::Datetime);
        assert!(!values_equal(Some(&utc), Some(&plus_two), datetime));
    }

    #[test]
    fn declared_types_apply_at_every_depth() -> Result<(), serde_json::Error> {
        let validator: ItemValidator = serde_json::from_value(json!({
            "type": "object",
            "propertyValidators": {
                "times": { "type": "array", "arrayElementsValidator": { "type": "datetime" } },
                "ids": { "type": "hashtable", "hashtableValuesValidator": { "type": "uuid" } },
                "label": { "type": "string" }
            }
        }))?;
        let old = json!({
            "times": ["2024-03-01T12:00:00Z"],
            "ids": { "a": "1511fba4-e039-42cc-9ac2-9f2fa29eecfc" },
            "label": "x"
        });
        let doc = json!({
            "times": ["2024-03-01T14:00:00+02:00"],
            "ids": { "a": "1511FBA4-E039-42CC-9AC2-9F2FA29EECFC" },
            "label": "x"
        });
        let declared = Semantics::Declared {
            validator: &validator,
            args: ConstraintArgs::for_document(&doc, Some(&old)),
        };
        assert!(values_equal(Some(&doc), Some(&old), declared));
        assert!(!values_equal(Some(&doc), Some(&old), STRICT));

        let relabeled = json!({ "times": doc["times"], "ids": doc["ids"], "label": "X" });
        assert!(!values_equal(Some(&relabeled), Some(&old), declared));
        Ok(())
    }

    #[test]
    fn range_ordering() {
        assert_eq!(ordering(&json!(0), &json!(1), ValueType::Integer), Some(Ordering::Less));
        assert_eq!(ordering(&json!(2.5), &json!(2), ValueType::Float), Some(Ordering::Greater));
        assert_eq!(ordering(&json!("b"), &json!("a"), ValueType::String), Some(Ordering::Greater));
        assert_eq!(
            ordering(&json!("2024-01-02"), &json!("2024-01-10"), ValueType::Date),
            Some(Ordering::Less)
        );
        assert_eq!(ordering(&json!("garbage"), &json!("2024-01-10"), ValueType::Date), None);
        assert_eq!(ordering(&json!("5"), &json!(1), ValueType::Integer), None);
    }
}

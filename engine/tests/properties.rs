//! Property-based tests for the comparator and the write decision.
//!
//! Uses proptest to check that deep equality is reflexive, symmetric and
//! order-sensitive, that equivalent datetimes compare equal only under
//! semantic comparison, and that decisions are deterministic and stable
//! when a valid document is resubmitted over itself.

use chrono::{DateTime, FixedOffset, Utc};
use proptest::prelude::*;
use serde_json::{json, Map, Value};
use syncguard::compare::{values_equal, Semantics};
use syncguard::schema::ValueType;
use syncguard::SyncFunction;
use syncguard_test_helpers::{single_type, RecordingHost};

fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        any::<i64>().prop_map(Value::from),
        "[a-z0-9 ]{0,8}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 24, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("[a-c]{1,2}", inner, 0..4)
                .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

fn task_document() -> impl Strategy<Value = Value> {
    prop::collection::btree_map(
        prop_oneof![
            Just("type".to_owned()),
            Just("title".to_owned()),
            Just("points".to_owned()),
            Just("tags".to_owned()),
            Just("extra".to_owned()),
        ],
        json_value(),
        0..5,
    )
    .prop_map(|entries| Value::Object(entries.into_iter().collect::<Map<_, _>>()))
}

fn task_sync() -> SyncFunction {
    let registry = single_type(
        "task",
        json!({
            "channels": { "write": "tasks" },
            "propertyValidators": {
                "title": { "type": "string", "required": true, "maximumLength": 6 },
                "points": { "type": "integer", "minimumValue": 0, "immutableWhenSet": true },
                "tags": {
                    "type": "array",
                    "immutable": true,
                    "arrayElementsValidator": { "type": "string", "mustNotBeEmpty": true }
                }
            }
        }),
    );
    SyncFunction::new(registry.unwrap_or_default())
}

// =============================================================================
// Comparator Laws
// =============================================================================

proptest! {
    /// Every value equals itself.
    #[test]
    fn prop_equality_reflexive(value in json_value()) {
        prop_assert!(values_equal(Some(&value), Some(&value), Semantics::Strict));
    }

    /// Equality does not depend on argument order.
    #[test]
    fn prop_equality_symmetric(left in json_value(), right in json_value()) {
        prop_assert_eq!(
            values_equal(Some(&left), Some(&right), Semantics::Strict),
            values_equal(Some(&right), Some(&left), Semantics::Strict)
        );
    }

    /// Reversing a non-palindromic array breaks equality.
    #[test]
    fn prop_arrays_order_sensitive(elements in prop::collection::vec(any::<i32>(), 2..6)) {
        let reversed: Vec<i32> = elements.iter().rev().copied().collect();
        prop_assume!(reversed != elements);
        prop_assert!(!values_equal(
            Some(&json!(elements)),
            Some(&json!(reversed)),
            Semantics::Strict
        ));
    }

    /// The same instant written with different offsets is equal as a
    /// datetime and unequal as text.
    #[test]
    fn prop_equivalent_offsets(seconds in 0i64..4_000_000_000, hours in -12i32..=14) {
        let utc = DateTime::<Utc>::from_timestamp(seconds, 0);
        let zone = FixedOffset::east_opt(hours * 3600);
        prop_assume!(utc.is_some() && zone.is_some());
        if let (Some(utc), Some(zone)) = (utc, zone) {
            let plain = json!(utc.format("%Y-%m-%dT%H:%M:%SZ").to_string());
            let shifted = utc.with_timezone(&zone).format("%Y-%m-%dT%H:%M:%S%:z");
            let shifted = json!(shifted.to_string());
            let datetime = Semantics::Kind(ValueType::Datetime);
            prop_assert!(values_equal(Some(&plain), Some(&shifted), datetime));
            prop_assert!(!values_equal(Some(&plain), Some(&shifted), Semantics::Strict));
        }
    }
}

// =============================================================================
// Decision Properties
// =============================================================================

proptest! {
    /// The same write yields the same outcome and the same host calls.
    #[test]
    fn prop_decisions_deterministic(mut doc in task_document()) {
        if let Some(fields) = doc.as_object_mut() {
            fields.insert("type".into(), json!("task"));
        }
        let sync = task_sync();
        let (mut first, mut second) = (RecordingHost::new(), RecordingHost::new());
        prop_assert_eq!(
            sync.evaluate(&doc, None, &mut first),
            sync.evaluate(&doc, None, &mut second)
        );
        prop_assert_eq!(first.calls, second.calls);
    }

    /// A document that passes also passes when resubmitted over itself.
    #[test]
    fn prop_unchanged_resubmission_passes(
        title in "[a-z]{1,6}",
        points in prop::option::of(0i64..100),
        tags in prop::collection::vec("[a-z]{1,4}", 0..3),
    ) {
        let mut doc = json!({ "_id": "t", "type": "task", "title": title, "tags": tags });
        if let (Some(points), Some(fields)) = (points, doc.as_object_mut()) {
            fields.insert("points".into(), json!(points));
        }
        let sync = task_sync();
        let mut host = RecordingHost::new();
        prop_assert!(sync.evaluate(&doc, None, &mut host).is_ok());
        prop_assert!(sync.evaluate(&doc, Some(&doc), &mut host).is_ok());
    }
}

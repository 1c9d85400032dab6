//! End-to-end write decisions against a recording host.
//!
//! Each test loads definitions from JSON, runs one or more writes through
//! [`SyncFunction::evaluate`] and asserts on both the outcome and the host
//! calls the engine made.

use serde_json::json;
use syncguard::schema::{AccessGrant, Expiry, RequiredAccess};
use syncguard::{Error, SyncFunction, WriteOutcome};
use syncguard_test_helpers::{registry, single_type, HostCall, RecordingHost};

fn invalid(doc_type: &str, violations: &[&str]) -> Error {
    Error::Invalid {
        doc_type: doc_type.to_owned(),
        violations: violations.iter().map(|v| (*v).to_owned()).collect(),
    }
}

// =============================================================================
// Content Validation
// =============================================================================

#[test]
fn integer_minimum() -> anyhow::Result<()> {
    let sync = SyncFunction::new(single_type(
        "counter",
        json!({ "propertyValidators": { "count": { "type": "integer", "minimumValue": 1 } } }),
    )?);
    let mut host = RecordingHost::new();

    let low = json!({ "_id": "c", "type": "counter", "count": 0 });
    let err = sync.evaluate(&low, None, &mut host);
    assert_eq!(err, Err(invalid("counter", &["item \"count\" must not be less than 1"])));
    assert_eq!(
        err.err().and_then(|err| err.forbidden()).as_deref(),
        Some("Invalid counter document: item \"count\" must not be less than 1")
    );

    let ok = json!({ "_id": "c", "type": "counter", "count": 5 });
    assert!(matches!(sync.evaluate(&ok, None, &mut host)?, WriteOutcome::Accepted(_)));
    Ok(())
}

#[test]
fn immutable_array_on_replace() -> anyhow::Result<()> {
    let sync = SyncFunction::new(single_type(
        "list",
        json!({ "propertyValidators": { "items": { "type": "array", "immutable": true } } }),
    )?);
    let mut host = RecordingHost::new();
    let old = json!({ "_id": "l", "type": "list", "items": [1, 2, 3] });

    let same = json!({ "_id": "l", "type": "list", "items": [1.0, 2, 3] });
    assert!(sync.evaluate(&same, Some(&old), &mut host).is_ok());

    let reordered = json!({ "_id": "l", "type": "list", "items": [3, 2, 1] });
    assert_eq!(
        sync.evaluate(&reordered, Some(&old), &mut host),
        Err(invalid("list", &["item \"items\" cannot be modified"]))
    );
    Ok(())
}

#[test]
fn single_unknown_property_regardless_of_siblings() -> anyhow::Result<()> {
    let sync = SyncFunction::new(single_type(
        "profile",
        json!({
            "propertyValidators": {
                "name": { "type": "string" },
                "age": { "type": "integer" }
            }
        }),
    )?);
    let mut host = RecordingHost::new();
    let doc = json!({
        "_id": "p",
        "_rev": "2-b",
        "type": "profile",
        "name": "ann",
        "nickname": "a"
    });
    let Err(Error::Invalid { violations, .. }) = sync.evaluate(&doc, None, &mut host) else {
        unreachable!("an undeclared property must be reported");
    };
    assert_eq!(violations, ["property \"nickname\" is not supported"]);

    let with_bad_sibling = json!({ "type": "profile", "age": "old", "nickname": "a" });
    let Err(Error::Invalid { violations, .. }) = sync.evaluate(&with_bad_sibling, None, &mut host)
    else {
        unreachable!("both violations must be reported");
    };
    let unknown: Vec<_> = violations
        .iter()
        .filter(|violation| violation.contains("nickname"))
        .collect();
    assert_eq!(unknown, ["property \"nickname\" is not supported"]);
    assert_eq!(violations.len(), 2);
    Ok(())
}

#[test]
fn reference_limit_wins_over_document_limit() -> anyhow::Result<()> {
    let sync = SyncFunction::new(single_type(
        "asset",
        json!({
            "allowAttachments": true,
            "attachmentConstraints": { "maximumIndividualSize": 100 },
            "propertyValidators": {
                "logo": {
                    "type": "attachmentReference",
                    "supportedExtensions": ["png", "jpg"],
                    "maximumSize": 200
                }
            }
        }),
    )?);
    let mut host = RecordingHost::new();
    let doc = json!({
        "_id": "a",
        "type": "asset",
        "logo": "logo.png",
        "_attachments": { "logo.png": { "content_type": "image/png", "length": 250 } }
    });
    assert_eq!(
        sync.evaluate(&doc, None, &mut host),
        Err(invalid(
            "asset",
            &["attachment reference \"logo\" must not be larger than 200 bytes"]
        ))
    );
    Ok(())
}

#[test]
fn type_cannot_change_on_replace() -> anyhow::Result<()> {
    let sync = SyncFunction::new(registry(&json!([
        { "name": "note", "definition": {} },
        { "name": "memo", "definition": {} }
    ]))?);
    let mut host = RecordingHost::new();
    let old = json!({ "_id": "n", "type": "note" });
    let doc = json!({ "_id": "n", "type": "memo" });
    assert_eq!(sync.evaluate(&doc, Some(&old), &mut host), Err(Error::UnknownType));
    assert!(host.calls.is_empty());
    Ok(())
}

#[test]
fn deletion_checks_only_document_constraints() -> anyhow::Result<()> {
    let sync = SyncFunction::new(single_type(
        "ledger",
        json!({
            "cannotDelete": true,
            "propertyValidators": { "total": { "type": "integer", "required": true } }
        }),
    )?);
    let mut host = RecordingHost::new();
    let old = json!({ "_id": "l", "type": "ledger", "total": 3 });
    let tombstone = json!({ "_id": "l", "_deleted": true });
    assert_eq!(
        sync.evaluate(&tombstone, Some(&old), &mut host),
        Err(invalid("ledger", &["documents of this type cannot be deleted"]))
    );
    Ok(())
}

// =============================================================================
// Failure Classes
// =============================================================================

#[test]
fn host_denial_propagates_unchanged() -> anyhow::Result<()> {
    let sync = SyncFunction::new(single_type("secret", json!({ "authorizedRoles": "admin" }))?);
    let mut host = RecordingHost::denying("missing role");
    let doc = json!({ "_id": "s", "type": "secret", "extra": 1 });
    let err = sync.evaluate(&doc, None, &mut host);
    assert!(matches!(
        &err,
        Err(Error::AccessDenied(rejection)) if rejection.message == "missing role"
    ));
    assert_eq!(
        host.calls,
        [HostCall::RequireAccess(RequiredAccess {
            roles: Some(vec!["admin".into()]),
            ..RequiredAccess::default()
        })]
    );
    Ok(())
}

#[test]
fn configuration_defects_are_distinct() -> anyhow::Result<()> {
    let sync = SyncFunction::new(single_type(
        "broken",
        json!({ "propertyValidators": { "amount": { "type": "money", "required": true } } }),
    )?);
    let mut host = RecordingHost::new();
    let doc = json!({ "_id": "b", "type": "broken", "amount": 3 });
    let Err(err) = sync.evaluate(&doc, None, &mut host) else {
        unreachable!("an unrecognized type tag cannot validate");
    };
    assert!(err.is_configuration_defect());
    assert_eq!(err.forbidden(), None);
    assert_eq!(err, Error::UnrecognizedType { path: "amount".into() });

    let expiring = SyncFunction::new(single_type("session", json!({ "expiry": [1, 2] }))?);
    let err = expiring.evaluate(&json!({ "_id": "s1", "type": "session" }), None, &mut host);
    assert_eq!(
        err.map_err(|err| err.to_string()),
        Err("malformed expiry value for document \"s1\": [1,2]".to_owned())
    );
    Ok(())
}

// =============================================================================
// Host Effects
// =============================================================================

#[test]
fn unknown_type_deletion_uses_public_channel() -> anyhow::Result<()> {
    let sync = SyncFunction::new(single_type("note", json!({ "channels": "notes" }))?);
    let mut host = RecordingHost::new();
    let tombstone = json!({ "_id": "x", "_deleted": true });
    assert_eq!(
        sync.evaluate(&tombstone, None, &mut host),
        Ok(WriteOutcome::UnknownTypeDeleted)
    );
    assert_eq!(host.calls, [HostCall::AssignChannels(vec!["!".into()])]);
    Ok(())
}

#[test]
fn accepted_write_grants_sets_expiry_and_assigns_channels() -> anyhow::Result<()> {
    let sync = SyncFunction::new(single_type(
        "room",
        json!({
            "channels": { "view": "lobby", "add": ["rooms", "lobby"], "write": "rooms" },
            "accessAssignments": [
                { "type": "role", "users": "ann", "roles": "host" },
                { "channels": "room-1", "roles": "host", "users": ["bob"] }
            ],
            "expiry": "2030-06-01T00:00:00Z",
            "allowUnknownProperties": true
        }),
    )?);
    let mut host = RecordingHost::new();
    let doc = json!({ "_id": "r", "type": "room", "topic": "rust" });
    let outcome = sync.evaluate(&doc, None, &mut host)?;

    assert_eq!(
        host.access_checks(),
        [&RequiredAccess {
            channels: Some(vec!["rooms".into(), "rooms".into(), "lobby".into()]),
            ..RequiredAccess::default()
        }]
    );
    let grants = [
        AccessGrant::Roles {
            users: vec!["ann".into()],
            roles: vec!["role:host".into()],
        },
        AccessGrant::Channels {
            assignees: vec!["bob".into(), "role:host".into()],
            channels: vec!["room-1".into()],
        },
    ];
    assert_eq!(host.grants(), grants.iter().collect::<Vec<_>>());
    assert_eq!(
        host.expiry(),
        Some(&Expiry::Timestamp("2030-06-01T00:00:00Z".into()))
    );
    assert_eq!(
        host.assigned_channels(),
        Some(&["lobby".to_owned(), "rooms".to_owned()][..])
    );
    let context = outcome.context().cloned().unwrap_or_default();
    assert_eq!(context.access_assignments, grants);
    assert_eq!(context.channels, ["lobby", "rooms"]);
    Ok(())
}

#[test]
fn public_write_skips_the_access_check() -> anyhow::Result<()> {
    let sync = SyncFunction::new(single_type("open", json!({}))?);
    let mut host = RecordingHost::denying("never asked");
    let outcome = sync.evaluate(&json!({ "type": "open" }), None, &mut host)?;
    assert!(host.access_checks().is_empty());
    assert_eq!(host.assigned_channels(), Some(&[][..]));
    assert_eq!(
        outcome.context().and_then(|context| context.authorization.clone()),
        Some(RequiredAccess::default())
    );
    Ok(())
}

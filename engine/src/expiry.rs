//! Document lifetime resolution.

use serde_json::{Number, Value};
use syncguard_schema::{document, ConstraintArgs, DocumentDefinition, Expiry, ExpiryValue};

use crate::error::{Error, Result};
use crate::temporal;

/// Resolves the definition's expiry for one write, or `None` when it
/// declares none.
///
/// # Errors
///
/// Returns [`Error::MalformedExpiry`] when the resolved value is neither an
/// integer, an ISO 8601 datetime string nor an instant.
pub fn resolve_expiry(
    definition: &DocumentDefinition,
    args: &ConstraintArgs<'_>,
) -> Result<Option<Expiry>> {
    let Some(constraint) = &definition.expiry else {
        return Ok(None);
    };
    let raw = constraint.resolve(args);
    let expiry = match &*raw {
        ExpiryValue::Instant(instant) => Some(Expiry::EpochSeconds(instant.timestamp())),
        ExpiryValue::Json(Value::Number(number)) => whole_number(number).map(Expiry::Offset),
        ExpiryValue::Json(Value::String(text)) => temporal::parse_datetime(text)
            .is_some()
            .then(|| Expiry::Timestamp(text.clone())),
        ExpiryValue::Json(_) => None,
    };
    expiry.map(Some).ok_or_else(|| Error::MalformedExpiry {
        doc_id: document::id(args.doc).unwrap_or_default().to_owned(),
        raw: match &*raw {
            ExpiryValue::Json(value) => value.to_string(),
            ExpiryValue::Instant(instant) => instant.to_rfc3339(),
        },
    })
}

fn whole_number(number: &Number) -> Option<i64> {
    number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|float| float.fract() == 0.0 && float.abs() < 9.0e18)
            .map(|float| float as i64)
    })
}

//! Document-level attachment limits.

use serde_json::Value;
use syncguard_schema::{document, AttachmentConstraints};

use super::{contains_ignore_case, list, AttachmentReferences};
use crate::report::ViolationList;

/// Checks the document's binary attachments against the definition's
/// limits.
///
/// A limit on a single attachment (size, extension, content type) is
/// skipped when the attachment-reference property that names it declares
/// its own; that property has already been checked.
pub fn validate_attachments(
    doc: &Value,
    constraints: Option<&AttachmentConstraints>,
    allow_attachments: bool,
    references: &AttachmentReferences,
    violations: &mut ViolationList,
) {
    let attachments = document::attachments(doc);
    if attachments.is_empty() {
        return;
    }

    let defaults = AttachmentConstraints::default();
    let limits = constraints.unwrap_or(&defaults);
    let mut total_size: u64 = 0;

    for attachment in &attachments {
        let name = attachment.name;
        let owner = references.get(name);
        total_size = total_size.saturating_add(attachment.length);

        if let Some(maximum) = limits.maximum_individual_size {
            if owner.map_or(true, |owner| owner.maximum_size.is_none())
                && attachment.length > maximum
            {
                violations.push(format!(
                    "attachment {name} must not be larger than {maximum} bytes"
                ));
            }
        }

        if let Some(extensions) = &limits.supported_extensions {
            let overridden = owner.is_some_and(|owner| owner.supported_extensions.is_some());
            let supported = attachment
                .extension()
                .is_some_and(|extension| contains_ignore_case(extensions, &extension));
            if !overridden && !supported {
                violations.push(format!(
                    "attachment {name} must have a supported file extension ({})",
                    list(extensions)
                ));
            }
        }

        if let Some(content_types) = &limits.supported_content_types {
            let overridden = owner.is_some_and(|owner| owner.supported_content_types.is_some());
            let supported = attachment
                .content_type
                .is_some_and(|content_type| contains_ignore_case(content_types, content_type));
            if !overridden && !supported {
                violations.push(format!(
                    "attachment {name} must have a supported content type ({})",
                    list(content_types)
                ));
            }
        }

        if limits.require_attachment_references && owner.is_none() {
            violations.push(format!(
                "attachment {name} must have a corresponding attachment reference property"
            ));
        }

        if let Some(pattern) = &limits.filename_regex_pattern {
            if !pattern.is_match(name) {
                violations.push(format!(
                    "attachment {name} must conform to expected pattern {}",
                    pattern.as_str()
                ));
            }
        }
    }

    if let Some(maximum) = limits.maximum_total_size {
        if total_size > maximum {
            violations.push(format!(
                "the total size of all attachments must not exceed {maximum} bytes"
            ));
        }
    }
    if let Some(maximum) = limits.maximum_attachment_count {
        if attachments.len() > maximum {
            violations.push(format!(
                "the total number of attachments must not exceed {maximum}"
            ));
        }
    }

    if !allow_attachments {
        violations.push("document type does not support attachments");
    }
}

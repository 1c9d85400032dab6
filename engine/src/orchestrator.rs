//! The write decision: type resolution, authorization, validation, access
//! grants, expiry and channel assignment, in that order.
//!
//! Each stage that runs may be followed by the definition's lifecycle hook
//! for it. Type resolution and authorization failures end the write at
//! once; content violations are collected and reported together.

use serde_json::Value;
use syncguard_schema::{
    document, ActionContext, ConstraintArgs, DefinitionRegistry, DocumentDefinition, Hook,
};
use tracing::debug;

use crate::authorization::{self, PUBLIC_CHANNEL};
use crate::error::{Error, Result};
use crate::host::Host;
use crate::report::ViolationList;
use crate::type_resolver::resolve_type;
use crate::validators::{
    enabled, property::root_schema, resolved, validate_attachments, validate_document_constraints,
    PropertyValidator,
};
use crate::{access, expiry};

/// How a write that was not refused ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    /// Every stage passed; carries what each stage decided.
    Accepted(ActionContext),
    /// A document no definition recognizes was deleted. It was assigned to
    /// the public channel only.
    UnknownTypeDeleted,
}

impl WriteOutcome {
    /// Returns the accumulated context of an accepted write.
    #[must_use]
    pub fn context(&self) -> Option<&ActionContext> {
        match self {
            Self::Accepted(context) => Some(context),
            Self::UnknownTypeDeleted => None,
        }
    }
}

/// The decision function for one deployment's document definitions.
#[derive(Debug, Clone, Default)]
pub struct SyncFunction {
    registry: DefinitionRegistry,
}

impl SyncFunction {
    /// Wraps a registry.
    #[must_use]
    pub fn new(registry: DefinitionRegistry) -> Self {
        Self { registry }
    }

    /// Builds the registry from a producer function.
    pub fn from_fn<F>(producer: F) -> Self
    where
        F: FnOnce() -> DefinitionRegistry,
    {
        Self::new(producer())
    }

    /// The definitions, in resolution order.
    #[must_use]
    pub fn registry(&self) -> &DefinitionRegistry {
        &self.registry
    }

    /// Decides one write of `doc` over `old_doc`, calling back into `host`
    /// for authorization, grants, expiry and channel assignment.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownType`] when no definition matches a
    /// non-deletion, [`Error::AccessDenied`] with the host's own rejection,
    /// [`Error::Invalid`] with every content violation,
    /// [`Error::ActionRejected`] when a lifecycle hook refuses, and a
    /// configuration defect when a definition cannot be evaluated.
    pub fn evaluate<H>(
        &self,
        doc: &Value,
        old_doc: Option<&Value>,
        host: &mut H,
    ) -> Result<WriteOutcome>
    where
        H: Host + ?Sized,
    {
        let doc_id = document::id(doc).unwrap_or_default();
        let deleting = document::is_deleted(doc);

        let Some((doc_type, definition)) = resolve_type(&self.registry, doc, old_doc) else {
            if deleting {
                debug!(doc_id, "deleting document of unknown type");
                host.assign_channels(&[PUBLIC_CHANNEL.to_owned()]);
                return Ok(WriteOutcome::UnknownTypeDeleted);
            }
            return Err(Error::UnknownType);
        };
        let hooks = &definition.hooks;
        let args = ConstraintArgs::for_document(doc, old_doc);
        let mut context = ActionContext {
            doc_type: doc_type.to_owned(),
            ..ActionContext::default()
        };
        debug!(doc_id, doc_type, "document type resolved");
        run_hook(hooks.on_type_identification_succeeded.as_ref(), doc, old_doc, &context)?;

        let operation = authorization::operation(doc, old_doc);
        let required = authorization::required_access(definition, operation, &args);
        if !required.is_public() {
            host.require_access(&required).map_err(Error::AccessDenied)?;
        }
        debug!(doc_id, doc_type, %operation, "write authorized");
        context.authorization = Some(required);
        run_hook(hooks.on_authorization_succeeded.as_ref(), doc, old_doc, &context)?;

        validate_content(definition, doc_type, doc, old_doc)?;
        debug!(doc_id, doc_type, "document content valid");
        run_hook(hooks.on_validation_succeeded.as_ref(), doc, old_doc, &context)?;

        if !deleting && definition.access_assignments.is_some() {
            let grants = access::access_grants(definition, &args);
            for grant in &grants {
                host.grant_access(grant);
            }
            debug!(doc_id, doc_type, grants = grants.len(), "access assignments issued");
            context.access_assignments = grants;
            run_hook(hooks.on_access_assignments_succeeded.as_ref(), doc, old_doc, &context)?;
        }

        if !deleting {
            if let Some(expiry) = expiry::resolve_expiry(definition, &args)? {
                host.set_expiry(&expiry);
                debug!(doc_id, doc_type, ?expiry, "expiry set");
                context.expiry = Some(expiry);
                run_hook(hooks.on_expiry_set_succeeded.as_ref(), doc, old_doc, &context)?;
            }
        }

        let channels = authorization::channel_union(definition, &args);
        host.assign_channels(&channels);
        debug!(doc_id, doc_type, channels = channels.len(), "channels assigned");
        context.channels = channels;
        run_hook(
            hooks.on_document_channel_assignment_succeeded.as_ref(),
            doc,
            old_doc,
            &context,
        )?;

        Ok(WriteOutcome::Accepted(context))
    }
}

/// Runs the validation stage alone: document-level constraints, then, for
/// anything but a deletion, the property schema and attachment limits.
///
/// # Errors
///
/// Returns [`Error::Invalid`] carrying every violation found, or a
/// configuration defect met while walking the schema.
pub fn validate_content(
    definition: &DocumentDefinition,
    doc_type: &str,
    doc: &Value,
    old_doc: Option<&Value>,
) -> Result<()> {
    let mut violations = ViolationList::new();
    validate_document_constraints(definition, doc, old_doc, &mut violations);

    if !document::is_deleted(doc) {
        let args = ConstraintArgs::for_document(doc, old_doc);
        let schema = root_schema(definition, &args);
        let mut properties = PropertyValidator::new(doc, old_doc);
        properties.validate_root(&schema, enabled(&definition.allow_unknown_properties, &args))?;
        let (found, references) = properties.finish();
        violations.extend(found);

        let constraints = resolved(&definition.attachment_constraints, &args);
        validate_attachments(
            doc,
            constraints.as_deref(),
            enabled(&definition.allow_attachments, &args),
            &references,
            &mut violations,
        );
    }

    violations.into_result(doc_type)
}

fn run_hook(
    hook: Option<&Hook>,
    doc: &Value,
    old_doc: Option<&Value>,
    context: &ActionContext,
) -> Result<()> {
    match hook {
        Some(hook) => hook(doc, old_doc, context).map_err(Error::ActionRejected),
        None => Ok(()),
    }
}

//! Entry scanning.
//!
//! The first phase of a batch walks every entry once and produces two
//! collections: the logical ids that need identity resolution, classified
//! by why they matter, and the conditional expressions that need match
//! resolution. Nothing is validated here; malformed expressions are left
//! for the resolver to sort out.

use std::collections::HashMap;

use crate::config::StorageSettings;
use crate::model::ModelAdapter;
use crate::types::{BundleEntry, BundleMethod, LogicalId, PrefetchReason};

/// A conditional expression collected from one entry, with its prefetch
/// flags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct ConditionalRequest {
    /// The expression as it appeared in the entry.
    pub(crate) expression: String,
    /// The resource type the expression searches.
    pub(crate) resource_type: String,
    /// Whether resolution should eagerly load the matched body.
    pub(crate) prefetch_body: bool,
    /// Whether resolution should eagerly load just the matched version.
    pub(crate) prefetch_version: bool,
}

/// Classifies every logical id a batch touches.
///
/// Update and patch targets addressed by plain id become direct targets.
/// References inside create and update bodies become reference targets,
/// inserted only if absent: a direct target is never downgraded by a later
/// reference to the same id.
pub(crate) fn classify_prefetch_ids(
    entries: &[BundleEntry],
    adapter: &dyn ModelAdapter,
) -> HashMap<LogicalId, PrefetchReason> {
    let mut reasons = HashMap::new();
    for entry in entries {
        let Some(resource) = entry.resource.as_ref() else {
            continue;
        };
        if matches!(entry.method, BundleMethod::Put | BundleMethod::Patch) {
            if let Some(id) = LogicalId::parse(&entry.url) {
                reasons.insert(id, PrefetchReason::DirectTarget);
            }
        }
        if matches!(entry.method, BundleMethod::Put | BundleMethod::Post) {
            for reference in adapter.collect_references(resource) {
                if let Some(id) = LogicalId::parse(&reference) {
                    reasons.entry(id).or_insert(PrefetchReason::ReferenceTarget);
                }
            }
        }
    }
    reasons
}

/// Collects every conditional expression in the batch.
///
/// Conditional updates and patches want the matched body up front; guarded
/// creates only need the matched version for their response. Inline
/// references are passed along untagged when enabled; the admission filter
/// drops the plain ones.
pub(crate) fn collect_conditional_requests(
    entries: &[BundleEntry],
    adapter: &dyn ModelAdapter,
    settings: &StorageSettings,
) -> Vec<ConditionalRequest> {
    let mut requests = Vec::new();
    for entry in entries {
        let resource = entry.resource.as_ref();
        match entry.method {
            BundleMethod::Put | BundleMethod::Patch => {
                if entry.url.contains('?') {
                    if let Some(resource_type) = expression_type(&entry.url, resource, adapter) {
                        requests.push(ConditionalRequest {
                            expression: entry.url.clone(),
                            resource_type,
                            prefetch_body: true,
                            prefetch_version: false,
                        });
                    }
                }
            }
            BundleMethod::Post => {
                if let Some(precondition) = entry.if_none_exist.as_deref() {
                    if precondition.contains('?') {
                        if let Some(resource_type) =
                            expression_type(precondition, resource, adapter)
                        {
                            requests.push(ConditionalRequest {
                                expression: precondition.to_string(),
                                resource_type,
                                prefetch_body: false,
                                prefetch_version: true,
                            });
                        }
                    }
                }
            }
            _ => {}
        }

        if settings.allow_inline_match_urls {
            if let Some(resource) = resource {
                for reference in adapter.collect_references(resource) {
                    if let Some(resource_type) = adapter.resource_type_in_url(&reference) {
                        requests.push(ConditionalRequest {
                            expression: reference,
                            resource_type,
                            prefetch_body: false,
                            prefetch_version: false,
                        });
                    }
                }
            }
        }
    }
    requests
}

/// Determines the resource type of an expression, falling back to the
/// entry body when the expression itself does not carry one.
fn expression_type(
    expression: &str,
    resource: Option<&serde_json::Value>,
    adapter: &dyn ModelAdapter,
) -> Option<String> {
    adapter
        .resource_type_in_url(expression)
        .or_else(|| resource.and_then(|r| adapter.body_resource_type(r)))
}

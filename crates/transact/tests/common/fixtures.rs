//! Resource definitions and bundle builders shared across integration tests.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::{Value, json};

use helios_transact::model::{
    DefinitionRegistry, JsonModelAdapter, ResourceDefinition, SearchParamType,
};
use helios_transact::types::{BundleEntry, BundleMethod};

/// Builds a definition registry with the resource types the tests use.
///
/// Patient carries a token, a string, and a reference parameter so tests can
/// exercise the indexed fast path, the non-token fallback, and reference
/// collection from one registry.
pub fn test_registry() -> DefinitionRegistry {
    let mut registry = DefinitionRegistry::new();
    registry.register(
        ResourceDefinition::new("Patient")
            .with_param("identifier", SearchParamType::Token)
            .with_param("name", SearchParamType::String)
            .with_param("organization", SearchParamType::Reference),
    );
    registry.register(
        ResourceDefinition::new("Observation")
            .with_param("code", SearchParamType::Token)
            .with_param("subject", SearchParamType::Reference),
    );
    registry.register(
        ResourceDefinition::new("Organization").with_param("identifier", SearchParamType::Token),
    );
    registry
}

/// Builds a model adapter over [`test_registry`].
pub fn test_adapter() -> Arc<JsonModelAdapter> {
    Arc::new(JsonModelAdapter::new(Arc::new(RwLock::new(
        test_registry(),
    ))))
}

/// A POST entry guarded by an `If-None-Exist` condition.
pub fn guarded_create(resource_type: &str, condition: &str) -> BundleEntry {
    BundleEntry::new(BundleMethod::Post, resource_type)
        .with_resource(json!({ "resourceType": resource_type }))
        .with_if_none_exist(condition)
}

/// A plain POST entry with no condition.
pub fn plain_create(resource_type: &str) -> BundleEntry {
    BundleEntry::new(BundleMethod::Post, resource_type)
        .with_resource(json!({ "resourceType": resource_type }))
}

/// A PUT entry targeting `Patient/{id}` with a minimal body.
pub fn patient_update(id: &str) -> BundleEntry {
    BundleEntry::new(BundleMethod::Put, format!("Patient/{id}")).with_resource(json!({
        "resourceType": "Patient",
        "id": id,
    }))
}

/// A PUT entry addressed by a conditional URL instead of an id.
pub fn conditional_update(resource_type: &str, url: &str) -> BundleEntry {
    BundleEntry::new(BundleMethod::Put, url)
        .with_resource(json!({ "resourceType": resource_type }))
}

/// A POST entry for an Observation whose `subject` points at `reference`.
pub fn observation_with_subject(reference: &str) -> BundleEntry {
    BundleEntry::new(BundleMethod::Post, "Observation").with_resource(json!({
        "resourceType": "Observation",
        "subject": { "reference": reference },
    }))
}

/// A DELETE entry for `Patient/{id}`.
pub fn patient_delete(id: &str) -> BundleEntry {
    BundleEntry::new(BundleMethod::Delete, format!("Patient/{id}"))
}

/// Wraps a raw JSON body in a POST entry.
pub fn post_with_body(resource_type: &str, body: Value) -> BundleEntry {
    BundleEntry::new(BundleMethod::Post, resource_type).with_resource(body)
}

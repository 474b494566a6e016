//! The model adapter seam.
//!
//! Everything the engine needs to know about the resource model flows
//! through a [`ModelAdapter`] value handed in by the caller: definition
//! lookup, reference extraction from resource bodies, and resource-type
//! recognition in request URLs. The engine itself stays independent of any
//! concrete model version.

use std::sync::Arc;

use parking_lot::RwLock;
use serde_json::Value;

use super::definition::{DefinitionRegistry, ResourceDefinition};

/// Capability value abstracting the resource model from the engine.
pub trait ModelAdapter: Send + Sync {
    /// Looks up the definition for a resource type name.
    fn resource_definition(&self, resource_type: &str) -> Option<Arc<ResourceDefinition>>;

    /// Returns the resource type a body declares, when it declares one.
    fn body_resource_type(&self, resource: &Value) -> Option<String>;

    /// Collects every reference value appearing anywhere in a body,
    /// including inside contained resources.
    fn collect_references(&self, resource: &Value) -> Vec<String>;

    /// Returns the resource type named by a request or reference URL, if the
    /// URL carries one the model knows. Base-URL prefixes are skipped;
    /// placeholder and local references carry no type.
    fn resource_type_in_url(&self, url: &str) -> Option<String>;
}

/// [`ModelAdapter`] over JSON resource bodies and a shared definition
/// registry.
pub struct JsonModelAdapter {
    registry: Arc<RwLock<DefinitionRegistry>>,
}

impl JsonModelAdapter {
    /// Creates an adapter backed by the given registry.
    pub fn new(registry: Arc<RwLock<DefinitionRegistry>>) -> Self {
        JsonModelAdapter { registry }
    }
}

impl ModelAdapter for JsonModelAdapter {
    fn resource_definition(&self, resource_type: &str) -> Option<Arc<ResourceDefinition>> {
        self.registry.read().get(resource_type)
    }

    fn body_resource_type(&self, resource: &Value) -> Option<String> {
        resource
            .get("resourceType")
            .and_then(Value::as_str)
            .map(str::to_string)
    }

    fn collect_references(&self, resource: &Value) -> Vec<String> {
        let mut references = Vec::new();
        collect_reference_values(resource, &mut references);
        references
    }

    fn resource_type_in_url(&self, url: &str) -> Option<String> {
        if url.is_empty() || url.starts_with('#') || url.starts_with("urn:") {
            return None;
        }
        let path = url.split('?').next().unwrap_or(url);
        let registry = self.registry.read();
        path.split('/')
            .filter(|segment| !segment.is_empty())
            .find(|segment| registry.contains(segment))
            .map(str::to_string)
    }
}

fn collect_reference_values(value: &Value, out: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                if key == "reference" {
                    if let Some(reference) = child.as_str() {
                        out.push(reference.to_string());
                        continue;
                    }
                }
                collect_reference_values(child, out);
            }
        }
        Value::Array(items) => {
            for item in items {
                collect_reference_values(item, out);
            }
        }
        _ => {}
    }
}

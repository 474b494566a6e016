//! Resource definitions and the definition registry.
//!
//! The engine never hardcodes knowledge of concrete resource types. What it
//! knows about a type - which search parameters exist and what type each one
//! has - comes from a [`ResourceDefinition`] held in a [`DefinitionRegistry`].

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

/// The type of a search parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SearchParamType {
    /// A simple string, like a name or description.
    String,
    /// A search against a URI.
    Uri,
    /// A search for a number.
    Number,
    /// A search for a date, dateTime, or period.
    Date,
    /// A quantity, with a number and units.
    Quantity,
    /// A code from a code system or value set.
    Token,
    /// A reference to another resource.
    Reference,
    /// A composite search parameter that combines others.
    Composite,
    /// Special search parameters (_id, _lastUpdated, etc.).
    Special,
}

impl fmt::Display for SearchParamType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SearchParamType::String => write!(f, "string"),
            SearchParamType::Uri => write!(f, "uri"),
            SearchParamType::Number => write!(f, "number"),
            SearchParamType::Date => write!(f, "date"),
            SearchParamType::Quantity => write!(f, "quantity"),
            SearchParamType::Token => write!(f, "token"),
            SearchParamType::Reference => write!(f, "reference"),
            SearchParamType::Composite => write!(f, "composite"),
            SearchParamType::Special => write!(f, "special"),
        }
    }
}

/// Definition of one resource type: its name and search parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceDefinition {
    name: String,
    search_params: HashMap<String, SearchParamType>,
}

impl ResourceDefinition {
    /// Creates a definition with no search parameters.
    pub fn new(name: impl Into<String>) -> Self {
        ResourceDefinition {
            name: name.into(),
            search_params: HashMap::new(),
        }
    }

    /// Adds a search parameter to this definition.
    pub fn with_param(mut self, name: impl Into<String>, param_type: SearchParamType) -> Self {
        self.search_params.insert(name.into(), param_type);
        self
    }

    /// Returns the resource type name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Returns the type of a search parameter, if the parameter exists.
    pub fn param_type(&self, param_name: &str) -> Option<SearchParamType> {
        self.search_params.get(param_name).copied()
    }
}

/// In-memory registry of resource definitions, indexed by type name.
#[derive(Debug, Default)]
pub struct DefinitionRegistry {
    definitions: HashMap<String, Arc<ResourceDefinition>>,
}

impl DefinitionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        DefinitionRegistry::default()
    }

    /// Registers a definition, replacing any previous one for the same name.
    pub fn register(&mut self, definition: ResourceDefinition) {
        self.definitions
            .insert(definition.name().to_string(), Arc::new(definition));
    }

    /// Looks up a definition by resource type name.
    pub fn get(&self, resource_type: &str) -> Option<Arc<ResourceDefinition>> {
        self.definitions.get(resource_type).cloned()
    }

    /// Returns `true` if the registry knows the given resource type.
    pub fn contains(&self, resource_type: &str) -> bool {
        self.definitions.contains_key(resource_type)
    }

    /// Returns the number of registered definitions.
    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    /// Returns `true` if no definitions are registered.
    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

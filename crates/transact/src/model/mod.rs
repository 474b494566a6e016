//! Resource model abstraction.
//!
//! The engine is model-version independent: resource definitions, reference
//! walking, and URL type recognition are provided by a [`ModelAdapter`]
//! value. [`JsonModelAdapter`] is the standard implementation over JSON
//! bodies and a [`DefinitionRegistry`].

mod adapter;
mod definition;

pub use adapter::{JsonModelAdapter, ModelAdapter};
pub use definition::{DefinitionRegistry, ResourceDefinition, SearchParamType};

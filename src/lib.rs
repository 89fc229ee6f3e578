//! wireup - a declarative component-registry loader
//!
//! This library parses hierarchical component documents (an XML subset) and
//! populates a [`DefinitionRegistry`] with named component definitions,
//! resolving cross-document imports, aliases, and profile-gated scopes along
//! the way. Definitions are inert metadata; nothing here instantiates them.
//!
//! # Example
//!
//! ```rust
//! let (registry, report) = wireup::load_str(r#"
//!     <components>
//!         <component id="greeter" type="app::Greeter"/>
//!         <alias name="greeter" alias="welcomer"/>
//!     </components>
//! "#).unwrap();
//!
//! assert!(report.is_clean());
//! assert_eq!(report.registered, 1);
//! assert_eq!(registry.get("welcomer").unwrap().type_name, "app::Greeter");
//! ```

pub mod environment;
pub mod error;
pub mod parser;
pub mod reader;
pub mod registry;
pub mod resource;

pub use environment::{Environment, EnvironmentError};
pub use error::ParseError;
pub use parser::{parse, Document};
pub use reader::{
    CustomContext, CustomNode, DefinitionReader, LoadReport, NamespaceHandler, Problem,
    ReaderEvent, ReaderHooks, COMPONENTS_NAMESPACE,
};
pub use registry::{
    ComponentDefinition, DefinitionHolder, DefinitionRegistry, Property, PropertyValue,
    RegistryError, Scope,
};
pub use resource::{
    FileResource, FileSystemResourceLoader, InMemoryResource, Resource, ResourceError,
    ResourceLoader,
};

use std::path::Path;

use thiserror::Error;

/// Fatal failure of a load pass.
///
/// Non-fatal problems never surface here; they accumulate in the
/// [`LoadReport`] instead.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The document resource could not be read
    #[error("failed to read {description}: {source}")]
    Read {
        description: String,
        #[source]
        source: std::io::Error,
    },

    /// The document is not syntactically valid
    #[error("parse errors in {description}: {}", format_parse_errors(.errors))]
    Parse {
        description: String,
        errors: Vec<ParseError>,
    },

    /// A location string could not be resolved to a loadable resource
    #[error("cannot resolve location [{location}]: {source}")]
    Resource {
        location: String,
        #[source]
        source: ResourceError,
    },

    /// Placeholder or environment failure; fatal for the enclosing load
    #[error(transparent)]
    Environment(#[from] EnvironmentError),

    /// A resource is already being loaded further up the import chain
    #[error("import cycle detected: {chain}")]
    ImportCycle { chain: String },
}

impl LoadError {
    /// Store-level failures are reported against the importing node and
    /// processing continues; anything else aborts the pass.
    pub(crate) fn is_store_level(&self) -> bool {
        !matches!(self, LoadError::Environment(_))
    }
}

fn format_parse_errors(errors: &[ParseError]) -> String {
    errors
        .iter()
        .map(|e| e.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// Load component definitions from an in-memory document with default options
pub fn load_str(source: &str) -> Result<(DefinitionRegistry, LoadReport), LoadError> {
    let mut registry = DefinitionRegistry::new();
    let report = DefinitionReader::new(&mut registry).load_str(source)?;
    Ok((registry, report))
}

/// Load component definitions from a document on disk with default options
pub fn load_path(path: impl AsRef<Path>) -> Result<(DefinitionRegistry, LoadReport), LoadError> {
    let mut registry = DefinitionRegistry::new();
    let report = DefinitionReader::new(&mut registry).load_path(path)?;
    Ok((registry, report))
}

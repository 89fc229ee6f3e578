//! Component definition records and the registry that stores them

use std::collections::HashMap;

use thiserror::Error;

use crate::error::Span;

/// Errors that can occur during registration
#[derive(Debug, Error)]
pub enum RegistryError {
    /// Registration under an empty name
    #[error("component name must not be empty")]
    EmptyName,

    /// Duplicate definition name while overrides are disallowed
    #[error("a component named '{name}' is already registered")]
    DuplicateName { name: String },

    /// Alias already bound to a different name while overrides are disallowed
    #[error("alias '{alias}' is already bound to '{bound_to}'")]
    DuplicateAlias { alias: String, bound_to: String },

    /// Alias registration that would close a loop in the alias table
    #[error("alias '{alias}' for '{name}' would form a cycle")]
    AliasCycle { name: String, alias: String },
}

/// How a consuming container would scope instances of a component
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scope {
    #[default]
    Singleton,
    Prototype,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Scope::Singleton => "singleton",
            Scope::Prototype => "prototype",
        })
    }
}

/// Value applied to a component property
#[derive(Debug, Clone, PartialEq)]
pub enum PropertyValue {
    /// Literal string value
    Literal(String),
    /// Reference to another registered component by name
    Reference(String),
}

/// A named property on a component definition
#[derive(Debug, Clone, PartialEq)]
pub struct Property {
    pub name: String,
    pub value: PropertyValue,
}

/// Construction metadata for one named component.
///
/// Definitions are inert records; nothing here instantiates anything.
#[derive(Debug, Clone, PartialEq)]
pub struct ComponentDefinition {
    /// Implementation type identifier, opaque to the loader
    pub type_name: String,
    pub scope: Scope,
    pub lazy_init: bool,
    pub init_method: Option<String>,
    pub destroy_method: Option<String>,
    /// Names of components that must be registered before this one is used
    pub depends_on: Vec<String>,
    pub description: Option<String>,
    pub properties: Vec<Property>,
    /// Source location of the defining element
    pub span: Span,
}

impl ComponentDefinition {
    pub fn new(type_name: impl Into<String>) -> Self {
        Self {
            type_name: type_name.into(),
            scope: Scope::default(),
            lazy_init: false,
            init_method: None,
            destroy_method: None,
            depends_on: Vec::new(),
            description: None,
            properties: Vec::new(),
            span: 0..0,
        }
    }

    /// Look up a property by name
    pub fn property(&self, name: &str) -> Option<&PropertyValue> {
        self.properties
            .iter()
            .find(|p| p.name == name)
            .map(|p| &p.value)
    }
}

/// A definition together with its name and aliases, prior to registration
#[derive(Debug, Clone, PartialEq)]
pub struct DefinitionHolder {
    pub name: String,
    pub aliases: Vec<String>,
    pub definition: ComponentDefinition,
}

/// Registry of component definitions plus a name-to-name alias table.
///
/// One registration pass assumes exclusive access; the registry carries no
/// internal locking.
#[derive(Debug, Default)]
pub struct DefinitionRegistry {
    definitions: HashMap<String, ComponentDefinition>,
    /// Registration order, for deterministic listing
    order: Vec<String>,
    aliases: HashMap<String, String>,
    allow_overrides: bool,
}

impl DefinitionRegistry {
    /// Create a registry that rejects duplicate names
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry where later registrations replace earlier ones
    pub fn with_overrides_allowed() -> Self {
        Self {
            allow_overrides: true,
            ..Self::default()
        }
    }

    pub fn overrides_allowed(&self) -> bool {
        self.allow_overrides
    }

    /// Register a definition under a name
    pub fn register(
        &mut self,
        name: impl Into<String>,
        definition: ComponentDefinition,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        if name.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if self.definitions.contains_key(&name) {
            if !self.allow_overrides {
                return Err(RegistryError::DuplicateName { name });
            }
        } else {
            self.order.push(name.clone());
        }
        self.definitions.insert(name, definition);
        Ok(())
    }

    /// Bind `alias` to `name`. An alias equal to its name is dropped.
    pub fn register_alias(&mut self, name: &str, alias: &str) -> Result<(), RegistryError> {
        if name.is_empty() || alias.is_empty() {
            return Err(RegistryError::EmptyName);
        }
        if alias == name {
            self.aliases.remove(alias);
            return Ok(());
        }
        if let Some(bound_to) = self.aliases.get(alias) {
            if bound_to == name {
                return Ok(());
            }
            if !self.allow_overrides {
                return Err(RegistryError::DuplicateAlias {
                    alias: alias.to_string(),
                    bound_to: bound_to.clone(),
                });
            }
        }
        if self.would_cycle(name, alias) {
            return Err(RegistryError::AliasCycle {
                name: name.to_string(),
                alias: alias.to_string(),
            });
        }
        self.aliases.insert(alias.to_string(), name.to_string());
        Ok(())
    }

    /// Would binding `alias -> name` close a loop through the alias table?
    fn would_cycle(&self, name: &str, alias: &str) -> bool {
        let mut current = name;
        loop {
            if current == alias {
                return true;
            }
            match self.aliases.get(current) {
                Some(next) => current = next,
                None => return false,
            }
        }
    }

    /// Resolve a name through the alias table to its canonical form
    pub fn canonical_name<'a>(&'a self, name: &'a str) -> &'a str {
        let mut current = name;
        while let Some(next) = self.aliases.get(current) {
            current = next;
        }
        current
    }

    /// Look up a definition by name or alias
    pub fn get(&self, name: &str) -> Option<&ComponentDefinition> {
        self.definitions.get(self.canonical_name(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.definitions.contains_key(self.canonical_name(name))
    }

    /// Definition names in registration order
    pub fn definition_names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|s| s.as_str())
    }

    /// Aliases bound (directly) to the given name, sorted
    pub fn aliases_of(&self, name: &str) -> Vec<&str> {
        let mut found: Vec<&str> = self
            .aliases
            .iter()
            .filter(|(_, target)| target.as_str() == name)
            .map(|(alias, _)| alias.as_str())
            .collect();
        found.sort_unstable();
        found
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }
}

/// Register a holder's definition under its name, then bind its aliases
pub fn register_holder(
    registry: &mut DefinitionRegistry,
    holder: DefinitionHolder,
) -> Result<(), RegistryError> {
    let DefinitionHolder {
        name,
        aliases,
        definition,
    } = holder;
    registry.register(name.clone(), definition)?;
    for alias in &aliases {
        registry.register_alias(&name, alias)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_register_and_get() {
        let mut registry = DefinitionRegistry::new();
        registry
            .register("user", ComponentDefinition::new("app::User"))
            .expect("Should register");
        assert!(registry.contains("user"));
        assert_eq!(registry.get("user").unwrap().type_name, "app::User");
    }

    #[test]
    fn test_duplicate_name_rejected() {
        let mut registry = DefinitionRegistry::new();
        registry
            .register("user", ComponentDefinition::new("app::User"))
            .unwrap();
        let result = registry.register("user", ComponentDefinition::new("app::Other"));
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateName { .. })
        ));
        // the original registration survives
        assert_eq!(registry.get("user").unwrap().type_name, "app::User");
    }

    #[test]
    fn test_override_policy() {
        let mut registry = DefinitionRegistry::with_overrides_allowed();
        assert!(registry.overrides_allowed());
        registry
            .register("user", ComponentDefinition::new("app::User"))
            .unwrap();
        registry
            .register("user", ComponentDefinition::new("app::Other"))
            .unwrap();
        assert_eq!(registry.get("user").unwrap().type_name, "app::Other");
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_empty_name_rejected() {
        let mut registry = DefinitionRegistry::new();
        let result = registry.register("", ComponentDefinition::new("app::User"));
        assert!(matches!(result, Err(RegistryError::EmptyName)));
    }

    #[test]
    fn test_alias_resolution() {
        let mut registry = DefinitionRegistry::new();
        registry
            .register("user", ComponentDefinition::new("app::User"))
            .unwrap();
        registry.register_alias("user", "customer").unwrap();
        assert_eq!(registry.get("customer").unwrap().type_name, "app::User");
        assert_eq!(registry.canonical_name("customer"), "user");
        assert_eq!(registry.aliases_of("user"), vec!["customer"]);
    }

    #[test]
    fn test_transitive_alias_resolution() {
        let mut registry = DefinitionRegistry::new();
        registry
            .register("user", ComponentDefinition::new("app::User"))
            .unwrap();
        registry.register_alias("user", "customer").unwrap();
        registry.register_alias("customer", "client").unwrap();
        assert_eq!(registry.get("client").unwrap().type_name, "app::User");
    }

    #[test]
    fn test_alias_equal_to_name_is_dropped() {
        let mut registry = DefinitionRegistry::new();
        registry.register_alias("other", "user").unwrap();
        registry.register_alias("user", "user").unwrap();
        assert!(registry.aliases_of("other").is_empty());
    }

    #[test]
    fn test_alias_rebinding_rejected() {
        let mut registry = DefinitionRegistry::new();
        registry.register_alias("a", "x").unwrap();
        let result = registry.register_alias("b", "x");
        assert!(matches!(
            result,
            Err(RegistryError::DuplicateAlias { .. })
        ));
        // same binding again is fine
        registry.register_alias("a", "x").unwrap();
    }

    #[test]
    fn test_alias_cycle_rejected() {
        let mut registry = DefinitionRegistry::new();
        registry.register_alias("a", "b").unwrap();
        registry.register_alias("b", "c").unwrap();
        let result = registry.register_alias("c", "a");
        assert!(matches!(result, Err(RegistryError::AliasCycle { .. })));
    }

    #[test]
    fn test_registration_order_preserved() {
        let mut registry = DefinitionRegistry::new();
        for name in ["zeta", "alpha", "mid"] {
            registry
                .register(name, ComponentDefinition::new("T"))
                .unwrap();
        }
        let names: Vec<_> = registry.definition_names().collect();
        assert_eq!(names, vec!["zeta", "alpha", "mid"]);
    }

    #[test]
    fn test_register_holder_binds_aliases() {
        let mut registry = DefinitionRegistry::new();
        let holder = DefinitionHolder {
            name: "user".to_string(),
            aliases: vec!["customer".to_string(), "client".to_string()],
            definition: ComponentDefinition::new("app::User"),
        };
        register_holder(&mut registry, holder).unwrap();
        assert!(registry.get("customer").is_some());
        assert!(registry.get("client").is_some());
    }

    #[test]
    fn test_property_lookup() {
        let mut def = ComponentDefinition::new("app::User");
        def.properties.push(Property {
            name: "uid".to_string(),
            value: PropertyValue::Literal("42".to_string()),
        });
        assert_eq!(
            def.property("uid"),
            Some(&PropertyValue::Literal("42".to_string()))
        );
        assert!(def.property("missing").is_none());
    }
}

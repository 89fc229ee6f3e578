//! Element-level parsing delegate with scope-inherited defaults

use crate::parser::ast::{Element, XML_NAMESPACE};
use crate::reader::context::LoadSession;
use crate::reader::namespace::{CustomContext, CustomNode, NamespaceHandlerRegistry};
use crate::registry::{ComponentDefinition, DefinitionHolder, Property, PropertyValue, Scope};

/// Namespace URI of the default component vocabulary. Elements with no
/// namespace at all are treated as default-namespace too.
pub const COMPONENTS_NAMESPACE: &str = "https://wireup.dev/schema/components";

/// Delimiters splitting multi-valued attributes (aliases, depends-on, profiles)
const MULTI_VALUE_DELIMITERS: &[char] = &[',', ';', ' ', '\t', '\n', '\r'];

pub(crate) fn split_multi_value(raw: &str) -> Vec<String> {
    raw.split(MULTI_VALUE_DELIMITERS)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Defaults declared on a `<components>` scope and inherited by nested scopes
#[derive(Debug, Clone, Default)]
pub struct ScopeDefaults {
    pub lazy_init: bool,
    pub init_method: Option<String>,
    pub destroy_method: Option<String>,
}

/// Per-scope parsing delegate.
///
/// Each nested scope builds a fresh delegate from its own root element and
/// the parent's delegate. The chain lives on the call stack of the recursive
/// walk, so parent defaults are restored on scope exit without any mutable
/// save/restore slot.
#[derive(Debug)]
pub struct ParserDelegate {
    defaults: ScopeDefaults,
}

impl ParserDelegate {
    /// Build a delegate for `root`, inheriting unset defaults from `parent`
    pub fn new(root: &Element, parent: Option<&ParserDelegate>) -> Self {
        let inherited = parent.map(|p| p.defaults.clone()).unwrap_or_default();
        let defaults = ScopeDefaults {
            // "default" and absent both mean "inherit"
            lazy_init: match root.attr("default-lazy-init") {
                Some("true") => true,
                Some("false") => false,
                _ => inherited.lazy_init,
            },
            init_method: root
                .attr("default-init-method")
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .or(inherited.init_method),
            destroy_method: root
                .attr("default-destroy-method")
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .or(inherited.destroy_method),
        };
        Self { defaults }
    }

    pub fn defaults(&self) -> &ScopeDefaults {
        &self.defaults
    }

    pub fn is_default_namespace(&self, element: &Element) -> bool {
        matches!(
            element.namespace.as_deref(),
            None | Some(COMPONENTS_NAMESPACE)
        )
    }

    /// Parse a `<component>` element into a holder. Problems are reported
    /// through the session and `None` returned when the element is unusable.
    pub fn parse_component_element(
        &self,
        element: &Element,
        resource: &str,
        session: &mut LoadSession<'_>,
    ) -> Option<DefinitionHolder> {
        let id = element.attr("id").unwrap_or("");
        let mut aliases = split_multi_value(element.attr("name").unwrap_or(""));
        let name = if !id.is_empty() {
            id.to_string()
        } else if !aliases.is_empty() {
            // no id: the first name token is the name, the rest stay aliases
            aliases.remove(0)
        } else {
            session.error(
                "component must declare an 'id' or 'name' attribute",
                resource,
                element.span.clone(),
                None,
            );
            return None;
        };

        let type_name = match element.attr("type") {
            Some(t) if !t.is_empty() => t.to_string(),
            _ => {
                session.error(
                    format!("component '{}' must declare a 'type' attribute", name),
                    resource,
                    element.span.clone(),
                    None,
                );
                return None;
            }
        };

        let scope = match element.attr("scope") {
            None | Some("") | Some("singleton") => Scope::Singleton,
            Some("prototype") => Scope::Prototype,
            Some(other) => {
                session.error(
                    format!("unknown scope '{}' on component '{}'", other, name),
                    resource,
                    element.span.clone(),
                    None,
                );
                return None;
            }
        };

        let lazy_init = match element.attr("lazy-init") {
            Some("true") => true,
            Some("false") => false,
            _ => self.defaults.lazy_init,
        };

        let mut definition = ComponentDefinition::new(type_name);
        definition.scope = scope;
        definition.lazy_init = lazy_init;
        definition.init_method = element
            .attr("init-method")
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .or_else(|| self.defaults.init_method.clone());
        definition.destroy_method = element
            .attr("destroy-method")
            .filter(|v| !v.is_empty())
            .map(str::to_string)
            .or_else(|| self.defaults.destroy_method.clone());
        definition.depends_on = element
            .attr("depends-on")
            .map(split_multi_value)
            .unwrap_or_default();
        definition.span = element.span.clone();

        for child in element.child_elements() {
            if !self.is_default_namespace(child) {
                // custom children are handled by decoration
                continue;
            }
            match child.name.as_str() {
                "description" => definition.description = Some(child.text()),
                "property" => {
                    if let Some(property) =
                        self.parse_property_element(child, &name, resource, session)
                    {
                        if definition.properties.iter().any(|p| p.name == property.name) {
                            session.error(
                                format!(
                                    "component '{}' defines property '{}' more than once",
                                    name, property.name
                                ),
                                resource,
                                child.span.clone(),
                                None,
                            );
                        } else {
                            definition.properties.push(property);
                        }
                    }
                }
                other => session.error(
                    format!("unexpected element <{}> inside component '{}'", other, name),
                    resource,
                    child.span.clone(),
                    None,
                ),
            }
        }

        Some(DefinitionHolder {
            name,
            aliases,
            definition,
        })
    }

    fn parse_property_element(
        &self,
        element: &Element,
        component: &str,
        resource: &str,
        session: &mut LoadSession<'_>,
    ) -> Option<Property> {
        let name = match element.attr("name") {
            Some(n) if !n.is_empty() => n.to_string(),
            _ => {
                session.error(
                    format!(
                        "property inside component '{}' must declare a 'name' attribute",
                        component
                    ),
                    resource,
                    element.span.clone(),
                    None,
                );
                return None;
            }
        };

        let value_attr = element.attr("value");
        let ref_attr = element.attr("ref");
        let mut nested = None;
        for child in element.child_elements() {
            match child.name.as_str() {
                "value" => nested = Some(PropertyValue::Literal(child.text())),
                "ref" => {
                    nested = Some(PropertyValue::Reference(
                        child.attr("name").unwrap_or("").to_string(),
                    ))
                }
                _ => {}
            }
        }

        let sources =
            usize::from(value_attr.is_some()) + usize::from(ref_attr.is_some()) + usize::from(nested.is_some());
        if sources != 1 {
            session.error(
                format!(
                    "property '{}' of component '{}' must have exactly one of 'value', 'ref', or a nested element",
                    name, component
                ),
                resource,
                element.span.clone(),
                None,
            );
            return None;
        }

        let value = if let Some(v) = value_attr {
            PropertyValue::Literal(v.to_string())
        } else if let Some(r) = ref_attr {
            PropertyValue::Reference(r.to_string())
        } else {
            nested.unwrap()
        };

        if let PropertyValue::Reference(target) = &value {
            if target.is_empty() {
                session.error(
                    format!(
                        "property '{}' of component '{}' references an empty name",
                        name, component
                    ),
                    resource,
                    element.span.clone(),
                    None,
                );
                return None;
            }
        }

        Some(Property { name, value })
    }

    /// Hand a non-default-namespace element to its registered handler
    pub fn parse_custom_element(
        &self,
        element: &Element,
        handlers: &NamespaceHandlerRegistry,
        resource: &str,
        session: &mut LoadSession<'_>,
    ) {
        let Some(uri) = element.namespace.clone() else {
            return;
        };
        match handlers.get(&uri) {
            Some(handler) => {
                let mut ctx = CustomContext {
                    session,
                    resource_description: resource,
                };
                handler.parse(element, &mut ctx);
            }
            None => session.error(
                format!(
                    "no namespace handler registered for [{}] (element <{}>)",
                    uri,
                    element.qualified_name()
                ),
                resource,
                element.span.clone(),
                None,
            ),
        }
    }

    /// Offer custom attributes and child elements to their handlers for
    /// decoration, in document order: attributes first, then children
    pub fn decorate_if_required(
        &self,
        element: &Element,
        holder: DefinitionHolder,
        handlers: &NamespaceHandlerRegistry,
        resource: &str,
        session: &mut LoadSession<'_>,
    ) -> DefinitionHolder {
        let mut holder = holder;
        for attr in &element.attributes {
            if let Some(uri) = attr.namespace.clone() {
                if uri == COMPONENTS_NAMESPACE || uri == XML_NAMESPACE {
                    continue;
                }
                holder = self.decorate_node(
                    CustomNode::Attribute(attr),
                    &uri,
                    attr.span.clone(),
                    holder,
                    handlers,
                    resource,
                    session,
                );
            }
        }
        for child in element.child_elements() {
            if let Some(uri) = child.namespace.clone() {
                if uri == COMPONENTS_NAMESPACE {
                    continue;
                }
                holder = self.decorate_node(
                    CustomNode::Element(child),
                    &uri,
                    child.span.clone(),
                    holder,
                    handlers,
                    resource,
                    session,
                );
            }
        }
        holder
    }

    #[allow(clippy::too_many_arguments)]
    fn decorate_node(
        &self,
        node: CustomNode<'_>,
        uri: &str,
        span: crate::error::Span,
        holder: DefinitionHolder,
        handlers: &NamespaceHandlerRegistry,
        resource: &str,
        session: &mut LoadSession<'_>,
    ) -> DefinitionHolder {
        match handlers.get(uri) {
            Some(handler) => {
                let mut ctx = CustomContext {
                    session,
                    resource_description: resource,
                };
                handler.decorate(&node, holder, &mut ctx)
            }
            None => {
                session.error(
                    format!("no namespace handler registered for [{}]", uri),
                    resource,
                    span,
                    None,
                );
                holder
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse;
    use crate::registry::DefinitionRegistry;

    fn root_of(source: &str) -> crate::parser::ast::Element {
        parse(source).expect("Should parse").root
    }

    #[test]
    fn test_split_multi_value() {
        assert_eq!(split_multi_value("a,b;c d"), vec!["a", "b", "c", "d"]);
        assert_eq!(split_multi_value(""), Vec::<String>::new());
        assert_eq!(split_multi_value(" ,; "), Vec::<String>::new());
    }

    #[test]
    fn test_defaults_inherit_through_chain() {
        let outer_el = root_of(r#"<components default-lazy-init="true" default-init-method="init"/>"#);
        let inner_el = root_of(r#"<components default-lazy-init="false"/>"#);

        let outer = ParserDelegate::new(&outer_el, None);
        assert!(outer.defaults().lazy_init);
        assert_eq!(outer.defaults().init_method.as_deref(), Some("init"));

        let inner = ParserDelegate::new(&inner_el, Some(&outer));
        assert!(!inner.defaults().lazy_init);
        // unset on the inner scope, inherited from the outer
        assert_eq!(inner.defaults().init_method.as_deref(), Some("init"));
    }

    #[test]
    fn test_default_value_keyword_inherits() {
        let outer_el = root_of(r#"<components default-lazy-init="true"/>"#);
        let inner_el = root_of(r#"<components default-lazy-init="default"/>"#);
        let outer = ParserDelegate::new(&outer_el, None);
        let inner = ParserDelegate::new(&inner_el, Some(&outer));
        assert!(inner.defaults().lazy_init);
    }

    #[test]
    fn test_parse_component_with_id_and_aliases() {
        let root = root_of(r#"<component id="user" name="customer client" type="app::User"/>"#);
        let mut registry = DefinitionRegistry::new();
        let mut session = LoadSession::new(&mut registry);
        let delegate = ParserDelegate::new(&root, None);

        let holder = delegate
            .parse_component_element(&root, "test", &mut session)
            .expect("Should parse");
        assert_eq!(holder.name, "user");
        assert_eq!(holder.aliases, vec!["customer", "client"]);
        assert_eq!(holder.definition.type_name, "app::User");
        assert!(session.problems.is_empty());
    }

    #[test]
    fn test_first_name_token_becomes_name_without_id() {
        let root = root_of(r#"<component name="user,customer" type="app::User"/>"#);
        let mut registry = DefinitionRegistry::new();
        let mut session = LoadSession::new(&mut registry);
        let delegate = ParserDelegate::new(&root, None);

        let holder = delegate
            .parse_component_element(&root, "test", &mut session)
            .expect("Should parse");
        assert_eq!(holder.name, "user");
        assert_eq!(holder.aliases, vec!["customer"]);
    }

    #[test]
    fn test_component_without_name_is_skipped() {
        let root = root_of(r#"<component type="app::User"/>"#);
        let mut registry = DefinitionRegistry::new();
        let mut session = LoadSession::new(&mut registry);
        let delegate = ParserDelegate::new(&root, None);

        assert!(delegate
            .parse_component_element(&root, "test", &mut session)
            .is_none());
        assert_eq!(session.problems.len(), 1);
    }

    #[test]
    fn test_component_without_type_is_skipped() {
        let root = root_of(r#"<component id="user"/>"#);
        let mut registry = DefinitionRegistry::new();
        let mut session = LoadSession::new(&mut registry);
        let delegate = ParserDelegate::new(&root, None);

        assert!(delegate
            .parse_component_element(&root, "test", &mut session)
            .is_none());
        assert_eq!(session.problems.len(), 1);
    }

    #[test]
    fn test_properties_parsed() {
        let root = root_of(
            r#"<component id="user" type="app::User">
                <description>the demo user</description>
                <property name="uid" value="42"/>
                <property name="repo" ref="repository"/>
                <property name="motto"><value>hello</value></property>
            </component>"#,
        );
        let mut registry = DefinitionRegistry::new();
        let mut session = LoadSession::new(&mut registry);
        let delegate = ParserDelegate::new(&root, None);

        let holder = delegate
            .parse_component_element(&root, "test", &mut session)
            .expect("Should parse");
        assert!(session.problems.is_empty());
        assert_eq!(holder.definition.description.as_deref(), Some("the demo user"));
        assert_eq!(
            holder.definition.property("uid"),
            Some(&PropertyValue::Literal("42".to_string()))
        );
        assert_eq!(
            holder.definition.property("repo"),
            Some(&PropertyValue::Reference("repository".to_string()))
        );
        assert_eq!(
            holder.definition.property("motto"),
            Some(&PropertyValue::Literal("hello".to_string()))
        );
    }

    #[test]
    fn test_property_with_both_value_and_ref_is_rejected() {
        let root = root_of(
            r#"<component id="user" type="app::User">
                <property name="x" value="1" ref="other"/>
            </component>"#,
        );
        let mut registry = DefinitionRegistry::new();
        let mut session = LoadSession::new(&mut registry);
        let delegate = ParserDelegate::new(&root, None);

        let holder = delegate
            .parse_component_element(&root, "test", &mut session)
            .expect("component itself still parses");
        assert!(holder.definition.properties.is_empty());
        assert_eq!(session.problems.len(), 1);
    }

    #[test]
    fn test_duplicate_property_reported_first_wins() {
        let root = root_of(
            r#"<component id="user" type="app::User">
                <property name="uid" value="1"/>
                <property name="uid" value="2"/>
            </component>"#,
        );
        let mut registry = DefinitionRegistry::new();
        let mut session = LoadSession::new(&mut registry);
        let delegate = ParserDelegate::new(&root, None);

        let holder = delegate
            .parse_component_element(&root, "test", &mut session)
            .expect("Should parse");
        assert_eq!(session.problems.len(), 1);
        assert_eq!(
            holder.definition.property("uid"),
            Some(&PropertyValue::Literal("1".to_string()))
        );
    }

    #[test]
    fn test_unknown_scope_is_skipped() {
        let root = root_of(r#"<component id="user" type="app::User" scope="request"/>"#);
        let mut registry = DefinitionRegistry::new();
        let mut session = LoadSession::new(&mut registry);
        let delegate = ParserDelegate::new(&root, None);

        assert!(delegate
            .parse_component_element(&root, "test", &mut session)
            .is_none());
        assert_eq!(session.problems.len(), 1);
    }

    #[test]
    fn test_lazy_init_falls_back_to_scope_default() {
        let scope_el = root_of(r#"<components default-lazy-init="true"/>"#);
        let delegate = ParserDelegate::new(&scope_el, None);
        let root = root_of(r#"<component id="user" type="app::User"/>"#);
        let mut registry = DefinitionRegistry::new();
        let mut session = LoadSession::new(&mut registry);

        let holder = delegate
            .parse_component_element(&root, "test", &mut session)
            .expect("Should parse");
        assert!(holder.definition.lazy_init);
    }
}

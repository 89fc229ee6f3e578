//! Custom namespace handling
//!
//! Elements and attributes outside the default namespace are opaque to the
//! reader; a [`NamespaceHandler`] registered for their namespace URI decides
//! what they mean.

use std::collections::HashMap;

use crate::error::Span;
use crate::parser::ast::{Attribute, Element};
use crate::reader::context::{LoadSession, ReaderEvent};
use crate::registry::{register_holder, DefinitionHolder, DefinitionRegistry};

/// A custom node offered to a handler for decoration
#[derive(Debug)]
pub enum CustomNode<'a> {
    Element(&'a Element),
    Attribute(&'a Attribute),
}

/// Handler for one custom namespace
pub trait NamespaceHandler {
    /// Parse a top-level custom element. Anything the handler produces is
    /// registered through the context.
    fn parse(&self, element: &Element, ctx: &mut CustomContext<'_, '_>);

    /// Decorate a freshly parsed component in response to a custom attribute
    /// or child element. The default leaves the holder untouched.
    fn decorate(
        &self,
        _node: &CustomNode<'_>,
        holder: DefinitionHolder,
        _ctx: &mut CustomContext<'_, '_>,
    ) -> DefinitionHolder {
        holder
    }
}

/// Registry of namespace handlers keyed by namespace URI
#[derive(Default)]
pub struct NamespaceHandlerRegistry {
    handlers: HashMap<String, Box<dyn NamespaceHandler>>,
}

impl NamespaceHandlerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, uri: impl Into<String>, handler: impl NamespaceHandler + 'static) {
        self.handlers.insert(uri.into(), Box::new(handler));
    }

    pub fn get(&self, uri: &str) -> Option<&dyn NamespaceHandler> {
        self.handlers.get(uri).map(|h| h.as_ref())
    }
}

/// Facade handed to namespace handlers for registering and reporting
pub struct CustomContext<'s, 'r> {
    pub(crate) session: &'s mut LoadSession<'r>,
    pub(crate) resource_description: &'s str,
}

impl CustomContext<'_, '_> {
    /// Register a component produced by the handler. Registration failures
    /// are recorded as non-fatal problems, same as default-namespace ones.
    pub fn register(&mut self, holder: DefinitionHolder) {
        let name = holder.name.clone();
        let aliases = holder.aliases.clone();
        let span = holder.definition.span.clone();
        match register_holder(self.session.registry, holder) {
            Ok(()) => {
                self.session.registered += 1;
                self.session
                    .events
                    .push(ReaderEvent::ComponentRegistered { name, aliases });
            }
            Err(err) => self.session.error(
                format!("failed to register component '{}'", name),
                self.resource_description,
                span,
                Some(err.to_string()),
            ),
        }
    }

    /// Record a non-fatal problem against a node
    pub fn report(&mut self, message: impl Into<String>, span: Span) {
        self.session
            .error(message, self.resource_description, span, None);
    }

    /// Read-only view of the registry being populated
    pub fn registry(&self) -> &DefinitionRegistry {
        self.session.registry
    }
}

//! Definition document reader
//!
//! Translates parsed component documents into registry entries: a recursive
//! walk over `<components>` scopes that dispatches each child node to import
//! resolution, alias registration, component registration, or a custom
//! namespace handler. Structural problems are accumulated, never fatal for
//! sibling nodes; placeholder failures and malformed documents abort the
//! whole pass.

mod context;
mod delegate;
mod namespace;

pub use context::{LoadReport, Problem, ReaderEvent, ReaderHooks};
pub use delegate::{ParserDelegate, ScopeDefaults, COMPONENTS_NAMESPACE};
pub use namespace::{CustomContext, CustomNode, NamespaceHandler, NamespaceHandlerRegistry};

use std::io::Read;
use std::path::Path;

use context::LoadSession;
use delegate::split_multi_value;

use crate::environment::Environment;
use crate::parser::ast::{Document, Element};
use crate::parser::parse;
use crate::registry::{register_holder, DefinitionRegistry};
use crate::resource::{
    apply_relative_path, is_absolute_location, FileResource, FileSystemResourceLoader,
    InMemoryResource, Resource, ResourceLoader,
};
use crate::LoadError;

/// Reads component documents into a registry.
///
/// The reader borrows the registry for its lifetime; one registration pass
/// has exclusive access and performs no locking of its own.
pub struct DefinitionReader<'r> {
    registry: &'r mut DefinitionRegistry,
    environment: Environment,
    loader: Box<dyn ResourceLoader>,
    handlers: NamespaceHandlerRegistry,
    hooks: Option<Box<dyn ReaderHooks>>,
}

impl<'r> DefinitionReader<'r> {
    pub fn new(registry: &'r mut DefinitionRegistry) -> Self {
        Self {
            registry,
            environment: Environment::new(),
            loader: Box::new(FileSystemResourceLoader::new()),
            handlers: NamespaceHandlerRegistry::new(),
            hooks: None,
        }
    }

    /// Set the environment used for profile gating and placeholder expansion
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }

    /// Replace the loader used to resolve absolute import locations
    pub fn with_loader(mut self, loader: impl ResourceLoader + 'static) -> Self {
        self.loader = Box::new(loader);
        self
    }

    /// Register a handler for a custom namespace URI
    pub fn with_namespace_handler(
        mut self,
        uri: impl Into<String>,
        handler: impl NamespaceHandler + 'static,
    ) -> Self {
        self.handlers.register(uri, handler);
        self
    }

    /// Install pre/post scope hooks
    pub fn with_hooks(mut self, hooks: impl ReaderHooks + 'static) -> Self {
        self.hooks = Some(Box::new(hooks));
        self
    }

    /// Load definitions from a document on disk
    pub fn load_path(&mut self, path: impl AsRef<Path>) -> Result<LoadReport, LoadError> {
        self.load(&FileResource::new(path.as_ref()))
    }

    /// Load definitions from an in-memory document. Relative imports have no
    /// base to derive from and will be reported as problems.
    pub fn load_str(&mut self, source: &str) -> Result<LoadReport, LoadError> {
        self.load(&InMemoryResource::new(source, "inline document"))
    }

    /// Load definitions from the given resource into the registry
    pub fn load(&mut self, resource: &dyn Resource) -> Result<LoadReport, LoadError> {
        let ctx = LoadContext {
            environment: &self.environment,
            loader: self.loader.as_ref(),
            handlers: &self.handlers,
            hooks: self.hooks.as_deref(),
        };
        let mut session = LoadSession::new(self.registry);
        load_resource(&ctx, &mut session, resource)?;
        Ok(session.into_report())
    }
}

/// Immutable collaborators shared by every document in one pass
struct LoadContext<'c> {
    environment: &'c Environment,
    loader: &'c dyn ResourceLoader,
    handlers: &'c NamespaceHandlerRegistry,
    hooks: Option<&'c dyn ReaderHooks>,
}

/// Read, parse and register one resource, guarding against import cycles.
/// Returns the number of definitions registered from it, imports included.
fn load_resource(
    ctx: &LoadContext<'_>,
    session: &mut LoadSession<'_>,
    resource: &dyn Resource,
) -> Result<usize, LoadError> {
    let description = resource.description();
    if session.loading.contains(&description) {
        let chain = format!("{} -> {}", session.loading.join(" -> "), description);
        return Err(LoadError::ImportCycle { chain });
    }
    session.loading.push(description.clone());
    let result = read_and_register(ctx, session, resource, &description);
    session.loading.pop();
    result
}

fn read_and_register(
    ctx: &LoadContext<'_>,
    session: &mut LoadSession<'_>,
    resource: &dyn Resource,
    description: &str,
) -> Result<usize, LoadError> {
    let mut source = String::new();
    resource
        .open()
        .and_then(|mut stream| stream.read_to_string(&mut source).map(|_| ()))
        .map_err(|err| LoadError::Read {
            description: description.to_string(),
            source: err,
        })?;

    let document = parse(&source).map_err(|errors| LoadError::Parse {
        description: description.to_string(),
        errors,
    })?;

    let before = session.registered;
    let reader = DocumentReader {
        ctx,
        resource,
        description,
    };
    reader.register_definitions(&document, session)?;
    Ok(session.registered - before)
}

/// Walks one parsed document, dispatching nodes into the registry
struct DocumentReader<'c> {
    ctx: &'c LoadContext<'c>,
    /// Resource the document was read from; relative imports derive from it
    resource: &'c dyn Resource,
    description: &'c str,
}

impl DocumentReader<'_> {
    fn register_definitions(
        &self,
        document: &Document,
        session: &mut LoadSession<'_>,
    ) -> Result<(), LoadError> {
        self.do_register(&document.root, None, session)
    }

    /// One scope: build the next delegate chain link, gate on profiles,
    /// dispatch children. Nested `<components>` elements recurse here.
    fn do_register(
        &self,
        root: &Element,
        parent: Option<&ParserDelegate>,
        session: &mut LoadSession<'_>,
    ) -> Result<(), LoadError> {
        let delegate = ParserDelegate::new(root, parent);

        if delegate.is_default_namespace(root) {
            if let Some(profile_attr) = root.attr("profile") {
                if !profile_attr.trim().is_empty() {
                    let profiles = split_multi_value(profile_attr);
                    if !self.ctx.environment.accepts_profiles(&profiles) {
                        // nothing in this subtree is registered
                        return Ok(());
                    }
                }
            }
        }

        if let Some(hooks) = self.ctx.hooks {
            hooks.before_scope(root);
        }
        self.parse_definitions(root, &delegate, session)?;
        if let Some(hooks) = self.ctx.hooks {
            hooks.after_scope(root);
        }
        Ok(())
    }

    fn parse_definitions(
        &self,
        root: &Element,
        delegate: &ParserDelegate,
        session: &mut LoadSession<'_>,
    ) -> Result<(), LoadError> {
        if delegate.is_default_namespace(root) {
            for child in root.child_elements() {
                if delegate.is_default_namespace(child) {
                    self.parse_default_element(child, delegate, session)?;
                } else {
                    delegate.parse_custom_element(
                        child,
                        self.ctx.handlers,
                        self.description,
                        session,
                    );
                }
            }
        } else {
            delegate.parse_custom_element(root, self.ctx.handlers, self.description, session);
        }
        Ok(())
    }

    fn parse_default_element(
        &self,
        element: &Element,
        delegate: &ParserDelegate,
        session: &mut LoadSession<'_>,
    ) -> Result<(), LoadError> {
        match element.name.as_str() {
            "import" => self.import_definition_resource(element, session),
            "alias" => {
                self.process_alias_registration(element, session);
                Ok(())
            }
            "component" => {
                self.process_component_definition(element, delegate, session);
                Ok(())
            }
            "components" => self.do_register(element, Some(delegate), session),
            other => {
                session.error(
                    format!("unrecognized element <{}>", other),
                    self.description,
                    element.span.clone(),
                    None,
                );
                Ok(())
            }
        }
    }

    /// Resolve and load an `<import resource="..."/>` node.
    ///
    /// Store-level failures (unreadable or unparseable target, unresolvable
    /// location, cycle) are reported against this node and siblings continue;
    /// placeholder failures abort the pass.
    fn import_definition_resource(
        &self,
        element: &Element,
        session: &mut LoadSession<'_>,
    ) -> Result<(), LoadError> {
        let raw_location = element.attr("resource").unwrap_or("");
        if raw_location.trim().is_empty() {
            session.error(
                "import must declare a non-empty 'resource' attribute",
                self.description,
                element.span.clone(),
                None,
            );
            return Ok(());
        }

        let location = self
            .ctx
            .environment
            .resolve_required_placeholders(raw_location)?;

        let mut actual_resources = Vec::new();

        if is_absolute_location(&location) {
            if let Err(err) = self.load_from_location(&location, session, &mut actual_resources) {
                if !err.is_store_level() {
                    return Err(err);
                }
                session.error(
                    format!("failed to import definitions from [{}]", location),
                    self.description,
                    element.span.clone(),
                    Some(err.to_string()),
                );
            }
        } else if let Err(err) = self.import_relative(&location, session, &mut actual_resources) {
            if !err.is_store_level() {
                return Err(err);
            }
            let message = match &err {
                LoadError::Resource { .. } => {
                    format!("failed to resolve current resource location [{}]", location)
                }
                _ => format!(
                    "failed to import definitions from relative location [{}]",
                    location
                ),
            };
            session.error(message, self.description, element.span.clone(), Some(err.to_string()));
        }

        session.events.push(ReaderEvent::ImportProcessed {
            location,
            actual_resources,
        });
        Ok(())
    }

    /// Relative import: derive a sibling of the current document's resource.
    /// When the sibling does not exist, fall back to an absolute location
    /// string built from the base URL, for loaders that cannot confirm
    /// existence up front.
    fn import_relative(
        &self,
        location: &str,
        session: &mut LoadSession<'_>,
        actual_resources: &mut Vec<String>,
    ) -> Result<usize, LoadError> {
        let relative = self
            .resource
            .create_relative(location)
            .map_err(|err| LoadError::Resource {
                location: location.to_string(),
                source: err,
            })?;

        if relative.exists() {
            let count = load_resource(self.ctx, session, relative.as_ref())?;
            actual_resources.push(relative.description());
            Ok(count)
        } else {
            let base = self.resource.url().map_err(|err| LoadError::Resource {
                location: location.to_string(),
                source: err,
            })?;
            let absolute = apply_relative_path(base.as_str(), location);
            self.load_from_location(&absolute, session, actual_resources)
        }
    }

    fn load_from_location(
        &self,
        location: &str,
        session: &mut LoadSession<'_>,
        actual_resources: &mut Vec<String>,
    ) -> Result<usize, LoadError> {
        let resource = self
            .ctx
            .loader
            .get_resource(location)
            .map_err(|err| LoadError::Resource {
                location: location.to_string(),
                source: err,
            })?;
        let count = load_resource(self.ctx, session, resource.as_ref())?;
        actual_resources.push(resource.description());
        Ok(count)
    }

    fn process_alias_registration(&self, element: &Element, session: &mut LoadSession<'_>) {
        let name = element.attr("name").unwrap_or("").to_string();
        let alias = element.attr("alias").unwrap_or("").to_string();
        let mut valid = true;
        if name.is_empty() {
            session.error(
                "alias must declare a non-empty 'name' attribute",
                self.description,
                element.span.clone(),
                None,
            );
            valid = false;
        }
        if alias.is_empty() {
            session.error(
                "alias must declare a non-empty 'alias' attribute",
                self.description,
                element.span.clone(),
                None,
            );
            valid = false;
        }
        if !valid {
            return;
        }
        match session.registry.register_alias(&name, &alias) {
            Ok(()) => session
                .events
                .push(ReaderEvent::AliasRegistered { name, alias }),
            Err(err) => session.error(
                format!("failed to register alias '{}' for component '{}'", alias, name),
                self.description,
                element.span.clone(),
                Some(err.to_string()),
            ),
        }
    }

    fn process_component_definition(
        &self,
        element: &Element,
        delegate: &ParserDelegate,
        session: &mut LoadSession<'_>,
    ) {
        // parse failures are already reported; nothing more to do here
        let Some(holder) = delegate.parse_component_element(element, self.description, session)
        else {
            return;
        };
        let holder =
            delegate.decorate_if_required(element, holder, self.ctx.handlers, self.description, session);
        let name = holder.name.clone();
        let aliases = holder.aliases.clone();
        match register_holder(session.registry, holder) {
            Ok(()) => {
                session.registered += 1;
                session
                    .events
                    .push(ReaderEvent::ComponentRegistered { name, aliases });
            }
            Err(err) => session.error(
                format!("failed to register component '{}'", name),
                self.description,
                element.span.clone(),
                Some(err.to_string()),
            ),
        }
    }
}

//! Problems, events, and the per-pass session state

use std::fmt;

use crate::error::Span;
use crate::parser::ast::Element;
use crate::registry::DefinitionRegistry;

/// A non-fatal problem recorded against a document node.
///
/// Problems accumulate; they never halt processing of sibling nodes.
#[derive(Debug, Clone)]
pub struct Problem {
    pub message: String,
    /// Description of the resource the offending node came from
    pub resource: String,
    pub span: Span,
    pub cause: Option<String>,
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} in {}", self.message, self.resource)?;
        if let Some(cause) = &self.cause {
            write!(f, ": {}", cause)?;
        }
        Ok(())
    }
}

/// Notifications emitted while documents are processed, in order
#[derive(Debug, Clone, PartialEq)]
pub enum ReaderEvent {
    /// An `<import>` node finished, successfully or not
    ImportProcessed {
        /// Location after placeholder expansion
        location: String,
        /// Descriptions of the resources actually loaded
        actual_resources: Vec<String>,
    },
    AliasRegistered {
        name: String,
        alias: String,
    },
    ComponentRegistered {
        name: String,
        aliases: Vec<String>,
    },
}

/// Outcome of one load pass
#[derive(Debug, Default)]
pub struct LoadReport {
    /// Number of component definitions registered, imports included
    pub registered: usize,
    pub problems: Vec<Problem>,
    pub events: Vec<ReaderEvent>,
}

impl LoadReport {
    pub fn is_clean(&self) -> bool {
        self.problems.is_empty()
    }
}

/// Extension hooks invoked around each document scope.
///
/// Both default to no-ops; implement to observe or log scopes as they are
/// entered and left. Skipped scopes (profile not accepted) see neither hook.
pub trait ReaderHooks {
    fn before_scope(&self, _root: &Element) {}
    fn after_scope(&self, _root: &Element) {}
}

/// Mutable state threaded through one registration pass
pub(crate) struct LoadSession<'a> {
    pub registry: &'a mut DefinitionRegistry,
    pub registered: usize,
    pub problems: Vec<Problem>,
    pub events: Vec<ReaderEvent>,
    /// Descriptions of resources on the import stack, outermost first
    pub loading: Vec<String>,
}

impl<'a> LoadSession<'a> {
    pub fn new(registry: &'a mut DefinitionRegistry) -> Self {
        Self {
            registry,
            registered: 0,
            problems: Vec::new(),
            events: Vec::new(),
            loading: Vec::new(),
        }
    }

    /// Record a non-fatal problem against a node
    pub fn error(
        &mut self,
        message: impl Into<String>,
        resource: &str,
        span: Span,
        cause: Option<String>,
    ) {
        self.problems.push(Problem {
            message: message.into(),
            resource: resource.to_string(),
            span,
            cause,
        });
    }

    pub fn into_report(self) -> LoadReport {
        LoadReport {
            registered: self.registered,
            problems: self.problems,
            events: self.events,
        }
    }
}

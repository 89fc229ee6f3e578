//! Document tree types for parsed component documents

use std::collections::HashMap;

use crate::error::ParseError;

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Namespace implicitly bound to the `xml` prefix.
pub const XML_NAMESPACE: &str = "http://www.w3.org/XML/1998/namespace";

/// Root of a parsed component document
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub root: Element,
}

/// A named, attributed node in the document tree
#[derive(Debug, Clone, PartialEq)]
pub struct Element {
    /// Namespace prefix as written in the source, if any
    pub prefix: Option<String>,
    /// Local tag name
    pub name: String,
    /// Namespace URI resolved from in-scope `xmlns` declarations
    pub namespace: Option<String>,
    pub attributes: Vec<Attribute>,
    pub children: Vec<Node>,
    pub span: Span,
}

/// Child of an element: a nested element or character data
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Element(Element),
    Text(String),
}

/// A single attribute on an element
#[derive(Debug, Clone, PartialEq)]
pub struct Attribute {
    pub prefix: Option<String>,
    pub name: String,
    /// Resolved namespace URI; unprefixed attributes carry none
    pub namespace: Option<String>,
    pub value: String,
    pub span: Span,
}

impl Element {
    /// Look up an unprefixed attribute by local name
    pub fn attr(&self, name: &str) -> Option<&str> {
        self.attributes
            .iter()
            .find(|a| a.prefix.is_none() && a.name == name)
            .map(|a| a.value.as_str())
    }

    /// Iterate over direct element children in document order
    pub fn child_elements(&self) -> impl Iterator<Item = &Element> {
        self.children.iter().filter_map(|c| match c {
            Node::Element(e) => Some(e),
            Node::Text(_) => None,
        })
    }

    /// Concatenated direct text content
    pub fn text(&self) -> String {
        let mut out = String::new();
        for child in &self.children {
            if let Node::Text(t) = child {
                if !out.is_empty() {
                    out.push(' ');
                }
                out.push_str(t);
            }
        }
        out
    }

    /// Tag name as written, including any prefix
    pub fn qualified_name(&self) -> String {
        match &self.prefix {
            Some(p) => format!("{}:{}", p, self.name),
            None => self.name.clone(),
        }
    }
}

/// Resolve `xmlns` declarations into per-node namespace URIs.
///
/// Declarations are lexically scoped and are consumed here; after this pass
/// they no longer appear among an element's attributes. Undeclared prefixes
/// are collected as errors.
pub(crate) fn resolve_namespaces(root: &mut Element) -> Vec<ParseError> {
    let mut errors = Vec::new();
    let mut scope = HashMap::new();
    scope.insert("xml".to_string(), XML_NAMESPACE.to_string());
    resolve_element(root, &scope, &mut errors);
    errors
}

fn resolve_element(
    element: &mut Element,
    scope: &HashMap<String, String>,
    errors: &mut Vec<ParseError>,
) {
    let mut local = scope.clone();
    for attr in &element.attributes {
        if attr.prefix.is_none() && attr.name == "xmlns" {
            // the empty key tracks the in-scope default namespace
            local.insert(String::new(), attr.value.clone());
        } else if attr.prefix.as_deref() == Some("xmlns") {
            local.insert(attr.name.clone(), attr.value.clone());
        }
    }
    element
        .attributes
        .retain(|a| !(a.prefix.is_none() && a.name == "xmlns") && a.prefix.as_deref() != Some("xmlns"));

    element.namespace = match &element.prefix {
        Some(prefix) => match local.get(prefix) {
            Some(uri) => Some(uri.clone()),
            None => {
                errors.push(undeclared_prefix(prefix, &element.span));
                None
            }
        },
        None => local.get("").filter(|uri| !uri.is_empty()).cloned(),
    };

    for attr in &mut element.attributes {
        if let Some(prefix) = &attr.prefix {
            match local.get(prefix) {
                Some(uri) => attr.namespace = Some(uri.clone()),
                None => errors.push(undeclared_prefix(prefix, &attr.span)),
            }
        }
    }

    for child in &mut element.children {
        if let Node::Element(e) = child {
            resolve_element(e, &local, errors);
        }
    }
}

fn undeclared_prefix(prefix: &str, span: &Span) -> ParseError {
    ParseError::Syntax {
        span: span.clone(),
        message: format!("undeclared namespace prefix '{}'", prefix),
        expected: Vec::new(),
    }
}

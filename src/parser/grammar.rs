//! Parser implementation using chumsky

use chumsky::input::{Stream, ValueInput};
use chumsky::prelude::*;

use crate::parser::ast::{resolve_namespaces, Attribute, Document, Element, Node};
use crate::parser::lexer::{self, Token};

/// Parse a component document into an element tree
pub fn parse(input: &str) -> Result<Document, Vec<crate::ParseError>> {
    let len = input.len();

    let token_iter = lexer::lex(input)
        .into_iter()
        .map(|(tok, span)| (tok, span.into()));

    // Turn the token iterator into a stream that chumsky can use
    let token_stream = Stream::from_iter(token_iter)
        // Split (Token, SimpleSpan) into token and span parts
        .map((len..len).into(), |(t, s): (_, _)| (t, s));

    let mut root = document_parser()
        .parse(token_stream)
        .into_result()
        .map_err(|errs| {
            errs.into_iter()
                .map(|e| e.into())
                .collect::<Vec<crate::ParseError>>()
        })?;

    let errors = resolve_namespaces(&mut root);
    if errors.is_empty() {
        Ok(Document { root })
    } else {
        Err(errors)
    }
}

/// Helper to extract span range from chumsky's span types
fn span_range(e: &impl chumsky::span::Span<Offset = usize>) -> std::ops::Range<usize> {
    e.start()..e.end()
}

/// Split `prefix:local` tag and attribute names
fn split_name(raw: &str) -> (Option<String>, String) {
    match raw.split_once(':') {
        Some((prefix, local)) if !prefix.is_empty() && !local.is_empty() => {
            (Some(prefix.to_string()), local.to_string())
        }
        _ => (None, raw.to_string()),
    }
}

fn document_parser<'a, I>() -> impl Parser<'a, I, Element, extra::Err<Rich<'a, Token>>> + Clone
where
    I: ValueInput<'a, Token = Token, Span = SimpleSpan>,
{
    let element = recursive(|element| {
        let attribute = select! {
            Token::AttrName(n) => n,
        }
        .then_ignore(just(Token::Eq))
        .then(select! { Token::Value(v) => v })
        .map_with(|(raw_name, value), e| {
            let (prefix, name) = split_name(&raw_name);
            Attribute {
                prefix,
                name,
                namespace: None,
                value,
                span: span_range(&e.span()),
            }
        });

        let child = choice((
            element.clone().map(Node::Element),
            select! { Token::Text(t) => Node::Text(t) },
        ));

        // `<name attr="v"/>` has no children; `<name>...</name>` carries its
        // closing tag name along so the match can be checked below
        let empty_body = just(Token::SelfClose).map(|_| (Vec::new(), None));
        let full_body = just(Token::TagClose)
            .ignore_then(child.repeated().collect::<Vec<_>>())
            .then(select! { Token::CloseTag(n) => n })
            .map(|(children, close)| (children, Some(close)));

        select! { Token::OpenStart(n) => n }
            .then(attribute.repeated().collect::<Vec<_>>())
            .then(choice((empty_body, full_body)))
            .try_map(|((raw_name, attributes), (children, close)), span: SimpleSpan| {
                if let Some(close) = &close {
                    if close != &raw_name {
                        return Err(Rich::custom(
                            span,
                            format!(
                                "mismatched closing tag: expected </{}>, found </{}>",
                                raw_name, close
                            ),
                        ));
                    }
                }
                let (prefix, name) = split_name(&raw_name);
                Ok(Element {
                    prefix,
                    name,
                    namespace: None,
                    attributes,
                    children,
                    span: span_range(&span),
                })
            })
            .boxed()
    });

    // A document is exactly one root element
    element.then_ignore(end())
}

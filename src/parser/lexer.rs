//! Lexer for the XML document subset using logos
//!
//! Markup is context-dependent: a name means different things inside and
//! outside a tag. Two logos token sets cover the two modes, and `lex` drives
//! them with `morph`, switching on `<` and `>`.

use logos::{Lexer, Logos, Skip};

/// Byte range in source text
pub type Span = std::ops::Range<usize>;

/// Tokens handed to the grammar
#[derive(Debug, Clone, PartialEq)]
pub enum Token {
    /// `<name` opening a start tag
    OpenStart(String),
    /// `</name>` closing an element
    CloseTag(String),
    /// Attribute name inside a start tag
    AttrName(String),
    /// `=` between an attribute name and its value
    Eq,
    /// Quoted attribute value, entities decoded
    Value(String),
    /// `>` ending a start tag
    TagClose,
    /// `/>` ending an empty element
    SelfClose,
    /// Non-whitespace character data between tags, entities decoded
    Text(String),
}

/// Tokens between tags
#[derive(Logos, Debug, Clone, PartialEq)]
enum ContentToken {
    #[regex(r"[^<]+", |lex| lex.slice().to_string())]
    Text(String),

    #[token("<!--", skip_comment)]
    Comment,

    #[token("<?", skip_processing_instruction)]
    Declaration,

    #[regex(r"<!DOCTYPE[^>]*>", logos::skip)]
    Doctype,

    #[token("</")]
    CloseStart,

    #[token("<")]
    OpenAngle,
}

/// Tokens inside a tag
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
enum MarkupToken {
    #[regex(r"[A-Za-z_][A-Za-z0-9_.:-]*", |lex| lex.slice().to_string())]
    Name(String),

    #[token("=")]
    Eq,

    #[regex(r#""[^"]*""#, |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    DoubleQuoted(String),

    #[regex(r"'[^']*'", |lex| {
        let s = lex.slice();
        s[1..s.len() - 1].to_string()
    })]
    SingleQuoted(String),

    #[token("/>")]
    SelfClose,

    #[token(">")]
    End,
}

fn skip_comment(lex: &mut Lexer<ContentToken>) -> Skip {
    match lex.remainder().find("-->") {
        Some(end) => lex.bump(end + 3),
        None => lex.bump(lex.remainder().len()),
    }
    Skip
}

fn skip_processing_instruction(lex: &mut Lexer<ContentToken>) -> Skip {
    match lex.remainder().find("?>") {
        Some(end) => lex.bump(end + 2),
        None => lex.bump(lex.remainder().len()),
    }
    Skip
}

/// Lex input into tokens with spans
pub fn lex(input: &str) -> Vec<(Token, Span)> {
    let mut tokens = Vec::new();
    let mut content = ContentToken::lexer(input);
    loop {
        let Some(item) = content.next() else { break };
        let tok = match item {
            Ok(tok) => tok,
            Err(()) => continue,
        };
        match tok {
            ContentToken::Text(raw) => {
                let trimmed = raw.trim();
                if !trimmed.is_empty() {
                    tokens.push((Token::Text(decode_entities(trimmed)), content.span()));
                }
            }
            ContentToken::OpenAngle => {
                let start = content.span().start;
                let mut markup = content.morph::<MarkupToken>();
                lex_start_tag(&mut markup, start, &mut tokens);
                content = markup.morph();
            }
            ContentToken::CloseStart => {
                let start = content.span().start;
                let mut markup = content.morph::<MarkupToken>();
                lex_end_tag(&mut markup, start, &mut tokens);
                content = markup.morph();
            }
            ContentToken::Comment | ContentToken::Declaration | ContentToken::Doctype => {}
        }
    }
    tokens
}

fn lex_start_tag(lex: &mut Lexer<MarkupToken>, open_start: usize, tokens: &mut Vec<(Token, Span)>) {
    let mut seen_name = false;
    while let Some(item) = lex.next() {
        let tok = match item {
            Ok(tok) => tok,
            Err(()) => continue,
        };
        match tok {
            MarkupToken::Name(name) => {
                if seen_name {
                    tokens.push((Token::AttrName(name), lex.span()));
                } else {
                    tokens.push((Token::OpenStart(name), open_start..lex.span().end));
                    seen_name = true;
                }
            }
            MarkupToken::Eq => tokens.push((Token::Eq, lex.span())),
            MarkupToken::DoubleQuoted(value) | MarkupToken::SingleQuoted(value) => {
                tokens.push((Token::Value(decode_entities(&value)), lex.span()));
            }
            MarkupToken::SelfClose => {
                tokens.push((Token::SelfClose, lex.span()));
                return;
            }
            MarkupToken::End => {
                tokens.push((Token::TagClose, lex.span()));
                return;
            }
        }
    }
}

fn lex_end_tag(lex: &mut Lexer<MarkupToken>, open_start: usize, tokens: &mut Vec<(Token, Span)>) {
    let mut name = String::new();
    while let Some(item) = lex.next() {
        match item {
            Ok(MarkupToken::Name(n)) if name.is_empty() => name = n,
            Ok(MarkupToken::End) | Ok(MarkupToken::SelfClose) => {
                tokens.push((Token::CloseTag(name), open_start..lex.span().end));
                return;
            }
            _ => continue,
        }
    }
    // hit end of input before `>`; emit nothing and let the grammar report it
}

/// Decode the five standard entities plus numeric character references.
/// Anything unrecognized is kept literally.
fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }
    let mut out = String::with_capacity(input.len());
    let mut rest = input;
    while let Some(pos) = rest.find('&') {
        out.push_str(&rest[..pos]);
        rest = &rest[pos..];
        match rest.find(';') {
            Some(end) if end > 1 => match decode_entity(&rest[1..end]) {
                Some(c) => {
                    out.push(c);
                    rest = &rest[end + 1..];
                }
                None => {
                    out.push('&');
                    rest = &rest[1..];
                }
            },
            _ => {
                out.push('&');
                rest = &rest[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "lt" => Some('<'),
        "gt" => Some('>'),
        "amp" => Some('&'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        _ => {
            let code = if let Some(hex) = name.strip_prefix("#x").or_else(|| name.strip_prefix("#X")) {
                u32::from_str_radix(hex, 16).ok()?
            } else if let Some(dec) = name.strip_prefix('#') {
                dec.parse().ok()?
            } else {
                return None;
            };
            char::from_u32(code)
        }
    }
}

//! Template scanning
//!
//! Splits template text into literal text and `{{ … }}` actions, applying
//! trim markers, then tokenizes action bodies with Logos.

use logos::{Logos, Span};

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Token inside an action
#[derive(Logos, Debug, Clone, PartialEq)]
#[logos(skip r"[ \t\r\n]+")]
pub enum Token<'src> {
    #[token("|")]
    Pipe,

    #[token("true")]
    True,
    #[token("false")]
    False,

    /// Field chain such as `.Ports.Admin`
    #[regex(r"(\.[A-Za-z_][A-Za-z0-9_]*)+", |lex| lex.slice())]
    Field(&'src str),

    /// The whole context
    #[token(".")]
    Dot,

    #[regex(r"-?[0-9]+", |lex| lex.slice())]
    Integer(&'src str),

    #[regex(r"-?[0-9]+\.[0-9]+([eE][+-]?[0-9]+)?", |lex| lex.slice())]
    Float(&'src str),

    /// Interpreted string literal, quotes stripped, escapes still present
    #[regex(r#""([^"\\]|\\.)*""#, |lex| {
        let s = lex.slice();
        &s[1..s.len() - 1]
    })]
    String(&'src str),

    /// Raw string literal, backquotes stripped
    #[regex(r"`[^`]*`", |lex| {
        let s = lex.slice();
        &s[1..s.len() - 1]
    })]
    RawString(&'src str),

    /// Function name
    #[regex(r"[A-Za-z_][A-Za-z0-9_]*", |lex| lex.slice())]
    Ident(&'src str),
}

/// A piece of scanned template text
#[derive(Debug, Clone, PartialEq)]
pub enum Segment<'src> {
    Text(String),
    Action { body: &'src str, line: usize },
}

/// Error while scanning, with the 1-based line it occurred on
#[derive(Debug, Clone, PartialEq)]
pub struct ScanError {
    pub line: usize,
    pub message: String,
}

impl ScanError {
    fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

fn line_at(source: &str, offset: usize) -> usize {
    source[..offset].matches('\n').count() + 1
}

/// Find the `}}` closing an action whose body starts at `from`,
/// skipping over string literals.
fn find_close(source: &str, from: usize) -> Option<usize> {
    let bytes = source.as_bytes();
    let mut i = from;
    let mut quote: Option<u8> = None;

    while i < bytes.len() {
        let b = bytes[i];
        match quote {
            Some(q) => {
                if b == b'\\' && q == b'"' {
                    i += 1;
                } else if b == q {
                    quote = None;
                }
            }
            None => {
                if b == b'"' || b == b'`' {
                    quote = Some(b);
                } else if source[i..].starts_with(CLOSE) {
                    return Some(i);
                }
            }
        }
        i += 1;
    }
    None
}

/// Split template text into literal text and action bodies
///
/// `{{- ` trims whitespace before the action and ` -}}` trims whitespace
/// after it. Comment actions (`{{/* … */}}`) are dropped.
pub fn scan(source: &str) -> Result<Vec<Segment<'_>>, ScanError> {
    let mut segments = Vec::new();
    let mut text = String::new();
    let mut pos = 0;
    let mut trim_next = false;

    while let Some(rel) = source[pos..].find(OPEN) {
        let open = pos + rel;
        let mut body_start = open + OPEN.len();
        let rest = &source[body_start..];
        let trim_before = rest.starts_with('-') && rest[1..].starts_with(char::is_whitespace);
        if trim_before {
            body_start += 1;
        }

        // Trim markers only reach the literal directly beside the action.
        let mut literal = &source[pos..open];
        if trim_next {
            literal = literal.trim_start();
        }
        if trim_before {
            literal = literal.trim_end();
        }
        text.push_str(literal);

        let line = line_at(source, open);

        let close = find_close(source, body_start)
            .ok_or_else(|| ScanError::new(line, "unclosed action"))?;

        let mut body = &source[body_start..close];
        trim_next = false;
        if body.ends_with('-') && body[..body.len() - 1].ends_with(char::is_whitespace) {
            body = &body[..body.len() - 1];
            trim_next = true;
        }

        let inner = body.trim();
        if inner.starts_with("/*") {
            if !inner.ends_with("*/") {
                return Err(ScanError::new(line, "unclosed comment"));
            }
        } else {
            if !text.is_empty() {
                segments.push(Segment::Text(std::mem::take(&mut text)));
            }
            segments.push(Segment::Action { body, line });
        }

        pos = close + CLOSE.len();
    }

    let mut literal = &source[pos..];
    if trim_next {
        literal = literal.trim_start();
    }
    text.push_str(literal);
    if !text.is_empty() {
        segments.push(Segment::Text(text));
    }

    Ok(segments)
}

/// Tokenize an action body
pub fn lex(body: &str) -> Result<Vec<(Token<'_>, Span)>, String> {
    let mut lexer = Token::lexer(body);
    let mut tokens = Vec::new();

    while let Some(result) = lexer.next() {
        match result {
            Ok(token) => tokens.push((token, lexer.span())),
            Err(()) => {
                return Err(format!(
                    "unexpected '{}' in action at offset {}",
                    lexer.slice(),
                    lexer.span().start
                ))
            }
        }
    }

    Ok(tokens)
}

/// Resolve escapes in an interpreted string literal
pub fn unescape(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('\\') => out.push('\\'),
            Some('"') => out.push('"'),
            Some(other) => return Err(format!("unknown escape sequence '\\{}'", other)),
            None => return Err("unterminated escape sequence".to_string()),
        }
    }

    Ok(out)
}

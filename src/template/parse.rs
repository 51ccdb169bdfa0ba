//! Template parser
//!
//! Grammar of an action body:
//!
//! ```text
//! pipeline := command ('|' command)*
//! command  := operand | IDENT operand*
//! operand  := FIELD | '.' | INTEGER | FLOAT | STRING | true | false
//! ```
//!
//! Function names are checked against the helper map at parse time.

use serde_json::{Number, Value};

use super::funcs::FuncMap;
use super::lexer::{self, Segment, Token};

/// Parsed template body
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    Text(String),
    Action { pipeline: Pipeline, line: usize },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Pipeline {
    pub commands: Vec<Command>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    /// A lone operand; only valid as the first stage of a pipeline
    Operand(Operand),
    /// Function call; a piped value becomes the final argument
    Call { func: String, args: Vec<Operand> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    /// `.A.B.C`
    Field(Vec<String>),
    /// `.`
    Dot,
    Literal(Value),
}

/// Parse failure: line plus message
#[derive(Debug, Clone, PartialEq)]
pub struct ParseError {
    pub line: usize,
    pub message: String,
}

pub fn parse(source: &str, funcs: &FuncMap) -> Result<Vec<Node>, ParseError> {
    let segments = lexer::scan(source).map_err(|e| ParseError {
        line: e.line,
        message: e.message,
    })?;

    segments
        .into_iter()
        .map(|segment| match segment {
            Segment::Text(text) => Ok(Node::Text(text)),
            Segment::Action { body, line } => parse_pipeline(body, funcs)
                .map(|pipeline| Node::Action { pipeline, line })
                .map_err(|message| ParseError { line, message }),
        })
        .collect()
}

fn parse_pipeline(body: &str, funcs: &FuncMap) -> Result<Pipeline, String> {
    let tokens = lexer::lex(body)?;
    if tokens.is_empty() {
        return Err("missing value for command".to_string());
    }

    let mut commands = Vec::new();
    for (stage, group) in tokens.split(|(t, _)| *t == Token::Pipe).enumerate() {
        let Some(((first, _), rest)) = group.split_first() else {
            return Err(format!("missing command in pipeline stage {}", stage + 1));
        };

        let command = match first {
            Token::Ident(name) => {
                if !funcs.contains(name) {
                    return Err(format!("function \"{}\" not defined", name));
                }
                let args = rest
                    .iter()
                    .map(|(t, _)| operand(t, funcs))
                    .collect::<Result<Vec<_>, _>>()?;
                Command::Call {
                    func: name.to_string(),
                    args,
                }
            }
            token => {
                if !rest.is_empty() {
                    return Err(format!("can't give argument to non-function {}", describe(token)));
                }
                if stage > 0 {
                    return Err(format!(
                        "non executable command in pipeline stage {}",
                        stage + 1
                    ));
                }
                Command::Operand(operand(token, funcs)?)
            }
        };
        commands.push(command);
    }

    Ok(Pipeline { commands })
}

fn operand(token: &Token<'_>, funcs: &FuncMap) -> Result<Operand, String> {
    Ok(match token {
        Token::Field(path) => Operand::Field(
            path.split('.')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        ),
        Token::Dot => Operand::Dot,
        Token::True => Operand::Literal(Value::Bool(true)),
        Token::False => Operand::Literal(Value::Bool(false)),
        Token::Integer(s) => {
            let n: i64 = s
                .parse()
                .map_err(|_| format!("integer out of range: {}", s))?;
            Operand::Literal(Value::from(n))
        }
        Token::Float(s) => {
            let f: f64 = s.parse().map_err(|_| format!("bad number syntax: {}", s))?;
            let n = Number::from_f64(f).ok_or_else(|| format!("bad number syntax: {}", s))?;
            Operand::Literal(Value::Number(n))
        }
        Token::String(raw) => Operand::Literal(Value::String(lexer::unescape(raw)?)),
        Token::RawString(raw) => Operand::Literal(Value::String(raw.to_string())),
        Token::Ident(name) if funcs.contains(name) => {
            return Err(format!("function \"{}\" must be the first word of a command", name))
        }
        Token::Ident(name) => return Err(format!("function \"{}\" not defined", name)),
        Token::Pipe => return Err("unexpected \"|\"".to_string()),
    })
}

fn describe(token: &Token<'_>) -> String {
    match token {
        Token::Field(path) => format!("<{}>", path),
        Token::Dot => "<.>".to_string(),
        Token::Integer(s) | Token::Float(s) => s.to_string(),
        Token::String(s) => format!("\"{}\"", s),
        Token::RawString(s) => format!("`{}`", s),
        Token::True => "true".to_string(),
        Token::False => "false".to_string(),
        Token::Ident(s) => s.to_string(),
        Token::Pipe => "|".to_string(),
    }
}

//! Template execution against a JSON context

use serde_json::Value;
use std::borrow::Cow;
use std::io::{self, Write};

use super::funcs::FuncMap;
use super::parse::{Command, Node, Operand, Pipeline};

/// Execution failure
#[derive(Debug)]
pub enum ExecError {
    /// Evaluation failed at the given line
    Eval { line: usize, message: String },
    /// The output sink failed
    Io(io::Error),
}

impl From<io::Error> for ExecError {
    fn from(e: io::Error) -> Self {
        Self::Io(e)
    }
}

/// Text form of a value as it appears in rendered output
pub fn format_value(value: &Value) -> Cow<'_, str> {
    match value {
        Value::String(s) => Cow::Borrowed(s),
        Value::Null => Cow::Borrowed(""),
        Value::Bool(b) => Cow::Owned(b.to_string()),
        Value::Number(n) => Cow::Owned(n.to_string()),
        Value::Array(_) | Value::Object(_) => Cow::Owned(value.to_string()),
    }
}

pub fn execute<W: Write>(
    nodes: &[Node],
    funcs: &FuncMap,
    ctx: &Value,
    out: &mut W,
) -> Result<(), ExecError> {
    for node in nodes {
        match node {
            Node::Text(text) => out.write_all(text.as_bytes())?,
            Node::Action { pipeline, line } => {
                let value = eval_pipeline(pipeline, funcs, ctx).map_err(|message| {
                    ExecError::Eval {
                        line: *line,
                        message,
                    }
                })?;
                out.write_all(format_value(&value).as_bytes())?;
            }
        }
    }
    Ok(())
}

fn eval_pipeline(pipeline: &Pipeline, funcs: &FuncMap, ctx: &Value) -> Result<Value, String> {
    let mut piped: Option<Value> = None;

    for command in &pipeline.commands {
        let value = match command {
            Command::Operand(op) => eval_operand(op, ctx)?,
            Command::Call { func, args } => {
                let mut values = args
                    .iter()
                    .map(|op| eval_operand(op, ctx))
                    .collect::<Result<Vec<_>, _>>()?;
                values.extend(piped.take());

                let f = funcs
                    .get(func)
                    .ok_or_else(|| format!("function \"{}\" not defined", func))?;
                f(&values).map_err(|e| format!("error calling {}: {}", func, e))?
            }
        };
        piped = Some(value);
    }

    Ok(piped.unwrap_or(Value::Null))
}

fn eval_operand(op: &Operand, ctx: &Value) -> Result<Value, String> {
    match op {
        Operand::Dot => Ok(ctx.clone()),
        Operand::Literal(v) => Ok(v.clone()),
        Operand::Field(path) => lookup(ctx, path).cloned(),
    }
}

/// Walk a dotted field path through nested objects
fn lookup<'a>(ctx: &'a Value, path: &[String]) -> Result<&'a Value, String> {
    let mut current = ctx;
    for (i, key) in path.iter().enumerate() {
        current = match current {
            Value::Object(map) => map.get(key).ok_or_else(|| {
                format!(
                    "map has no entry for key \"{}\" (at .{})",
                    key,
                    path[..=i].join(".")
                )
            })?,
            other => {
                return Err(format!(
                    "can't evaluate field {} in type {}",
                    key,
                    type_name(other)
                ))
            }
        };
    }
    Ok(current)
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

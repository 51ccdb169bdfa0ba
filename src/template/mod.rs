//! Config document templates
//!
//! A small Go-template-compatible subset: `{{ .Field.Path }}` actions,
//! pipelines into helper functions (`{{ .Meta | indent 4 }}`), literals,
//! trim markers and comments. Rendering a missing field is an error.
//!
//! Templates render against a `serde_json::Value`, so any `Serialize` type
//! (usually [`crate::driver::Params::context`]) can act as the context.

mod exec;
mod funcs;
mod lexer;
mod parse;

use serde_json::Value;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use crate::common::{Error, Result};

pub use exec::format_value;
pub use funcs::{indent, Func, FuncMap};

/// A parsed template, ready to execute any number of times
#[derive(Debug, Clone)]
pub struct Template {
    name: String,
    funcs: FuncMap,
    nodes: Vec<parse::Node>,
}

impl Template {
    /// Parse `source` with the built-in helpers
    pub fn parse(name: &str, source: &str) -> Result<Self> {
        Self::parse_with(name, source, FuncMap::builtin())
    }

    /// Parse `source` with a caller-supplied helper map
    pub fn parse_with(name: &str, source: &str, funcs: FuncMap) -> Result<Self> {
        let nodes = parse::parse(source, &funcs).map_err(|e| Error::TemplateParse {
            name: name.to_string(),
            line: e.line,
            message: e.message,
        })?;

        Ok(Self {
            name: name.to_string(),
            funcs,
            nodes,
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Execute the template, streaming output into `out`
    ///
    /// Sink failures surface as `Error::Io`.
    pub fn execute<W: Write>(&self, ctx: &Value, out: &mut W) -> Result<()> {
        exec::execute(&self.nodes, &self.funcs, ctx, out).map_err(|e| match e {
            exec::ExecError::Eval { line, message } => {
                Error::template_exec(&self.name, format!("line {}: {}", line, message))
            }
            exec::ExecError::Io(e) => Error::Io(e),
        })
    }

    /// Execute the template into a string; nothing is returned on failure
    pub fn render(&self, ctx: &Value) -> Result<String> {
        let mut buf = Vec::new();
        self.execute(ctx, &mut buf)?;
        // Output is assembled from &str pieces only.
        Ok(String::from_utf8_lossy(&buf).into_owned())
    }
}

/// Parse and render a template to a string in one go
pub fn render(name: &str, source: &str, ctx: &Value) -> Result<String> {
    Template::parse(name, source)?.render(ctx)
}

/// Render a config document to `path`
///
/// Parses the template, creates the destination directory, truncates or
/// creates the file and streams the rendered output into it. Each phase
/// fails with its own error variant. A failed execution can leave a
/// partially written file behind; the handle is closed either way.
pub fn render_file(path: &Path, name: &str, source: &str, ctx: &Value) -> Result<()> {
    let template = Template::parse(name, source)?;

    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir).map_err(|source| Error::CreateDir {
            path: dir.to_path_buf(),
            source,
        })?;
    }

    let file = File::create(path).map_err(|source| Error::CreateFile {
        path: path.to_path_buf(),
        source,
    })?;
    let mut writer = BufWriter::new(file);

    let write_err = |source: std::io::Error| Error::WriteFile {
        path: path.to_path_buf(),
        source,
    };

    match template.execute(ctx, &mut writer) {
        Ok(()) => {}
        Err(Error::Io(source)) => return Err(write_err(source)),
        Err(e) => return Err(e),
    }
    writer.flush().map_err(write_err)?;

    tracing::debug!(path = %path.display(), template = name, "rendered config document");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_is_deterministic() {
        let template = Template::parse("t", "{{.A}}-{{.B | indent 1}}").unwrap();
        let ctx = json!({"A": 1, "B": "x\ny"});
        let first = template.render(&ctx).unwrap();
        let second = template.render(&ctx).unwrap();
        assert_eq!(first, second);
        assert_eq!(first, "1- x\n y");
    }

    #[test]
    fn test_parse_error_names_template() {
        let err = Template::parse("client.yaml", "ok\n{{ .A | nope }}").unwrap_err();
        match err {
            Error::TemplateParse { name, line, .. } => {
                assert_eq!(name, "client.yaml");
                assert_eq!(line, 2);
            }
            other => panic!("Expected TemplateParse, got {other:?}"),
        }
    }

    #[test]
    fn test_exec_error_names_template_and_line() {
        let err = render("server.yaml", "a\nb {{.Missing}}", &json!({})).unwrap_err();
        match err {
            Error::TemplateExec { name, message } => {
                assert_eq!(name, "server.yaml");
                assert!(message.starts_with("line 2:"));
            }
            other => panic!("Expected TemplateExec, got {other:?}"),
        }
    }

    #[test]
    fn test_custom_helper_via_parse_with() {
        let mut funcs = FuncMap::builtin();
        funcs.insert("quote", |args| {
            Ok(Value::String(format!("\"{}\"", format_value(&args[0]))))
        });
        let template = Template::parse_with("t", "name: {{ .N | quote }}", funcs).unwrap();
        assert_eq!(template.render(&json!({"N": "x"})).unwrap(), "name: \"x\"");
    }
}

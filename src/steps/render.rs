//! Render a config document from a template

use serde_json::Value;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::common::{paths, Error, Result};
use crate::driver::{Params, Step};
use crate::template;

/// Where the template text comes from
#[derive(Debug, Clone)]
pub enum TemplateSource {
    Inline(String),
    File(PathBuf),
}

impl TemplateSource {
    fn load(&self) -> Result<String> {
        match self {
            Self::Inline(text) => Ok(text.clone()),
            Self::File(path) => std::fs::read_to_string(path).map_err(|e| Error::FileRead {
                path: path.display().to_string(),
                error: e.to_string(),
            }),
        }
    }
}

/// Render a template into a file
///
/// The context is the parameter set plus `fields`; string fields are
/// expanded first so they can reference ports and vars. The output path is
/// itself a template and resolves against `base_dir`. With `publish`, the
/// final path is stored as a var for later steps (e.g. `-c {{.Vars.conf}}`).
#[derive(Debug, Clone)]
pub struct RenderConfig {
    id: String,
    source: TemplateSource,
    output: String,
    base_dir: PathBuf,
    fields: BTreeMap<String, Value>,
    publish: Option<String>,
}

impl RenderConfig {
    pub fn new(id: &str, source: TemplateSource, output: &str) -> Self {
        Self {
            id: id.to_string(),
            source,
            output: output.to_string(),
            base_dir: PathBuf::from("."),
            fields: BTreeMap::new(),
            publish: None,
        }
    }

    pub fn base_dir(mut self, dir: &Path) -> Self {
        self.base_dir = dir.to_path_buf();
        self
    }

    pub fn field(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(name.to_string(), value.into());
        self
    }

    pub fn fields(mut self, fields: BTreeMap<String, Value>) -> Self {
        self.fields.extend(fields);
        self
    }

    pub fn publish(mut self, var: &str) -> Self {
        self.publish = Some(var.to_string());
        self
    }
}

impl Step for RenderConfig {
    fn run(&mut self, params: &mut Params) -> Result<()> {
        let text = self.source.load()?;

        let mut ctx = params.context();
        for (name, value) in &self.fields {
            let value = match value {
                Value::String(s) => Value::String(params.fill(s)?),
                other => other.clone(),
            };
            ctx.insert(name.clone(), value);
        }

        let output = paths::resolve(&self.base_dir, Path::new(&params.fill(&self.output)?));
        template::render_file(&output, &self.id, &text, &Value::Object(ctx))?;
        tracing::info!(template = %self.id, path = %output.display(), "rendered config");

        if let Some(var) = &self.publish {
            params.set_var(var, output.display().to_string());
        }
        Ok(())
    }

    // Rendered documents stay on disk for post-mortem inspection.
    fn cleanup(&mut self) {}

    fn name(&self) -> String {
        format!("render {}", self.id)
    }
}

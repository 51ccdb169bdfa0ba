//! Helper functions callable from templates

use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use super::exec::format_value;

/// A template helper: receives evaluated arguments, returns a value or a message
pub type Func = Arc<dyn Fn(&[Value]) -> Result<Value, String> + Send + Sync>;

/// Named helpers available to a template
#[derive(Clone)]
pub struct FuncMap {
    funcs: HashMap<String, Func>,
}

impl FuncMap {
    /// Helpers every template gets
    pub fn builtin() -> Self {
        let mut map = Self {
            funcs: HashMap::new(),
        };
        map.insert("indent", indent_func);
        map
    }

    pub fn insert<F>(&mut self, name: &str, func: F)
    where
        F: Fn(&[Value]) -> Result<Value, String> + Send + Sync + 'static,
    {
        self.funcs.insert(name.to_string(), Arc::new(func));
    }

    pub fn get(&self, name: &str) -> Option<&Func> {
        self.funcs.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.funcs.contains_key(name)
    }
}

impl Default for FuncMap {
    fn default() -> Self {
        Self::builtin()
    }
}

impl fmt::Debug for FuncMap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<&str> = self.funcs.keys().map(String::as_str).collect();
        names.sort_unstable();
        f.debug_struct("FuncMap").field("funcs", &names).finish()
    }
}

/// Prefix every line of `text`, the first included, with `n` spaces
pub fn indent(n: usize, text: &str) -> String {
    let pad = " ".repeat(n);
    let mut out = String::with_capacity(text.len() + pad.len());
    out.push_str(&pad);
    out.push_str(&text.replace('\n', &format!("\n{}", pad)));
    out
}

fn indent_func(args: &[Value]) -> Result<Value, String> {
    let [width, text] = args else {
        return Err(format!("indent: want 2 arguments, got {}", args.len()));
    };
    let n = width
        .as_u64()
        .ok_or_else(|| format!("indent: width must be a non-negative integer, got {}", width))?;
    Ok(Value::String(indent(n as usize, &format_value(text))))
}

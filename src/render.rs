//! Parameter rendering: `$VAR` and `${VAR}` interpolation

use anyhow::anyhow;
use convergence::Render;
use std::collections::BTreeMap;
use std::env::{self, VarError};

/// Expands variables from `--var` overrides, then the process environment.
///
/// An undefined variable is an error naming the parameter it appeared in.
#[derive(Debug, Default, Clone)]
pub struct EnvRenderer {
    vars: BTreeMap<String, String>,
}

impl EnvRenderer {
    pub fn new(vars: impl IntoIterator<Item = (String, String)>) -> Self {
        Self {
            vars: vars.into_iter().collect(),
        }
    }

    fn lookup(&self, name: &str) -> Result<Option<String>, VarError> {
        if let Some(value) = self.vars.get(name) {
            return Ok(Some(value.clone()));
        }
        env::var(name).map(Some)
    }
}

impl Render for EnvRenderer {
    fn render(&self, name: &str, content: &str) -> anyhow::Result<String> {
        let expanded = shellexpand::env_with_context(content, |var: &str| self.lookup(var))
            .map_err(|e| anyhow!("${} is not defined (in \"{name}\")", e.var_name))?;
        Ok(expanded.into_owned())
    }
}

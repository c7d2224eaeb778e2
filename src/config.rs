use anyhow::{Context, Result, bail};
use convergence::{Module, Node, Params, Registry, Render};
use serde::Deserialize;
use std::collections::{BTreeMap, HashSet};
use std::fs;
use std::path::{Path, PathBuf};

// ============================================================================
// Manifest
// ============================================================================

/// Desired state, as written by the operator
///
/// ```toml
/// [settings]
/// jobs = 4
///
/// [[resource]]
/// kind = "rpm.package"
/// name = "nginx"
/// params = { name = "nginx" }
///
/// [[module]]
/// name = "web"
///
/// [[module.resource]]
/// kind = "systemd.unit"
/// name = "nginx-service"
/// params = { name = "nginx.service", enable = "enabled" }
/// ```
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Manifest {
    #[serde(default)]
    pub settings: Settings,
    #[serde(default, rename = "resource")]
    pub resources: Vec<ResourceDecl>,
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleDecl>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Settings {
    /// Top-level nodes converged in parallel
    #[serde(default = "default_jobs")]
    pub jobs: usize,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            jobs: default_jobs(),
        }
    }
}

fn default_jobs() -> usize {
    4
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ResourceDecl {
    pub kind: String,
    pub name: String,
    #[serde(default)]
    pub params: BTreeMap<String, toml::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ModuleDecl {
    pub name: String,
    #[serde(default, rename = "resource")]
    pub resources: Vec<ResourceDecl>,
    #[serde(default, rename = "module")]
    pub modules: Vec<ModuleDecl>,
}

impl Manifest {
    /// Load a manifest file; `~` in the path is expanded
    pub fn load(path: &Path) -> Result<Self> {
        let path = expand_path(path);
        let content = fs::read_to_string(&path)
            .with_context(|| format!("Could not read manifest {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Invalid manifest {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Prepare every declaration into a tree of tasks.
    ///
    /// All invalid declarations are reported together; no task is returned
    /// unless every declaration prepared cleanly.
    pub fn build(&self, registry: &Registry, render: &dyn Render) -> Result<Vec<Node>> {
        let mut problems = Vec::new();
        let nodes = build_level("", &self.resources, &self.modules, registry, render, &mut problems);

        if !problems.is_empty() {
            bail!(
                "{} invalid declaration(s):\n  {}",
                problems.len(),
                problems.join("\n  ")
            );
        }
        Ok(nodes)
    }
}

fn build_level(
    path: &str,
    resources: &[ResourceDecl],
    modules: &[ModuleDecl],
    registry: &Registry,
    render: &dyn Render,
    problems: &mut Vec<String>,
) -> Vec<Node> {
    let mut seen = HashSet::new();
    let mut nodes = Vec::new();
    let qualified = |name: &str| {
        if path.is_empty() {
            name.to_string()
        } else {
            format!("{path}/{name}")
        }
    };

    for decl in resources {
        let id = qualified(&decl.name);
        if !seen.insert(decl.name.as_str()) {
            problems.push(format!("{id}: duplicate name"));
            continue;
        }
        match prepare(decl, registry, render) {
            Ok(node) => nodes.push(node),
            Err(e) => problems.push(format!("{id}: {e:#}")),
        }
    }

    for decl in modules {
        let id = qualified(&decl.name);
        if !seen.insert(decl.name.as_str()) {
            problems.push(format!("{id}: duplicate name"));
            continue;
        }
        let mut module = Module::new(&decl.name);
        for child in build_level(&id, &decl.resources, &decl.modules, registry, render, problems) {
            module.push(child);
        }
        nodes.push(Node::Module(module));
    }

    nodes
}

fn prepare(decl: &ResourceDecl, registry: &Registry, render: &dyn Render) -> Result<Node> {
    let params = raw_params(&decl.params)?;
    let task = registry.preparer(&decl.kind, &params)?.prepare(render)?;
    log::debug!("Prepared {} ({})", decl.name, decl.kind);
    Ok(Node::task(&decl.name, task))
}

/// Flatten parameter values to the raw strings preparers expect
fn raw_params(values: &BTreeMap<String, toml::Value>) -> Result<Params> {
    values
        .iter()
        .map(|(key, value)| {
            let raw = match value {
                toml::Value::String(s) => s.clone(),
                toml::Value::Integer(i) => i.to_string(),
                toml::Value::Boolean(b) => b.to_string(),
                _ => bail!("parameter \"{key}\" must be a string, integer or boolean"),
            };
            Ok((key.clone(), raw))
        })
        .collect()
}

/// Expand a leading `~`
pub fn expand_path(path: &Path) -> PathBuf {
    let raw = path.to_string_lossy();
    PathBuf::from(shellexpand::tilde(raw.as_ref()).as_ref())
}

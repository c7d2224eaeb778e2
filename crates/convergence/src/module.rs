//! Modules: composite resources
//!
//! A [`Module`] groups child resources and behaves like a single task. It
//! has no system-level effect of its own; it delegates to its children in
//! order and aggregates their statuses.

use crate::error::{Error, Failure};
use crate::status::Status;
use crate::task::{BoxedTask, Task};

/// Access to an ordered collection of child resources.
///
/// External schedulers use this to flatten a resource tree.
pub trait Parent {
    /// Children in declaration order.
    fn children(&self) -> &[Node];
}

/// One node of a resource tree.
#[derive(Debug)]
pub enum Node {
    /// A leaf resource
    Task {
        /// Name of the declaration
        name: String,
        /// The prepared task
        task: BoxedTask,
    },
    /// A nested module
    Module(Module),
}

impl Node {
    /// Wrap a prepared task as a leaf.
    pub fn task(name: impl Into<String>, task: BoxedTask) -> Self {
        Self::Task {
            name: name.into(),
            task,
        }
    }

    /// Name of this node.
    pub fn name(&self) -> &str {
        match self {
            Self::Task { name, .. } => name,
            Self::Module(module) => module.name(),
        }
    }

    /// Flatten the tree depth-first into `(path, task)` pairs.
    ///
    /// Paths join node names with `/`. Modules themselves are not listed.
    pub fn leaves(&self) -> Vec<(String, &dyn Task)> {
        let mut out = Vec::new();
        self.collect_leaves("", &mut out);
        out
    }

    fn collect_leaves<'a>(&'a self, prefix: &str, out: &mut Vec<(String, &'a dyn Task)>) {
        let path = if prefix.is_empty() {
            self.name().to_string()
        } else {
            format!("{prefix}/{}", self.name())
        };

        match self {
            Self::Task { task, .. } => out.push((path, task.as_ref())),
            Self::Module(module) => {
                for child in module.children() {
                    child.collect_leaves(&path, out);
                }
            }
        }
    }
}

impl Task for Node {
    fn check(&self) -> Result<Status, Failure> {
        match self {
            Self::Task { task, .. } => task.check(),
            Self::Module(module) => module.check(),
        }
    }

    fn apply(&self) -> Result<Status, Failure> {
        match self {
            Self::Task { task, .. } => task.apply(),
            Self::Module(module) => module.apply(),
        }
    }
}

impl Parent for Node {
    fn children(&self) -> &[Node] {
        match self {
            Self::Task { .. } => &[],
            Self::Module(module) => module.children(),
        }
    }
}

/// A named, ordered group of child resources.
#[derive(Debug, Default)]
pub struct Module {
    name: String,
    children: Vec<Node>,
}

impl Module {
    /// Create an empty module.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Add a child at the end.
    pub fn push(&mut self, child: Node) {
        self.children.push(child);
    }

    /// Builder-style [`Module::push`].
    pub fn with_child(mut self, child: Node) -> Self {
        self.push(child);
        self
    }

    /// Name of this module.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `op` on every child, merging statuses.
    ///
    /// A failing child does not stop the walk. The first failure is
    /// returned after every child has reported.
    fn aggregate<F>(&self, op: F) -> Result<Status, Failure>
    where
        F: Fn(&Node) -> Result<Status, Failure>,
    {
        let mut status = Status::new();
        let mut first_error = None;

        for child in &self.children {
            match op(child) {
                Ok(child_status) => status.merge(child.name(), child_status),
                Err(failure) => {
                    let error = self.child_error(child, failure.error);
                    log::warn!("{error}");
                    status.merge(child.name(), failure.status);
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
            }
        }

        match first_error {
            Some(error) => Err(Failure::new(status, error)),
            None => Ok(status),
        }
    }

    /// Prefix a child's error with this module's name.
    ///
    /// A nested module already reports a path rooted at its own name, so
    /// that path is extended instead of wrapped again.
    fn child_error(&self, child: &Node, error: Error) -> Error {
        match error {
            Error::Child { path, source } => Error::Child {
                path: format!("{}/{path}", self.name),
                source,
            },
            other => Error::Child {
                path: format!("{}/{}", self.name, child.name()),
                source: Box::new(other),
            },
        }
    }
}

impl Task for Module {
    fn check(&self) -> Result<Status, Failure> {
        self.aggregate(Node::check)
    }

    fn apply(&self) -> Result<Status, Failure> {
        self.aggregate(Node::apply)
    }
}

impl Parent for Module {
    fn children(&self) -> &[Node] {
        &self.children
    }
}

//! Render service consumed by preparers

use crate::error::{Error, Result};

/// Resolves a raw parameter value before validation.
///
/// Implementations handle templating or interpolation. The convergence
/// core only consumes this capability.
pub trait Render: Send + Sync {
    /// Render the raw `content` of parameter `name`.
    fn render(&self, name: &str, content: &str) -> anyhow::Result<String>;
}

/// Renderer that returns content unchanged
#[derive(Debug, Default, Clone, Copy)]
pub struct Verbatim;

impl Render for Verbatim {
    fn render(&self, _name: &str, content: &str) -> anyhow::Result<String> {
        Ok(content.to_string())
    }
}

/// Render one field of `kind`, mapping failures to [`Error::Render`].
pub fn render_field(
    render: &dyn Render,
    kind: &str,
    field: &'static str,
    content: &str,
) -> Result<String> {
    render
        .render(field, content)
        .map_err(|source| Error::Render {
            kind: kind.to_string(),
            field,
            source,
        })
}

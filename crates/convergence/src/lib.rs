//! # Convergence
//!
//! The core of declarative resource management: turn raw parameters into a
//! validated task, check it against the live system, and apply the
//! difference.
//!
//! ## Core Concepts
//!
//! - **Preparer**: raw, user-supplied parameters for one resource. Preparing
//!   validates them and binds a backend, before any system contact.
//! - **Task**: a validated resource instance exposing `check` and `apply`.
//! - **Status**: the diff and severity returned by `check` and `apply`.
//! - **Module**: a composite task that owns an ordered list of children.
//! - **Registry**: maps resource kind names to their preparers.
//!
//! ## Example
//!
//! ```ignore
//! use convergence::{Params, Registry, Verbatim, Task};
//!
//! let registry = Registry::builder()
//!     .register::<PackagePreparer, Package>("rpm.package")?
//!     .build();
//!
//! let mut params = Params::new();
//! params.insert("name".into(), "nginx".into());
//!
//! let task = registry.preparer("rpm.package", &params)?.prepare(&Verbatim)?;
//! if task.check()?.has_changes() {
//!     task.apply()?;
//! }
//! ```
//!
//! ## Guarantees
//!
//! - Preparation performs no system calls; every invalid parameter is
//!   rejected there with an error naming the field.
//! - `apply` is idempotent and confirms success by querying again.
//! - Each task owns its backend, so distinct tasks can run on different
//!   threads without sharing state.

pub mod context;
pub mod error;
pub mod executor;
pub mod module;
pub mod registry;
pub mod render;
pub mod status;
pub mod task;
pub mod types;
pub mod validate;

// Re-export main types at crate root
pub use context::{AutoConfirm, AutoDecline, ConfirmCallback, NoProgress, ProgressCallback};
pub use error::{Error, Failure, Phase, Result};
pub use executor::{ExecuteReport, NodeReport, check_all, execute, execute_simple};
pub use module::{Module, Node, Parent};
pub use registry::{Params, Registration, Registry, RegistryBuilder};
pub use render::{Render, Verbatim, render_field};
pub use status::{Diff, Status, StatusLevel};
pub use task::{BoxedTask, Preparer, Task};
pub use types::{ExecuteOptions, ExecuteSummary, Outcome};
pub use validate::{MAX_ID, Token};

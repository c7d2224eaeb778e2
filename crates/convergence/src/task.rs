//! Task and Preparer traits
//!
//! A [`Preparer`] holds raw, user-supplied parameters. Preparing it
//! validates those parameters and binds a backend, producing a [`Task`]
//! that can check and apply one resource instance.

use crate::error::{Failure, Result};
use crate::render::Render;
use crate::status::Status;
use std::fmt;

/// A validated, executable unit for one resource instance.
///
/// Every field of a task is within its legal domain; a task never fails
/// because of a value that preparation should have rejected. A task owns
/// its backend exclusively, so distinct tasks share no mutable state.
///
/// Callers must not run `check` or `apply` concurrently on the same task.
///
/// # Example
///
/// ```ignore
/// use convergence::{Failure, Status, Task};
///
/// #[derive(Debug)]
/// struct Marker { present: std::sync::atomic::AtomicBool }
///
/// impl Task for Marker {
///     fn check(&self) -> Result<Status, Failure> {
///         let mut status = Status::new();
///         let live = if self.present.load(Ordering::SeqCst) { "present" } else { "absent" };
///         status.add_difference("state", live, "present");
///         Ok(status)
///     }
///
///     fn apply(&self) -> Result<Status, Failure> {
///         let status = self.check()?;
///         if status.has_changes() {
///             self.present.store(true, Ordering::SeqCst);
///         }
///         Ok(status)
///     }
/// }
/// ```
pub trait Task: Send + Sync + fmt::Debug {
    /// Compare live state against desired state. Never mutates the system.
    fn check(&self) -> std::result::Result<Status, Failure>;

    /// Make the minimal changes needed to reach desired state.
    ///
    /// When nothing needs changing, performs no mutation and returns a
    /// status without changes. Success is confirmed by querying the
    /// system again, not by trusting the mutation call.
    fn apply(&self) -> std::result::Result<Status, Failure>;
}

/// A boxed task for type-erased storage
pub type BoxedTask = Box<dyn Task>;

/// Raw parameters for one resource declaration.
///
/// Preparation validates them and builds a [`Task`]. It performs no system
/// calls and may be called repeatedly.
pub trait Preparer: Send + fmt::Debug {
    /// Validate parameters and build a task bound to the default backend.
    fn prepare(&self, render: &dyn Render) -> Result<BoxedTask>;
}

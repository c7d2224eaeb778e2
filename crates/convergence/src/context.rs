//! Callbacks used by the batch driver
//!
//! The driver reports progress and asks for confirmation through these
//! traits, so the core never prints or prompts on its own.

use crate::types::Outcome;
use anyhow::Result;

/// Receives progress while a batch converges.
pub trait ProgressCallback: Send {
    /// A batch of `count` top-level nodes is starting
    fn on_batch_start(&mut self, count: usize);

    /// Node `name` finished with `outcome`
    fn on_node_complete(&mut self, name: &str, outcome: &Outcome);

    /// Every node has reported
    fn on_batch_complete(&mut self);
}

/// Decides whether pending changes may be applied.
pub trait ConfirmCallback: Send {
    /// Answer `prompt`; `Ok(false)` leaves the system untouched.
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

/// Ignores progress
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_batch_start(&mut self, _count: usize) {}
    fn on_node_complete(&mut self, _name: &str, _outcome: &Outcome) {}
    fn on_batch_complete(&mut self) {}
}

/// Approves every prompt, for `--yes` and non-interactive runs
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(true)
    }
}

/// Declines every prompt
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> Result<bool> {
        Ok(false)
    }
}

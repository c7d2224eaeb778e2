//! Batch driver - converges independent top-level nodes
//!
//! Each top-level node is checked, applied if needed, and checked again to
//! confirm convergence. Independent nodes run in parallel on a rayon pool;
//! the children of a module always run in order. Dependency ordering
//! between nodes is the caller's concern.

use crate::context::{ConfirmCallback, ProgressCallback};
use crate::error::Failure;
use crate::module::Node;
use crate::status::Status;
use crate::task::Task;
use crate::types::{ExecuteOptions, ExecuteSummary, Outcome};
use anyhow::Result;
use rayon::prelude::*;
use serde::Serialize;

/// What happened to one top-level node
#[derive(Debug, Clone, Serialize)]
pub struct NodeReport {
    /// Name of the node
    pub name: String,
    /// Final outcome
    #[serde(flatten)]
    pub outcome: Outcome,
    /// Status of the check (no change, dry run) or of the apply
    pub status: Status,
}

/// Result of a batch run
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExecuteReport {
    /// Counts per outcome
    pub summary: ExecuteSummary,
    /// One report per top-level node, in input order
    pub nodes: Vec<NodeReport>,
}

/// Check every node without changing anything.
pub fn check_all(nodes: &[Node], jobs: usize) -> Result<Vec<Result<Status, Failure>>> {
    let pool = build_pool(jobs)?;
    Ok(pool.install(|| nodes.par_iter().map(Node::check).collect()))
}

/// Converge `nodes` with the given options and callbacks
///
/// # Arguments
/// * `nodes` - Independent top-level nodes
/// * `opts` - Execution options (dry_run, jobs)
/// * `progress` - Progress callback
/// * `confirm` - Asked once before any change is applied
pub fn execute<P, C>(
    nodes: &[Node],
    opts: &ExecuteOptions,
    progress: &mut P,
    confirm: &mut C,
) -> Result<ExecuteReport>
where
    P: ProgressCallback + ?Sized,
    C: ConfirmCallback + ?Sized,
{
    let pool = build_pool(opts.jobs)?;
    let checks: Vec<Result<Status, Failure>> =
        pool.install(|| nodes.par_iter().map(Node::check).collect());

    let pending = checks
        .iter()
        .filter(|c| matches!(c, Ok(status) if status.has_changes()))
        .count();
    log::debug!("{pending} of {} nodes need changes", nodes.len());

    let proceed = pending > 0
        && !opts.dry_run
        && confirm.confirm(&format!("Apply changes to {pending} resources?"))?;

    progress.on_batch_start(nodes.len());
    let reports: Vec<NodeReport> = pool.install(|| {
        nodes
            .par_iter()
            .zip(checks.into_par_iter())
            .map(|(node, check)| converge_node(node, check, opts.dry_run, proceed))
            .collect()
    });

    let mut summary = ExecuteSummary::default();
    for report in &reports {
        summary.add(&report.outcome);
        progress.on_node_complete(&report.name, &report.outcome);
    }
    progress.on_batch_complete();

    Ok(ExecuteReport {
        summary,
        nodes: reports,
    })
}

/// Simple execution without callbacks
pub fn execute_simple(nodes: &[Node], opts: &ExecuteOptions) -> Result<ExecuteReport> {
    use crate::context::{AutoConfirm, NoProgress};

    execute(nodes, opts, &mut NoProgress, &mut AutoConfirm)
}

fn build_pool(jobs: usize) -> Result<rayon::ThreadPool> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
        .map_err(|e| anyhow::anyhow!("Failed to create thread pool: {}", e))
}

/// Apply one node after its initial check, then confirm convergence
fn converge_node(
    node: &Node,
    check: Result<Status, Failure>,
    dry_run: bool,
    proceed: bool,
) -> NodeReport {
    let name = node.name().to_string();
    let report = |outcome, status| NodeReport {
        name: name.clone(),
        outcome,
        status,
    };

    let checked = match check {
        Ok(status) => status,
        Err(failure) => {
            return report(
                Outcome::Failed {
                    error: failure.error.to_string(),
                },
                failure.status,
            );
        }
    };

    if !checked.has_changes() {
        return report(Outcome::NoChange, checked);
    }
    if dry_run {
        return report(
            Outcome::Skipped {
                reason: "Dry run".to_string(),
            },
            checked,
        );
    }
    if !proceed {
        return report(
            Outcome::Skipped {
                reason: "Not confirmed".to_string(),
            },
            checked,
        );
    }

    log::info!("Applying {name}");
    let applied = match node.apply() {
        Ok(status) => status,
        Err(failure) => {
            log::warn!("Applying {name} failed: {}", failure.error);
            return report(
                Outcome::Failed {
                    error: failure.error.to_string(),
                },
                failure.status,
            );
        }
    };

    match node.check() {
        Ok(after) if !after.has_changes() => report(Outcome::Changed, applied),
        Ok(after) => {
            let remaining: Vec<&str> = after.changes().map(|(k, _)| k.as_str()).collect();
            report(
                Outcome::Failed {
                    error: format!("{name} did not converge: {}", remaining.join(", ")),
                },
                applied,
            )
        }
        Err(failure) => report(
            Outcome::Failed {
                error: failure.error.to_string(),
            },
            applied,
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::context::{AutoConfirm, AutoDecline, NoProgress};
    use crate::error::Error;
    use crate::module::Module;
    use std::sync::Mutex;

    #[derive(Debug)]
    struct Counter {
        value: Mutex<u32>,
        target: u32,
        stuck: bool,
    }

    impl Counter {
        fn node(name: &str, value: u32, target: u32) -> Node {
            Node::task(
                name,
                Box::new(Self {
                    value: Mutex::new(value),
                    target,
                    stuck: false,
                }),
            )
        }

        fn stuck(name: &str) -> Node {
            Node::task(
                name,
                Box::new(Self {
                    value: Mutex::new(0),
                    target: 1,
                    stuck: true,
                }),
            )
        }
    }

    impl Task for Counter {
        fn check(&self) -> Result<Status, Failure> {
            let mut status = Status::new();
            status.add_difference(
                "value",
                self.value.lock().unwrap().to_string(),
                self.target.to_string(),
            );
            Ok(status)
        }

        fn apply(&self) -> Result<Status, Failure> {
            let status = self.check()?;
            if !self.stuck {
                *self.value.lock().unwrap() = self.target;
            }
            Ok(status)
        }
    }

    #[derive(Debug)]
    struct Broken;

    impl Task for Broken {
        fn check(&self) -> Result<Status, Failure> {
            Err(Error::query("broken", anyhow::anyhow!("offline")).into())
        }

        fn apply(&self) -> Result<Status, Failure> {
            self.check()
        }
    }

    #[test]
    fn test_execute_empty() {
        let report = execute_simple(&[], &ExecuteOptions::default()).unwrap();
        assert_eq!(report.summary.total(), 0);
    }

    #[test]
    fn test_execute_no_changes() {
        let nodes = vec![Counter::node("a", 1, 1)];
        let report = execute_simple(&nodes, &ExecuteOptions::default()).unwrap();
        assert_eq!(report.summary.no_change, 1);
        assert_eq!(report.nodes[0].outcome, Outcome::NoChange);
    }

    #[test]
    fn test_execute_with_changes_converges() {
        let nodes = vec![
            Counter::node("a", 0, 1),
            Counter::node("b", 2, 2),
            Node::Module(Module::new("m").with_child(Counter::node("c", 0, 3))),
        ];
        let report = execute_simple(&nodes, &ExecuteOptions::default()).unwrap();

        assert_eq!(report.summary.changed, 2);
        assert_eq!(report.summary.no_change, 1);
        assert!(report.summary.is_success());
        for node in &nodes {
            assert!(!node.check().unwrap().has_changes());
        }
    }

    #[test]
    fn test_dry_run_changes_nothing() {
        let nodes = vec![Counter::node("a", 0, 1)];
        let opts = ExecuteOptions {
            dry_run: true,
            jobs: 1,
        };
        let report = execute(&nodes, &opts, &mut NoProgress, &mut AutoConfirm).unwrap();

        assert_eq!(report.summary.skipped, 1);
        assert!(nodes[0].check().unwrap().has_changes());
    }

    #[test]
    fn test_declined_changes_are_skipped() {
        let nodes = vec![Counter::node("a", 0, 1)];
        let report = execute(
            &nodes,
            &ExecuteOptions::default(),
            &mut NoProgress,
            &mut AutoDecline,
        )
        .unwrap();

        assert_eq!(report.summary.skipped, 1);
        assert!(nodes[0].check().unwrap().has_changes());
    }

    #[test]
    fn test_unconverged_apply_is_failure() {
        let nodes = vec![Counter::stuck("a")];
        let report = execute_simple(&nodes, &ExecuteOptions::default()).unwrap();

        assert_eq!(report.summary.failed, 1);
        match &report.nodes[0].outcome {
            Outcome::Failed { error } => assert!(error.contains("did not converge")),
            other => panic!("unexpected outcome: {other:?}"),
        }
    }

    #[test]
    fn test_check_failure_does_not_stop_others() {
        let nodes = vec![
            Node::task("broken", Box::new(Broken)),
            Counter::node("a", 0, 1),
        ];
        let report = execute_simple(&nodes, &ExecuteOptions::default()).unwrap();

        assert_eq!(report.summary.failed, 1);
        assert_eq!(report.summary.changed, 1);
        assert_eq!(report.nodes[0].name, "broken");
    }

    #[test]
    fn test_check_all_is_read_only() {
        let nodes = vec![Counter::node("a", 0, 1)];
        let checks = check_all(&nodes, 2).unwrap();
        assert!(checks[0].as_ref().unwrap().has_changes());
        assert!(nodes[0].check().unwrap().has_changes());
    }
}

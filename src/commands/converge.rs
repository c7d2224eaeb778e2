//! Converge commands
//!
//! - `check` - Show what apply would change
//! - `apply` - Make the system match the manifest
//! - `kinds` - List registered resource kinds

use anyhow::{Result, bail};
use colored::Colorize;
use convergence::{
    AutoConfirm, ConfirmCallback, ExecuteOptions, ExecuteReport, NoProgress, Node, Outcome,
    ProgressCallback, Registry, Status, execute,
};
use serde::Serialize;
use std::path::Path;

use crate::Context;
use crate::cli::{ApplyArgs, OutputFormat};
use crate::config::Manifest;
use crate::render::EnvRenderer;
use crate::resource;
use crate::ui;

/// Load the manifest and prepare every declaration
fn load(
    manifest: &Path,
    vars: &[(String, String)],
    registry: &Registry,
) -> Result<(Manifest, Vec<Node>)> {
    let manifest_file = Manifest::load(manifest)?;
    let render = EnvRenderer::new(vars.iter().cloned());
    let nodes = manifest_file.build(registry, &render)?;
    log::info!("Prepared {} top-level resources", nodes.len());
    Ok((manifest_file, nodes))
}

// ============================================================================
// check
// ============================================================================

#[derive(Debug, Serialize)]
struct CheckEntry<'a> {
    name: &'a str,
    status: Status,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

pub fn check(ctx: &Context, manifest: &Path, vars: &[(String, String)]) -> Result<()> {
    let registry = resource::registry()?;
    let (manifest_file, nodes) = load(manifest, vars, &registry)?;
    let results = convergence::check_all(&nodes, manifest_file.settings.jobs)?;

    let entries: Vec<CheckEntry> = nodes
        .iter()
        .zip(results)
        .map(|(node, result)| match result {
            Ok(status) => CheckEntry {
                name: node.name(),
                status,
                error: None,
            },
            Err(failure) => CheckEntry {
                name: node.name(),
                status: failure.status,
                error: Some(failure.error.to_string()),
            },
        })
        .collect();

    let failed = entries.iter().filter(|e| e.error.is_some()).count();
    let pending = entries
        .iter()
        .filter(|e| e.error.is_none() && e.status.has_changes())
        .count();

    match ctx.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => {
            if !ctx.quiet {
                ui::header("Check");
            }
            for entry in &entries {
                if ctx.quiet && !entry.status.has_changes() && entry.error.is_none() {
                    continue;
                }
                ui::status(entry.name, &entry.status, ctx.verbose > 0);
                if let Some(error) = &entry.error {
                    ui::error(error);
                }
            }
            println!();
            if pending == 0 && failed == 0 {
                ui::success("Everything is converged");
            } else if pending > 0 {
                ui::info(&format!("{pending} resource(s) would change"));
            }
        }
    }

    if failed > 0 {
        bail!("{failed} resource(s) could not be checked");
    }
    Ok(())
}

// ============================================================================
// apply
// ============================================================================

/// Prints one line per finished node
struct ConsoleProgress {
    quiet: bool,
}

impl ProgressCallback for ConsoleProgress {
    fn on_batch_start(&mut self, count: usize) {
        if !self.quiet {
            println!();
            println!("  {} Converging {} resources...", "→".cyan(), count);
        }
    }

    fn on_node_complete(&mut self, name: &str, outcome: &Outcome) {
        if self.quiet && !matches!(outcome, Outcome::Failed { .. }) {
            return;
        }
        let detail = match outcome {
            Outcome::Skipped { reason } => format!(" ({reason})").dimmed().to_string(),
            Outcome::Failed { error } => format!(": {error}").red().to_string(),
            _ => String::new(),
        };
        println!("    {} {name}{detail}", ui::outcome_symbol(outcome));
    }

    fn on_batch_complete(&mut self) {}
}

/// Asks on the terminal; dialoguer draws on stderr, so JSON on stdout stays clean
struct PromptConfirm;

impl ConfirmCallback for PromptConfirm {
    fn confirm(&mut self, prompt: &str) -> Result<bool> {
        let confirmed = dialoguer::Confirm::new()
            .with_prompt(prompt)
            .default(false)
            .interact()?;
        Ok(confirmed)
    }
}

pub fn apply(
    ctx: &Context,
    manifest: &Path,
    vars: &[(String, String)],
    args: &ApplyArgs,
) -> Result<()> {
    let registry = resource::registry()?;
    let (manifest_file, nodes) = load(manifest, vars, &registry)?;

    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        jobs: args.jobs.unwrap_or(manifest_file.settings.jobs),
    };

    let json = ctx.format == OutputFormat::Json;
    let (mut console, mut silent) = (ConsoleProgress { quiet: ctx.quiet }, NoProgress);
    let progress: &mut dyn ProgressCallback = if json { &mut silent } else { &mut console };
    let (mut auto, mut prompt) = (AutoConfirm, PromptConfirm);
    let confirm: &mut dyn ConfirmCallback = if args.yes {
        &mut auto
    } else {
        &mut prompt
    };

    let report = execute(&nodes, &opts, progress, confirm)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print_report(ctx, &report, opts.dry_run);
    }

    if !report.summary.is_success() {
        bail!("{} resource(s) failed", report.summary.failed);
    }
    Ok(())
}

fn print_report(ctx: &Context, report: &ExecuteReport, dry_run: bool) {
    if ctx.verbose > 0 || dry_run {
        for node in report.nodes.iter().filter(|n| n.status.has_changes()) {
            ui::status(&node.name, &node.status, ctx.verbose > 0);
        }
    }

    let summary = &report.summary;
    println!();
    if dry_run {
        ui::info("Dry run - no changes made");
    } else if summary.is_success() {
        ui::success("Converged");
    } else {
        ui::warn("Converged with errors");
    }

    if summary.changed > 0 {
        println!("    • {} resources changed", summary.changed);
    }
    if summary.no_change > 0 && !ctx.quiet {
        println!("    • {} resources unchanged", summary.no_change);
    }
    if summary.skipped > 0 {
        println!("    • {} resources skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "resources".red());
    }
}

// ============================================================================
// kinds
// ============================================================================

#[derive(Debug, Serialize)]
struct KindEntry<'a> {
    kind: &'a str,
    preparer: &'static str,
    task: &'static str,
}

pub fn kinds(ctx: &Context) -> Result<()> {
    let registry = resource::registry()?;
    let mut entries = Vec::new();
    for kind in registry.kinds() {
        let registration = registry.lookup(kind)?;
        entries.push(KindEntry {
            kind,
            preparer: registration.preparer_type(),
            task: registration.task_type(),
        });
    }

    match ctx.format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&entries)?),
        OutputFormat::Text => {
            for entry in &entries {
                println!("{}", entry.kind.bold());
                if ctx.verbose > 0 {
                    ui::dim(&format!("{} -> {}", entry.preparer, entry.task));
                }
            }
        }
    }
    Ok(())
}

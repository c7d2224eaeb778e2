//! Process execution seam.
//!
//! Backends never spawn processes directly; they go through a
//! [`SysCaller`] so tests can substitute canned output.

use crate::error::{Error, Result};
use std::fmt;
use std::process::Command;

/// Captured result of running a program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Output {
    /// Exit code, `None` if terminated by a signal
    pub code: Option<i32>,
    /// Standard output
    pub stdout: String,
    /// Standard error
    pub stderr: String,
}

impl Output {
    /// Successful output with the given stdout.
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            code: Some(0),
            stdout: stdout.into(),
            stderr: String::new(),
        }
    }

    /// Failed output with the given exit code and stderr.
    pub fn failed(code: i32, stderr: impl Into<String>) -> Self {
        Self {
            code: Some(code),
            stdout: String::new(),
            stderr: stderr.into(),
        }
    }

    /// Whether the program exited with status zero.
    pub fn success(&self) -> bool {
        self.code == Some(0)
    }

    /// Turn a non-zero exit into a categorized error.
    pub fn check(self, program: &str, target: &str) -> Result<Self> {
        if self.success() {
            Ok(self)
        } else {
            // Some tools report failures on stdout only
            let detail = if self.stderr.trim().is_empty() {
                &self.stdout
            } else {
                &self.stderr
            };
            Err(Error::from_output(program, self.code, detail, target))
        }
    }
}

/// Runs external programs and captures their output.
pub trait SysCaller: Send + Sync + fmt::Debug {
    /// Run `program` with `args` and wait for it to finish.
    fn call(&self, program: &str, args: &[&str]) -> Result<Output>;
}

/// Caller that executes real processes.
#[derive(Debug, Default, Clone, Copy)]
pub struct ExecCaller;

impl SysCaller for ExecCaller {
    fn call(&self, program: &str, args: &[&str]) -> Result<Output> {
        log::debug!("Running {} {}", program, args.join(" "));
        let output = Command::new(program)
            .args(args)
            .output()
            .map_err(|source| Error::ToolNotFound {
                program: program.to_string(),
                source,
            })?;

        Ok(Output {
            code: output.status.code(),
            stdout: String::from_utf8_lossy(&output.stdout).to_string(),
            stderr: String::from_utf8_lossy(&output.stderr).to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCategory;

    #[test]
    fn test_check_passes_success() {
        let out = Output::ok("1.0").check("rpm", "nginx").unwrap();
        assert_eq!(out.stdout, "1.0");
    }

    #[test]
    fn test_check_uses_stdout_when_stderr_empty() {
        let out = Output {
            code: Some(1),
            stdout: "No package nginxx available.".into(),
            stderr: String::new(),
        };
        let err = out.check("yum", "nginxx").unwrap_err();
        assert_eq!(err.category(), ErrorCategory::NotFound);
    }

    #[test]
    fn test_exec_caller_missing_program() {
        let err = ExecCaller
            .call("definitely-not-a-real-program-xyz", &[])
            .unwrap_err();
        assert_eq!(err.category(), ErrorCategory::ToolNotFound);
    }
}

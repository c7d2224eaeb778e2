//! RPM package backend using `rpm` for queries and `yum` for changes.

use crate::backend::PackageManager;
use crate::error::{Error, Result};
use crate::exec::{ExecCaller, SysCaller};

/// Backend that drives `rpm` and `yum`.
#[derive(Debug, Default, Clone)]
pub struct YumManager<S = ExecCaller> {
    sys: S,
}

impl<S: SysCaller> YumManager<S> {
    /// Create a manager running commands through `sys`.
    pub fn new(sys: S) -> Self {
        Self { sys }
    }
}

impl<S: SysCaller> PackageManager for YumManager<S> {
    fn installed_version(&self, name: &str) -> Result<Option<String>> {
        let output = self.sys.call(
            "rpm",
            &["-q", "--queryformat", "%{VERSION}-%{RELEASE}", name],
        )?;

        if output.success() {
            let version = output.stdout.trim().to_string();
            return Ok(Some(version));
        }

        // rpm exits 1 and prints "package X is not installed" on stdout
        if output.code == Some(1) && output.stdout.contains("is not installed") {
            return Ok(None);
        }

        Err(Error::from_output("rpm", output.code, &output.stderr, name))
    }

    fn install(&self, name: &str) -> Result<()> {
        log::info!("Installing package {name}");
        self.sys
            .call("yum", &["install", "-y", name])?
            .check("yum", name)?;
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        log::info!("Removing package {name}");
        self.sys
            .call("yum", &["remove", "-y", name])?
            .check("yum", name)?;
        Ok(())
    }
}

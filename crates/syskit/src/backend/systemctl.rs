//! systemd unit backend using `systemctl`.

use crate::backend::UnitManager;
use crate::error::Result;
use crate::exec::{ExecCaller, SysCaller};
use crate::types::UnitStatus;

/// Properties requested from `systemctl show`.
const PROPERTIES: &str =
    "Id,Description,LoadState,ActiveState,SubState,UnitFileState,FragmentPath";

/// Backend that drives `systemctl`.
#[derive(Debug, Default, Clone)]
pub struct Systemctl<S = ExecCaller> {
    sys: S,
}

impl<S: SysCaller> Systemctl<S> {
    /// Create a manager running commands through `sys`.
    pub fn new(sys: S) -> Self {
        Self { sys }
    }

    fn run(&self, verb: &str, name: &str) -> Result<()> {
        log::info!("systemctl {verb} {name}");
        self.sys
            .call("systemctl", &[verb, name])?
            .check("systemctl", name)?;
        Ok(())
    }
}

impl<S: SysCaller> UnitManager for Systemctl<S> {
    fn status(&self, name: &str) -> Result<Option<UnitStatus>> {
        let property_arg = format!("--property={PROPERTIES}");
        let output = self
            .sys
            .call("systemctl", &["show", name, &property_arg])?
            .check("systemctl", name)?;

        let status = parse_show(&output.stdout);
        if status.load_state == "not-found" || status.load_state.is_empty() {
            return Ok(None);
        }
        Ok(Some(status))
    }

    fn start(&self, name: &str) -> Result<()> {
        self.run("start", name)
    }

    fn stop(&self, name: &str) -> Result<()> {
        self.run("stop", name)
    }

    fn enable(&self, name: &str) -> Result<()> {
        self.run("enable", name)
    }

    fn disable(&self, name: &str) -> Result<()> {
        self.run("disable", name)
    }
}

/// Parse `Key=Value` lines printed by `systemctl show`.
pub fn parse_show(output: &str) -> UnitStatus {
    let mut status = UnitStatus::default();
    for line in output.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = value.trim().to_string();
        match key.trim() {
            "Id" => status.name = value,
            "Description" => status.description = value,
            "LoadState" => status.load_state = value,
            "ActiveState" => status.active_state = value,
            "SubState" => status.sub_state = value,
            "UnitFileState" => status.unit_file_state = value,
            "FragmentPath" => status.fragment_path = value,
            _ => {}
        }
    }
    status
}

//! `systemd.unit`: service units driven through systemctl
//!
//! Only the run state and enablement of an existing unit are managed.
//! Unit files are never written, so a unit systemd does not know about
//! cannot be started or enabled. It already satisfies `stopped`.

use super::{ABSENT, apply_planned};
use convergence::validate::{self, Token};
use convergence::{
    BoxedTask, Error, Failure, Preparer, Render, Status, StatusLevel, Task, render_field,
};
use serde::Deserialize;
use syskit::backend::{UnitManager, default_unit_manager};

/// Registered kind name
pub const KIND: &str = "systemd.unit";

/// Desired run state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitState {
    #[default]
    Running,
    Stopped,
}

impl Token for UnitState {
    const ALL: &'static [Self] = &[Self::Running, Self::Stopped];

    fn token(&self) -> &'static str {
        match self {
            Self::Running => "running",
            Self::Stopped => "stopped",
        }
    }
}

/// Whether the unit starts at boot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Enablement {
    Enabled,
    Disabled,
}

impl Token for Enablement {
    const ALL: &'static [Self] = &[Self::Enabled, Self::Disabled];

    fn token(&self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        }
    }
}

/// Raw parameters for a unit declaration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UnitPreparer {
    /// Unit name, e.g. `nginx.service`
    #[serde(default)]
    pub name: String,

    /// `running` or `stopped`
    #[serde(default)]
    pub state: String,

    /// `enabled` or `disabled`; left alone when empty
    #[serde(default)]
    pub enable: String,
}

impl UnitPreparer {
    /// Validate and bind to an explicit backend.
    pub fn prepare_with(
        &self,
        render: &dyn Render,
        manager: Box<dyn UnitManager>,
    ) -> convergence::Result<Unit> {
        let name = render_field(render, KIND, "name", &self.name)?;
        validate::required(KIND, "name", &name)?;

        let state = render_field(render, KIND, "state", &self.state)?;
        let state = validate::parse_enum(KIND, "state", &state)?.unwrap_or_default();

        let enable = render_field(render, KIND, "enable", &self.enable)?;
        let enable = validate::parse_enum(KIND, "enable", &enable)?;

        Ok(Unit {
            name,
            state,
            enable,
            manager,
        })
    }
}

impl Preparer for UnitPreparer {
    fn prepare(&self, render: &dyn Render) -> convergence::Result<BoxedTask> {
        let task = self.prepare_with(render, Box::new(default_unit_manager()))?;
        Ok(Box::new(task))
    }
}

/// A validated unit resource
#[derive(Debug)]
pub struct Unit {
    name: String,
    state: UnitState,
    enable: Option<Enablement>,
    manager: Box<dyn UnitManager>,
}

impl Unit {
    fn target(&self) -> String {
        format!("unit {}", self.name)
    }

    fn plan(&self) -> convergence::Result<Status> {
        let live = self
            .manager
            .status(&self.name)
            .map_err(|e| Error::query(self.target(), e))?;

        let mut status = Status::new();
        let Some(live) = live else {
            status.add_message(format!("unit {} not found", self.name));
            let satisfied = self.state == UnitState::Stopped
                && self.enable != Some(Enablement::Enabled);
            if !satisfied {
                status.add_difference("state", ABSENT, self.state.token());
                status.raise_level(StatusLevel::CantChange);
            }
            return Ok(status);
        };
        log::debug!("{live}");

        let running = if live.is_active() {
            UnitState::Running
        } else {
            UnitState::Stopped
        };
        status.add_difference("state", running.token(), self.state.token());

        if let Some(enable) = self.enable {
            let current = if live.is_enabled() {
                Enablement::Enabled
            } else {
                Enablement::Disabled
            };
            status.add_difference("enable", current.token(), enable.token());
        }
        Ok(status)
    }

    fn mutate(&self, planned: &Status) -> syskit::Result<()> {
        let differs = |key: &str| planned.differences.get(key).is_some_and(|d| d.has_changes());

        if differs("enable") {
            match self.enable {
                Some(Enablement::Enabled) => self.manager.enable(&self.name)?,
                Some(Enablement::Disabled) => self.manager.disable(&self.name)?,
                None => {}
            }
        }
        if differs("state") {
            match self.state {
                UnitState::Running => self.manager.start(&self.name)?,
                UnitState::Stopped => self.manager.stop(&self.name)?,
            }
        }
        Ok(())
    }
}

impl Task for Unit {
    fn check(&self) -> Result<Status, Failure> {
        Ok(self.plan()?)
    }

    fn apply(&self) -> Result<Status, Failure> {
        let planned = self.plan()?;
        let changes = planned.clone();
        apply_planned(
            &self.target(),
            planned,
            || self.mutate(&changes),
            || self.plan(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::fakes::FakeUnits;
    use convergence::Verbatim;

    fn unit(state: &str, enable: &str, fake: FakeUnits) -> Unit {
        UnitPreparer {
            name: "nginx.service".into(),
            state: state.into(),
            enable: enable.into(),
        }
        .prepare_with(&Verbatim, Box::new(fake))
        .unwrap()
    }

    #[test]
    fn test_prepare_rejects_bad_enable() {
        let err = UnitPreparer {
            name: "nginx.service".into(),
            enable: "yes".into(),
            ..Default::default()
        }
        .prepare_with(&Verbatim, Box::new(FakeUnits::default()))
        .unwrap_err();
        assert_eq!(
            err.to_string(),
            "systemd.unit \"enable\" parameter invalid, use enabled or disabled"
        );
    }

    #[test]
    fn test_prepare_requires_name() {
        let err = UnitPreparer::default()
            .prepare_with(&Verbatim, Box::new(FakeUnits::default()))
            .unwrap_err();
        assert!(matches!(err, Error::MissingParameter { field: "name", .. }));
    }

    #[test]
    fn test_check_running_unit() {
        let status = unit("running", "", FakeUnits::with("nginx.service", true, false))
            .check()
            .unwrap();
        assert!(!status.has_changes());
        assert!(!status.differences.contains_key("enable"));
    }

    #[test]
    fn test_check_missing_unit_cant_change() {
        let status = unit("running", "", FakeUnits::default()).check().unwrap();
        assert!(status.is_warning());
        assert_eq!(status.messages, vec!["unit nginx.service not found"]);
    }

    #[test]
    fn test_apply_starts_and_enables() {
        let fake = FakeUnits::with("nginx.service", false, false);
        let calls = fake.calls.clone();
        let task = unit("running", "enabled", fake);

        let status = task.apply().unwrap();
        assert_eq!(status.changes().count(), 2);
        assert!(!task.check().unwrap().has_changes());
        assert_eq!(
            *calls.lock().unwrap(),
            vec!["enable nginx.service", "start nginx.service"]
        );
    }

    #[test]
    fn test_apply_only_touches_differences() {
        let fake = FakeUnits::with("nginx.service", true, true);
        let calls = fake.calls.clone();
        let task = unit("stopped", "enabled", fake);

        task.apply().unwrap();
        assert_eq!(*calls.lock().unwrap(), vec!["stop nginx.service"]);
        assert!(!task.apply().unwrap().has_changes());
    }

    #[test]
    fn test_missing_unit_is_already_stopped() {
        let fake = FakeUnits::default();
        let calls = fake.calls.clone();
        let task = unit("stopped", "disabled", fake);

        let status = task.check().unwrap();
        assert_eq!(status.level, StatusLevel::NoChange);
        assert_eq!(status.messages, vec!["unit nginx.service not found"]);
        assert!(!task.apply().unwrap().has_changes());
        assert!(calls.lock().unwrap().is_empty());

        let enabled = unit("stopped", "enabled", FakeUnits::default());
        assert!(enabled.check().unwrap().is_warning());
    }

    #[test]
    fn test_apply_backend_failure() {
        let fake = FakeUnits {
            broken: true,
            ..FakeUnits::with("nginx.service", false, true)
        };
        let calls = fake.calls.clone();
        let failure = unit("running", "", fake).apply().unwrap_err();

        assert!(matches!(failure.error, Error::BackendMutation { .. }));
        assert!(failure.error.is_retryable());
        assert_eq!(failure.status.differences["state"].to, "running");
        assert_eq!(*calls.lock().unwrap(), vec!["start nginx.service"]);
    }

    #[test]
    fn test_apply_missing_unit_fails_without_mutation() {
        let fake = FakeUnits::default();
        let calls = fake.calls.clone();
        let failure = unit("running", "", fake).apply().unwrap_err();
        assert_eq!(
            failure.error.to_string(),
            "changing unit nginx.service failed: unit nginx.service not found"
        );
        assert!(calls.lock().unwrap().is_empty());
    }
}

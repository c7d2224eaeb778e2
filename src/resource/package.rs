//! `rpm.package`: system packages managed through rpm and yum

use super::apply_planned;
use convergence::validate::{self, Token};
use convergence::{BoxedTask, Error, Failure, Preparer, Render, Status, Task, render_field};
use serde::Deserialize;
use syskit::backend::{PackageManager, default_package_manager};

/// Registered kind name
pub const KIND: &str = "rpm.package";

/// Desired package state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PackageState {
    #[default]
    Present,
    Absent,
}

impl Token for PackageState {
    const ALL: &'static [Self] = &[Self::Present, Self::Absent];

    fn token(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }
}

/// Raw parameters for a package declaration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PackagePreparer {
    /// Name of the system package to be managed
    #[serde(default)]
    pub name: String,

    /// Desired package state, `present` or `absent`
    #[serde(default)]
    pub state: String,
}

impl PackagePreparer {
    /// Validate and bind to an explicit backend.
    pub fn prepare_with(
        &self,
        render: &dyn Render,
        manager: Box<dyn PackageManager>,
    ) -> convergence::Result<Package> {
        let name = render_field(render, KIND, "name", &self.name)?;
        validate::required(KIND, "name", &name)?;

        let state = render_field(render, KIND, "state", &self.state)?;
        let state = validate::parse_enum(KIND, "state", &state)?.unwrap_or_default();

        Ok(Package {
            name,
            state,
            manager,
        })
    }
}

impl Preparer for PackagePreparer {
    fn prepare(&self, render: &dyn Render) -> convergence::Result<BoxedTask> {
        let task = self.prepare_with(render, Box::new(default_package_manager()))?;
        Ok(Box::new(task))
    }
}

/// A validated package resource
#[derive(Debug)]
pub struct Package {
    name: String,
    state: PackageState,
    manager: Box<dyn PackageManager>,
}

impl Package {
    fn target(&self) -> String {
        format!("package {}", self.name)
    }

    fn plan(&self) -> convergence::Result<Status> {
        let installed = self
            .manager
            .installed_version(&self.name)
            .map_err(|e| Error::query(self.target(), e))?;

        let live = if installed.is_some() {
            PackageState::Present
        } else {
            PackageState::Absent
        };

        let mut status = Status::new();
        status.add_difference("state", live.token(), self.state.token());
        if let Some(version) = installed {
            status.add_message(format!("{} {version} is installed", self.name));
        }
        Ok(status)
    }
}

impl Task for Package {
    fn check(&self) -> Result<Status, Failure> {
        Ok(self.plan()?)
    }

    fn apply(&self) -> Result<Status, Failure> {
        let planned = self.plan()?;
        apply_planned(
            &self.target(),
            planned,
            || match self.state {
                PackageState::Present => self.manager.install(&self.name),
                PackageState::Absent => self.manager.remove(&self.name),
            },
            || self.plan(),
        )
    }
}

//! In-memory backends for resource tests

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};
use syskit::backend::{AccountDatabase, PackageManager, UnitManager};
use syskit::{Account, AccountSpec, Error, Group, Result, UnitStatus};

/// Log of mutating calls, shared with the test after the backend is boxed
pub type Calls = Arc<Mutex<Vec<String>>>;

fn record(calls: &Calls, call: String) {
    calls.lock().unwrap().push(call);
}

fn refused(target: &str) -> Error {
    Error::Permission {
        message: format!("refusing to change {target}"),
    }
}

/// Package manager backed by a map of name to version
#[derive(Debug, Default)]
pub struct FakePackages {
    pub installed: Mutex<BTreeMap<String, String>>,
    pub calls: Calls,
    /// Accept mutations without changing state
    pub inert: bool,
    /// Fail every mutation
    pub broken: bool,
}

impl FakePackages {
    pub fn with(installed: &[(&str, &str)]) -> Self {
        Self {
            installed: Mutex::new(
                installed
                    .iter()
                    .map(|(n, v)| ((*n).to_string(), (*v).to_string()))
                    .collect(),
            ),
            ..Default::default()
        }
    }
}

impl PackageManager for FakePackages {
    fn installed_version(&self, name: &str) -> Result<Option<String>> {
        Ok(self.installed.lock().unwrap().get(name).cloned())
    }

    fn install(&self, name: &str) -> Result<()> {
        record(&self.calls, format!("install {name}"));
        if self.broken {
            return Err(refused(name));
        }
        if !self.inert {
            self.installed
                .lock()
                .unwrap()
                .insert(name.to_string(), "1.0-1".to_string());
        }
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<()> {
        record(&self.calls, format!("remove {name}"));
        if self.broken {
            return Err(refused(name));
        }
        if !self.inert {
            self.installed.lock().unwrap().remove(name);
        }
        Ok(())
    }
}

/// Service manager backed by a map of unit statuses
#[derive(Debug, Default)]
pub struct FakeUnits {
    pub units: Mutex<BTreeMap<String, UnitStatus>>,
    pub calls: Calls,
    pub broken: bool,
}

impl FakeUnits {
    pub fn with(name: &str, active: bool, enabled: bool) -> Self {
        let status = UnitStatus {
            name: name.to_string(),
            load_state: "loaded".to_string(),
            active_state: if active { "active" } else { "inactive" }.to_string(),
            sub_state: if active { "running" } else { "dead" }.to_string(),
            unit_file_state: if enabled { "enabled" } else { "disabled" }.to_string(),
            ..Default::default()
        };
        let fake = Self::default();
        fake.units.lock().unwrap().insert(name.to_string(), status);
        fake
    }

    fn update(&self, verb: &str, name: &str, f: impl FnOnce(&mut UnitStatus)) -> Result<()> {
        record(&self.calls, format!("{verb} {name}"));
        if self.broken {
            return Err(refused(name));
        }
        let mut units = self.units.lock().unwrap();
        let unit = units.get_mut(name).ok_or_else(|| Error::NotFound {
            name: name.to_string(),
        })?;
        f(unit);
        Ok(())
    }
}

impl UnitManager for FakeUnits {
    fn status(&self, name: &str) -> Result<Option<UnitStatus>> {
        Ok(self.units.lock().unwrap().get(name).cloned())
    }

    fn start(&self, name: &str) -> Result<()> {
        self.update("start", name, |u| u.active_state = "active".to_string())
    }

    fn stop(&self, name: &str) -> Result<()> {
        self.update("stop", name, |u| u.active_state = "inactive".to_string())
    }

    fn enable(&self, name: &str) -> Result<()> {
        self.update("enable", name, |u| u.unit_file_state = "enabled".to_string())
    }

    fn disable(&self, name: &str) -> Result<()> {
        self.update("disable", name, |u| {
            u.unit_file_state = "disabled".to_string();
        })
    }
}

/// Account database backed by in-memory lists
#[derive(Debug, Default)]
pub struct FakeAccounts {
    pub users: Mutex<Vec<Account>>,
    pub groups: Vec<Group>,
    pub calls: Calls,
    pub broken: bool,
}

impl FakeAccounts {
    /// root (0/0), alice (1000/100) and groups root (0), users (100), ops (50)
    pub fn standard() -> Self {
        Self {
            users: Mutex::new(vec![account("root", 0, 0), account("alice", 1000, 100)]),
            groups: vec![group("root", 0), group("users", 100), group("ops", 50)],
            ..Default::default()
        }
    }
}

fn account(username: &str, uid: u32, gid: u32) -> Account {
    Account {
        username: username.to_string(),
        uid,
        gid,
        comment: String::new(),
        home_dir: format!("/home/{username}"),
        shell: "/bin/bash".to_string(),
    }
}

fn group(name: &str, gid: u32) -> Group {
    Group {
        name: name.to_string(),
        gid,
        members: Vec::new(),
    }
}

fn apply_spec(account: &mut Account, spec: &AccountSpec) {
    if let Some(uid) = spec.uid {
        account.uid = uid;
    }
    if let Some(gid) = spec.gid {
        account.gid = gid;
    }
    if let Some(comment) = &spec.comment {
        account.comment = comment.clone();
    }
    if let Some(home) = &spec.home_dir {
        account.home_dir = home.clone();
    }
}

impl AccountDatabase for FakeAccounts {
    fn user(&self, username: &str) -> Result<Option<Account>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.username == username)
            .cloned())
    }

    fn user_by_uid(&self, uid: u32) -> Result<Option<Account>> {
        Ok(self
            .users
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.uid == uid)
            .cloned())
    }

    fn group(&self, name: &str) -> Result<Option<Group>> {
        Ok(self.groups.iter().find(|g| g.name == name).cloned())
    }

    fn group_by_gid(&self, gid: u32) -> Result<Option<Group>> {
        Ok(self.groups.iter().find(|g| g.gid == gid).cloned())
    }

    fn add_user(&self, username: &str, spec: &AccountSpec) -> Result<()> {
        record(&self.calls, format!("add {username}"));
        if self.broken {
            return Err(refused(username));
        }
        let mut users = self.users.lock().unwrap();
        let next_uid = users.iter().map(|a| a.uid).max().unwrap_or(999) + 1;
        let mut created = account(username, next_uid, 100);
        apply_spec(&mut created, spec);
        users.push(created);
        Ok(())
    }

    fn modify_user(&self, username: &str, spec: &AccountSpec) -> Result<()> {
        record(&self.calls, format!("modify {username}"));
        if self.broken {
            return Err(refused(username));
        }
        let mut users = self.users.lock().unwrap();
        if let Some(existing) = users.iter_mut().find(|a| a.username == username) {
            apply_spec(existing, spec);
        }
        Ok(())
    }

    fn delete_user(&self, username: &str) -> Result<()> {
        record(&self.calls, format!("delete {username}"));
        if self.broken {
            return Err(refused(username));
        }
        self.users.lock().unwrap().retain(|a| a.username != username);
        Ok(())
    }
}

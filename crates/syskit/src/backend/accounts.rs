//! Local account backend.
//!
//! Queries read the passwd and group files directly; changes go through
//! the shadow-utils commands (`useradd`, `usermod`, `userdel`) so that
//! shadow entries and locking are handled by the system.

use crate::backend::AccountDatabase;
use crate::error::{Error, Result};
use crate::exec::{ExecCaller, SysCaller};
use crate::types::{Account, AccountSpec, Group};
use std::fs;
use std::path::{Path, PathBuf};

/// Default passwd database.
pub const PASSWD_PATH: &str = "/etc/passwd";

/// Default group database.
pub const GROUP_PATH: &str = "/etc/group";

/// Backend over the local passwd/group files.
#[derive(Debug, Clone)]
pub struct LocalAccounts<S = ExecCaller> {
    passwd: PathBuf,
    group: PathBuf,
    sys: S,
}

impl Default for LocalAccounts {
    fn default() -> Self {
        Self::new(PASSWD_PATH, GROUP_PATH, ExecCaller)
    }
}

impl<S: SysCaller> LocalAccounts<S> {
    /// Create a backend reading the given files and running commands
    /// through `sys`.
    pub fn new(passwd: impl Into<PathBuf>, group: impl Into<PathBuf>, sys: S) -> Self {
        Self {
            passwd: passwd.into(),
            group: group.into(),
            sys,
        }
    }

    fn accounts(&self) -> Result<Vec<Account>> {
        let content = fs::read_to_string(&self.passwd)?;
        parse_passwd(&self.passwd, &content)
    }

    fn groups(&self) -> Result<Vec<Group>> {
        let content = fs::read_to_string(&self.group)?;
        parse_group(&self.group, &content)
    }

    fn run(&self, program: &str, args: &[String], username: &str) -> Result<()> {
        let args: Vec<&str> = args.iter().map(String::as_str).collect();
        self.sys.call(program, &args)?.check(program, username)?;
        Ok(())
    }
}

impl<S: SysCaller> AccountDatabase for LocalAccounts<S> {
    fn user(&self, username: &str) -> Result<Option<Account>> {
        Ok(self.accounts()?.into_iter().find(|a| a.username == username))
    }

    fn user_by_uid(&self, uid: u32) -> Result<Option<Account>> {
        Ok(self.accounts()?.into_iter().find(|a| a.uid == uid))
    }

    fn group(&self, name: &str) -> Result<Option<Group>> {
        Ok(self.groups()?.into_iter().find(|g| g.name == name))
    }

    fn group_by_gid(&self, gid: u32) -> Result<Option<Group>> {
        Ok(self.groups()?.into_iter().find(|g| g.gid == gid))
    }

    fn add_user(&self, username: &str, spec: &AccountSpec) -> Result<()> {
        log::info!("Adding user {username}");
        let mut args = spec.to_args();
        args.push(username.to_string());
        self.run("useradd", &args, username)
    }

    fn modify_user(&self, username: &str, spec: &AccountSpec) -> Result<()> {
        if spec.is_empty() {
            return Ok(());
        }
        log::info!("Modifying user {username}");
        let mut args = spec.to_args();
        args.push(username.to_string());
        self.run("usermod", &args, username)
    }

    fn delete_user(&self, username: &str) -> Result<()> {
        log::info!("Deleting user {username}");
        self.run("userdel", &[username.to_string()], username)
    }
}

/// Lines that carry no entry: blanks, comments and NIS compat markers.
fn is_skipped(line: &str) -> bool {
    let line = line.trim();
    line.is_empty() || line.starts_with('#') || line.starts_with('+') || line.starts_with('-')
}

fn parse_id(path: &Path, line: usize, field: &str, value: &str) -> Result<u32> {
    value.parse().map_err(|_| Error::Parse {
        path: path.to_path_buf(),
        line,
        message: format!("{field} {value:?} is not a number"),
    })
}

/// Parse passwd(5) content: `name:password:uid:gid:gecos:home:shell`.
pub fn parse_passwd(path: &Path, content: &str) -> Result<Vec<Account>> {
    let mut accounts = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if is_skipped(line) {
            continue;
        }
        let line_no = idx + 1;
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() != 7 {
            return Err(Error::Parse {
                path: path.to_path_buf(),
                line: line_no,
                message: format!("expected 7 fields, found {}", fields.len()),
            });
        }
        accounts.push(Account {
            username: fields[0].to_string(),
            uid: parse_id(path, line_no, "uid", fields[2])?,
            gid: parse_id(path, line_no, "gid", fields[3])?,
            comment: fields[4].to_string(),
            home_dir: fields[5].to_string(),
            shell: fields[6].to_string(),
        });
    }
    Ok(accounts)
}

/// Parse group(5) content: `name:password:gid:member,member`.
pub fn parse_group(path: &Path, content: &str) -> Result<Vec<Group>> {
    let mut groups = Vec::new();
    for (idx, line) in content.lines().enumerate() {
        if is_skipped(line) {
            continue;
        }
        let line_no = idx + 1;
        let fields: Vec<&str> = line.split(':').collect();
        if fields.len() != 4 {
            return Err(Error::Parse {
                path: path.to_path_buf(),
                line: line_no,
                message: format!("expected 4 fields, found {}", fields.len()),
            });
        }
        groups.push(Group {
            name: fields[0].to_string(),
            gid: parse_id(path, line_no, "gid", fields[2])?,
            members: fields[3]
                .split(',')
                .filter(|m| !m.is_empty())
                .map(str::to_string)
                .collect(),
        });
    }
    Ok(groups)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::Output;
    use std::sync::Mutex;
    use tempfile::TempDir;

    const PASSWD: &str = "\
# local accounts
root:x:0:0:root:/root:/bin/bash
svc:x:1234:50:Service Account:/srv/svc:/sbin/nologin

+::::::
";

    const GROUP: &str = "\
root:x:0:
ops:x:50:svc,alice
";

    #[derive(Debug, Default)]
    struct Recorder {
        calls: Mutex<Vec<String>>,
    }

    impl SysCaller for Recorder {
        fn call(&self, program: &str, args: &[&str]) -> Result<Output> {
            self.calls
                .lock()
                .unwrap()
                .push(format!("{program} {}", args.join(" ")));
            Ok(Output::ok(""))
        }
    }

    fn fixture() -> (TempDir, LocalAccounts<Recorder>) {
        let tmp = TempDir::new().unwrap();
        let passwd = tmp.path().join("passwd");
        let group = tmp.path().join("group");
        fs::write(&passwd, PASSWD).unwrap();
        fs::write(&group, GROUP).unwrap();
        let db = LocalAccounts::new(passwd, group, Recorder::default());
        (tmp, db)
    }

    #[test]
    fn test_parse_passwd() {
        let accounts = parse_passwd(Path::new("passwd"), PASSWD).unwrap();
        assert_eq!(accounts.len(), 2);
        assert_eq!(accounts[1].username, "svc");
        assert_eq!(accounts[1].uid, 1234);
        assert_eq!(accounts[1].comment, "Service Account");
        assert_eq!(accounts[1].shell, "/sbin/nologin");
    }

    #[test]
    fn test_parse_passwd_rejects_bad_uid() {
        let err = parse_passwd(Path::new("passwd"), "bad:x:abc:0::/:/bin/sh\n").unwrap_err();
        assert!(matches!(err, Error::Parse { line: 1, .. }));
    }

    #[test]
    fn test_parse_group_members() {
        let groups = parse_group(Path::new("group"), GROUP).unwrap();
        assert!(groups[0].members.is_empty());
        assert_eq!(groups[1].members, vec!["svc", "alice"]);
    }

    #[test]
    fn test_lookups() {
        let (_tmp, db) = fixture();
        assert_eq!(db.user("svc").unwrap().unwrap().gid, 50);
        assert!(db.user("nobody").unwrap().is_none());
        assert_eq!(db.user_by_uid(0).unwrap().unwrap().username, "root");
        assert_eq!(db.group("ops").unwrap().unwrap().gid, 50);
        assert_eq!(db.group_by_gid(0).unwrap().unwrap().name, "root");
        assert!(db.group_by_gid(99).unwrap().is_none());
    }

    #[test]
    fn test_mutation_commands() {
        let (_tmp, db) = fixture();
        let spec = AccountSpec {
            uid: Some(2000),
            gid: Some(50),
            ..Default::default()
        };
        db.add_user("bob", &spec).unwrap();
        db.modify_user("bob", &AccountSpec::default()).unwrap();
        db.delete_user("bob").unwrap();

        assert_eq!(
            *db.sys.calls.lock().unwrap(),
            vec!["useradd -u 2000 -g 50 bob", "userdel bob"]
        );
    }

    #[test]
    fn test_missing_database_is_io_error() {
        let db = LocalAccounts::new("/nonexistent/passwd", "/nonexistent/group", Recorder::default());
        assert!(matches!(db.user("svc").unwrap_err(), Error::Io(_)));
    }
}

//! `user`: local accounts

use super::{ABSENT, apply_planned};
use convergence::validate::{self, Token};
use convergence::{
    BoxedTask, Error, Failure, Preparer, Render, Status, StatusLevel, Task, render_field,
};
use serde::Deserialize;
use syskit::backend::{AccountDatabase, default_account_database};
use syskit::{Account, AccountSpec};

/// Registered kind name
pub const KIND: &str = "user";

/// Desired account state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UserState {
    #[default]
    Present,
    Absent,
}

impl Token for UserState {
    const ALL: &'static [Self] = &[Self::Present, Self::Absent];

    fn token(&self) -> &'static str {
        match self {
            Self::Present => "present",
            Self::Absent => "absent",
        }
    }
}

/// Primary group, by name or by id
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupRef {
    Name(String),
    Gid(u32),
}

/// Raw parameters for a user declaration
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct UserPreparer {
    /// Login name
    #[serde(default)]
    pub username: String,

    /// Numeric user id
    #[serde(default)]
    pub uid: String,

    /// Primary group name; exclusive with `gid`
    #[serde(default)]
    pub groupname: String,

    /// Primary group id; exclusive with `groupname`
    #[serde(default)]
    pub gid: String,

    /// Display name, stored as the account comment
    #[serde(default)]
    pub name: String,

    /// Home directory
    #[serde(default)]
    pub home_dir: String,

    /// `present` or `absent`
    #[serde(default)]
    pub state: String,
}

impl UserPreparer {
    /// Validate and bind to an explicit backend.
    pub fn prepare_with(
        &self,
        render: &dyn Render,
        db: Box<dyn AccountDatabase>,
    ) -> convergence::Result<User> {
        let field = |name: &'static str, value: &str| render_field(render, KIND, name, value);

        let username = field("username", &self.username)?;
        validate::required(KIND, "username", &username)?;

        let uid = validate::parse_id(KIND, "uid", &field("uid", &self.uid)?)?;

        let groupname = field("groupname", &self.groupname)?;
        let gid = field("gid", &self.gid)?;
        validate::exclusive(KIND, ("groupname", &groupname), ("gid", &gid))?;
        let gid = validate::parse_id(KIND, "gid", &gid)?;

        let state = validate::parse_enum(KIND, "state", &field("state", &self.state)?)?;

        let group = match (validate::optional(groupname), gid) {
            (Some(name), _) => Some(GroupRef::Name(name)),
            (None, Some(gid)) => Some(GroupRef::Gid(gid)),
            (None, None) => None,
        };

        Ok(User {
            username,
            uid,
            group,
            comment: validate::optional(field("name", &self.name)?),
            home_dir: validate::optional(field("home_dir", &self.home_dir)?),
            state: state.unwrap_or_default(),
            db,
        })
    }
}

impl Preparer for UserPreparer {
    fn prepare(&self, render: &dyn Render) -> convergence::Result<BoxedTask> {
        let task = self.prepare_with(render, Box::new(default_account_database()))?;
        Ok(Box::new(task))
    }
}

/// Change to make once the plan is accepted
#[derive(Debug, Clone, PartialEq, Eq)]
enum Change {
    Nothing,
    Add(AccountSpec),
    Modify(AccountSpec),
    Delete,
}

/// A validated user resource
#[derive(Debug)]
pub struct User {
    username: String,
    uid: Option<u32>,
    group: Option<GroupRef>,
    comment: Option<String>,
    home_dir: Option<String>,
    state: UserState,
    db: Box<dyn AccountDatabase>,
}

impl User {
    fn target(&self) -> String {
        format!("user {}", self.username)
    }

    fn query<T>(&self, result: syskit::Result<T>) -> convergence::Result<T> {
        result.map_err(|e| Error::query(self.target(), e))
    }

    /// Resolve the requested group to a gid.
    ///
    /// A missing group marks the status `CantChange` and yields `None`.
    fn resolve_gid(&self, status: &mut Status) -> convergence::Result<Option<u32>> {
        let found = match &self.group {
            None => return Ok(None),
            Some(GroupRef::Name(name)) => self.query(self.db.group(name))?,
            Some(GroupRef::Gid(gid)) => self.query(self.db.group_by_gid(*gid))?,
        };
        if let Some(group) = found {
            return Ok(Some(group.gid));
        }

        let wanted = match &self.group {
            Some(GroupRef::Name(name)) => name.clone(),
            Some(GroupRef::Gid(gid)) => gid.to_string(),
            None => String::new(),
        };
        status.raise_level(StatusLevel::CantChange);
        status.add_message(format!("group {wanted} does not exist"));
        Ok(None)
    }

    /// Refuse a uid that another account already owns.
    ///
    /// Uids may be shared in passwd, so an account already holding the
    /// requested uid is never refused.
    fn check_uid_owner(
        &self,
        status: &mut Status,
        live: Option<&Account>,
    ) -> convergence::Result<()> {
        let Some(uid) = self.uid else {
            return Ok(());
        };
        if live.is_some_and(|account| account.uid == uid) {
            return Ok(());
        }
        if let Some(owner) = self.query(self.db.user_by_uid(uid))?
            && owner.username != self.username
        {
            status.raise_level(StatusLevel::CantChange);
            status.add_message(format!("uid {uid} already belongs to {}", owner.username));
        }
        Ok(())
    }

    fn plan(&self) -> convergence::Result<(Status, Change)> {
        let live = self.query(self.db.user(&self.username))?;
        let mut status = Status::new();

        if self.state == UserState::Absent {
            return Ok(match live {
                Some(_) => {
                    status.add_difference("user", &self.username, ABSENT);
                    (status, Change::Delete)
                }
                None => {
                    status.add_message(format!("user {} does not exist", self.username));
                    (status, Change::Nothing)
                }
            });
        }

        let gid = self.resolve_gid(&mut status)?;
        self.check_uid_owner(&mut status, live.as_ref())?;

        let change = match live {
            None => self.plan_add(&mut status, gid),
            Some(account) => self.plan_modify(&mut status, gid, &account),
        };
        Ok((status, change))
    }

    fn plan_add(&self, status: &mut Status, gid: Option<u32>) -> Change {
        status.add_difference("user", ABSENT, &self.username);
        if let Some(uid) = self.uid {
            status.add_difference("uid", ABSENT, uid.to_string());
        }
        if let Some(gid) = gid {
            status.add_difference("gid", ABSENT, gid.to_string());
        }
        if let Some(comment) = &self.comment {
            status.add_difference("comment", ABSENT, comment);
        }
        if let Some(home) = &self.home_dir {
            status.add_difference("home_dir", ABSENT, home);
        }

        Change::Add(AccountSpec {
            uid: self.uid,
            gid,
            comment: self.comment.clone(),
            home_dir: self.home_dir.clone(),
        })
    }

    fn plan_modify(&self, status: &mut Status, gid: Option<u32>, live: &Account) -> Change {
        let mut spec = AccountSpec::default();

        if let Some(uid) = self.uid {
            status.add_difference("uid", live.uid.to_string(), uid.to_string());
            if live.uid != uid {
                spec.uid = Some(uid);
            }
        }
        if let Some(gid) = gid {
            status.add_difference("gid", live.gid.to_string(), gid.to_string());
            if live.gid != gid {
                spec.gid = Some(gid);
            }
        }
        if let Some(comment) = &self.comment {
            status.add_difference("comment", &live.comment, comment);
            if &live.comment != comment {
                spec.comment = Some(comment.clone());
            }
        }
        if let Some(home) = &self.home_dir {
            status.add_difference("home_dir", &live.home_dir, home);
            if &live.home_dir != home {
                spec.home_dir = Some(home.clone());
            }
        }

        if spec.is_empty() {
            Change::Nothing
        } else {
            Change::Modify(spec)
        }
    }
}

impl Task for User {
    fn check(&self) -> Result<Status, Failure> {
        let (status, _) = self.plan()?;
        Ok(status)
    }

    fn apply(&self) -> Result<Status, Failure> {
        let (planned, change) = self.plan()?;
        apply_planned(
            &self.target(),
            planned,
            || match &change {
                Change::Nothing => Ok(()),
                Change::Add(spec) => self.db.add_user(&self.username, spec),
                Change::Modify(spec) => self.db.modify_user(&self.username, spec),
                Change::Delete => self.db.delete_user(&self.username),
            },
            || self.plan().map(|(status, _)| status),
        )
    }
}

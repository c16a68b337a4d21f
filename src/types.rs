use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Read,
    Write,
    Admin,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::Read => "read",
            Role::Write => "write",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Who a grant is held by. Teams are managed by the organization itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum PrincipalKind {
    User {
        #[serde(default)]
        is_robot: bool,
    },
    Team,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grant {
    pub name: String,
    #[serde(flatten)]
    pub kind: PrincipalKind,
    pub role: Role,
}

impl Grant {
    pub fn user(name: impl Into<String>, role: Role) -> Self {
        Grant {
            name: name.into(),
            kind: PrincipalKind::User { is_robot: false },
            role,
        }
    }

    pub fn robot(name: impl Into<String>, role: Role) -> Self {
        Grant {
            name: name.into(),
            kind: PrincipalKind::User { is_robot: true },
            role,
        }
    }

    pub fn team(name: impl Into<String>, role: Role) -> Self {
        Grant {
            name: name.into(),
            kind: PrincipalKind::Team,
            role,
        }
    }

    pub fn is_user(&self) -> bool {
        matches!(self.kind, PrincipalKind::User { .. })
    }

    pub fn is_robot(&self) -> bool {
        matches!(self.kind, PrincipalKind::User { is_robot: true })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub namespace: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub is_public: bool,
    pub grants: Vec<Grant>,
}

impl Repository {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Repository {
            namespace: namespace.into(),
            name: name.into(),
            description: None,
            is_public: false,
            grants: Vec::new(),
        }
    }

    pub fn with_grant(mut self, grant: Grant) -> Self {
        self.grants.push(grant);
        self
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub namespace: String,
    pub members: BTreeSet<String>,
}

impl Organization {
    pub fn new<I, S>(namespace: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Organization {
            namespace: namespace.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }

    /// True for listed members and for robot accounts named `<namespace>+<robot>`.
    pub fn is_inside(&self, principal: &str) -> bool {
        if self.members.contains(principal) {
            return true;
        }
        principal
            .split_once('+')
            .is_some_and(|(owner, robot)| owner == self.namespace && !robot.is_empty())
    }
}

/// Everything fetched in one run: membership and grants always travel together.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct State {
    pub organization: Organization,
    pub repositories: Vec<Repository>,
    #[serde(default)]
    pub fetched_at: Option<DateTime<Utc>>,
}

impl State {
    pub fn new(organization: Organization, repositories: Vec<Repository>) -> Self {
        State {
            organization,
            repositories,
            fetched_at: None,
        }
    }
}

/// A user grant held by someone outside the organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finding<'a> {
    pub repository: &'a Repository,
    pub grant: &'a Grant,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn grant_json_is_flat() {
        let g = Grant::robot("other+ci", Role::Write);
        let s = serde_json::to_string(&g).unwrap();
        assert!(s.contains("\"kind\":\"user\""));
        assert!(s.contains("\"is_robot\":true"));
        assert!(s.contains("\"role\":\"write\""));

        let t: Grant =
            serde_json::from_str(r#"{"name":"owners","kind":"team","role":"admin"}"#).unwrap();
        assert_eq!(t, Grant::team("owners", Role::Admin));
    }

    #[test]
    fn unknown_role_is_rejected() {
        let r = serde_json::from_str::<Grant>(r#"{"name":"x","kind":"user","role":"owner"}"#);
        assert!(r.is_err());
    }

    #[test]
    fn own_robots_are_inside() {
        let org = Organization::new("woofshop", ["alice", "bob"]);
        assert!(org.is_inside("alice"));
        assert!(org.is_inside("woofshop+deployer"));
        assert!(!org.is_inside("woofshop+"));
        assert!(!org.is_inside("catshop+deployer"));
        assert!(!org.is_inside("niceperson"));
    }

    #[test]
    fn full_name_joins_namespace() {
        assert_eq!(Repository::new("woofshop", "landscape").full_name(), "woofshop/landscape");
    }
}

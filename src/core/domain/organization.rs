//! Organizations, their members and projects.

use serde::{Deserialize, Serialize};

use crate::core::types::Id;

/// An organization secrets are attached to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub id: Id,
    /// URL-safe name, e.g. `acme-corp`.
    pub url_name: String,
}

/// A user belonging to an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub user_id: Id,
    pub username: String,
}

/// A project owned by an organization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub id: Id,
    pub organization_id: Id,
    pub name: String,
}

/// How the working directory names its project: owner organization plus
/// project name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ProjectRef {
    pub owner: String,
    pub name: String,
}

impl ProjectRef {
    pub fn new(owner: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            name: name.into(),
        }
    }
}

impl std::fmt::Display for ProjectRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.owner, self.name)
    }
}

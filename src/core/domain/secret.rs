//! Secret types.
//!
//! A [`Secret`] is one encrypted value as the service returns it. Several may
//! share a name at different scopes; [`crate::core::resolve`] picks one.

use serde::{Deserialize, Serialize};

use crate::core::types::{EncryptedValue, Id, SecretName};

/// An encrypted secret visible to the current user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    pub secret_id: Id,
    pub name: SecretName,
    /// Base64 RSA-OAEP ciphertext, encrypted for the current user.
    pub value: EncryptedValue,
    /// `None` means organization wide.
    #[serde(default)]
    pub project_id: Option<Id>,
    #[serde(default)]
    pub is_user: bool,
}

impl Secret {
    /// Case-insensitive name comparison.
    pub fn matches_name(&self, name: &str) -> bool {
        names_match(&self.name, name)
    }

    /// Whether this secret sits at exactly the given scope.
    pub fn has_scope(&self, is_user: bool, project_id: Option<Id>) -> bool {
        self.is_user == is_user && self.project_id == project_id
    }

    pub fn scope(&self) -> Scope {
        match (self.is_user, self.project_id.is_some()) {
            (true, true) => Scope::UserProject,
            (true, false) => Scope::User,
            (false, true) => Scope::Project,
            (false, false) => Scope::Organization,
        }
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name)
    }
}

pub(crate) fn names_match(a: &str, b: &str) -> bool {
    a.eq_ignore_ascii_case(b) || a.to_lowercase() == b.to_lowercase()
}

/// Effective visibility of a secret.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    /// Only the owning user, only within one project.
    UserProject,
    /// Only the owning user, any project.
    User,
    /// Every member, one project.
    Project,
    /// Every member, every project.
    Organization,
}

impl std::fmt::Display for Scope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Scope::UserProject => "user+project",
            Scope::User => "user",
            Scope::Project => "project",
            Scope::Organization => "organization",
        };
        f.write_str(s)
    }
}

/// A new or updated value sent to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretChange {
    /// Set when updating an existing secret.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub secret_id: Option<Id>,
    pub name: SecretName,
    pub value: EncryptedValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Id>,
    pub is_user: bool,
}

/// Scope a project declares for one of its secrets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DefinitionScope {
    User,
    Project,
}

impl std::fmt::Display for DefinitionScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DefinitionScope::User => f.write_str("user"),
            DefinitionScope::Project => f.write_str("project"),
        }
    }
}

/// A secret a project expects to exist. Carries no value.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretDefinition {
    pub name: SecretName,
    pub scope: DefinitionScope,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl SecretDefinition {
    /// The lookup that resolves this definition.
    pub fn request(&self) -> SecretRequest {
        match self.scope {
            DefinitionScope::User => SecretRequest::user(self.name.clone()),
            DefinitionScope::Project => SecretRequest::project(self.name.clone()),
        }
    }
}

/// A lookup by name with scope hints.
///
/// The hints only disambiguate between candidates; a user scoped secret for
/// the current project always wins regardless of them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SecretRequest {
    pub name: SecretName,
    /// Prefer user scoped values; others only as a last resort.
    pub is_user: bool,
    /// Organization wide values are not acceptable.
    pub pull_from_project: bool,
}

impl SecretRequest {
    /// Request a value private to the current user.
    pub fn user(name: impl Into<SecretName>) -> Self {
        Self {
            name: name.into(),
            is_user: true,
            pull_from_project: false,
        }
    }

    /// Request a value shared through the current project.
    pub fn project(name: impl Into<SecretName>) -> Self {
        Self {
            name: name.into(),
            is_user: false,
            pull_from_project: true,
        }
    }

    /// Request a shared value at project or organization scope.
    pub fn shared(name: impl Into<SecretName>) -> Self {
        Self {
            name: name.into(),
            is_user: false,
            pull_from_project: false,
        }
    }
}

/// A definition together with whether a value resolves for it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SecretExport {
    pub name: SecretName,
    pub scope: DefinitionScope,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub has_value: bool,
}

//! Secret store client.
//!
//! Thin layer over [`Transport`] that attaches operation context to remote
//! failures and owns the write path: values are encrypted client side before
//! anything leaves the process.

use tracing::debug;

use crate::core::api::{RemoteResult, Transport};
use crate::core::domain::{
    Organization, Project, Secret, SecretChange, SecretDefinition, SecretDiff, Share,
};
use crate::core::keypair::Encrypter;
use crate::core::types::{Id, PublicKeyPem};
use crate::error::{RemoteError, Result};

/// Client for the secrets service.
#[derive(Debug, Clone)]
pub struct SecretsClient<T> {
    transport: T,
}

impl<T: Transport> SecretsClient<T> {
    pub fn new(transport: T) -> Self {
        Self { transport }
    }

    /// Underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// User id behind the current credentials.
    pub fn authenticated_user_id(&self) -> RemoteResult<Id> {
        self.transport
            .authenticated_user_id()
            .map_err(|e| e.context("authenticate"))
    }

    /// All secrets the current user can see in `organization`.
    pub fn fetch_all(&self, organization: &Organization) -> Result<Vec<Secret>> {
        debug!(organization = %organization.url_name, "fetching secrets");
        let secrets = self
            .transport
            .fetch_all_secrets(organization.id)
            .map_err(|e| e.context("fetch secrets"))?;
        debug!(count = secrets.len(), "secrets fetched");
        Ok(secrets)
    }

    /// Secret definitions declared by `project`.
    pub fn fetch_definitions(&self, project: &Project) -> Result<Vec<SecretDefinition>> {
        debug!(project = %project.name, "fetching secret definitions");
        Ok(self
            .transport
            .fetch_secret_definitions(project.id)
            .map_err(|e| e.context("fetch secret definitions"))?)
    }

    /// Encrypt `value` for the current user and store it at the given scope.
    ///
    /// Updates the secret with exactly the same name (ignoring case), user
    /// flag and project, or creates a new one.
    ///
    /// # Arguments
    ///
    /// * `encrypter` - The current user's key
    /// * `project` - `None` for organization or user wide values
    /// * `is_user` - Keep the value private to the current user
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::MessageTooLong` for values the key cannot hold,
    /// or the remote failure with its operation attached.
    pub fn save<E: Encrypter + ?Sized>(
        &self,
        encrypter: &E,
        organization: &Organization,
        project: Option<&Project>,
        is_user: bool,
        name: &str,
        value: &str,
    ) -> Result<()> {
        let project_id = project.map(|p| p.id);
        let existing = self
            .fetch_all(organization)?
            .into_iter()
            .find(|s| s.matches_name(name) && s.has_scope(is_user, project_id));

        let change = SecretChange {
            secret_id: existing.as_ref().map(|s| s.secret_id),
            name: existing.map(|s| s.name).unwrap_or_else(|| name.to_string()),
            value: encrypter.encrypt_and_encode(value.as_bytes())?,
            project_id,
            is_user,
        };

        debug!(
            name = %change.name,
            is_user,
            update = change.secret_id.is_some(),
            "saving secret"
        );
        self.save_changes(organization.id, &[change])
    }

    /// Persist already encrypted changes.
    pub fn save_changes(&self, organization_id: Id, changes: &[SecretChange]) -> Result<()> {
        Ok(self
            .transport
            .save_secrets(organization_id, changes)
            .map_err(|e| e.context("save secrets"))?)
    }

    /// Shares `user_id` is missing, or `None` when there is nothing to do.
    pub fn fetch_diff(&self, organization_id: Id, user_id: Id) -> RemoteResult<Option<SecretDiff>> {
        match self.transport.fetch_diff(organization_id, user_id) {
            Ok(diff) => Ok(Some(diff)),
            Err(RemoteError::NotFound(_)) => Ok(None),
            Err(e) => Err(e.context("fetch diff")),
        }
    }

    /// Replace what is shared with `user_id`.
    pub fn save_shares(&self, organization_id: Id, user_id: Id, shares: &[Share]) -> RemoteResult<()> {
        self.transport
            .save_shares(organization_id, user_id, shares)
            .map_err(|e| e.context("save shares"))
    }

    /// A member's public key.
    pub fn fetch_public_key(&self, user_id: Id) -> RemoteResult<PublicKeyPem> {
        self.transport
            .fetch_public_key(user_id)
            .map_err(|e| e.context("fetch public key"))
    }
}

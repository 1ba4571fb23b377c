//! Secrets service transport.
//!
//! Everything cloakroom needs from the platform and the secrets service goes
//! through [`Transport`]. No HTTP client ships with the library; callers
//! provide one.

use crate::core::domain::{
    Member, Organization, Project, RawKeypair, Secret, SecretChange, SecretDefinition, SecretDiff,
    Share,
};
use crate::core::types::{Id, PublicKeyPem};
use crate::error::RemoteError;

/// Result of a remote call.
pub type RemoteResult<T> = std::result::Result<T, RemoteError>;

/// Calls against the platform and the secrets service.
///
/// Implementations map HTTP 401 to [`RemoteError::Unauthorized`] and 404 to
/// [`RemoteError::NotFound`]; everything else is `SaveFailed` for rejected
/// writes or `Unknown`. Calls are blocking and never retried here.
pub trait Transport {
    /// User id behind the current credentials.
    fn authenticated_user_id(&self) -> RemoteResult<Id>;

    fn fetch_organization(&self, url_name: &str) -> RemoteResult<Organization>;

    fn fetch_project(&self, organization: &str, name: &str) -> RemoteResult<Project>;

    fn fetch_members(&self, organization_id: Id) -> RemoteResult<Vec<Member>>;

    /// Every secret the current user can see in the organization.
    fn fetch_all_secrets(&self, organization_id: Id) -> RemoteResult<Vec<Secret>>;

    fn fetch_secret_definitions(&self, project_id: Id) -> RemoteResult<Vec<SecretDefinition>>;

    /// Shares `user_id` is missing. `NotFound` when there are none.
    fn fetch_diff(&self, organization_id: Id, user_id: Id) -> RemoteResult<SecretDiff>;

    fn save_secrets(&self, organization_id: Id, changes: &[SecretChange]) -> RemoteResult<()>;

    /// Bulk update of everything shared with `user_id`.
    fn save_shares(&self, organization_id: Id, user_id: Id, shares: &[Share]) -> RemoteResult<()>;

    /// The current user's stored keypair.
    fn fetch_keypair(&self) -> RemoteResult<RawKeypair>;

    fn save_keypair(&self, keypair: &RawKeypair) -> RemoteResult<()>;

    fn fetch_public_key(&self, user_id: Id) -> RemoteResult<PublicKeyPem>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn authenticated_user_id(&self) -> RemoteResult<Id> {
        (**self).authenticated_user_id()
    }

    fn fetch_organization(&self, url_name: &str) -> RemoteResult<Organization> {
        (**self).fetch_organization(url_name)
    }

    fn fetch_project(&self, organization: &str, name: &str) -> RemoteResult<Project> {
        (**self).fetch_project(organization, name)
    }

    fn fetch_members(&self, organization_id: Id) -> RemoteResult<Vec<Member>> {
        (**self).fetch_members(organization_id)
    }

    fn fetch_all_secrets(&self, organization_id: Id) -> RemoteResult<Vec<Secret>> {
        (**self).fetch_all_secrets(organization_id)
    }

    fn fetch_secret_definitions(&self, project_id: Id) -> RemoteResult<Vec<SecretDefinition>> {
        (**self).fetch_secret_definitions(project_id)
    }

    fn fetch_diff(&self, organization_id: Id, user_id: Id) -> RemoteResult<SecretDiff> {
        (**self).fetch_diff(organization_id, user_id)
    }

    fn save_secrets(&self, organization_id: Id, changes: &[SecretChange]) -> RemoteResult<()> {
        (**self).save_secrets(organization_id, changes)
    }

    fn save_shares(&self, organization_id: Id, user_id: Id, shares: &[Share]) -> RemoteResult<()> {
        (**self).save_shares(organization_id, user_id, shares)
    }

    fn fetch_keypair(&self) -> RemoteResult<RawKeypair> {
        (**self).fetch_keypair()
    }

    fn save_keypair(&self, keypair: &RawKeypair) -> RemoteResult<()> {
        (**self).save_keypair(keypair)
    }

    fn fetch_public_key(&self, user_id: Id) -> RemoteResult<PublicKeyPem> {
        (**self).fetch_public_key(user_id)
    }
}

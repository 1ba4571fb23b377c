//! Sharing secrets with another member.
//!
//! Shared values are decrypted with the sender's key and encrypted again for
//! the recipient's public key. User scoped secrets never leave their owner.

use tracing::{debug, trace};

use crate::core::api::Transport;
use crate::core::domain::{names_match, Member, Organization, Secret, Share};
use crate::core::keypair::{Decrypter, Encrypter, Keypair, PublicKey};
use crate::core::secrets::SecretsClient;
use crate::error::{ResolveError, Result, SyncError};

/// Re-encrypt every shared (non user scoped) secret for `target`.
///
/// Stops at the first secret that fails; no partial batch is returned.
///
/// # Errors
///
/// `ResolveError::Decrypt` naming the secret that could not be decrypted
/// with `source`, or a `CryptoError` if encryption for `target` fails.
pub fn share<D, E>(secrets: &[Secret], source: &D, target: &E) -> Result<Vec<Share>>
where
    D: Decrypter + ?Sized,
    E: Encrypter + ?Sized,
{
    let shared: Vec<Share> = secrets
        .iter()
        .filter(|s| !s.is_user)
        .map(|s| Share {
            name: s.name.clone(),
            value: s.value.clone(),
            project_id: s.project_id,
        })
        .collect();

    debug!(
        total = secrets.len(),
        shared = shared.len(),
        "sharing secrets"
    );
    reencrypt(&shared, source, target)
}

/// Re-encrypt `shares`, currently readable by `source`, for `target`.
pub fn reencrypt<D, E>(shares: &[Share], source: &D, target: &E) -> Result<Vec<Share>>
where
    D: Decrypter + ?Sized,
    E: Encrypter + ?Sized,
{
    shares
        .iter()
        .map(|share| -> Result<Share> {
            trace!(name = %share.name, "re-encrypting share");
            let plaintext = source
                .decode_and_decrypt(&share.value)
                .map_err(|e| ResolveError::Decrypt {
                    name: share.name.clone(),
                    source: e,
                })?;
            Ok(Share {
                name: share.name.clone(),
                value: target.encrypt_and_encode(&plaintext)?,
                project_id: share.project_id,
            })
        })
        .collect()
}

/// Shares the caller's secrets with one member of an organization.
pub struct Sharer<'a, T> {
    client: &'a SecretsClient<T>,
    keypair: &'a Keypair,
    organization: &'a Organization,
}

impl<'a, T: Transport> Sharer<'a, T> {
    pub fn new(
        client: &'a SecretsClient<T>,
        keypair: &'a Keypair,
        organization: &'a Organization,
    ) -> Self {
        Self {
            client,
            keypair,
            organization,
        }
    }

    /// Share everything shareable with `username`. Returns how many secrets
    /// were shared.
    ///
    /// # Errors
    ///
    /// `SyncError::MemberNotFound` if `username` is not in the organization;
    /// otherwise the first crypto or remote failure.
    pub fn run(&self, username: &str) -> Result<usize> {
        let member = self.find_member(username)?;
        debug!(member = %member.username, "sharing with member");

        let public_key = self.client.fetch_public_key(member.user_id)?;
        let public_key = PublicKey::parse(&public_key)?;

        let secrets = self.client.fetch_all(self.organization)?;
        let shares = share(&secrets, self.keypair, &public_key)?;

        self.client
            .save_shares(self.organization.id, member.user_id, &shares)?;

        debug!(member = %member.username, count = shares.len(), "shared");
        Ok(shares.len())
    }

    fn find_member(&self, username: &str) -> Result<Member> {
        let members = self
            .client
            .transport()
            .fetch_members(self.organization.id)
            .map_err(|e| e.context("fetch members"))?;

        members
            .into_iter()
            .find(|m| names_match(&m.username, username))
            .ok_or_else(|| SyncError::MemberNotFound(username.to_string()).into())
    }
}

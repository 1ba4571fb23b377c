//! Diff driven synchronization.
//!
//! Walks every member of an organization except the caller, one at a time,
//! and re-encrypts whatever the service reports as missing for them.

use tracing::{debug, info, warn};

use crate::core::api::Transport;
use crate::core::domain::{Member, Organization, SyncResult};
use crate::core::keypair::{Keypair, PublicKey};
use crate::core::secrets::SecretsClient;
use crate::core::share;
use crate::error::{Error, RemoteError, Result, SyncError};

/// Brings every member's shares up to date.
pub struct Synchronizer<'a, T> {
    client: &'a SecretsClient<T>,
    keypair: &'a Keypair,
    organization: &'a Organization,
}

enum Outcome {
    Updated(usize),
    Skipped,
}

impl<'a, T: Transport> Synchronizer<'a, T> {
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

    /// Synchronize all members.
    ///
    /// A member without a diff is skipped. `Unauthorized` stops the run at
    /// once with `SyncError::Aborted`; any other failure stops it with
    /// `SyncError::Member`. Both carry the member and the number of members
    /// already updated.
    pub fn run(&self) -> Result<SyncResult> {
        let me = self.client.authenticated_user_id()?;
        let members = self
            .client
            .transport()
            .fetch_members(self.organization.id)
            .map_err(|e| e.context("fetch members"))?;

        let mut result = SyncResult::default();
        for member in members.iter().filter(|m| m.user_id != me) {
            match self.sync_member(member) {
                Ok(Outcome::Updated(count)) => {
                    debug!(member = %member.username, shares = count, "member updated");
                    result.updated += 1;
                }
                Ok(Outcome::Skipped) => {
                    debug!(member = %member.username, "nothing to update");
                    result.skipped += 1;
                }
                Err(source) => {
                    warn!(member = %member.username, updated = result.updated, "synchronization stopped");
                    return Err(stopped(member, result.updated, source).into());
                }
            }
        }

        info!(
            organization = %self.organization.url_name,
            updated = result.updated,
            skipped = result.skipped,
            "synchronization finished"
        );
        Ok(result)
    }

    fn sync_member(&self, member: &Member) -> Result<Outcome> {
        let diff = match self
            .client
            .fetch_diff(self.organization.id, member.user_id)?
        {
            Some(diff) => diff,
            None => return Ok(Outcome::Skipped),
        };

        let public_key = PublicKey::parse(&diff.public_key)?;
        let shares = share::reencrypt(&diff.shares, self.keypair, &public_key)?;

        self.client
            .save_shares(self.organization.id, member.user_id, &shares)?;
        Ok(Outcome::Updated(shares.len()))
    }
}

fn stopped(member: &Member, updated: usize, source: Error) -> SyncError {
    match source {
        Error::Remote(RemoteError::Unauthorized) => SyncError::Aborted {
            member: member.username.clone(),
            updated,
            source: RemoteError::Unauthorized,
        },
        other => SyncError::Member {
            member: member.username.clone(),
            updated,
            source: Box::new(other),
        },
    }
}

//! In-memory secrets service shared by several users.
//!
//! Each user sees the service through a [`UserTransport`]. Secrets are stored
//! per user, so a value only becomes readable by someone else once it has
//! been shared with them. Diffs are computed from what the caller has and the
//! target lacks, unless a scripted response is queued.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet, VecDeque};

use cloakroom::core::api::{RemoteResult, Transport};
use cloakroom::core::domain::{
    DefinitionScope, Member, Organization, Project, RawKeypair, Secret, SecretChange,
    SecretDefinition, SecretDiff, Share,
};
use cloakroom::core::keypair::Keypair;
use cloakroom::core::types::{Id, PublicKeyPem};
use cloakroom::error::RemoteError;
use uuid::Uuid;

pub struct MemoryService {
    pub organization: Organization,
    pub project: Project,
    state: RefCell<State>,
}

#[derive(Default)]
struct State {
    members: Vec<Member>,
    public_keys: HashMap<Id, PublicKeyPem>,
    keypairs: HashMap<Id, RawKeypair>,
    secrets: HashMap<Id, Vec<Secret>>,
    definitions: Vec<SecretDefinition>,
    diffs: VecDeque<RemoteResult<SecretDiff>>,
    revoked: HashSet<Id>,
    calls: Vec<&'static str>,
}

impl MemoryService {
    pub fn new() -> Self {
        let organization = Organization {
            id: Uuid::new_v4(),
            url_name: "acme".to_string(),
        };
        let project = Project {
            id: Uuid::new_v4(),
            organization_id: organization.id,
            name: "api".to_string(),
        };
        Self {
            organization,
            project,
            state: RefCell::default(),
        }
    }

    /// Add a member, publishing `keypair`'s public key when given.
    pub fn add_user(&self, username: &str, keypair: Option<&Keypair>) -> Id {
        let user_id = Uuid::new_v4();
        let mut state = self.state.borrow_mut();
        state.members.push(Member {
            user_id,
            username: username.to_string(),
        });
        if let Some(keypair) = keypair {
            let pem = keypair.encode_public_key().expect("encode public key");
            state.public_keys.insert(user_id, pem);
        }
        user_id
    }

    /// The service as seen by `user_id`.
    pub fn as_user(&self, user_id: Id) -> UserTransport<'_> {
        UserTransport {
            service: self,
            user_id,
        }
    }

    /// Declare a secret on the project.
    pub fn define(&self, name: &str, scope: DefinitionScope) {
        self.state.borrow_mut().definitions.push(SecretDefinition {
            name: name.to_string(),
            scope,
            description: None,
        });
    }

    /// Queue a scripted `fetch_diff` response.
    pub fn push_diff(&self, diff: RemoteResult<SecretDiff>) {
        self.state.borrow_mut().diffs.push_back(diff);
    }

    /// Make every call by `user_id` fail with `Unauthorized`.
    pub fn revoke(&self, user_id: Id) {
        self.state.borrow_mut().revoked.insert(user_id);
    }

    /// Secrets stored for `user_id`.
    pub fn secrets_of(&self, user_id: Id) -> Vec<Secret> {
        self.state
            .borrow()
            .secrets
            .get(&user_id)
            .cloned()
            .unwrap_or_default()
    }

    /// Store a ciphertext for `user_id` directly.
    pub fn insert_secret(
        &self,
        user_id: Id,
        name: &str,
        value: &str,
        project_id: Option<Id>,
        is_user: bool,
    ) {
        self.state
            .borrow_mut()
            .secrets
            .entry(user_id)
            .or_default()
            .push(Secret {
                secret_id: Uuid::new_v4(),
                name: name.to_string(),
                value: value.to_string(),
                project_id,
                is_user,
            });
    }

    /// How often `call` was made, by anyone.
    pub fn count(&self, call: &str) -> usize {
        self.state
            .borrow()
            .calls
            .iter()
            .filter(|c| **c == call)
            .count()
    }
}

/// One user's view of a [`MemoryService`].
pub struct UserTransport<'a> {
    service: &'a MemoryService,
    user_id: Id,
}

impl UserTransport<'_> {
    fn enter(&self, call: &'static str) -> RemoteResult<()> {
        let mut state = self.service.state.borrow_mut();
        state.calls.push(call);
        if state.revoked.contains(&self.user_id) {
            Err(RemoteError::Unauthorized)
        } else {
            Ok(())
        }
    }

    fn computed_diff(&self, target: Id) -> RemoteResult<SecretDiff> {
        let state = self.service.state.borrow();
        let theirs = state.secrets.get(&target).cloned().unwrap_or_default();
        let missing: Vec<Share> = state
            .secrets
            .get(&self.user_id)
            .into_iter()
            .flatten()
            .filter(|s| !s.is_user)
            .filter(|s| {
                !theirs.iter().any(|t| {
                    !t.is_user && t.project_id == s.project_id && t.matches_name(&s.name)
                })
            })
            .map(|s| Share {
                name: s.name.clone(),
                value: s.value.clone(),
                project_id: s.project_id,
            })
            .collect();

        if missing.is_empty() {
            return Err(RemoteError::NotFound("diff".to_string()));
        }
        let public_key = state
            .public_keys
            .get(&target)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound("public key".to_string()))?;
        Ok(SecretDiff {
            public_key,
            shares: missing,
        })
    }
}

impl Transport for UserTransport<'_> {
    fn authenticated_user_id(&self) -> RemoteResult<Id> {
        self.enter("authenticated_user_id")?;
        Ok(self.user_id)
    }

    fn fetch_organization(&self, url_name: &str) -> RemoteResult<Organization> {
        self.enter("fetch_organization")?;
        if url_name == self.service.organization.url_name {
            Ok(self.service.organization.clone())
        } else {
            Err(RemoteError::NotFound(format!("organization {}", url_name)))
        }
    }

    fn fetch_project(&self, organization: &str, name: &str) -> RemoteResult<Project> {
        self.enter("fetch_project")?;
        if organization == self.service.organization.url_name && name == self.service.project.name
        {
            Ok(self.service.project.clone())
        } else {
            Err(RemoteError::NotFound(format!(
                "project {}/{}",
                organization, name
            )))
        }
    }

    fn fetch_members(&self, _organization_id: Id) -> RemoteResult<Vec<Member>> {
        self.enter("fetch_members")?;
        Ok(self.service.state.borrow().members.clone())
    }

    fn fetch_all_secrets(&self, _organization_id: Id) -> RemoteResult<Vec<Secret>> {
        self.enter("fetch_all_secrets")?;
        Ok(self.service.secrets_of(self.user_id))
    }

    fn fetch_secret_definitions(&self, _project_id: Id) -> RemoteResult<Vec<SecretDefinition>> {
        self.enter("fetch_secret_definitions")?;
        Ok(self.service.state.borrow().definitions.clone())
    }

    fn fetch_diff(&self, _organization_id: Id, user_id: Id) -> RemoteResult<SecretDiff> {
        self.enter("fetch_diff")?;
        let scripted = self.service.state.borrow_mut().diffs.pop_front();
        match scripted {
            Some(diff) => diff,
            None => self.computed_diff(user_id),
        }
    }

    fn save_secrets(&self, _organization_id: Id, changes: &[SecretChange]) -> RemoteResult<()> {
        self.enter("save_secrets")?;
        let mut state = self.service.state.borrow_mut();
        let mine = state.secrets.entry(self.user_id).or_default();

        for change in changes {
            let secret = Secret {
                secret_id: change.secret_id.unwrap_or_else(Uuid::new_v4),
                name: change.name.clone(),
                value: change.value.clone(),
                project_id: change.project_id,
                is_user: change.is_user,
            };
            match mine.iter_mut().find(|s| Some(s.secret_id) == change.secret_id) {
                Some(existing) => *existing = secret,
                None => mine.push(secret),
            }
        }
        Ok(())
    }

    fn save_shares(&self, _organization_id: Id, user_id: Id, shares: &[Share]) -> RemoteResult<()> {
        self.enter("save_shares")?;
        let mut state = self.service.state.borrow_mut();
        let theirs = state.secrets.entry(user_id).or_default();

        for share in shares {
            let existing = theirs.iter_mut().find(|s| {
                !s.is_user && s.project_id == share.project_id && s.matches_name(&share.name)
            });
            match existing {
                Some(secret) => secret.value = share.value.clone(),
                None => theirs.push(Secret {
                    secret_id: Uuid::new_v4(),
                    name: share.name.clone(),
                    value: share.value.clone(),
                    project_id: share.project_id,
                    is_user: false,
                }),
            }
        }
        Ok(())
    }

    fn fetch_keypair(&self) -> RemoteResult<RawKeypair> {
        self.enter("fetch_keypair")?;
        self.service
            .state
            .borrow()
            .keypairs
            .get(&self.user_id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound("keypair".to_string()))
    }

    fn save_keypair(&self, keypair: &RawKeypair) -> RemoteResult<()> {
        self.enter("save_keypair")?;
        let mut state = self.service.state.borrow_mut();
        state
            .public_keys
            .insert(self.user_id, keypair.public_key.clone());
        state.keypairs.insert(self.user_id, keypair.clone());
        Ok(())
    }

    fn fetch_public_key(&self, user_id: Id) -> RemoteResult<PublicKeyPem> {
        self.enter("fetch_public_key")?;
        self.service
            .state
            .borrow()
            .public_keys
            .get(&user_id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("public key for {}", user_id)))
    }
}

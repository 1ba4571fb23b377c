//! In-memory transport for unit tests.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};

use uuid::Uuid;

use crate::core::api::{RemoteResult, Transport};
use crate::core::domain::{
    Member, Organization, Project, RawKeypair, Secret, SecretChange, SecretDefinition, SecretDiff,
    Share,
};
use crate::core::types::{Id, PublicKeyPem};
use crate::error::RemoteError;

pub(crate) struct FakeTransport {
    pub user_id: Id,
    pub organization: Organization,
    pub project: Project,
    pub members: RefCell<Vec<Member>>,
    pub definitions: RefCell<Vec<SecretDefinition>>,
    pub public_keys: RefCell<HashMap<Id, PublicKeyPem>>,
    pub keypair: RefCell<Option<RawKeypair>>,
    secrets: RefCell<Vec<Secret>>,
    diffs: RefCell<VecDeque<RemoteResult<SecretDiff>>>,
    changes: RefCell<Vec<SecretChange>>,
    shares: RefCell<Vec<(Id, Vec<Share>)>>,
    save_error: RefCell<Option<RemoteError>>,
    calls: RefCell<Vec<&'static str>>,
}

impl FakeTransport {
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
            user_id: Uuid::new_v4(),
            organization,
            project,
            members: RefCell::default(),
            definitions: RefCell::default(),
            public_keys: RefCell::default(),
            keypair: RefCell::default(),
            secrets: RefCell::default(),
            diffs: RefCell::default(),
            changes: RefCell::default(),
            shares: RefCell::default(),
            save_error: RefCell::default(),
            calls: RefCell::default(),
        }
    }

    /// Add a secret holding `value` verbatim. Returns its id.
    pub fn add_secret(&self, name: &str, value: &str, project_id: Option<Id>, is_user: bool) -> Id {
        let secret_id = Uuid::new_v4();
        self.secrets.borrow_mut().push(Secret {
            secret_id,
            name: name.to_string(),
            value: value.to_string(),
            project_id,
            is_user,
        });
        secret_id
    }

    pub fn push_diff(&self, diff: RemoteResult<SecretDiff>) {
        self.diffs.borrow_mut().push_back(diff);
    }

    pub fn fail_saves_with(&self, error: RemoteError) {
        *self.save_error.borrow_mut() = Some(error);
    }

    pub fn saved_changes(&self) -> Vec<SecretChange> {
        self.changes.borrow().clone()
    }

    pub fn saved_shares(&self) -> Vec<(Id, Vec<Share>)> {
        self.shares.borrow().clone()
    }

    /// How often `call` was made.
    pub fn count(&self, call: &str) -> usize {
        self.calls.borrow().iter().filter(|c| **c == call).count()
    }

    fn record(&self, call: &'static str) {
        self.calls.borrow_mut().push(call);
    }

    fn save_result(&self) -> RemoteResult<()> {
        match self.save_error.borrow().clone() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Transport for FakeTransport {
    fn authenticated_user_id(&self) -> RemoteResult<Id> {
        self.record("authenticated_user_id");
        Ok(self.user_id)
    }

    fn fetch_organization(&self, url_name: &str) -> RemoteResult<Organization> {
        self.record("fetch_organization");
        if url_name == self.organization.url_name {
            Ok(self.organization.clone())
        } else {
            Err(RemoteError::NotFound(format!("organization {}", url_name)))
        }
    }

    fn fetch_project(&self, organization: &str, name: &str) -> RemoteResult<Project> {
        self.record("fetch_project");
        if organization == self.organization.url_name && name == self.project.name {
            Ok(self.project.clone())
        } else {
            Err(RemoteError::NotFound(format!("project {}/{}", organization, name)))
        }
    }

    fn fetch_members(&self, _organization_id: Id) -> RemoteResult<Vec<Member>> {
        self.record("fetch_members");
        Ok(self.members.borrow().clone())
    }

    fn fetch_all_secrets(&self, _organization_id: Id) -> RemoteResult<Vec<Secret>> {
        self.record("fetch_all_secrets");
        Ok(self.secrets.borrow().clone())
    }

    fn fetch_secret_definitions(&self, _project_id: Id) -> RemoteResult<Vec<SecretDefinition>> {
        self.record("fetch_secret_definitions");
        Ok(self.definitions.borrow().clone())
    }

    fn fetch_diff(&self, _organization_id: Id, _user_id: Id) -> RemoteResult<SecretDiff> {
        self.record("fetch_diff");
        self.diffs
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Err(RemoteError::NotFound("diff".to_string())))
    }

    fn save_secrets(&self, _organization_id: Id, changes: &[SecretChange]) -> RemoteResult<()> {
        self.record("save_secrets");
        self.save_result()?;
        self.changes.borrow_mut().extend_from_slice(changes);
        Ok(())
    }

    fn save_shares(&self, _organization_id: Id, user_id: Id, shares: &[Share]) -> RemoteResult<()> {
        self.record("save_shares");
        self.save_result()?;
        self.shares.borrow_mut().push((user_id, shares.to_vec()));
        Ok(())
    }

    fn fetch_keypair(&self) -> RemoteResult<RawKeypair> {
        self.record("fetch_keypair");
        self.keypair
            .borrow()
            .clone()
            .ok_or_else(|| RemoteError::NotFound("keypair".to_string()))
    }

    fn save_keypair(&self, keypair: &RawKeypair) -> RemoteResult<()> {
        self.record("save_keypair");
        self.save_result()?;
        *self.keypair.borrow_mut() = Some(keypair.clone());
        Ok(())
    }

    fn fetch_public_key(&self, user_id: Id) -> RemoteResult<PublicKeyPem> {
        self.record("fetch_public_key");
        self.public_keys
            .borrow()
            .get(&user_id)
            .cloned()
            .ok_or_else(|| RemoteError::NotFound(format!("public key for {}", user_id)))
    }
}

//! Secret expander.
//!
//! The read path: turn a [`SecretRequest`] into a plaintext. Platform lookups
//! are memoized in a [`Session`] and plaintexts in an in-memory cache, both
//! owned by one [`Expander`] and dropped with it.

use std::collections::HashMap;

use tracing::debug;
use zeroize::Zeroizing;

use crate::core::api::Transport;
use crate::core::domain::{
    names_match, Organization, Project, ProjectRef, Secret, SecretDefinition, SecretExport,
    SecretRequest,
};
use crate::core::keypair::{Decrypter, Keypair};
use crate::core::resolve;
use crate::core::secrets::SecretsClient;
use crate::error::{CryptoError, ResolveError, Result};

/// Lookups shared by every resolution in one session.
///
/// Each value is fetched on first use and kept until [`Session::clear`].
#[derive(Debug, Default)]
pub struct Session {
    organization: Option<Organization>,
    project: Option<Project>,
    secrets: Option<Vec<Secret>>,
    definitions: Option<Vec<SecretDefinition>>,
}

impl Session {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forget everything fetched so far.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    pub fn organization<T: Transport>(
        &mut self,
        client: &SecretsClient<T>,
        project: &ProjectRef,
    ) -> Result<&Organization> {
        let organization = match self.organization.take() {
            Some(org) => org,
            None => {
                debug!(organization = %project.owner, "fetching organization");
                client
                    .transport()
                    .fetch_organization(&project.owner)
                    .map_err(|e| e.context("fetch organization"))?
            }
        };
        Ok(self.organization.insert(organization))
    }

    pub fn project<T: Transport>(
        &mut self,
        client: &SecretsClient<T>,
        project: &ProjectRef,
    ) -> Result<&Project> {
        let fetched = match self.project.take() {
            Some(p) => p,
            None => {
                debug!(project = %project, "fetching project");
                client
                    .transport()
                    .fetch_project(&project.owner, &project.name)
                    .map_err(|e| e.context("fetch project"))?
            }
        };
        Ok(self.project.insert(fetched))
    }

    /// Every secret visible in the project's organization.
    pub fn secrets<T: Transport>(
        &mut self,
        client: &SecretsClient<T>,
        project: &ProjectRef,
    ) -> Result<&[Secret]> {
        let secrets = match self.secrets.take() {
            Some(s) => s,
            None => {
                let organization = self.organization(client, project)?;
                client.fetch_all(organization)?
            }
        };
        Ok(self.secrets.insert(secrets))
    }

    pub fn definitions<T: Transport>(
        &mut self,
        client: &SecretsClient<T>,
        project: &ProjectRef,
    ) -> Result<&[SecretDefinition]> {
        let definitions = match self.definitions.take() {
            Some(d) => d,
            None => {
                let project = self.project(client, project)?;
                client.fetch_definitions(project)?
            }
        };
        Ok(self.definitions.insert(definitions))
    }
}

/// Resolves and decrypts secrets for one project.
pub struct Expander<T> {
    client: SecretsClient<T>,
    project: Option<ProjectRef>,
    keypair: Option<Keypair>,
    session: Session,
    plaintexts: HashMap<SecretRequest, Zeroizing<String>>,
}

impl<T: Transport> Expander<T> {
    pub fn new(client: SecretsClient<T>) -> Self {
        Self {
            client,
            project: None,
            keypair: None,
            session: Session::new(),
            plaintexts: HashMap::new(),
        }
    }

    /// Project whose secrets are resolved.
    pub fn with_project(mut self, project: ProjectRef) -> Self {
        self.project = Some(project);
        self
    }

    /// Key used to decrypt values.
    pub fn with_keypair(mut self, keypair: Keypair) -> Self {
        self.keypair = Some(keypair);
        self
    }

    pub fn client(&self) -> &SecretsClient<T> {
        &self.client
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Resolve `request` and decrypt the winning value.
    ///
    /// Repeated requests are answered from memory without another fetch or
    /// decryption.
    ///
    /// # Errors
    ///
    /// - `ResolveError::NoKeypairLoaded` without a keypair
    /// - `ResolveError::NoProject` without a project
    /// - `ResolveError::SecretNotFound` when no candidate matches
    /// - `ResolveError::Decrypt` when the value does not decrypt, keeping the
    ///   base64 and ciphertext cases apart
    pub fn resolve(&mut self, request: &SecretRequest) -> Result<Zeroizing<String>> {
        let keypair = self.keypair.as_ref().ok_or(ResolveError::NoKeypairLoaded)?;

        let key = cache_key(request);
        if let Some(cached) = self.plaintexts.get(&key) {
            debug!(name = %request.name, "using cached plaintext");
            return Ok(cached.clone());
        }

        let project = self.project.as_ref().ok_or(ResolveError::NoProject)?;
        let project_id = self.session.project(&self.client, project)?.id;
        let secrets = self.session.secrets(&self.client, project)?;

        let secret = resolve::resolve(secrets, Some(project_id), request)
            .ok_or_else(|| ResolveError::SecretNotFound(request.name.clone()))?;
        debug!(name = %secret.name, scope = %secret.scope(), "resolved secret");

        let plaintext = decrypt(keypair, secret)?;
        self.plaintexts.insert(key, plaintext.clone());
        Ok(plaintext)
    }

    /// Resolve a secret the project declares by name.
    ///
    /// # Errors
    ///
    /// Returns `ResolveError::SecretUndefined` when no definition carries
    /// `name`, otherwise as [`Expander::resolve`].
    pub fn resolve_defined(&mut self, name: &str) -> Result<Zeroizing<String>> {
        let request = self.definition(name)?.request();
        self.resolve(&request)
    }

    /// The project's definition for `name`.
    pub fn definition(&mut self, name: &str) -> Result<SecretDefinition> {
        let project = self.project.as_ref().ok_or(ResolveError::NoProject)?;
        let definitions = self.session.definitions(&self.client, project)?;

        definitions
            .iter()
            .find(|d| names_match(&d.name, name))
            .cloned()
            .ok_or_else(|| ResolveError::SecretUndefined(name.to_string()).into())
    }

    /// Every definition of the project and whether a value resolves for it.
    /// Nothing is decrypted.
    pub fn export_definitions(&mut self) -> Result<Vec<SecretExport>> {
        let project = self.project.as_ref().ok_or(ResolveError::NoProject)?;
        let project_id = self.session.project(&self.client, project)?.id;
        let definitions = self.session.definitions(&self.client, project)?.to_vec();
        let secrets = self.session.secrets(&self.client, project)?;

        Ok(definitions
            .into_iter()
            .map(|d| {
                let has_value = resolve::resolve(secrets, Some(project_id), &d.request()).is_some();
                SecretExport {
                    name: d.name,
                    scope: d.scope,
                    description: d.description,
                    has_value,
                }
            })
            .collect())
    }

    /// Drop cached plaintexts and session lookups.
    pub fn clear(&mut self) {
        self.plaintexts.clear();
        self.session.clear();
    }
}

fn cache_key(request: &SecretRequest) -> SecretRequest {
    SecretRequest {
        name: request.name.to_lowercase(),
        ..request.clone()
    }
}

fn decrypt(keypair: &Keypair, secret: &Secret) -> Result<Zeroizing<String>> {
    let wrap = |source| ResolveError::Decrypt {
        name: secret.name.clone(),
        source,
    };

    let bytes = keypair.decode_and_decrypt(&secret.value).map_err(wrap)?;
    let text = String::from_utf8(bytes.to_vec()).map_err(|e| {
        wrap(CryptoError::DecryptionFailed(format!(
            "plaintext is not valid UTF-8: {}",
            e.utf8_error()
        )))
    })?;
    Ok(Zeroizing::new(text))
}

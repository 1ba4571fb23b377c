//! Private key file on disk.
//!
//! The key lives at `<dir>/<name>.key` as an unencrypted PKCS#1 PEM, so the
//! file mode is the only thing guarding it: it is written `0600` and loading
//! refuses anything readable or writable by group or others.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::Keypair;
use crate::core::constants::KEY_FILE_EXTENSION;
use crate::core::settings::{KeypairSettings, Settings};
use crate::error::{Result, StoreError};

/// Bits that must be clear on the key file.
#[cfg(unix)]
const FORBIDDEN_MODE_BITS: u32 = 0o177;

/// The local private key file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LocalKeyStore {
    dir: PathBuf,
    name: String,
}

impl LocalKeyStore {
    pub fn new(dir: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            dir: dir.into(),
            name: name.into(),
        }
    }

    /// Store located by the `keypair.dir` and `keypair.name` settings.
    pub fn from_settings(settings: &dyn Settings) -> Result<Self> {
        let keypair = KeypairSettings::from_settings(settings)?;
        Ok(Self::new(keypair.dir, keypair.name))
    }

    /// Key file path.
    pub fn path(&self) -> PathBuf {
        self.dir
            .join(format!("{}.{}", self.name, KEY_FILE_EXTENSION))
    }

    pub fn exists(&self) -> bool {
        self.path().is_file()
    }

    /// Load the private key.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if there is no key file
    /// - `StoreError::TooPermissive` if the mode allows anything beyond
    ///   owner read/write
    /// - `CryptoError` if the file is not a usable private key
    pub fn load(&self) -> Result<Keypair> {
        let path = self.path();
        debug!(path = %path.display(), "loading private key");

        let metadata = match fs::metadata(&path) {
            Ok(m) => m,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StoreError::NotFound(path).into())
            }
            Err(source) => return Err(StoreError::Io { path, source }.into()),
        };

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;

            let mode = metadata.permissions().mode() & 0o777;
            if mode & FORBIDDEN_MODE_BITS != 0 {
                warn!(path = %path.display(), mode = %format!("{:o}", mode), "insecure key file permissions");
                return Err(StoreError::TooPermissive { path, mode }.into());
            }
        }
        #[cfg(not(unix))]
        let _ = metadata;

        let contents = fs::read_to_string(&path)
            .map(zeroize::Zeroizing::new)
            .map_err(|source| StoreError::Io {
                path: path.clone(),
                source,
            })?;

        let keypair = Keypair::parse(&contents)?;
        debug!(bits = keypair.bits(), "private key loaded");
        Ok(keypair)
    }

    /// Write `keypair` as an unencrypted PEM with mode `0600`, replacing any
    /// existing file.
    pub fn save(&self, keypair: &Keypair) -> Result<PathBuf> {
        let path = self.path();
        debug!(path = %path.display(), "saving private key");

        let io_err = |source| StoreError::Io {
            path: path.clone(),
            source,
        };

        fs::create_dir_all(&self.dir).map_err(|source| StoreError::Io {
            path: self.dir.clone(),
            source,
        })?;

        let pem = keypair.encode_private_key()?;

        let mut options = fs::OpenOptions::new();
        options.write(true).create(true).truncate(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            options.mode(0o600);
        }

        let mut file = options.open(&path).map_err(io_err)?;

        // An existing file keeps its old mode through open(); tighten it
        // before any key material lands in it.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            file.set_permissions(fs::Permissions::from_mode(0o600))
                .map_err(io_err)?;
        }

        file.write_all(pem.as_bytes()).map_err(io_err)?;

        debug!(path = %path.display(), "private key saved");
        Ok(path)
    }

    /// Remove the key file. Returns whether one existed.
    pub fn delete(&self) -> Result<bool> {
        let path = self.path();
        match fs::remove_file(&path) {
            Ok(()) => {
                debug!(path = %path.display(), "private key removed");
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(source) => Err(StoreError::Io { path, source }.into()),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

//! Error types.
//!
//! Each concern owns a small `thiserror` enum; all of them convert into the
//! top-level [`Error`] so call sites can use `?` freely.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error.
#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("prompt failed: {0}")]
    Prompt(#[from] dialoguer::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the failure stems from something the user can fix (bad input,
    /// wrong passphrase, missing login, loose file permissions) rather than an
    /// unexpected fault.
    pub fn is_user_error(&self) -> bool {
        match self {
            Error::Crypto(e) => matches!(
                e,
                CryptoError::PassphraseIncorrect
                    | CryptoError::EmptyPassphrase
                    | CryptoError::BitLengthTooShort { .. }
                    | CryptoError::MessageTooLong { .. }
            ),
            Error::Resolve(e) => !matches!(e, ResolveError::Decrypt { .. }),
            Error::Store(e) => matches!(
                e,
                StoreError::NotFound(_)
                    | StoreError::TooPermissive { .. }
                    | StoreError::AlreadyExists(_)
            ),
            Error::Remote(e) => matches!(e, RemoteError::Unauthorized),
            Error::Sync(SyncError::Aborted { .. }) => true,
            Error::Sync(_) => false,
            Error::Config(e) => matches!(e, ConfigError::InvalidValue { .. }),
            Error::Prompt(_) | Error::Io(_) => false,
        }
    }
}

/// Keypair generation, PEM handling and RSA-OAEP failures.
#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("bit length {bits} is too short, minimum is {minimum}")]
    BitLengthTooShort { bits: usize, minimum: usize },

    #[error("key generation failed: {0}")]
    Generate(String),

    #[error("invalid PEM: {0}")]
    Pem(String),

    #[error("passphrase is incorrect")]
    PassphraseIncorrect,

    #[error("a passphrase is required to encrypt the private key")]
    EmptyPassphrase,

    #[error("invalid RSA public key: {0}")]
    InvalidPublicKey(String),

    #[error("key encoding failed: {0}")]
    Encode(String),

    #[error("message of {len} bytes is too long, key allows at most {max}")]
    MessageTooLong { len: usize, max: usize },

    #[error("encryption failed: {0}")]
    EncryptionFailed(String),

    #[error("decryption failed: {0}")]
    DecryptionFailed(String),

    #[error("base64 decoding failed: {0}")]
    Base64(#[from] base64::DecodeError),
}

/// Read-path failures while turning a secret name into a plaintext.
#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("no keypair loaded")]
    NoKeypairLoaded,

    #[error("no project defined")]
    NoProject,

    #[error("secret not found: {0}")]
    SecretNotFound(String),

    #[error("secret is not defined by the project: {0}")]
    SecretUndefined(String),

    #[error("could not decrypt secret {name}: {source}")]
    Decrypt {
        name: String,
        #[source]
        source: CryptoError,
    },

    #[error("unknown expander category: {0}")]
    UnknownCategory(String),

    #[error("invalid secret reference: {0}")]
    InvalidReference(String),
}

impl ResolveError {
    /// Whether a decrypt failure was caused by a malformed base64 envelope
    /// rather than by the ciphertext itself.
    pub fn is_bad_encoding(&self) -> bool {
        matches!(
            self,
            ResolveError::Decrypt {
                source: CryptoError::Base64(_),
                ..
            }
        )
    }
}

/// Local private key file failures.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("no private key found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("private key file {} is too permissive (mode {mode:o})", .path.display())]
    TooPermissive { path: PathBuf, mode: u32 },

    #[error("could not access {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("a private key already exists at {}", .0.display())]
    AlreadyExists(PathBuf),

    #[error("unable to determine config directory")]
    NoConfigDir,
}

/// Failures reported by the remote secrets service.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("not authenticated")]
    Unauthorized,

    #[error("not found: {0}")]
    NotFound(String),

    #[error("{operation} was rejected: {reason}")]
    SaveFailed { operation: String, reason: String },

    #[error("{operation} failed{}: {reason}", .status.map(|s| format!(" (status {s})")).unwrap_or_default())]
    Unknown {
        operation: String,
        status: Option<u16>,
        reason: String,
    },
}

impl RemoteError {
    /// Attach an operation name to an otherwise anonymous failure.
    pub fn context(self, operation: impl Into<String>) -> Self {
        match self {
            RemoteError::Unknown { status, reason, .. } => RemoteError::Unknown {
                operation: operation.into(),
                status,
                reason,
            },
            RemoteError::SaveFailed { reason, .. } => RemoteError::SaveFailed {
                operation: operation.into(),
                reason,
            },
            other => other,
        }
    }
}

/// Failures that stop a synchronization run part way through.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("synchronization aborted at member {member} after {updated} updated: {source}")]
    Aborted {
        member: String,
        updated: usize,
        #[source]
        source: RemoteError,
    },

    #[error("synchronizing member {member} failed after {updated} updated: {source}")]
    Member {
        member: String,
        updated: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("member not found: {0}")]
    MemberNotFound(String),
}

impl SyncError {
    /// Number of members updated before the run stopped.
    pub fn updated(&self) -> usize {
        match self {
            SyncError::Aborted { updated, .. } | SyncError::Member { updated, .. } => *updated,
            SyncError::MemberNotFound(_) => 0,
        }
    }
}

/// Settings file failures.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("could not read settings: {0}")]
    Read(#[source] std::io::Error),

    #[error("could not write settings: {0}")]
    Write(#[source] std::io::Error),

    #[error("invalid settings file: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("could not serialize settings: {0}")]
    Serialize(#[from] toml::ser::Error),

    #[error("invalid value for {key}: {reason}")]
    InvalidValue { key: String, reason: String },
}

pub type Result<T> = std::result::Result<T, Error>;

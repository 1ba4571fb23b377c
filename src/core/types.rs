//! Type aliases for domain concepts.
//!
//! Provides semantic type aliases to make function signatures more descriptive.

/// A secret name. Matched case-insensitively during resolution.
pub type SecretName = String;

/// A base64 encoded RSA-OAEP ciphertext.
pub type EncryptedValue = String;

/// A PEM encoded public key.
pub type PublicKeyPem = String;

/// A PEM encoded private key, possibly passphrase encrypted.
pub type PrivateKeyPem = String;

/// Stable identifier of an organization, project, user or secret.
pub type Id = uuid::Uuid;

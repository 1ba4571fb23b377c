//! Shares and diffs.

use serde::{Deserialize, Serialize};

use crate::core::types::{EncryptedValue, Id, PublicKeyPem, SecretName};

/// A secret re-encrypted for another member.
///
/// User scoped secrets are never shared, so there is no `is_user` flag.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Share {
    pub name: SecretName,
    pub value: EncryptedValue,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project_id: Option<Id>,
}

/// What a member is missing: their public key plus the shares, still
/// encrypted for the caller, that need re-encrypting for them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SecretDiff {
    pub public_key: PublicKeyPem,
    #[serde(default)]
    pub shares: Vec<Share>,
}

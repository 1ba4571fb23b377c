use serde::{Deserialize, Serialize};

use crate::core::types::{PrivateKeyPem, PublicKeyPem};

/// A keypair as the service stores it. The private key is always passphrase
/// encrypted before upload.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawKeypair {
    pub encrypted_private_key: PrivateKeyPem,
    pub public_key: PublicKeyPem,
}

impl std::fmt::Debug for RawKeypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RawKeypair")
            .field("public_key", &self.public_key)
            .finish_non_exhaustive()
    }
}

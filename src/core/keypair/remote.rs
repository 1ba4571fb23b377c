//! Keypair copy held by the secrets service.
//!
//! The service stores the public key in the clear and the private key
//! encrypted under the user's passphrase. A copy of the private key is kept
//! in the [`LocalKeyStore`] so day to day use needs no passphrase.

use tracing::{debug, info};

use super::{encode_keypair, EncodedKeypair, Keypair, LocalKeyStore, PublicKey};
use crate::core::api::Transport;
use crate::core::domain::RawKeypair;
use crate::core::types::Id;
use crate::error::{CryptoError, Error, RemoteError, Result, StoreError};

/// What [`ensure`] had to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ensured {
    /// The stored keypair opened with the passphrase.
    Existing,
    /// The local private key matched and was re-encrypted under the new
    /// passphrase.
    Reencrypted,
    /// No keypair existed; a new one was generated.
    Generated,
}

/// The stored keypair, unparsed.
pub fn fetch_raw<T: Transport>(transport: &T) -> Result<RawKeypair> {
    debug!("fetching keypair");
    Ok(transport
        .fetch_keypair()
        .map_err(|e| e.context("fetch keypair"))?)
}

/// The stored keypair, decrypted with `passphrase`.
pub fn fetch<T: Transport>(transport: &T, passphrase: &str) -> Result<Keypair> {
    let raw = fetch_raw(transport)?;
    Ok(Keypair::parse_encrypted(&raw.encrypted_private_key, passphrase)?)
}

/// Another user's public key.
pub fn fetch_public_key<T: Transport>(transport: &T, user_id: Id) -> Result<PublicKey> {
    let pem = transport
        .fetch_public_key(user_id)
        .map_err(|e| e.context("fetch public key"))?;
    Ok(PublicKey::parse(&pem)?)
}

/// Upload `encoded` and keep its private key in `store`.
pub fn save_encoded<T: Transport>(
    transport: &T,
    store: &LocalKeyStore,
    encoded: &EncodedKeypair,
) -> Result<()> {
    let raw = RawKeypair {
        encrypted_private_key: encoded.encoded_private_key.to_string(),
        public_key: encoded.encoded_public_key.clone(),
    };
    transport
        .save_keypair(&raw)
        .map_err(|e| e.context("save keypair"))?;
    store.save(&encoded.keypair)?;
    Ok(())
}

/// Generate a keypair, upload it encrypted under `passphrase` and save the
/// private key locally.
///
/// # Errors
///
/// Returns `CryptoError::EmptyPassphrase` for an empty passphrase; the
/// service never receives an unencrypted private key.
pub fn generate_and_save<T: Transport>(
    transport: &T,
    store: &LocalKeyStore,
    passphrase: &str,
    bits: usize,
) -> Result<EncodedKeypair> {
    if passphrase.is_empty() {
        return Err(CryptoError::EmptyPassphrase.into());
    }

    let encoded = encode_keypair(Keypair::generate(bits)?, passphrase)?;
    save_encoded(transport, store, &encoded)?;
    info!(bits, "keypair generated and saved");
    Ok(encoded)
}

/// Make sure the user has a keypair readable with `passphrase`, both remotely
/// and in `store`.
///
/// If the stored keypair does not open with `passphrase` but the local
/// private key matches its public key, the local key is re-encrypted under
/// `passphrase` and uploaded. Without a stored keypair a new one of `bits` is
/// generated.
///
/// # Errors
///
/// `CryptoError::PassphraseIncorrect` when neither the passphrase nor the
/// local key can recover the stored keypair.
pub fn ensure<T: Transport>(
    transport: &T,
    store: &LocalKeyStore,
    passphrase: &str,
    bits: usize,
) -> Result<Ensured> {
    let raw = match fetch_raw(transport) {
        Ok(raw) => raw,
        Err(Error::Remote(RemoteError::NotFound(_))) => {
            debug!("no stored keypair");
            generate_and_save(transport, store, passphrase, bits)?;
            return Ok(Ensured::Generated);
        }
        Err(e) => return Err(e),
    };

    match Keypair::parse_encrypted(&raw.encrypted_private_key, passphrase) {
        Ok(keypair) => {
            store.save(&keypair)?;
            Ok(Ensured::Existing)
        }
        Err(CryptoError::PassphraseIncorrect) => {
            debug!("passphrase does not open stored keypair, trying local key");
            let local = match store.load() {
                Ok(local) if local.match_public_key(&raw.public_key) => local,
                Ok(_) | Err(Error::Store(StoreError::NotFound(_))) => {
                    return Err(CryptoError::PassphraseIncorrect.into())
                }
                Err(e) => return Err(e),
            };

            if passphrase.is_empty() {
                return Err(CryptoError::EmptyPassphrase.into());
            }
            let encoded = encode_keypair(local, passphrase)?;
            save_encoded(transport, store, &encoded)?;
            info!("stored keypair re-encrypted with new passphrase");
            Ok(Ensured::Reencrypted)
        }
        Err(e) => Err(e.into()),
    }
}

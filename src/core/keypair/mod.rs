//! RSA keypairs.
//!
//! Every secret value is encrypted with RSA-OAEP using SHA-256 for both the
//! MGF1 mask and the label hash. PKCS#1 v1.5 padding is never used.
//!
//! ## Layout
//!
//! - `armor`: PEM blocks and RFC 1423 passphrase encryption
//! - `local`: the private key file on disk
//! - `remote`: the keypair copy held by the secrets service

pub mod armor;
pub mod local;
pub mod remote;

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::rngs::OsRng;
use rsa::pkcs1::{DecodeRsaPrivateKey, DecodeRsaPublicKey, EncodeRsaPrivateKey};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey, EncodePublicKey};
use rsa::traits::PublicKeyParts;
use rsa::{Oaep, RsaPrivateKey, RsaPublicKey};
use sha2::{Digest, Sha256};
use tracing::{debug, trace};
use zeroize::Zeroizing;

use crate::core::constants::MINIMUM_BIT_LENGTH;
use crate::core::types::PublicKeyPem;
use crate::error::CryptoError;

use armor::Block;

pub use local::LocalKeyStore;

/// PEM label of a PKCS#1 private key.
pub const PRIVATE_KEY_LABEL: &str = "RSA PRIVATE KEY";

/// PEM label the secrets service expects around SPKI public keys.
pub const PUBLIC_KEY_LABEL: &str = "RSA PUBLIC KEY";

/// OAEP overhead with SHA-256: two digests plus two bytes.
const OAEP_SHA256_OVERHEAD: usize = 2 * 32 + 2;

type CryptoResult<T> = std::result::Result<T, CryptoError>;

/// Something that can encrypt a message for a key holder.
pub trait Encrypter {
    /// Encrypt `msg` with RSA-OAEP (SHA-256).
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::MessageTooLong` if `msg` exceeds what the key
    /// size allows.
    fn encrypt(&self, msg: &[u8]) -> CryptoResult<Vec<u8>>;

    /// Encrypt then base64 encode (standard alphabet, padded).
    fn encrypt_and_encode(&self, msg: &[u8]) -> CryptoResult<String> {
        Ok(STANDARD.encode(self.encrypt(msg)?))
    }
}

/// Something that can decrypt ciphertext addressed to it.
pub trait Decrypter {
    /// Decrypt RSA-OAEP (SHA-256) ciphertext.
    fn decrypt(&self, ciphertext: &[u8]) -> CryptoResult<Zeroizing<Vec<u8>>>;

    /// Base64 decode then decrypt.
    ///
    /// # Errors
    ///
    /// `CryptoError::Base64` when the envelope is not valid base64,
    /// `CryptoError::DecryptionFailed` when the ciphertext is rejected.
    fn decode_and_decrypt(&self, value: &str) -> CryptoResult<Zeroizing<Vec<u8>>> {
        let ciphertext = STANDARD.decode(value.trim())?;
        self.decrypt(&ciphertext)
    }
}

/// An RSA public key.
#[derive(Clone)]
pub struct PublicKey {
    inner: RsaPublicKey,
}

impl PublicKey {
    /// Parse a PEM encoded public key.
    ///
    /// Accepts SPKI contents (what the service stores) and falls back to a
    /// bare PKCS#1 `RSAPublicKey`.
    pub fn parse(pem: &str) -> CryptoResult<Self> {
        let block = Block::decode(pem).map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        let inner = match RsaPublicKey::from_public_key_der(block.contents()) {
            Ok(key) => key,
            Err(spki_err) => RsaPublicKey::from_pkcs1_der(block.contents())
                .map_err(|_| CryptoError::InvalidPublicKey(spki_err.to_string()))?,
        };
        let key = Self { inner };
        check_bits(key.bits())?;
        Ok(key)
    }

    /// PEM encode as SPKI under the `RSA PUBLIC KEY` label.
    pub fn encode(&self) -> CryptoResult<PublicKeyPem> {
        let der = self
            .inner
            .to_public_key_der()
            .map_err(|e| CryptoError::Encode(e.to_string()))?;
        Ok(Block::new(PUBLIC_KEY_LABEL, der.as_bytes().to_vec()).encode())
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.inner.size() * 8
    }

    /// Largest plaintext, in bytes, that fits one OAEP block.
    pub fn max_message_len(&self) -> usize {
        self.inner.size().saturating_sub(OAEP_SHA256_OVERHEAD)
    }

    /// SHA-256 of the SPKI encoding, hex encoded.
    pub fn fingerprint(&self) -> CryptoResult<String> {
        let der = self
            .inner
            .to_public_key_der()
            .map_err(|e| CryptoError::Encode(e.to_string()))?;
        Ok(hex::encode(Sha256::digest(der.as_bytes())))
    }
}

impl PartialEq for PublicKey {
    fn eq(&self, other: &Self) -> bool {
        self.inner.n() == other.inner.n() && self.inner.e() == other.inner.e()
    }
}

impl Eq for PublicKey {}

impl std::fmt::Debug for PublicKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PublicKey")
            .field("bits", &self.bits())
            .finish()
    }
}

impl Encrypter for PublicKey {
    fn encrypt(&self, msg: &[u8]) -> CryptoResult<Vec<u8>> {
        let max = self.max_message_len();
        if msg.len() > max {
            return Err(CryptoError::MessageTooLong {
                len: msg.len(),
                max,
            });
        }

        trace!(plaintext_len = msg.len(), "encrypting");

        let ciphertext = self
            .inner
            .encrypt(&mut OsRng, Oaep::new::<Sha256>(), msg)
            .map_err(|e| match e {
                rsa::Error::MessageTooLong => CryptoError::MessageTooLong {
                    len: msg.len(),
                    max,
                },
                other => CryptoError::EncryptionFailed(other.to_string()),
            })?;

        trace!(ciphertext_len = ciphertext.len(), "encrypted");
        Ok(ciphertext)
    }
}

/// An RSA private key together with its public half.
#[derive(Clone)]
pub struct Keypair {
    inner: RsaPrivateKey,
    public: PublicKey,
}

impl Keypair {
    /// Generate a fresh keypair.
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::BitLengthTooShort` when `bits` is below
    /// [`MINIMUM_BIT_LENGTH`].
    pub fn generate(bits: usize) -> CryptoResult<Self> {
        check_bits(bits)?;

        debug!(bits, "generating RSA keypair");
        let inner = RsaPrivateKey::new(&mut OsRng, bits)
            .map_err(|e| CryptoError::Generate(e.to_string()))?;

        Ok(Self::from_private(inner))
    }

    /// Parse an unencrypted PEM private key.
    ///
    /// An encrypted block is attempted with the empty passphrase, which
    /// fails with `PassphraseIncorrect`.
    pub fn parse(pem: &str) -> CryptoResult<Self> {
        Self::parse_encrypted(pem, "")
    }

    /// Parse a PEM private key that may be passphrase encrypted.
    ///
    /// Unencrypted keys parse regardless of `passphrase`.
    ///
    /// # Errors
    ///
    /// `CryptoError::PassphraseIncorrect` when the block is encrypted and the
    /// passphrase does not open it; `CryptoError::Pem` for anything malformed;
    /// `CryptoError::BitLengthTooShort` below [`MINIMUM_BIT_LENGTH`].
    pub fn parse_encrypted(pem: &str, passphrase: &str) -> CryptoResult<Self> {
        let block = Block::decode(pem)?;
        let encrypted = block.is_encrypted();

        let der = if encrypted {
            block.decrypt(passphrase)?
        } else {
            Zeroizing::new(block.contents().to_vec())
        };

        let inner = match RsaPrivateKey::from_pkcs1_der(&der) {
            Ok(key) => key,
            Err(pkcs1_err) => match RsaPrivateKey::from_pkcs8_der(&der) {
                Ok(key) => key,
                // Valid padding over garbage still means the wrong passphrase.
                Err(_) if encrypted => return Err(CryptoError::PassphraseIncorrect),
                Err(_) => return Err(CryptoError::Pem(pkcs1_err.to_string())),
            },
        };

        let keypair = Self::from_private(inner);
        check_bits(keypair.bits())?;
        Ok(keypair)
    }

    fn from_private(inner: RsaPrivateKey) -> Self {
        let public = PublicKey {
            inner: inner.to_public_key(),
        };
        Self { inner, public }
    }

    /// The public half.
    pub fn public_key(&self) -> &PublicKey {
        &self.public
    }

    /// Modulus size in bits.
    pub fn bits(&self) -> usize {
        self.public.bits()
    }

    /// PEM encode the private key (PKCS#1), unencrypted.
    pub fn encode_private_key(&self) -> CryptoResult<Zeroizing<String>> {
        let der = self
            .inner
            .to_pkcs1_der()
            .map_err(|e| CryptoError::Encode(e.to_string()))?;
        Ok(Zeroizing::new(
            Block::new(PRIVATE_KEY_LABEL, der.as_bytes().to_vec()).encode(),
        ))
    }

    /// PEM encode the private key encrypted under `passphrase` (AES-256-CBC).
    ///
    /// # Errors
    ///
    /// Returns `CryptoError::EmptyPassphrase` for an empty passphrase; use
    /// [`Keypair::encode_private_key`] for unencrypted output.
    pub fn encrypt_and_encode_private_key(&self, passphrase: &str) -> CryptoResult<String> {
        let der = self
            .inner
            .to_pkcs1_der()
            .map_err(|e| CryptoError::Encode(e.to_string()))?;
        Ok(Block::encrypt(PRIVATE_KEY_LABEL, der.as_bytes(), passphrase)?.encode())
    }

    /// PEM encode the public key.
    pub fn encode_public_key(&self) -> CryptoResult<PublicKeyPem> {
        self.public.encode()
    }

    /// Whether `pem` holds this keypair's public key.
    ///
    /// Compares modulus and exponent only; unparsable input never matches.
    pub fn match_public_key(&self, pem: &str) -> bool {
        PublicKey::parse(pem)
            .map(|other| other == self.public)
            .unwrap_or(false)
    }
}

impl Encrypter for Keypair {
    fn encrypt(&self, msg: &[u8]) -> CryptoResult<Vec<u8>> {
        self.public.encrypt(msg)
    }
}

impl Decrypter for Keypair {
    fn decrypt(&self, ciphertext: &[u8]) -> CryptoResult<Zeroizing<Vec<u8>>> {
        trace!(ciphertext_len = ciphertext.len(), "decrypting");

        let plaintext = self
            .inner
            .decrypt_blinded(&mut OsRng, Oaep::new::<Sha256>(), ciphertext)
            .map_err(|e| CryptoError::DecryptionFailed(e.to_string()))?;

        trace!(plaintext_len = plaintext.len(), "decrypted");
        Ok(Zeroizing::new(plaintext))
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("bits", &self.bits())
            .finish_non_exhaustive()
    }
}

/// A keypair plus its PEM encodings, produced once for upload or storage.
#[derive(Debug)]
pub struct EncodedKeypair {
    pub keypair: Keypair,
    /// PEM private key, passphrase encrypted unless the passphrase was empty.
    pub encoded_private_key: Zeroizing<String>,
    pub encoded_public_key: PublicKeyPem,
}

/// Encode `keypair`, encrypting the private key when `passphrase` is not
/// empty.
pub fn encode_keypair(keypair: Keypair, passphrase: &str) -> CryptoResult<EncodedKeypair> {
    let encoded_private_key = if passphrase.is_empty() {
        keypair.encode_private_key()?
    } else {
        Zeroizing::new(keypair.encrypt_and_encode_private_key(passphrase)?)
    };
    let encoded_public_key = keypair.encode_public_key()?;

    Ok(EncodedKeypair {
        keypair,
        encoded_private_key,
        encoded_public_key,
    })
}

/// Generate a keypair of `bits` and encode it.
pub fn generate_encoded(bits: usize, passphrase: Option<&str>) -> CryptoResult<EncodedKeypair> {
    let keypair = Keypair::generate(bits)?;
    encode_keypair(keypair, passphrase.unwrap_or(""))
}

fn check_bits(bits: usize) -> CryptoResult<()> {
    if bits < MINIMUM_BIT_LENGTH {
        return Err(CryptoError::BitLengthTooShort {
            bits,
            minimum: MINIMUM_BIT_LENGTH,
        });
    }
    Ok(())
}

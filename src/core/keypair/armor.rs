//! PEM armor.
//!
//! Reads and writes RFC 1421 style blocks, including the RFC 1423 headers
//! (`Proc-Type`, `DEK-Info`) used by passphrase encrypted private keys. The
//! encrypted form keeps the standard layout so OpenSSL and friends still
//! recognize it.

use aes::cipher::{block_padding::Pkcs7, BlockDecryptMut, BlockEncryptMut, KeyIvInit};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use zeroize::Zeroizing;

use crate::error::CryptoError;

type Aes256CbcEnc = cbc::Encryptor<aes::Aes256>;
type Aes256CbcDec = cbc::Decryptor<aes::Aes256>;

const AES_256_CBC: &str = "AES-256-CBC";
const AES_BLOCK_SIZE: usize = 16;
const AES_256_KEY_SIZE: usize = 32;
const LINE_WIDTH: usize = 64;

const PROC_TYPE: &str = "Proc-Type";
const DEK_INFO: &str = "DEK-Info";
const PROC_TYPE_ENCRYPTED: &str = "4,ENCRYPTED";

/// A decoded PEM block.
#[derive(Clone, PartialEq, Eq)]
pub struct Block {
    label: String,
    headers: Vec<(String, String)>,
    contents: Vec<u8>,
}

impl Block {
    /// Create an unencrypted block.
    pub fn new(label: impl Into<String>, contents: Vec<u8>) -> Self {
        Self {
            label: label.into(),
            headers: Vec::new(),
            contents,
        }
    }

    /// Block label, e.g. `RSA PRIVATE KEY`.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Raw (possibly encrypted) contents.
    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    /// Header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }

    /// Whether the block carries RFC 1423 encryption headers.
    pub fn is_encrypted(&self) -> bool {
        self.header(PROC_TYPE)
            .map(|v| v.contains("ENCRYPTED"))
            .unwrap_or(false)
    }

    /// Encrypt `contents` under `passphrase` with AES-256-CBC.
    ///
    /// The key is derived the way OpenSSL's `EVP_BytesToKey` does with MD5
    /// and one iteration, salted with the first eight bytes of the random IV.
    pub fn encrypt(
        label: impl Into<String>,
        contents: &[u8],
        passphrase: &str,
    ) -> Result<Self, CryptoError> {
        if passphrase.is_empty() {
            return Err(CryptoError::EmptyPassphrase);
        }

        let mut iv = [0u8; AES_BLOCK_SIZE];
        OsRng.fill_bytes(&mut iv);

        let key = derive_key(passphrase.as_bytes(), &iv[..8]);
        let encryptor = Aes256CbcEnc::new_from_slices(key.as_slice(), &iv)
            .map_err(|e| CryptoError::Encode(e.to_string()))?;
        let encrypted = encryptor.encrypt_padded_vec_mut::<Pkcs7>(contents);

        Ok(Self {
            label: label.into(),
            headers: vec![
                (PROC_TYPE.to_string(), PROC_TYPE_ENCRYPTED.to_string()),
                (
                    DEK_INFO.to_string(),
                    format!("{},{}", AES_256_CBC, hex::encode_upper(iv)),
                ),
            ],
            contents: encrypted,
        })
    }

    /// Decrypt an encrypted block.
    ///
    /// A padding mismatch after decryption means the passphrase was wrong and
    /// yields `PassphraseIncorrect`. Malformed headers or a ciphertext that is
    /// not a whole number of blocks yield `Pem`.
    pub fn decrypt(&self, passphrase: &str) -> Result<Zeroizing<Vec<u8>>, CryptoError> {
        let dek = self
            .header(DEK_INFO)
            .ok_or_else(|| CryptoError::Pem("missing DEK-Info header".to_string()))?;
        let (cipher, iv_hex) = dek
            .split_once(',')
            .ok_or_else(|| CryptoError::Pem(format!("malformed DEK-Info header: {}", dek)))?;

        if cipher.trim() != AES_256_CBC {
            return Err(CryptoError::Pem(format!("unsupported PEM cipher: {}", cipher)));
        }

        let iv = hex::decode(iv_hex.trim())
            .map_err(|e| CryptoError::Pem(format!("malformed DEK-Info IV: {}", e)))?;
        if iv.len() != AES_BLOCK_SIZE {
            return Err(CryptoError::Pem(format!(
                "DEK-Info IV must be {} bytes, got {}",
                AES_BLOCK_SIZE,
                iv.len()
            )));
        }
        if self.contents.is_empty() || self.contents.len() % AES_BLOCK_SIZE != 0 {
            return Err(CryptoError::Pem(
                "encrypted PEM data is not a multiple of the block size".to_string(),
            ));
        }

        let key = derive_key(passphrase.as_bytes(), &iv[..8]);
        let decryptor = Aes256CbcDec::new_from_slices(key.as_slice(), &iv)
            .map_err(|e| CryptoError::Pem(e.to_string()))?;

        decryptor
            .decrypt_padded_vec_mut::<Pkcs7>(&self.contents)
            .map(Zeroizing::new)
            .map_err(|_| CryptoError::PassphraseIncorrect)
    }

    /// Render as PEM text with a trailing newline.
    pub fn encode(&self) -> String {
        let mut out = format!("-----BEGIN {}-----\n", self.label);
        for (name, value) in &self.headers {
            out.push_str(name);
            out.push_str(": ");
            out.push_str(value);
            out.push('\n');
        }
        if !self.headers.is_empty() {
            out.push('\n');
        }

        let body = STANDARD.encode(&self.contents);
        for chunk in body.as_bytes().chunks(LINE_WIDTH) {
            // base64 output is ASCII
            out.push_str(&String::from_utf8_lossy(chunk));
            out.push('\n');
        }

        out.push_str(&format!("-----END {}-----\n", self.label));
        out
    }

    /// Parse the first PEM block found in `text`.
    pub fn decode(text: &str) -> Result<Self, CryptoError> {
        let mut lines = text.lines().map(str::trim);

        let label = lines
            .by_ref()
            .find_map(|line| {
                line.strip_prefix("-----BEGIN ")
                    .and_then(|rest| rest.strip_suffix("-----"))
            })
            .ok_or_else(|| CryptoError::Pem("no PEM block found".to_string()))?
            .to_string();
        let end = format!("-----END {}-----", label);

        let mut headers = Vec::new();
        let mut body = String::new();
        let mut in_headers = true;
        let mut terminated = false;

        for line in lines {
            if line == end {
                terminated = true;
                break;
            }
            if in_headers {
                if line.is_empty() {
                    in_headers = false;
                    continue;
                }
                if let Some((name, value)) = line.split_once(':') {
                    headers.push((name.trim().to_string(), value.trim().to_string()));
                    continue;
                }
                in_headers = false;
            }
            body.push_str(line);
        }

        if !terminated {
            return Err(CryptoError::Pem(format!("missing end marker for {}", label)));
        }

        let contents = STANDARD
            .decode(body.as_bytes())
            .map_err(|e| CryptoError::Pem(format!("invalid base64 body: {}", e)))?;

        Ok(Self {
            label,
            headers,
            contents,
        })
    }
}

impl std::fmt::Debug for Block {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Block")
            .field("label", &self.label)
            .field("headers", &self.headers)
            .field("len", &self.contents.len())
            .finish()
    }
}

/// OpenSSL `EVP_BytesToKey` with MD5, one round, producing an AES-256 key.
fn derive_key(passphrase: &[u8], salt: &[u8]) -> Zeroizing<Vec<u8>> {
    let mut key = Zeroizing::new(Vec::with_capacity(AES_256_KEY_SIZE));
    let mut digest: Vec<u8> = Vec::new();

    while key.len() < AES_256_KEY_SIZE {
        let mut ctx = md5::Context::new();
        ctx.consume(&digest);
        ctx.consume(passphrase);
        ctx.consume(salt);
        digest = ctx.compute().0.to_vec();

        let take = (AES_256_KEY_SIZE - key.len()).min(digest.len());
        key.extend_from_slice(&digest[..take]);
    }

    key
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_encode_decode_plain_block() {
        let block = Block::new("TEST DATA", (0u8..200).collect());
        let text = block.encode();

        assert!(text.starts_with("-----BEGIN TEST DATA-----\n"));
        assert!(text.ends_with("-----END TEST DATA-----\n"));
        assert!(text.lines().all(|l| l.len() <= LINE_WIDTH));

        let decoded = Block::decode(&text).unwrap();
        assert_eq!(decoded, block);
        assert!(!decoded.is_encrypted());
    }

    #[test]
    fn test_decode_skips_leading_text() {
        let block = Block::new("THING", b"hello".to_vec());
        let text = format!("some preamble\n\n{}", block.encode());

        let decoded = Block::decode(&text).unwrap();
        assert_eq!(decoded.label(), "THING");
        assert_eq!(decoded.contents(), b"hello");
    }

    #[test]
    fn test_decode_rejects_garbage() {
        assert!(matches!(Block::decode("not pem"), Err(CryptoError::Pem(_))));
        assert!(matches!(
            Block::decode("-----BEGIN X-----\nAAAA\n"),
            Err(CryptoError::Pem(_))
        ));
        assert!(matches!(
            Block::decode("-----BEGIN X-----\n!!!!\n-----END X-----\n"),
            Err(CryptoError::Pem(_))
        ));
    }

    #[test]
    fn test_encrypted_block_roundtrip() {
        let secret = b"pkcs1 bytes would go here".to_vec();
        let block = Block::encrypt("RSA PRIVATE KEY", &secret, "hunter2").unwrap();

        assert!(block.is_encrypted());
        assert_ne!(block.contents(), secret.as_slice());

        let text = block.encode();
        assert!(text.contains("Proc-Type: 4,ENCRYPTED"));
        assert!(text.contains("DEK-Info: AES-256-CBC,"));

        let parsed = Block::decode(&text).unwrap();
        assert!(parsed.is_encrypted());
        assert_eq!(parsed.decrypt("hunter2").unwrap().as_slice(), secret.as_slice());
    }

    #[test]
    fn test_encrypt_rejects_empty_passphrase() {
        assert!(matches!(
            Block::encrypt("RSA PRIVATE KEY", b"x", ""),
            Err(CryptoError::EmptyPassphrase)
        ));
    }

    #[test]
    fn test_decrypt_with_malformed_dek_info() {
        let mut block = Block::encrypt("RSA PRIVATE KEY", b"data", "pw").unwrap();
        block.headers[1].1 = "DES-CBC,00".to_string();
        assert!(matches!(block.decrypt("pw"), Err(CryptoError::Pem(_))));

        block.headers[1].1 = "AES-256-CBC,zz".to_string();
        assert!(matches!(block.decrypt("pw"), Err(CryptoError::Pem(_))));
    }

    #[test]
    fn test_decrypt_truncated_ciphertext() {
        let mut block = Block::encrypt("RSA PRIVATE KEY", &[7u8; 40], "pw").unwrap();
        block.contents.truncate(block.contents.len() - 3);
        assert!(matches!(block.decrypt("pw"), Err(CryptoError::Pem(_))));
    }

    #[test]
    fn test_derive_key_matches_openssl() {
        let key = derive_key(b"password", &[0, 1, 2, 3, 4, 5, 6, 7]);
        assert_eq!(key.len(), AES_256_KEY_SIZE);
        let first = md5::compute([b"password".as_slice(), &[0, 1, 2, 3, 4, 5, 6, 7]].concat());
        assert_eq!(&key[..16], &first.0[..]);
    }
}

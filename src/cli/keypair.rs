//! Keypair commands.

use std::io::{self, IsTerminal};

use dialoguer::Password;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::cli::output;
use crate::core::keypair::{generate_encoded, Keypair, LocalKeyStore};
use crate::core::settings::{FileSettings, KeypairSettings};
use crate::error::{CryptoError, Result, StoreError};

/// Generate a keypair.
///
/// Saves the private key to the local store, or with `dry_run` prints both
/// PEM encodings, the private one encrypted when `encrypt` is set.
pub fn generate(
    bits: Option<usize>,
    dry_run: bool,
    encrypt: bool,
    force: bool,
    passphrase: Option<String>,
) -> Result<()> {
    let settings = FileSettings::open_default()?;
    let keypair_settings = KeypairSettings::from_settings(&settings)?;
    let bits = bits.unwrap_or(keypair_settings.bits);

    if dry_run {
        let passphrase = if encrypt {
            Some(read_new_passphrase(passphrase)?)
        } else {
            None
        };

        output::progress(&format!("Generating {}-bit keypair", bits));
        let encoded = generate_encoded(bits, passphrase.as_deref().map(|p| p.as_str()));
        output::progress_done(encoded.is_ok());
        let encoded = encoded?;

        print!("{}", encoded.encoded_private_key.as_str());
        print!("{}", encoded.encoded_public_key);
        return Ok(());
    }

    let store = LocalKeyStore::new(keypair_settings.dir, keypair_settings.name);
    if store.exists() && !force {
        return Err(StoreError::AlreadyExists(store.path()).into());
    }

    output::progress(&format!("Generating {}-bit keypair", bits));
    let keypair = Keypair::generate(bits);
    output::progress_done(keypair.is_ok());
    let keypair = keypair?;

    let path = store.save(&keypair)?;
    info!(path = %path.display(), bits, "keypair generated");

    output::success("keypair generated");
    println!();
    output::kv("path", output::path(path.display()));
    output::kv("bits", keypair.bits());
    output::kv("fingerprint", keypair.public_key().fingerprint()?);
    Ok(())
}

/// Show the local keypair, or print its public key.
pub fn show(public: bool) -> Result<()> {
    let store = open_store()?;
    let keypair = store.load()?;

    if public {
        print!("{}", keypair.encode_public_key()?);
        return Ok(());
    }

    output::kv("path", output::path(store.path().display()));
    output::kv("bits", keypair.bits());
    output::kv("fingerprint", keypair.public_key().fingerprint()?);
    Ok(())
}

/// Check that the local private key loads.
pub fn check() -> Result<()> {
    let store = open_store()?;
    let keypair = store.load()?;
    debug!(bits = keypair.bits(), "private key loaded");

    output::success(&format!(
        "private key ok at {}",
        output::path(store.path().display())
    ));
    Ok(())
}

/// Delete the local private key.
pub fn rm() -> Result<()> {
    let store = open_store()?;
    if store.delete()? {
        output::success(&format!(
            "removed {}",
            output::path(store.path().display())
        ));
    } else {
        output::warn(&format!(
            "no private key at {}",
            output::path(store.path().display())
        ));
    }
    Ok(())
}

fn open_store() -> Result<LocalKeyStore> {
    let settings = FileSettings::open_default()?;
    LocalKeyStore::from_settings(&settings)
}

/// Passphrase for a new private key, from the environment or a confirmed
/// prompt.
fn read_new_passphrase(provided: Option<String>) -> Result<Zeroizing<String>> {
    let passphrase = match provided {
        Some(p) => Zeroizing::new(p),
        None if io::stdin().is_terminal() => Zeroizing::new(
            Password::new()
                .with_prompt("Passphrase")
                .with_confirmation("Confirm passphrase", "Passphrases do not match")
                .interact()?,
        ),
        None => return Err(CryptoError::EmptyPassphrase.into()),
    };

    if passphrase.is_empty() {
        return Err(CryptoError::EmptyPassphrase.into());
    }
    Ok(passphrase)
}

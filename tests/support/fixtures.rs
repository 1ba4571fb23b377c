//! Test fixtures and constants.

use std::sync::OnceLock;

use cloakroom::core::constants::MINIMUM_BIT_LENGTH;
use cloakroom::core::keypair::Keypair;

/// Passphrase used for keypairs uploaded to the test service.
pub const PASSPHRASE: &str = "correct horse battery staple";

/// Secrets saved across multiple tests, as `(name, value)`.
pub const STANDARD_SECRETS: &[(&str, &str)] = &[
    ("db-password", "s3cr3t"),
    ("API_KEY", "sk-test-12345"),
    ("jwt-secret", "super-secret-jwt-token"),
];

/// Alice's keypair, generated once per test binary.
pub fn alice_keypair() -> &'static Keypair {
    static KEYPAIR: OnceLock<Keypair> = OnceLock::new();
    KEYPAIR.get_or_init(|| Keypair::generate(MINIMUM_BIT_LENGTH).expect("generate alice"))
}

/// Bob's keypair, distinct from Alice's.
pub fn bob_keypair() -> &'static Keypair {
    static KEYPAIR: OnceLock<Keypair> = OnceLock::new();
    KEYPAIR.get_or_init(|| Keypair::generate(MINIMUM_BIT_LENGTH).expect("generate bob"))
}

//! Cloakroom - client-side RSA encrypted secrets for organizations, projects
//! and users.
//!
//! Secret values are encrypted with each member's RSA public key before they
//! leave the machine; the service only ever stores ciphertexts. Reading a
//! secret means picking the most specific candidate for the current project
//! and decrypting it with the local private key.
//!
//! # Architecture
//!
//! ```text
//! src/
//! ├── cli/              # Command-line interface
//! │   ├── keypair       # Generate, show, check and remove the local key
//! │   ├── config        # Settings get/set/rm/list
//! │   └── completions   # Shell completions
//! └── core/             # Core library components
//!     ├── keypair/      # RSA keypair, OAEP, PEM
//!     │   ├── armor     # Passphrase encrypted PEM blocks
//!     │   ├── local     # Private key file (0600)
//!     │   └── remote    # Keypair copy held by the service
//!     ├── settings      # config.toml
//!     ├── api           # Transport trait for the secrets service
//!     ├── secrets       # Secrets client: fetch and upsert
//!     ├── resolve       # Candidate selection by scope
//!     ├── expander      # Session memo and plaintext cache
//!     ├── expand        # $secrets.<category>.<name> references
//!     ├── share         # Re-encryption for another member
//!     └── sync          # Diff driven member synchronization
//! ```
//!
//! # Scopes
//!
//! A secret belongs to an organization and is optionally narrowed to a
//! project, to the user, or to both. The most specific match wins:
//! user+project, then project or user, then organization.

pub mod cli;
pub mod core;
pub mod error;

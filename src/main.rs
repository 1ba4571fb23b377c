//! Cloakroom - client-side encrypted secrets for teams.

use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use cloakroom::cli::output;
use cloakroom::cli::{execute, Cli};
use cloakroom::core::constants::{LOG_ENV, PASSPHRASE_ENV};
use cloakroom::error::{CryptoError, Error, StoreError};

fn main() {
    let cli = Cli::parse();

    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| {
        if cli.verbose {
            EnvFilter::new("cloakroom=debug")
        } else {
            EnvFilter::new("cloakroom=warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(
            fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .without_time(),
        )
        .init();

    if let Err(e) = execute(cli.command) {
        let suggestion = match &e {
            Error::Store(StoreError::NotFound(_)) => {
                Some("run: cloakroom keypair generate".to_string())
            }
            Error::Store(StoreError::AlreadyExists(_)) => {
                Some("run: cloakroom keypair generate --force".to_string())
            }
            Error::Store(StoreError::TooPermissive { path, .. }) => {
                Some(format!("run: chmod 600 {}", path.display()))
            }
            Error::Crypto(CryptoError::EmptyPassphrase) => {
                Some(format!("set {} or run in a terminal", PASSPHRASE_ENV))
            }
            _ => None,
        };

        output::error(&e.to_string());
        if let Some(hint) = suggestion {
            output::hint(&hint);
        }
        std::process::exit(1);
    }
}

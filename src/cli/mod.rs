//! Command-line interface.
//!
//! Local commands only: keypair files, settings and completions. Commands
//! that talk to the secrets service need a [`Transport`] and live in the
//! library.
//!
//! [`Transport`]: crate::core::api::Transport

pub mod completions;
pub mod config;
pub mod keypair;
pub mod output;

use clap::{Parser, Subcommand};

use crate::core::constants::PASSPHRASE_ENV;

/// Cloakroom - client-side encrypted secrets for teams.
#[derive(Parser)]
#[command(
    name = "cloakroom",
    about = "Client-side RSA encrypted secrets for organizations, projects and users",
    version
)]
pub struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

/// Top-level commands.
#[derive(Subcommand)]
pub enum Command {
    /// Manage the local keypair
    Keypair {
        #[command(subcommand)]
        action: KeypairAction,
    },

    /// Read and write settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Keypair subcommands.
#[derive(Subcommand)]
pub enum KeypairAction {
    /// Generate a new keypair and save the private key locally
    Generate {
        /// Key size in bits (defaults to the keypair.bits setting)
        #[arg(short, long)]
        bits: Option<usize>,

        /// Print the PEM encoded keypair instead of saving it
        #[arg(long)]
        dry_run: bool,

        /// With --dry-run, encrypt the printed private key with a passphrase
        #[arg(long, requires = "dry_run")]
        encrypt: bool,

        /// Replace an existing private key
        #[arg(short, long)]
        force: bool,

        #[arg(long, env = PASSPHRASE_ENV, hide = true, hide_env_values = true)]
        passphrase: Option<String>,
    },

    /// Show the local keypair
    Show {
        /// Print the PEM encoded public key
        #[arg(long)]
        public: bool,
    },

    /// Check that the local private key loads
    Check,

    /// Delete the local private key
    Rm,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print a setting
    Get {
        /// Setting name (e.g. keypair.bits)
        key: String,
    },

    /// Change a setting
    Set {
        /// Setting name
        key: String,
        /// New value
        value: String,
    },

    /// Remove a setting
    Rm {
        /// Setting name
        key: String,
    },

    /// List all settings
    List {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
}

/// Supported shells for completions.
#[derive(clap::ValueEnum, Clone, Debug)]
pub enum Shell {
    Bash,
    Zsh,
    Fish,
    PowerShell,
}

/// Execute a command.
pub fn execute(command: Command) -> crate::error::Result<()> {
    use Command::*;

    match command {
        Keypair { action } => match action {
            KeypairAction::Generate {
                bits,
                dry_run,
                encrypt,
                force,
                passphrase,
            } => keypair::generate(bits, dry_run, encrypt, force, passphrase),
            KeypairAction::Show { public } => keypair::show(public),
            KeypairAction::Check => keypair::check(),
            KeypairAction::Rm => keypair::rm(),
        },
        Config { action } => match action {
            ConfigAction::Get { key } => config::get(&key),
            ConfigAction::Set { key, value } => config::set(&key, &value),
            ConfigAction::Rm { key } => config::rm(&key),
            ConfigAction::List { json } => config::list(json),
        },
        Completions { shell } => completions::execute(shell),
    }
}

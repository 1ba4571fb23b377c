//! Constants used throughout cloakroom.
//!
//! Centralizes magic strings and configuration values.

/// Smallest RSA modulus accepted when generating a keypair.
pub const MINIMUM_BIT_LENGTH: usize = 1024;

/// Bit length used when no explicit size is configured.
pub const DEFAULT_BIT_LENGTH: usize = 4096;

/// Application directory name under the platform config dir.
pub const APP_DIR: &str = "cloakroom";

/// Settings file name inside the application directory.
pub const SETTINGS_FILE: &str = "config.toml";

/// Local identifier of the private key file (`<name>.key`).
pub const KEYPAIR_LOCAL_NAME: &str = "private";

/// Extension of the private key file.
pub const KEY_FILE_EXTENSION: &str = "key";

/// Environment variable overriding the application directory.
pub const CONFIG_DIR_ENV: &str = "CLOAKROOM_CONFIG_DIR";

/// Environment variable supplying a passphrase non-interactively.
pub const PASSPHRASE_ENV: &str = "CLOAKROOM_PASSPHRASE";

/// Environment variable holding the tracing filter.
pub const LOG_ENV: &str = "CLOAKROOM_LOG";

/// Expander category for user scoped secrets (`$secrets.user.NAME`).
pub const USER_CATEGORY: &str = "user";

/// Expander category for project scoped secrets (`$secrets.project.NAME`).
pub const PROJECT_CATEGORY: &str = "project";

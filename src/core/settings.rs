//! Local settings.
//!
//! Persistence goes through the narrow [`Settings`] trait so the keypair store
//! and the CLI never care where values live. [`FileSettings`] keeps a flat
//! TOML table at `<config dir>/cloakroom/config.toml`.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::constants::{
    APP_DIR, CONFIG_DIR_ENV, DEFAULT_BIT_LENGTH, KEYPAIR_LOCAL_NAME, MINIMUM_BIT_LENGTH,
    SETTINGS_FILE,
};
use crate::error::{ConfigError, StoreError};

/// Directory holding the private key file.
pub const KEYPAIR_DIR: &str = "keypair.dir";
/// Local identifier of the private key file.
pub const KEYPAIR_NAME: &str = "keypair.name";
/// Bit length used when generating keypairs.
pub const KEYPAIR_BITS: &str = "keypair.bits";

/// Every key [`validate`] accepts.
pub const KNOWN_KEYS: &[&str] = &[KEYPAIR_DIR, KEYPAIR_NAME, KEYPAIR_BITS];

/// Key/value settings storage.
pub trait Settings {
    /// Value for `key`, if set.
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError>;

    /// Set `key` to `value`, persisting immediately.
    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError>;

    /// Remove `key`. Returns whether it was present.
    fn delete(&mut self, key: &str) -> Result<bool, ConfigError>;
}

/// Check that `key` is recognized and `value` is acceptable for it.
///
/// # Errors
///
/// Returns `ConfigError::InvalidValue` for unknown keys, an empty or
/// path-like key name, or a bit length that is not a number at least
/// [`MINIMUM_BIT_LENGTH`].
pub fn validate(key: &str, value: &str) -> Result<(), ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidValue {
        key: key.to_string(),
        reason,
    };

    match key {
        KEYPAIR_DIR if value.trim().is_empty() => Err(invalid("must not be empty".into())),
        KEYPAIR_DIR => Ok(()),
        KEYPAIR_NAME => {
            if value.is_empty()
                || value.contains(|c| c == '/' || c == '\\')
                || value.starts_with('.')
            {
                Err(invalid(format!("not a usable file name: {:?}", value)))
            } else {
                Ok(())
            }
        }
        KEYPAIR_BITS => match value.parse::<usize>() {
            Ok(bits) if bits >= MINIMUM_BIT_LENGTH => Ok(()),
            Ok(bits) => Err(invalid(format!(
                "{} is below the minimum of {}",
                bits, MINIMUM_BIT_LENGTH
            ))),
            Err(e) => Err(invalid(e.to_string())),
        },
        _ => Err(invalid(format!(
            "unknown setting, expected one of: {}",
            KNOWN_KEYS.join(", ")
        ))),
    }
}

/// Base directory for cloakroom files.
///
/// `CLOAKROOM_CONFIG_DIR` wins, otherwise the platform config dir.
pub fn config_dir() -> Result<PathBuf, StoreError> {
    if let Some(dir) = std::env::var_os(CONFIG_DIR_ENV).filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    dirs::config_dir()
        .map(|d| d.join(APP_DIR))
        .ok_or(StoreError::NoConfigDir)
}

/// Settings persisted to a TOML file.
#[derive(Debug)]
pub struct FileSettings {
    path: PathBuf,
    values: BTreeMap<String, String>,
}

impl FileSettings {
    /// Open the settings file at `path`. A missing file is an empty table.
    ///
    /// Nested tables are flattened with `.` so `[keypair] dir = "x"` and
    /// `"keypair.dir" = "x"` read the same.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, ConfigError> {
        let path = path.into();
        debug!(path = %path.display(), "loading settings");

        let values = match fs::read_to_string(&path) {
            Ok(contents) => {
                let table: toml::Table = toml::from_str(&contents)?;
                let mut values = BTreeMap::new();
                flatten("", table, &mut values);
                values
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => BTreeMap::new(),
            Err(e) => return Err(ConfigError::Read(e)),
        };

        debug!(keys = values.len(), "settings loaded");
        Ok(Self { path, values })
    }

    /// Open `config.toml` in [`config_dir`].
    pub fn open_default() -> crate::error::Result<Self> {
        let path = config_dir()?.join(SETTINGS_FILE);
        Ok(Self::open(path)?)
    }

    /// Settings file location.
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// All values, sorted by key.
    pub fn entries(&self) -> impl Iterator<Item = (&str, &str)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    fn save(&self) -> Result<(), ConfigError> {
        debug!(path = %self.path.display(), "saving settings");

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(ConfigError::Write)?;
        }
        let contents = toml::to_string_pretty(&self.values)?;
        fs::write(&self.path, contents).map_err(ConfigError::Write)
    }
}

fn flatten(prefix: &str, table: toml::Table, out: &mut BTreeMap<String, String>) {
    for (key, value) in table {
        let key = if prefix.is_empty() {
            key
        } else {
            format!("{}.{}", prefix, key)
        };
        match value {
            toml::Value::Table(inner) => flatten(&key, inner, out),
            toml::Value::String(s) => {
                out.insert(key, s);
            }
            other => {
                out.insert(key, other.to_string());
            }
        }
    }
}

impl Settings for FileSettings {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        validate(key, value)?;
        self.values.insert(key.to_string(), value.to_string());
        self.save()
    }

    fn delete(&mut self, key: &str) -> Result<bool, ConfigError> {
        let removed = self.values.remove(key).is_some();
        if removed {
            self.save()?;
        }
        Ok(removed)
    }
}

/// Settings that live only in memory.
#[derive(Debug, Default, Clone)]
pub struct MemorySettings {
    values: BTreeMap<String, String>,
}

impl MemorySettings {
    pub fn new() -> Self {
        Self::default()
    }
}

impl Settings for MemorySettings {
    fn get(&self, key: &str) -> Result<Option<String>, ConfigError> {
        Ok(self.values.get(key).cloned())
    }

    fn set(&mut self, key: &str, value: &str) -> Result<(), ConfigError> {
        validate(key, value)?;
        self.values.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn delete(&mut self, key: &str) -> Result<bool, ConfigError> {
        Ok(self.values.remove(key).is_some())
    }
}

/// Keypair settings with defaults applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeypairSettings {
    pub dir: PathBuf,
    pub name: String,
    pub bits: usize,
}

impl KeypairSettings {
    /// Read keypair settings, falling back to [`config_dir`], `private` and
    /// [`DEFAULT_BIT_LENGTH`].
    pub fn from_settings(settings: &dyn Settings) -> crate::error::Result<Self> {
        let dir = match settings.get(KEYPAIR_DIR)? {
            Some(dir) => PathBuf::from(dir),
            None => config_dir()?,
        };

        let name = match settings.get(KEYPAIR_NAME)? {
            Some(name) => {
                validate(KEYPAIR_NAME, &name)?;
                name
            }
            None => KEYPAIR_LOCAL_NAME.to_string(),
        };

        let bits = match settings.get(KEYPAIR_BITS)? {
            Some(bits) => {
                validate(KEYPAIR_BITS, &bits)?;
                // validated above
                bits.parse().unwrap_or(DEFAULT_BIT_LENGTH)
            }
            None => DEFAULT_BIT_LENGTH,
        };

        Ok(Self { dir, name, bits })
    }
}

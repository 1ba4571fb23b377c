//! Config commands.
//!
//! Read and write `config.toml` through [`FileSettings`].

use crate::cli::output;
use crate::core::settings::{FileSettings, Settings, KNOWN_KEYS};
use crate::error::{ConfigError, Result};

/// Print the value of `key`.
pub fn get(key: &str) -> Result<()> {
    known(key)?;
    let settings = FileSettings::open_default()?;
    match settings.get(key)? {
        Some(value) => println!("{}", value),
        None => output::dimmed(&format!("{} is not set", key)),
    }
    Ok(())
}

/// Set `key` to `value`.
pub fn set(key: &str, value: &str) -> Result<()> {
    let mut settings = FileSettings::open_default()?;
    settings.set(key, value)?;
    output::success(&format!("set {} = {}", output::key(key), value));
    Ok(())
}

/// Remove `key`.
pub fn rm(key: &str) -> Result<()> {
    known(key)?;
    let mut settings = FileSettings::open_default()?;
    if settings.delete(key)? {
        output::success(&format!("removed {}", output::key(key)));
    } else {
        output::warn(&format!("{} is not set", output::key(key)));
    }
    Ok(())
}

/// List all settings.
pub fn list(json: bool) -> Result<()> {
    let settings = FileSettings::open_default()?;

    if json {
        let map: serde_json::Map<String, serde_json::Value> = settings
            .entries()
            .map(|(k, v)| (k.to_string(), serde_json::Value::String(v.to_string())))
            .collect();
        let rendered = serde_json::to_string_pretty(&map)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;
        println!("{}", rendered);
        return Ok(());
    }

    let mut empty = true;
    for (key, value) in settings.entries() {
        output::kv(key, value);
        empty = false;
    }
    if empty {
        output::dimmed(&format!(
            "no settings in {}",
            output::path(settings.path().display())
        ));
    }
    Ok(())
}

fn known(key: &str) -> Result<()> {
    if KNOWN_KEYS.contains(&key) {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            key: key.to_string(),
            reason: format!("unknown setting, expected one of: {}", KNOWN_KEYS.join(", ")),
        }
        .into())
    }
}

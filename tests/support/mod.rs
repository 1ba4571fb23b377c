//! Test support utilities for cloakroom integration tests.
//!
//! Provides an isolated config directory for CLI runs and an in-memory
//! secrets service for library level tests.

#![allow(dead_code)]

pub mod assertions;
pub mod commands;
pub mod fixtures;
pub mod service;

#[allow(unused_imports)]
pub use assertions::*;
#[allow(unused_imports)]
pub use fixtures::*;
#[allow(unused_imports)]
pub use service::MemoryService;

use std::path::PathBuf;

use tempfile::TempDir;

/// Test environment with an isolated config directory.
///
/// Child processes get `CLOAKROOM_CONFIG_DIR` pointed at `config`, so tests
/// never touch the real config dir and can run in parallel.
pub struct Test {
    /// Temporary config directory
    pub config: TempDir,
}

impl Test {
    pub fn new() -> Self {
        let config = TempDir::new().expect("failed to create temp config dir");
        Self { config }
    }

    /// Create a test environment with a generated keypair.
    pub fn with_keypair() -> Self {
        let t = Self::new();
        let output = t.generate(&["--bits", "1024"]);
        assert!(
            output.status.success(),
            "Failed to generate keypair: {}",
            String::from_utf8_lossy(&output.stderr)
        );
        t
    }

    /// Default private key location.
    pub fn key_path(&self) -> PathBuf {
        self.config.path().join("private.key")
    }

    /// Settings file location.
    pub fn settings_path(&self) -> PathBuf {
        self.config.path().join("config.toml")
    }
}

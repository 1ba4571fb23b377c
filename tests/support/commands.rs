//! Command helper methods for Test.

use super::Test;
use assert_cmd::Command;
use std::process::Output;

impl Test {
    /// Create a cloakroom command bound to the test config directory.
    pub fn cmd(&self) -> Command {
        #[allow(deprecated)]
        let mut cmd = Command::cargo_bin("cloakroom").expect("failed to find cloakroom binary");
        cmd.env("CLOAKROOM_CONFIG_DIR", self.config.path());
        cmd.env_remove("CLOAKROOM_PASSPHRASE");
        cmd.env_remove("CLOAKROOM_LOG");
        cmd.env("NO_COLOR", "1");
        cmd.current_dir(self.config.path());
        cmd
    }

    /// Shortcut for `cloakroom keypair generate`.
    pub fn generate(&self, args: &[&str]) -> Output {
        self.cmd()
            .args(["keypair", "generate"])
            .args(args)
            .output()
            .expect("failed to run cloakroom keypair generate")
    }

    /// Shortcut for `cloakroom keypair show`.
    pub fn show(&self) -> Output {
        self.cmd()
            .args(["keypair", "show"])
            .output()
            .expect("failed to run cloakroom keypair show")
    }

    /// Shortcut for `cloakroom keypair check`.
    pub fn check(&self) -> Output {
        self.cmd()
            .args(["keypair", "check"])
            .output()
            .expect("failed to run cloakroom keypair check")
    }

    /// Shortcut for `cloakroom config set`.
    pub fn config_set(&self, key: &str, value: &str) -> Output {
        self.cmd()
            .args(["config", "set", key, value])
            .output()
            .expect("failed to run cloakroom config set")
    }

    /// Shortcut for `cloakroom config get`.
    pub fn config_get(&self, key: &str) -> Output {
        self.cmd()
            .args(["config", "get", key])
            .output()
            .expect("failed to run cloakroom config get")
    }

    /// Shortcut for `cloakroom config rm`.
    pub fn config_rm(&self, key: &str) -> Output {
        self.cmd()
            .args(["config", "rm", key])
            .output()
            .expect("failed to run cloakroom config rm")
    }

    /// Shortcut for `cloakroom config list --json`.
    pub fn config_list_json(&self) -> Output {
        self.cmd()
            .args(["config", "list", "--json"])
            .output()
            .expect("failed to run cloakroom config list --json")
    }
}

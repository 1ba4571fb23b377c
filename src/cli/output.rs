//! Shared CLI output helpers.
//!
//! Color scheme (respects NO_COLOR):
//! - Green: success, checkmarks
//! - Red: errors
//! - Yellow: warnings
//! - Cyan: paths, keys, hints
//! - Bold: headers, important values
//! - Dim: secondary info

use std::fmt::Display;
use std::io::{self, Write as IoWrite};

use console::style;

fn colors_enabled() -> bool {
    std::env::var_os("NO_COLOR").is_none() && console::colors_enabled()
}

/// Print a success message with checkmark.
///
/// Example: `✓ keypair generated`
pub fn success(msg: &str) {
    if colors_enabled() {
        println!("{} {}", style("✓").green(), msg);
    } else {
        println!("✓ {}", msg);
    }
}

/// Print an error message to stderr.
pub fn error(msg: &str) {
    if console::colors_enabled_stderr() && std::env::var_os("NO_COLOR").is_none() {
        eprintln!("{} {}", style("✗").red(), msg);
    } else {
        eprintln!("✗ {}", msg);
    }
}

/// Print a warning message.
pub fn warn(msg: &str) {
    if colors_enabled() {
        println!("{} {}", style("⚠").yellow(), msg);
    } else {
        println!("⚠ {}", msg);
    }
}

/// Print a hint to stderr, below an error.
///
/// Example: `→ run: chmod 600 ~/.config/cloakroom/private.key`
pub fn hint(msg: &str) {
    if console::colors_enabled_stderr() && std::env::var_os("NO_COLOR").is_none() {
        eprintln!("{} {}", style("→").cyan(), style(msg).cyan());
    } else {
        eprintln!("→ {}", msg);
    }
}

/// Print a key-value pair (label dim, value bold).
pub fn kv(label: &str, value: impl Display) {
    if colors_enabled() {
        println!("  {}  {}", style(label).dim(), style(value).bold());
    } else {
        println!("  {}  {}", label, value);
    }
}

/// Format a path in cyan.
pub fn path(p: impl Display) -> String {
    if colors_enabled() {
        style(p).cyan().to_string()
    } else {
        p.to_string()
    }
}

/// Format a key name in cyan.
pub fn key(k: &str) -> String {
    if colors_enabled() {
        style(k).cyan().to_string()
    } else {
        k.to_string()
    }
}

/// Start a progress line on stderr in the format `Label... `.
///
/// Call `progress_done()` to finish the line.
pub fn progress(label: &str) {
    eprint!("{}... ", style(label).dim());
    let _ = io::stderr().flush();
}

/// Finish a progress line.
pub fn progress_done(success: bool) {
    if success {
        eprintln!("{}", style("ok").green());
    } else {
        eprintln!("{}", style("failed").red());
    }
}

/// Print a dim secondary message.
pub fn dimmed(msg: &str) {
    if colors_enabled() {
        println!("{}", style(msg).dim());
    } else {
        println!("{}", msg);
    }
}

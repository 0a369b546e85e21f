//! Logging utilities with colored output.
//!
//! This module provides:
//! - `log!` macro for formatted terminal output with colored prefixes
//! - `debug!` macro, only printed with `--verbose`
//! - status helpers (`✓` / `✗` / `⚠`) for command results
//!
//! Everything goes to stderr so that command output on stdout (URLs, JSON)
//! stays pipeable.
//!
//! # Example
//!
//! ```ignore
//! log!("config"; "loaded {} routes", count);
//! debug!("route"; "{}: rejected ({})", template, reason);
//! ```

use owo_colors::{OwoColorize, Stream};
use std::{
    io::{Write, stderr},
    sync::atomic::{AtomicBool, Ordering},
};

/// Global verbose flag (set by --verbose CLI argument)
static VERBOSE: AtomicBool = AtomicBool::new(false);

/// Set verbose mode globally
pub fn set_verbose(v: bool) {
    VERBOSE.store(v, Ordering::SeqCst);
}

/// Check if verbose mode is enabled
pub fn is_verbose() -> bool {
    VERBOSE.load(Ordering::SeqCst)
}

// ============================================================================
// Log Macro
// ============================================================================

/// Log a message with a colored module prefix
///
/// # Usage
/// ```ignore
/// log!("module"; "message with {} formatting", args);
/// ```
#[macro_export]
macro_rules! log {
    ($module:expr; $($arg:tt)*) => {{
        $crate::logger::log($module, &format!($($arg)*))
    }};
}

/// Log a debug message (only shown when --verbose is enabled)
///
/// # Usage
/// ```ignore
/// debug!("module"; "debug info: {}", value);
/// ```
#[macro_export]
macro_rules! debug {
    ($module:expr; $($arg:tt)*) => {{
        if $crate::logger::is_verbose() {
            $crate::logger::log($module, &format!($($arg)*))
        }
    }};
}

// ============================================================================
// Helper Functions
// ============================================================================

/// Log a message with a colored module prefix
#[inline]
pub fn log(module: &str, message: &str) {
    let prefix = colorize_prefix(module);
    let mut out = stderr().lock();
    writeln!(out, "{prefix} {message}").ok();
    out.flush().ok();
}

/// Apply color to a module prefix based on module type
#[inline]
fn colorize_prefix(module: &str) -> String {
    let prefix = format!("[{module}]");
    let paint = |style: fn(&String) -> String| {
        prefix.if_supports_color(Stream::Stderr, style).to_string()
    };
    match module.to_ascii_lowercase().as_str() {
        "route" => paint(|p| p.bright_cyan().bold().to_string()),
        "config" => paint(|p| p.bright_blue().bold().to_string()),
        "conflict" | "error" => paint(|p| p.bright_red().bold().to_string()),
        _ => paint(|p| p.bright_yellow().bold().to_string()),
    }
}

// ============================================================================
// Status lines
// ============================================================================

/// Status line: success (✓ prefix, green).
pub fn status_success(message: &str) {
    status("✓".if_supports_color(Stream::Stderr, |s| s.green()).to_string(), message);
}

/// Status line: error (✗ prefix, red) with optional detail.
pub fn status_error(summary: &str, detail: &str) {
    let message = if detail.is_empty() {
        summary.to_string()
    } else {
        format!("{summary}\n{detail}")
    };
    status("✗".if_supports_color(Stream::Stderr, |s| s.red()).to_string(), &message);
}

/// Status line: warning (⚠ prefix, yellow).
pub fn status_warning(detail: &str) {
    status("⚠".if_supports_color(Stream::Stderr, |s| s.yellow()).to_string(), detail);
}

fn status(symbol: String, message: &str) {
    let mut out = stderr().lock();
    writeln!(out, "{symbol} {message}").ok();
    out.flush().ok();
}

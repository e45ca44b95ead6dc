//! Centralized styling for operator-facing output
//!
//! All colors live here rather than hardcoded at call sites, so the menu and
//! error reporting stay visually consistent. Uses crossterm's styling API;
//! plain stdout/stderr otherwise (no alternate screen, no raw mode).

use crossterm::style::Stylize;

/// Banner shown above the menu
pub const BANNER: &str = "server-bootstrap :: secure server provisioning";

/// Success message (green, check-marked)
pub fn success(msg: &str) -> String {
    format!("{} {}", "✓".green(), msg.green())
}

/// Error message (red, cross-marked)
pub fn error(msg: &str) -> String {
    format!("{} {}", "✗".red(), msg.red())
}

/// Informational message (cyan)
pub fn info(msg: &str) -> String {
    msg.cyan().to_string()
}

/// Warning / operator-action-required message (yellow)
pub fn warning(msg: &str) -> String {
    msg.yellow().to_string()
}

/// Section heading (bold)
pub fn heading(msg: &str) -> String {
    msg.bold().to_string()
}

/// Numbered menu entry
pub fn menu_entry(number: usize, label: &str) -> String {
    format!("  {}) {}", number.to_string().cyan(), label)
}

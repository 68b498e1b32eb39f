//! Terminal and platform detection.

use std::io::IsTerminal;

/// Whether the health label may be colored on stdout.
///
/// Off when `--no-color` is given, `NO_COLOR` is set, `TERM=dumb`, or stdout
/// is not a terminal.
#[must_use]
pub fn should_use_color(no_color_flag: bool) -> bool {
    if no_color_flag || std::env::var_os("NO_COLOR").is_some() {
        return false;
    }
    if std::env::var("TERM").is_ok_and(|t| t == "dumb") {
        return false;
    }
    std::io::stdout().is_terminal()
}

#[must_use]
pub const fn is_macos() -> bool {
    cfg!(target_os = "macos")
}

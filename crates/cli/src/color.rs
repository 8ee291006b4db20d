// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Warden Project Contributors

use clap::builder::styling::{Ansi256Color, Color, Style, Styles};
use std::io::IsTerminal;

pub mod codes {
    /// Section headers and folder names.
    pub const HEADER: u8 = 74;
    /// Muted / secondary text.
    pub const MUTED: u8 = 240;
    /// Risk/severity emphasis.
    pub const WARN: u8 = 178;
}

/// Priority: `NO_COLOR=1` disables, `COLOR=1` forces, otherwise TTY check.
pub fn should_colorize() -> bool {
    if std::env::var("NO_COLOR").is_ok_and(|v| v == "1") {
        return false;
    }
    if std::env::var("COLOR").is_ok_and(|v| v == "1") {
        return true;
    }
    std::io::stdout().is_terminal()
}

/// Build clap `Styles` using the project palette.
pub fn styles() -> Styles {
    if !should_colorize() {
        return Styles::plain();
    }
    Styles::styled()
        .header(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::HEADER)))))
        .literal(Style::new().fg_color(Some(Color::Ansi256(Ansi256Color(codes::MUTED)))))
}

fn fg256(code: u8) -> String {
    format!("\x1b[38;5;{code}m")
}

const RESET: &str = "\x1b[0m";

pub fn header(text: &str) -> String {
    if should_colorize() { format!("{}{}{}", fg256(codes::HEADER), text, RESET) } else { text.to_string() }
}

pub fn muted(text: &str) -> String {
    if should_colorize() { format!("{}{}{}", fg256(codes::MUTED), text, RESET) } else { text.to_string() }
}

pub fn warn(text: &str) -> String {
    if should_colorize() { format!("{}{}{}", fg256(codes::WARN), text, RESET) } else { text.to_string() }
}

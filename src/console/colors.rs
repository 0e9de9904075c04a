//! Color constants and styling for console output.

use std::io::IsTerminal;

use crossterm::style::{Color, Stylize};

use crate::fields::Status;

/// Used for Planned projects
pub const PLANNED: Color = Color::Blue;
/// Used for projects in progress
pub const IN_PROGRESS: Color = Color::Rgb { r: 255, g: 215, b: 0 };
/// Used for Completed projects
pub const COMPLETED: Color = Color::Rgb { r: 0, g: 128, b: 0 };
/// Used for Paused projects
pub const PAUSED: Color = Color::Rgb { r: 86, g: 60, b: 92 };
/// Used for Cancelled projects
pub const CANCELLED: Color = Color::DarkGrey;

pub fn status_color(status: Status) -> Color {
    match status {
        Status::Planned => PLANNED,
        Status::InProgress => IN_PROGRESS,
        Status::Completed => COMPLETED,
        Status::Paused => PAUSED,
        Status::Cancelled => CANCELLED,
    }
}

/// Decides whether output carries ANSI styling.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    enabled: bool,
}

impl Palette {
    pub fn plain() -> Self {
        Palette { enabled: false }
    }

    pub fn colored() -> Self {
        Palette { enabled: true }
    }

    /// Colored when stdout is a terminal.
    pub fn detect() -> Self {
        Palette { enabled: std::io::stdout().is_terminal() }
    }

    pub fn ok(&self, msg: &str) -> String {
        if self.enabled {
            format!("{} {msg}", "[OK]".green().bold())
        } else {
            format!("[OK] {msg}")
        }
    }

    pub fn error(&self, msg: &str) -> String {
        if self.enabled {
            format!("{} {msg}", "[ERROR]".red().bold())
        } else {
            format!("[ERROR] {msg}")
        }
    }

    pub fn heading(&self, title: &str) -> String {
        if self.enabled {
            title.cyan().bold().to_string()
        } else {
            title.to_string()
        }
    }

    pub fn status(&self, status: Status) -> String {
        if self.enabled {
            status.to_string().with(status_color(status)).to_string()
        } else {
            status.to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_palette_has_no_escapes() {
        let p = Palette::plain();
        assert_eq!(p.ok("saved"), "[OK] saved");
        assert_eq!(p.error("nope"), "[ERROR] nope");
        assert_eq!(p.status(Status::InProgress), "InProgress");
    }

    #[test]
    fn test_colored_palette_wraps_markers() {
        let p = Palette::colored();
        let line = p.error("nope");
        assert!(line.contains("[ERROR]"));
        assert!(line.contains('\u{1b}'));
        assert!(line.ends_with(" nope"));
    }
}

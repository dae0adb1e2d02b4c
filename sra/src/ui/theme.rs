//! Colors used for terminal output.
//!
//! Each logical message kind maps to a 16-color ANSI foreground. Color is
//! only applied when the destination stream is a terminal.

use owo_colors::{AnsiColors, OwoColorize};

/// The logical parts of the output that get a color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ThemeEntry {
    Header,
    Success,
    Info,
    Warn,
    Error,
    /// Unchanged resources.
    Muted,
}

impl ThemeEntry {
    pub fn color(self) -> AnsiColors {
        match self {
            ThemeEntry::Header => AnsiColors::Cyan,
            ThemeEntry::Success => AnsiColors::Green,
            ThemeEntry::Info => AnsiColors::Blue,
            ThemeEntry::Warn => AnsiColors::Yellow,
            ThemeEntry::Error => AnsiColors::Red,
            ThemeEntry::Muted => AnsiColors::BrightBlack,
        }
    }
}

/// Renders `text` in the entry's color, or plain when `colored` is false.
pub fn paint(text: &str, entry: ThemeEntry, colored: bool) -> String {
    if colored {
        text.color(entry.color()).to_string()
    } else {
        text.to_string()
    }
}

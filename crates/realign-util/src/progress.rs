//! Cargo-style status lines written to stderr.

use std::io::Write;

use console::Style;

/// Colour of the right-aligned label in a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tone {
    /// Something was changed (bold green).
    Action,
    /// Informational, nothing changed (bold cyan).
    Info,
    /// Something was skipped or needs attention (bold yellow).
    Warn,
}

impl Tone {
    fn style(self) -> Style {
        match self {
            Tone::Action => Style::new().green().bold(),
            Tone::Info => Style::new().cyan().bold(),
            Tone::Warn => Style::new().yellow().bold(),
        }
    }
}

/// Format a status line without printing it: the label is right-aligned
/// to 12 columns, followed by the message.
pub fn format_status(tone: Tone, label: &str, message: &str) -> String {
    format!("{:>12} {message}", tone.style().apply_to(label))
}

fn emit(tone: Tone, label: &str, message: &str) {
    let _ = writeln!(std::io::stderr(), "{}", format_status(tone, label, message));
}

/// `     Aligned org.example:app`
pub fn status(label: &str, message: &str) {
    emit(Tone::Action, label, message);
}

pub fn status_info(label: &str, message: &str) {
    emit(Tone::Info, label, message);
}

pub fn status_warn(label: &str, message: &str) {
    emit(Tone::Warn, label, message);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn label_is_right_aligned() {
        console::set_colors_enabled(false);
        let line = format_status(Tone::Info, "Loaded", "3 modules");
        assert_eq!(line, "      Loaded 3 modules");
    }
}

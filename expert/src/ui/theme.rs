//! Color theme and styling for the expert TUI

use ratatui::style::{Color, Modifier, Style};

/// UI color theme
#[derive(Debug, Clone)]
pub struct Theme {
    pub foreground: Color,
    pub border: Color,
    pub border_focused: Color,

    pub input_text: Color,
    pub success_text: Color,
    pub error_text: Color,
    pub info_text: Color,
    pub system_text: Color,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            foreground: Color::White,
            border: Color::DarkGray,
            border_focused: Color::Cyan,

            input_text: Color::Cyan,
            success_text: Color::Green,
            error_text: Color::Red,
            info_text: Color::Yellow,
            system_text: Color::DarkGray,
        }
    }
}

impl Theme {
    /// Style for user input echoes
    pub fn input_style(&self) -> Style {
        Style::default()
            .fg(self.input_text)
            .add_modifier(Modifier::ITALIC)
    }

    /// Style for success lines
    pub fn success_style(&self) -> Style {
        Style::default().fg(self.success_text)
    }

    /// Style for error lines
    pub fn error_style(&self) -> Style {
        Style::default().fg(self.error_text)
    }

    /// Style for informational notices
    pub fn info_style(&self) -> Style {
        Style::default().fg(self.info_text)
    }

    /// Style for system messages
    pub fn system_style(&self) -> Style {
        Style::default()
            .fg(self.system_text)
            .add_modifier(Modifier::DIM)
    }

    /// Border style for a panel
    pub fn border_style(&self, focused: bool) -> Style {
        Style::default().fg(if focused {
            self.border_focused
        } else {
            self.border
        })
    }

    /// Title bar style
    pub fn title_style(&self) -> Style {
        Style::default()
            .fg(self.foreground)
            .add_modifier(Modifier::BOLD)
    }
}

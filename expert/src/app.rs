//! Main application state and logic

use std::collections::VecDeque;

use expert_core::{roundtrip, Bootstrapper};

use crate::ui::theme::Theme;

/// Vim-style input modes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// Normal mode - navigation and hotkeys (default)
    #[default]
    Normal,
    /// Insert mode - free text input
    Insert,
}

/// Kind of a transcript entry, for styling
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    Input,
    Success,
    Empty,
    Error,
    System,
}

/// A single entry in the transcript panel
#[derive(Debug, Clone)]
pub struct TranscriptEntry {
    pub kind: EntryKind,
    pub text: String,
}

impl TranscriptEntry {
    fn new(kind: EntryKind, text: impl Into<String>) -> Self {
        Self {
            kind,
            text: text.into(),
        }
    }
}

/// Main application state
pub struct App {
    pub theme: Theme,

    // Input state
    pub input_mode: InputMode,
    input_buffer: String,
    cursor_position: usize,
    pub input_history: VecDeque<String>,
    pub history_index: Option<usize>,

    // Transcript display
    pub transcript: Vec<TranscriptEntry>,
    pub scroll: usize,
    pub scroll_locked_to_bottom: bool,

    // Status
    status_message: Option<String>,
    pub show_help: bool,

    // Input submitted but not yet processed
    pub pending_input: Option<String>,
}

impl App {
    pub fn new() -> Self {
        let mut app = Self {
            theme: Theme::default(),
            input_mode: InputMode::Normal,
            input_buffer: String::new(),
            cursor_position: 0,
            input_history: VecDeque::with_capacity(100),
            history_index: None,
            transcript: Vec::new(),
            scroll: 0,
            scroll_locked_to_bottom: true,
            status_message: None,
            show_help: false,
            pending_input: None,
        };

        app.add_entry(
            EntryKind::System,
            "Enter a name, run inference, and the first result fact is displayed.",
        );
        app.add_entry(
            EntryKind::System,
            "Press 'i' to type, Enter to run, '?' for help, 'q' to quit",
        );
        app
    }

    /// Bootstrap a fresh engine session and run one complete round
    /// trip for `input`, appending the outcome to the transcript.
    ///
    /// Exactly one of {error message, success line, no-results notice}
    /// is shown per invocation. Errors are logged after display.
    pub fn run_round_trip(&mut self, input: &str) {
        self.add_entry(EntryKind::Input, input);

        let mut session = match Bootstrapper::new().create_session() {
            Ok(session) => session,
            Err(error) => {
                let message = format!("Failed to load inference engine: {error}");
                self.add_entry(EntryKind::Error, message.clone());
                self.set_status(message);
                tracing::error!(%error, "engine bootstrap failed");
                return;
            }
        };

        match roundtrip::submit_and_infer(&mut session, input) {
            Ok(results) => match results.first() {
                Some(first) => {
                    self.add_entry(EntryKind::Success, format!("Result: {first}"));
                    self.set_status(format!("{} result fact(s)", results.len()));
                }
                None => {
                    self.add_entry(EntryKind::Empty, "No results found.");
                    self.set_status("No results");
                }
            },
            Err(error) => {
                self.add_entry(EntryKind::Error, error.to_string());
                self.set_status(error.to_string());
                tracing::error!(%error, "round trip failed");
            }
        }
    }

    /// Append an entry and keep the view pinned to the bottom.
    pub fn add_entry(&mut self, kind: EntryKind, text: impl Into<String>) {
        self.transcript.push(TranscriptEntry::new(kind, text));
        if self.scroll_locked_to_bottom {
            self.scroll = usize::MAX;
        }
    }

    // --- Input editing -----------------------------------------------------

    pub fn input_buffer(&self) -> &str {
        &self.input_buffer
    }

    pub fn cursor_position(&self) -> usize {
        self.cursor_position
    }

    /// Byte offset of a character position, for unicode-safe editing.
    fn byte_index(&self, char_position: usize) -> usize {
        self.input_buffer
            .char_indices()
            .nth(char_position)
            .map(|(i, _)| i)
            .unwrap_or(self.input_buffer.len())
    }

    pub fn type_char(&mut self, c: char) {
        let byte_index = self.byte_index(self.cursor_position);
        self.input_buffer.insert(byte_index, c);
        self.cursor_position += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor_position > 0 {
            self.cursor_position -= 1;
            let byte_index = self.byte_index(self.cursor_position);
            self.input_buffer.remove(byte_index);
        }
    }

    pub fn delete(&mut self) {
        if self.cursor_position < self.input_buffer.chars().count() {
            let byte_index = self.byte_index(self.cursor_position);
            self.input_buffer.remove(byte_index);
        }
    }

    pub fn cursor_left(&mut self) {
        self.cursor_position = self.cursor_position.saturating_sub(1);
    }

    pub fn cursor_right(&mut self) {
        if self.cursor_position < self.input_buffer.chars().count() {
            self.cursor_position += 1;
        }
    }

    pub fn cursor_home(&mut self) {
        self.cursor_position = 0;
    }

    pub fn cursor_end(&mut self) {
        self.cursor_position = self.input_buffer.chars().count();
    }

    /// Take the input buffer for submission. Empty input is a valid
    /// submission: the round trip substitutes the placeholder.
    pub fn submit_input(&mut self) -> String {
        let input = std::mem::take(&mut self.input_buffer);
        self.cursor_position = 0;
        self.history_index = None;
        if !input.is_empty() {
            self.input_history.push_front(input.clone());
        }
        input
    }

    pub fn clear_input(&mut self) {
        self.input_buffer.clear();
        self.cursor_position = 0;
        self.history_index = None;
    }

    pub fn history_prev(&mut self) {
        let next_index = match self.history_index {
            None => 0,
            Some(i) => i + 1,
        };
        if let Some(entry) = self.input_history.get(next_index) {
            self.input_buffer = entry.clone();
            self.history_index = Some(next_index);
            self.cursor_end();
        }
    }

    pub fn history_next(&mut self) {
        match self.history_index {
            Some(0) | None => {
                self.clear_input();
            }
            Some(i) => {
                if let Some(entry) = self.input_history.get(i - 1) {
                    self.input_buffer = entry.clone();
                    self.history_index = Some(i - 1);
                    self.cursor_end();
                }
            }
        }
    }

    // --- Scrolling ---------------------------------------------------------

    pub fn scroll_up(&mut self, amount: usize) {
        self.scroll = self.scroll.saturating_sub(amount);
        self.scroll_locked_to_bottom = false;
    }

    pub fn scroll_down(&mut self, amount: usize) {
        self.scroll = self.scroll.saturating_add(amount);
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll = usize::MAX;
        self.scroll_locked_to_bottom = true;
    }

    // --- Status ------------------------------------------------------------

    pub fn set_status(&mut self, message: impl Into<String>) {
        self.status_message = Some(message.into());
    }

    pub fn status(&self) -> Option<&str> {
        self.status_message.as_deref()
    }

    pub fn toggle_help(&mut self) {
        self.show_help = !self.show_help;
    }

    pub fn enter_normal_mode(&mut self) {
        self.input_mode = InputMode::Normal;
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_success_entry() {
        let mut app = App::new();
        app.run_round_trip("Alice");

        let last = app.transcript.last().unwrap();
        assert_eq!(last.kind, EntryKind::Success);
        assert_eq!(last.text, "Result: Alice");
    }

    #[test]
    fn test_round_trip_empty_input_shows_placeholder() {
        let mut app = App::new();
        app.run_round_trip("");

        let last = app.transcript.last().unwrap();
        assert_eq!(last.text, "Result: <no-name>");
    }

    #[test]
    fn test_input_editing() {
        let mut app = App::new();
        app.type_char('h');
        app.type_char('i');
        app.cursor_left();
        app.backspace();
        assert_eq!(app.input_buffer(), "i");

        let submitted = app.submit_input();
        assert_eq!(submitted, "i");
        assert_eq!(app.input_buffer(), "");
    }

    #[test]
    fn test_history_browsing() {
        let mut app = App::new();
        app.type_char('a');
        app.submit_input();
        app.type_char('b');
        app.submit_input();

        app.history_prev();
        assert_eq!(app.input_buffer(), "b");
        app.history_prev();
        assert_eq!(app.input_buffer(), "a");
        app.history_next();
        assert_eq!(app.input_buffer(), "b");
        app.history_next();
        assert_eq!(app.input_buffer(), "");
    }
}

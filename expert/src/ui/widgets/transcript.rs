//! Transcript display widget

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Widget},
};

use crate::app::{EntryKind, TranscriptEntry};
use crate::ui::theme::Theme;

/// Widget for displaying the invocation transcript
pub struct TranscriptWidget<'a> {
    items: &'a [TranscriptEntry],
    scroll: usize,
    theme: &'a Theme,
    focused: bool,
}

impl<'a> TranscriptWidget<'a> {
    pub fn new(items: &'a [TranscriptEntry], theme: &'a Theme) -> Self {
        Self {
            items,
            scroll: 0,
            theme,
            focused: false,
        }
    }

    pub fn scroll(mut self, scroll: usize) -> Self {
        self.scroll = scroll;
        self
    }

    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    fn style_for_kind(&self, kind: EntryKind) -> ratatui::style::Style {
        match kind {
            EntryKind::Input => self.theme.input_style(),
            EntryKind::Success => self.theme.success_style(),
            EntryKind::Empty => self.theme.info_style(),
            EntryKind::Error => self.theme.error_style(),
            EntryKind::System => self.theme.system_style(),
        }
    }
}

impl Widget for TranscriptWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let title = if self.focused {
            " Results [j/k scroll] "
        } else {
            " Results "
        };

        let block = Block::default()
            .title(title)
            .borders(Borders::ALL)
            .border_style(self.theme.border_style(self.focused));

        let inner = block.inner(area);
        block.render(area, buf);

        let mut lines: Vec<Line> = Vec::new();
        for item in self.items {
            let style = self.style_for_kind(item.kind);
            let prefix = match item.kind {
                EntryKind::Input => "> ",
                EntryKind::System => "[ ",
                _ => "",
            };
            let suffix = match item.kind {
                EntryKind::System => " ]",
                _ => "",
            };

            let text = format!("{}{}{}", prefix, item.text, suffix);
            for line in text.lines() {
                lines.push(Line::from(Span::styled(line.to_string(), style)));
            }
            lines.push(Line::from(""));
        }

        // Clamp scroll so the last page stays visible
        let max_scroll = lines.len().saturating_sub(inner.height as usize);
        let scroll = self.scroll.min(max_scroll);

        let paragraph = Paragraph::new(lines).scroll((scroll as u16, 0));
        paragraph.render(inner, buf);
    }
}

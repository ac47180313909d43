//! Render orchestration for the expert TUI

use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use crate::app::{App, InputMode};
use crate::ui::widgets::{InputWidget, TranscriptWidget};

/// Main render function
pub fn render(frame: &mut Frame, app: &App) {
    let area = frame.area();

    let [title_area, transcript_area, input_area, status_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(3),
        Constraint::Length(3),
        Constraint::Length(1),
    ])
    .areas(area);

    render_title_bar(frame, app, title_area);

    let transcript = TranscriptWidget::new(&app.transcript, &app.theme)
        .scroll(app.scroll)
        .focused(app.input_mode == InputMode::Normal);
    frame.render_widget(transcript, transcript_area);

    let input = InputWidget::new(app.input_buffer(), &app.theme)
        .cursor_position(app.cursor_position())
        .active(app.input_mode == InputMode::Insert);
    frame.render_widget(input, input_area);

    render_status_bar(frame, app, status_area);

    if app.show_help {
        render_help_overlay(frame, app, area);
    }
}

fn render_title_bar(frame: &mut Frame, app: &App, area: Rect) {
    let title = Line::from(vec![
        Span::styled(" Expert Shell ", app.theme.title_style()),
        Span::styled(
            "assert a fact, run inference, see the result",
            app.theme.system_style(),
        ),
    ]);
    frame.render_widget(Paragraph::new(title), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let mode = match app.input_mode {
        InputMode::Normal => Span::styled(" NORMAL ", Style::default().add_modifier(Modifier::REVERSED)),
        InputMode::Insert => Span::styled(
            " INSERT ",
            Style::default().add_modifier(Modifier::REVERSED | Modifier::BOLD),
        ),
    };

    let mut spans = vec![mode, Span::raw(" ")];
    if let Some(status) = app.status() {
        spans.push(Span::styled(status.to_string(), app.theme.system_style()));
    }
    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_help_overlay(frame: &mut Frame, app: &App, area: Rect) {
    let popup = centered_rect(50, 12, area);
    frame.render_widget(Clear, popup);

    let lines = vec![
        Line::from(""),
        Line::from("  i / a      enter insert mode"),
        Line::from("  Enter      run inference on the input"),
        Line::from("  Esc        back to normal mode"),
        Line::from("  j / k      scroll results"),
        Line::from("  g / G      jump to top / bottom"),
        Line::from("  Up / Down  browse input history (insert mode)"),
        Line::from("  ?          toggle this help"),
        Line::from("  q          quit"),
    ];

    let block = Block::default()
        .title(" Help ")
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(true));
    frame.render_widget(Paragraph::new(lines).block(block), popup);
}

/// A centered rect of fixed size within `area`.
fn centered_rect(width: u16, height: u16, area: Rect) -> Rect {
    let width = width.min(area.width);
    let height = height.min(area.height);
    Rect {
        x: area.x + (area.width.saturating_sub(width)) / 2,
        y: area.y + (area.height.saturating_sub(height)) / 2,
        width,
        height,
    }
}

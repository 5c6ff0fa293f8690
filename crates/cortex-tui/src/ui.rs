use chrono::Local;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, Borders, Paragraph},
};
use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};
use cortex_core::{ChatMessage, ChatRole};
use crate::app::{App, QUICK_ACTIONS};
use crate::markdown;

const ACCENT: Color = Color::Cyan;

pub fn render(app: &mut App, frame: &mut Frame) {
    let area = frame.area();

    let [header_area, chat_area, input_area, actions_area, footer_area] = Layout::vertical([
        Constraint::Length(1),
        Constraint::Min(0),
        Constraint::Length(3),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);

    render_header(app, frame, header_area);
    render_chat(app, frame, chat_area);
    render_input(app, frame, input_area);
    render_quick_actions(app, frame, actions_area);
    render_footer(app, frame, footer_area);
}

fn render_header(app: &App, frame: &mut Frame, area: Rect) {
    let key_status = if app.has_api_key {
        Span::raw("")
    } else {
        Span::styled(" GEMINI_API_KEY not set ", Style::default().fg(Color::White).bg(Color::Red))
    };

    let title = Line::from(vec![
        Span::styled(" Cortex ", Style::default().fg(ACCENT).bold()),
        Span::styled(
            format!("v{} ", env!("CARGO_PKG_VERSION")),
            Style::default().fg(Color::Black).bg(ACCENT),
        ),
        Span::styled(" NEURAL ASSISTANT // CODING SPECIALIST ", Style::default().fg(Color::Gray)),
        Span::styled("│ Created by Kushal ", Style::default().fg(Color::DarkGray)),
        Span::styled(format!("│ {} ", app.model), Style::default().fg(Color::DarkGray)),
        key_status,
    ]);

    let header = Paragraph::new(title).style(Style::default().bg(Color::Black));
    frame.render_widget(header, area);
}

fn message_header(msg: &ChatMessage) -> Line<'static> {
    let color = match msg.role {
        ChatRole::User => Color::White,
        ChatRole::Assistant => ACCENT,
    };
    let time = msg.timestamp.with_timezone(&Local).format("%H:%M").to_string();
    Line::from(vec![
        Span::styled(
            format!("{}:", msg.role.label()),
            Style::default().fg(color).add_modifier(Modifier::BOLD),
        ),
        Span::styled(format!(" {}", time), Style::default().fg(Color::DarkGray)),
    ])
}

/// Every line of the chat pane, before wrapping
pub fn chat_lines(app: &App) -> Vec<Line<'static>> {
    let mut lines: Vec<Line<'static>> = Vec::new();

    for msg in app.conversation.messages() {
        lines.push(message_header(msg));
        match msg.role {
            ChatRole::User => {
                for line in msg.content.lines() {
                    lines.push(Line::from(line.to_string()));
                }
            }
            ChatRole::Assistant => lines.extend(markdown::render(&msg.content)),
        }
        lines.push(Line::default());
    }

    if app.is_busy() {
        lines.push(Line::from(Span::styled(
            format!("{}:", ChatRole::Assistant.label()),
            Style::default().fg(ACCENT).add_modifier(Modifier::BOLD),
        )));
        // Animated ellipsis: cycles through ".", "..", "..."
        let dots = ".".repeat((app.animation_frame as usize) + 1);
        lines.push(Line::from(Span::styled(
            format!("Thinking{}", dots),
            Style::default().fg(Color::DarkGray).add_modifier(Modifier::ITALIC),
        )));
    }

    lines
}

/// Word-wrap `lines` to `width` columns, keeping span styles.
///
/// The chat pane draws these rows as-is, so the row count is exactly what
/// the scroll bounds are computed from. Words wider than a row are split.
pub fn wrap_lines(lines: &[Line<'static>], width: u16) -> Vec<Line<'static>> {
    let mut rows = RowBuilder::new(usize::from(width.max(1)));

    for line in lines {
        if line.width() <= rows.width {
            rows.rows.push(line.clone());
            continue;
        }

        rows.start(line.style);
        for span in &line.spans {
            for token in split_words(&span.content) {
                if token.starts_with(char::is_whitespace) {
                    rows.push_space(token, span.style);
                } else {
                    rows.push_word(token, span.style);
                }
            }
        }
        rows.finish();
    }

    rows.rows
}

struct RowBuilder {
    width: usize,
    rows: Vec<Line<'static>>,
    style: Style,
    current: Vec<Span<'static>>,
    current_width: usize,
    first_row: usize,
}

impl RowBuilder {
    fn new(width: usize) -> Self {
        Self {
            width,
            rows: Vec::new(),
            style: Style::default(),
            current: Vec::new(),
            current_width: 0,
            first_row: 0,
        }
    }

    fn start(&mut self, style: Style) {
        self.style = style;
        self.first_row = self.rows.len();
    }

    fn break_row(&mut self) {
        let spans = std::mem::take(&mut self.current);
        self.rows.push(Line::from(spans).style(self.style));
        self.current_width = 0;
    }

    fn push(&mut self, text: &str, style: Style, width: usize) {
        self.current.push(Span::styled(text.to_string(), style));
        self.current_width += width;
    }

    fn push_space(&mut self, text: &str, style: Style) {
        let width = text.width();
        if self.current_width == 0 && self.rows.len() > self.first_row {
            // No leading whitespace on continuation rows
            return;
        }
        if self.current_width + width <= self.width {
            self.push(text, style, width);
        } else {
            self.break_row();
        }
    }

    fn push_word(&mut self, word: &str, style: Style) {
        let width = word.width();
        if self.current_width + width <= self.width {
            self.push(word, style, width);
            return;
        }
        if width <= self.width {
            self.break_row();
            self.push(word, style, width);
            return;
        }

        let mut chunk = String::new();
        let mut chunk_width = 0;
        for c in word.chars() {
            let cw = c.width().unwrap_or(0);
            if self.current_width + chunk_width + cw > self.width
                && self.current_width + chunk_width > 0
            {
                if !chunk.is_empty() {
                    self.push(&chunk, style, chunk_width);
                }
                self.break_row();
                chunk.clear();
                chunk_width = 0;
            }
            chunk.push(c);
            chunk_width += cw;
        }
        if !chunk.is_empty() {
            self.push(&chunk, style, chunk_width);
        }
    }

    fn finish(&mut self) {
        if !self.current.is_empty() || self.rows.len() == self.first_row {
            self.break_row();
        }
    }
}

/// Split into alternating runs of whitespace and non-whitespace
fn split_words(text: &str) -> Vec<&str> {
    let mut tokens = Vec::new();
    let mut start = 0;
    let mut prev_space = None;

    for (i, c) in text.char_indices() {
        let space = c.is_whitespace();
        if prev_space.is_some_and(|prev| prev != space) {
            tokens.push(&text[start..i]);
            start = i;
        }
        prev_space = Some(space);
    }
    if start < text.len() {
        tokens.push(&text[start..]);
    }

    tokens
}

fn render_chat(app: &mut App, frame: &mut Frame, area: Rect) {
    app.chat_area = Some(area);
    app.chat_height = area.height.saturating_sub(2);
    app.chat_width = area.width.saturating_sub(2);

    let lines = wrap_lines(&chat_lines(app), app.chat_width);
    app.update_scroll(u16::try_from(lines.len()).unwrap_or(u16::MAX));

    let border_color = if app.is_busy() { ACCENT } else { Color::DarkGray };
    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(format!(" Conversation ({} messages) ", app.conversation.len()));

    let chat = Paragraph::new(Text::from(lines))
        .block(block)
        .scroll((app.chat_scroll, 0));

    frame.render_widget(chat, area);
}

fn render_input(app: &App, frame: &mut Frame, area: Rect) {
    let busy = app.is_busy();
    let border_color = if busy { Color::DarkGray } else { Color::Yellow };

    let input_block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .title(if busy { " Waiting for Cortex... " } else { " Ask " });

    // Calculate visible portion of input with horizontal scrolling
    // Inner width = total width - 2 (for borders) - 2 (for the prompt)
    let inner_width = area.width.saturating_sub(4) as usize;
    let cursor_pos = app.cursor;

    let scroll_offset = if inner_width == 0 {
        0
    } else if cursor_pos >= inner_width {
        cursor_pos - inner_width + 1
    } else {
        0
    };

    let body = if app.input.is_empty() {
        Span::styled("Ask Cortex for code or daily help...", Style::default().fg(Color::DarkGray))
    } else {
        // Pasted newlines are kept in the message but drawn as a single glyph
        let visible_text: String = app.input
            .chars()
            .skip(scroll_offset)
            .take(inner_width)
            .map(|c| if c == '\n' { '↵' } else { c })
            .collect();
        let style = if busy {
            Style::default().fg(Color::DarkGray)
        } else {
            Style::default().fg(Color::White)
        };
        Span::styled(visible_text, style)
    };

    let input = Paragraph::new(Line::from(vec![
        Span::styled("› ", Style::default().fg(Color::DarkGray)),
        body,
    ]))
    .block(input_block);

    frame.render_widget(input, area);

    if !busy {
        let cursor_x = (cursor_pos - scroll_offset) as u16;
        frame.set_cursor_position((area.x + cursor_x + 3, area.y + 1));
    }
}

fn render_quick_actions(app: &App, frame: &mut Frame, area: Rect) {
    let style = if app.is_busy() {
        Style::default().fg(Color::DarkGray)
    } else {
        Style::default().fg(Color::Gray)
    };

    let mut spans = vec![Span::raw(" ")];
    for (i, action) in QUICK_ACTIONS.iter().enumerate() {
        spans.push(Span::styled(
            format!(" F{} ", i + 1),
            Style::default().bg(Color::DarkGray).fg(Color::White),
        ));
        spans.push(Span::styled(format!(" {}  ", action.to_uppercase()), style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

fn render_footer(app: &App, frame: &mut Frame, area: Rect) {
    let (mode_text, mode_style) = if app.is_busy() {
        (" SENDING ", Style::default().bg(ACCENT).fg(Color::Black))
    } else {
        (" READY ", Style::default().bg(Color::Blue).fg(Color::White))
    };

    // Key style: dark background with bright text for visibility on both light/dark terminals
    let key_style = Style::default().bg(Color::DarkGray).fg(Color::White);
    let label_style = Style::default().fg(Color::Gray);

    let hints = [
        ("Enter", "send"),
        ("↑↓/PgUp/PgDn", "scroll"),
        ("Ctrl+L", "clear chat"),
        ("Ctrl+U", "clear input"),
        ("Esc", "quit"),
    ];

    let mut spans = vec![Span::styled(mode_text, mode_style), Span::raw(" ")];
    for (key, label) in hints {
        spans.push(Span::styled(format!(" {} ", key), key_style));
        spans.push(Span::styled(format!(" {} ", label), label_style));
    }

    frame.render_widget(Paragraph::new(Line::from(spans)), area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use cortex_core::{ChatError, ChatService, TranscriptEntry, TurnExecutor};
    use ratatui::{backend::TestBackend, Terminal};
    use std::sync::Arc;

    struct NeverCalled;

    #[async_trait]
    impl ChatService for NeverCalled {
        async fn send_turn(
            &self,
            _message: &str,
            _history: &[TranscriptEntry],
        ) -> Result<Option<String>, ChatError> {
            Ok(None)
        }
    }

    fn app() -> App {
        App::new(TurnExecutor::new(Arc::new(NeverCalled)), "test-model", true)
    }

    fn text_of(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_wrap_lines_breaks_on_word_boundaries() {
        let lines = vec![Line::from("aaaa bbbb cccc"), Line::default(), Line::from("short")];
        let wrapped = wrap_lines(&lines, 9);
        assert_eq!(text_of(&wrapped), vec!["aaaa bbbb", "cccc", "", "short"]);
    }

    #[test]
    fn test_wrap_lines_splits_overlong_words() {
        let wrapped = wrap_lines(&[Line::from("a".repeat(25))], 10);
        let widths: Vec<usize> = wrapped.iter().map(Line::width).collect();
        assert_eq!(widths, vec![10, 10, 5]);
    }

    #[test]
    fn test_wrap_lines_keeps_span_styles() {
        let bold = Style::default().add_modifier(Modifier::BOLD);
        let line = Line::from(vec![Span::styled("hello", bold), Span::raw(" world")]);
        let wrapped = wrap_lines(&[line], 5);

        assert_eq!(text_of(&wrapped), vec!["hello", "world"]);
        assert_eq!(wrapped[0].spans[0].style, bold);
    }

    #[test]
    fn test_rows_fit_the_pane_width() {
        let lines = vec![Line::from("lorem ipsum dolor sit amet consectetur adipiscing elit")];
        for width in 1..20u16 {
            assert!(wrap_lines(&lines, width).iter().all(|l| l.width() <= usize::from(width)));
        }
    }

    #[test]
    fn test_long_reply_tail_is_visible_when_following() {
        let mut app = app();
        let mut reply = "abcdefgh ".repeat(30);
        reply.push_str("ENDMARKER");
        app.conversation.push_assistant(&reply);

        let mut terminal = Terminal::new(TestBackend::new(24, 14)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(app.follow_tail);
        assert_eq!(app.chat_scroll, app.max_scroll);
        assert!(screen.contains("ENDMARKER"));
    }

    #[test]
    fn test_chat_lines_show_greeting() {
        let app = app();
        let text = text_of(&chat_lines(&app));
        assert!(text[0].starts_with("Cortex:"));
        assert!(text[1].starts_with("Hello! I'm Cortex."));
    }

    #[tokio::test]
    async fn test_chat_lines_show_thinking_while_busy() {
        let mut app = app();
        app.input = "hi".to_string();
        app.submit();

        let text = text_of(&chat_lines(&app));
        assert!(text.iter().any(|l| l.starts_with("You:")));
        assert_eq!(text.last().map(String::as_str), Some("Thinking."));
    }

    #[test]
    fn test_render_draws_header_and_placeholder() {
        let mut app = app();
        let mut terminal = Terminal::new(TestBackend::new(100, 20)).unwrap();
        terminal.draw(|frame| render(&mut app, frame)).unwrap();

        let buffer = terminal.backend().buffer();
        let screen: String = buffer.content().iter().map(|c| c.symbol()).collect();
        assert!(screen.contains("Cortex"));
        assert!(screen.contains("Ask Cortex for code or daily help..."));
        assert!(app.chat_area.is_some());
    }
}

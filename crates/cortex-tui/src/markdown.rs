//! Markdown to terminal lines
//!
//! Assistant replies are markdown. They are turned into styled ratatui lines
//! here. Raw HTML is shown as literal text and never interpreted.

use pulldown_cmark::{CodeBlockKind, Event, Options, Parser, Tag, TagEnd};
use ratatui::{
    style::{Color, Modifier, Style},
    text::{Line, Span},
};

pub fn render(text: &str) -> Vec<Line<'static>> {
    let mut renderer = Renderer::default();
    let parser = Parser::new_ext(text, Options::ENABLE_STRIKETHROUGH | Options::ENABLE_TASKLISTS);
    for event in parser {
        renderer.handle(event);
    }
    renderer.finish()
}

fn code_style() -> Style {
    Style::default().fg(Color::LightGreen)
}

fn muted_style() -> Style {
    Style::default().fg(Color::DarkGray)
}

#[derive(Default)]
struct Renderer {
    lines: Vec<Line<'static>>,
    current: Vec<Span<'static>>,
    styles: Vec<Style>,
    /// Next number for ordered lists, `None` for bullets
    lists: Vec<Option<u64>>,
    quote_depth: usize,
    in_code_block: bool,
    link_urls: Vec<String>,
}

impl Renderer {
    fn style(&self) -> Style {
        self.styles.last().copied().unwrap_or_default()
    }

    fn push_style(&mut self, style: Style) {
        let patched = self.style().patch(style);
        self.styles.push(patched);
    }

    fn handle(&mut self, event: Event) {
        match event {
            Event::Start(tag) => self.start(tag),
            Event::End(tag) => self.end(tag),
            Event::Text(text) => {
                if self.in_code_block {
                    self.push_literal(&text, code_style());
                } else {
                    let style = self.style();
                    self.current.push(Span::styled(text.into_string(), style));
                }
            }
            Event::Code(code) => {
                self.current.push(Span::styled(code.into_string(), code_style()));
            }
            Event::Html(html) | Event::InlineHtml(html) => {
                let style = self.style();
                self.push_literal(&html, style);
            }
            Event::SoftBreak | Event::HardBreak => self.flush(),
            Event::Rule => {
                self.flush();
                self.lines.push(Line::from(Span::styled("─".repeat(24), muted_style())));
            }
            Event::TaskListMarker(checked) => {
                let marker = if checked { "[x] " } else { "[ ] " };
                self.current.push(Span::styled(marker, muted_style()));
            }
            _ => {}
        }
    }

    fn start(&mut self, tag: Tag) {
        match tag {
            Tag::Heading { .. } => {
                self.flush();
                self.push_style(Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD));
            }
            Tag::BlockQuote(_) => {
                self.flush();
                self.quote_depth += 1;
                self.push_style(Style::default().add_modifier(Modifier::ITALIC));
            }
            Tag::CodeBlock(kind) => {
                self.flush();
                self.in_code_block = true;
                if let CodeBlockKind::Fenced(lang) = kind {
                    if !lang.is_empty() {
                        self.lines.push(Line::from(Span::styled(
                            format!("  {}", lang),
                            muted_style().add_modifier(Modifier::ITALIC),
                        )));
                    }
                }
            }
            Tag::List(start) => {
                self.flush();
                self.lists.push(start);
            }
            Tag::Item => {
                self.flush();
                let depth = self.lists.len().saturating_sub(1);
                let marker = match self.lists.last_mut() {
                    Some(Some(n)) => {
                        let marker = format!("{}. ", n);
                        *n += 1;
                        marker
                    }
                    _ => "• ".to_string(),
                };
                self.current.push(Span::raw("  ".repeat(depth)));
                self.current.push(Span::styled(marker, Style::default().fg(Color::Yellow)));
            }
            Tag::Emphasis => self.push_style(Style::default().add_modifier(Modifier::ITALIC)),
            Tag::Strong => self.push_style(Style::default().add_modifier(Modifier::BOLD)),
            Tag::Strikethrough => {
                self.push_style(Style::default().add_modifier(Modifier::CROSSED_OUT))
            }
            Tag::Link { dest_url, .. } | Tag::Image { dest_url, .. } => {
                self.link_urls.push(dest_url.into_string());
                self.push_style(
                    Style::default()
                        .fg(Color::Blue)
                        .add_modifier(Modifier::UNDERLINED),
                );
            }
            _ => {}
        }
    }

    fn end(&mut self, tag: TagEnd) {
        match tag {
            TagEnd::Paragraph => {
                self.flush();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::Heading(_) => {
                self.flush();
                self.styles.pop();
                self.blank();
            }
            TagEnd::BlockQuote(_) => {
                self.flush();
                self.styles.pop();
                self.quote_depth = self.quote_depth.saturating_sub(1);
                self.blank();
            }
            TagEnd::CodeBlock => {
                self.flush();
                self.in_code_block = false;
                self.blank();
            }
            TagEnd::List(_) => {
                self.flush();
                self.lists.pop();
                if self.lists.is_empty() {
                    self.blank();
                }
            }
            TagEnd::HtmlBlock => {
                self.flush();
                self.blank();
            }
            TagEnd::Item => self.flush(),
            TagEnd::Emphasis | TagEnd::Strong | TagEnd::Strikethrough => {
                self.styles.pop();
            }
            TagEnd::Link | TagEnd::Image => {
                self.styles.pop();
                if let Some(url) = self.link_urls.pop() {
                    if !url.is_empty() {
                        self.current.push(Span::styled(format!(" ({})", url), muted_style()));
                    }
                }
            }
            _ => {}
        }
    }

    /// Text whose newlines are real line breaks (code blocks, raw HTML)
    fn push_literal(&mut self, text: &str, style: Style) {
        let mut pieces = text.split('\n').peekable();
        while let Some(piece) = pieces.next() {
            if !piece.is_empty() {
                let piece = if self.in_code_block && self.current.is_empty() {
                    format!("  {}", piece)
                } else {
                    piece.to_string()
                };
                self.current.push(Span::styled(piece, style));
            }
            if pieces.peek().is_some() {
                self.flush_keep_empty();
            }
        }
    }

    fn flush(&mut self) {
        if !self.current.is_empty() {
            self.flush_keep_empty();
        }
    }

    fn flush_keep_empty(&mut self) {
        let mut spans = Vec::with_capacity(self.current.len() + 1);
        if self.quote_depth > 0 {
            spans.push(Span::styled("│ ".repeat(self.quote_depth), muted_style()));
        }
        spans.append(&mut self.current);
        self.lines.push(Line::from(spans));
    }

    fn blank(&mut self) {
        if self.lines.last().is_some_and(|l| l.width() > 0) {
            self.lines.push(Line::default());
        }
    }

    fn finish(mut self) -> Vec<Line<'static>> {
        self.flush();
        while self.lines.last().is_some_and(|l| l.width() == 0) {
            self.lines.pop();
        }
        self.lines
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn plain(lines: &[Line]) -> Vec<String> {
        lines
            .iter()
            .map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect())
            .collect()
    }

    #[test]
    fn test_bold_span_is_styled() {
        let lines = render("**bold** text");
        assert_eq!(plain(&lines), vec!["bold text"]);

        let bold = &lines[0].spans[0];
        assert_eq!(bold.content, "bold");
        assert!(bold.style.add_modifier.contains(Modifier::BOLD));
        assert!(!lines[0].spans[1].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_fenced_code_block_keeps_lines() {
        let lines = render("```rust\nfn main() {\n    println!(\"hi\");\n}\n```");
        let text = plain(&lines);
        assert_eq!(text[0], "  rust");
        assert_eq!(text[1], "  fn main() {");
        assert_eq!(text[2], "      println!(\"hi\");");
        assert_eq!(text[3], "  }");
    }

    #[test]
    fn test_bullet_and_ordered_lists() {
        let text = plain(&render("- apples\n- pears\n\n1. first\n2. second"));
        assert_eq!(text, vec!["• apples", "• pears", "", "1. first", "2. second"]);
    }

    #[test]
    fn test_nested_list_is_indented() {
        let text = plain(&render("- outer\n  - inner"));
        assert_eq!(text, vec!["• outer", "  • inner"]);
    }

    #[test]
    fn test_paragraphs_are_separated_by_blank_line() {
        let text = plain(&render("First paragraph.\n\nSecond paragraph."));
        assert_eq!(text, vec!["First paragraph.", "", "Second paragraph."]);
    }

    #[test]
    fn test_html_is_shown_literally() {
        let text = plain(&render("<script>alert(1)</script>"));
        assert_eq!(text, vec!["<script>alert(1)</script>"]);
    }

    #[test]
    fn test_link_shows_destination() {
        let text = plain(&render("see [docs](https://example.com)"));
        assert_eq!(text, vec!["see docs (https://example.com)"]);
    }

    #[test]
    fn test_heading_and_quote() {
        let lines = render("# Title\n\n> quoted");
        let text = plain(&lines);
        assert_eq!(text, vec!["Title", "", "│ quoted"]);
        assert!(lines[0].spans[0].style.add_modifier.contains(Modifier::BOLD));
    }

    #[test]
    fn test_inline_code_is_highlighted() {
        let lines = render("call `useState` here");
        assert_eq!(lines[0].spans[1].content, "useState");
        assert_eq!(lines[0].spans[1].style.fg, Some(Color::LightGreen));
    }
}

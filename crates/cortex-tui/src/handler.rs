use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::App;
use crate::tui::AppEvent;

const WHEEL_STEP: u16 = 3;

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

pub async fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Paste(text) => insert_text(app, &text),
        AppEvent::Resize => {}
        AppEvent::Tick => {
            app.tick_animation();
            app.poll_turn().await;
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);

    match key.code {
        // Global keys
        KeyCode::Char('c') if ctrl => app.should_quit = true,
        KeyCode::Esc => app.should_quit = true,
        KeyCode::Char('l') if ctrl => app.clear_chat(),

        KeyCode::F(n @ 1..=3) => app.apply_quick_action(usize::from(n - 1)),

        // Chat scrolling
        KeyCode::Up => app.scroll_up(1),
        KeyCode::Down => app.scroll_down(1),
        KeyCode::PageUp => app.scroll_up(app.page_size()),
        KeyCode::PageDown => app.scroll_down(app.page_size()),

        KeyCode::Enter => app.submit(),

        // Input editing is disabled while a reply is pending
        _ if app.is_busy() => {}

        KeyCode::Backspace => {
            if app.cursor > 0 {
                app.cursor -= 1;
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Delete => {
            let char_count = app.input.chars().count();
            if app.cursor < char_count {
                let byte_pos = char_to_byte_index(&app.input, app.cursor);
                app.input.remove(byte_pos);
            }
        }
        KeyCode::Left => {
            app.cursor = app.cursor.saturating_sub(1);
        }
        KeyCode::Right => {
            let char_count = app.input.chars().count();
            app.cursor = (app.cursor + 1).min(char_count);
        }
        KeyCode::Home => {
            app.cursor = 0;
        }
        KeyCode::End => {
            app.cursor = app.input.chars().count();
        }
        KeyCode::Char('u') if ctrl => {
            app.input.clear();
            app.cursor = 0;
        }
        KeyCode::Char(c) if !ctrl => {
            let byte_pos = char_to_byte_index(&app.input, app.cursor);
            app.input.insert(byte_pos, c);
            app.cursor += 1;
        }
        _ => {}
    }
}

fn insert_text(app: &mut App, text: &str) {
    if app.is_busy() {
        return;
    }
    let text = text.replace("\r\n", "\n").replace('\r', "\n");
    let byte_pos = char_to_byte_index(&app.input, app.cursor);
    app.input.insert_str(byte_pos, &text);
    app.cursor += text.chars().count();
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let in_chat = app
        .chat_area
        .map(|r| point_in_rect(mouse.column, mouse.row, r))
        .unwrap_or(false);
    if !in_chat {
        return;
    }

    match mouse.kind {
        MouseEventKind::ScrollDown => app.scroll_down(WHEEL_STEP),
        MouseEventKind::ScrollUp => app.scroll_up(WHEEL_STEP),
        _ => {}
    }
}

use anyhow::Result;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind};
use ratatui::layout::Rect;
use crate::app::{App, InputMode};
use crate::controller::TextField;
use crate::tui::AppEvent;

pub fn handle_event(app: &mut App, event: AppEvent) -> Result<()> {
    match event {
        AppEvent::Key(key) => handle_key(app, key),
        AppEvent::Mouse(mouse) => handle_mouse(app, mouse),
        AppEvent::Resize(_, _) => {}
        AppEvent::Tick => {
            app.tick_animation();
        }
    }
    Ok(())
}

fn handle_key(app: &mut App, key: KeyEvent) {
    // Global keys that work in any mode
    if key.modifiers.contains(KeyModifiers::CONTROL) {
        match key.code {
            KeyCode::Char('c') => {
                app.should_quit = true;
                return;
            }
            KeyCode::Char('o') => {
                app.open_file_prompt();
                return;
            }
            _ => {}
        }
    }

    // The file prompt captures all keys while open
    if app.file_prompt.is_some() {
        handle_file_prompt(app, key);
        return;
    }

    match app.input_mode {
        InputMode::Normal => handle_normal_mode(app, key),
        InputMode::Editing => handle_editing_mode(app, key),
    }
}

fn handle_normal_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        // Quit
        KeyCode::Char('q') => app.should_quit = true,

        // Back to typing
        KeyCode::Char('i') | KeyCode::Enter => app.input_mode = InputMode::Editing,

        KeyCode::Char('u') => app.open_file_prompt(),

        KeyCode::Char('D') => app.toggle_debug_window(),

        // Transcript scrolling
        KeyCode::Char('j') | KeyCode::Down => app.controller.transcript_mut().scroll_down(1),
        KeyCode::Char('k') | KeyCode::Up => app.controller.transcript_mut().scroll_up(1),
        KeyCode::Char('d') | KeyCode::PageDown => {
            let half_page = half_page(app);
            app.controller.transcript_mut().scroll_down(half_page);
        }
        KeyCode::Char('b') | KeyCode::PageUp => {
            let half_page = half_page(app);
            app.controller.transcript_mut().scroll_up(half_page);
        }
        KeyCode::Char('g') | KeyCode::Home => app.controller.transcript_mut().scroll_to_top(),
        KeyCode::Char('G') | KeyCode::End => app.controller.transcript_mut().scroll_to_bottom(),

        // Debug window scrolling
        KeyCode::Char('J') => app.debug_scroll = app.debug_scroll.saturating_add(1),
        KeyCode::Char('K') => app.debug_scroll = app.debug_scroll.saturating_sub(1),

        _ => {}
    }
}

fn handle_editing_mode(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => {
            app.input_mode = InputMode::Normal;
        }
        KeyCode::Enter => {
            app.submit_query();
        }
        _ => edit_field(app.controller.query_field_mut(), key),
    }
}

fn handle_file_prompt(app: &mut App, key: KeyEvent) {
    match key.code {
        KeyCode::Esc => app.cancel_file_prompt(),
        KeyCode::Enter => app.confirm_file_prompt(),
        _ => {
            if let Some(field) = app.file_prompt.as_mut() {
                edit_field(field, key);
            }
        }
    }
}

fn edit_field(field: &mut TextField, key: KeyEvent) {
    match key.code {
        KeyCode::Backspace => field.backspace(),
        KeyCode::Delete => field.delete(),
        KeyCode::Left => field.move_left(),
        KeyCode::Right => field.move_right(),
        KeyCode::Home => field.move_home(),
        KeyCode::End => field.move_end(),
        KeyCode::Char(c) => field.insert(c),
        _ => {}
    }
}

fn half_page(app: &App) -> u16 {
    app.transcript_area
        .map(|area| area.height.saturating_sub(2) / 2)
        .unwrap_or(5)
        .max(1)
}

/// Check if a point is within a rectangle
fn point_in_rect(x: u16, y: u16, rect: Rect) -> bool {
    x >= rect.x && x < rect.x + rect.width && y >= rect.y && y < rect.y + rect.height
}

fn handle_mouse(app: &mut App, mouse: MouseEvent) {
    let x = mouse.column;
    let y = mouse.row;

    let hit = |area: Option<Rect>| area.map(|r| point_in_rect(x, y, r)).unwrap_or(false);

    match mouse.kind {
        MouseEventKind::ScrollDown => {
            if hit(app.transcript_area) {
                app.controller.transcript_mut().scroll_down(3);
            }
        }
        MouseEventKind::ScrollUp => {
            if hit(app.transcript_area) {
                app.controller.transcript_mut().scroll_up(3);
            }
        }
        MouseEventKind::Down(MouseButton::Left) => {
            // Buttons are inert while the file prompt is open
            if app.file_prompt.is_some() {
                return;
            }
            if hit(app.send_button_area) {
                app.submit_query();
            } else if hit(app.upload_button_area) {
                app.open_file_prompt();
            } else if hit(app.input_area) {
                app.input_mode = InputMode::Editing;
            }
        }
        _ => {}
    }
}

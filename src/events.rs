use std::time::Duration;

use anyhow::Result;
use crossterm::event::{
    self, Event, KeyCode, KeyEvent, KeyModifiers, MouseButton, MouseEvent, MouseEventKind,
};

use crate::app::{App, Prompt, View};
use crate::ui::common::tab_at;

/// Rows between the top of the content area and the first table row:
/// the filter/date bar, the table border and the column header.
const ROWS_ABOVE_ITEMS: u16 = 3;

/// Poll for events with a timeout
pub fn poll_event(timeout: Duration) -> Result<Option<Event>> {
    if event::poll(timeout)? {
        Ok(Some(event::read()?))
    } else {
        Ok(None)
    }
}

/// Handle a key event
pub fn handle_key_event(app: &mut App, key: KeyEvent) {
    // Ctrl-C always quits, even from a form
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        app.quit();
        return;
    }

    // If help is shown, any key closes it
    if app.show_help {
        app.show_help = false;
        return;
    }

    // Forms capture all input
    match app.prompt {
        Some(Prompt::Login(_)) => {
            handle_login_input(app, key);
            return;
        }
        Some(Prompt::Upload(_)) => {
            handle_upload_input(app, key);
            return;
        }
        None => {}
    }

    // If detail overlay is shown, handle overlay-specific keys
    if app.show_detail_overlay {
        match key.code {
            KeyCode::Esc | KeyCode::Enter | KeyCode::Backspace | KeyCode::Char('q') => {
                app.close_overlay();
            }
            // Allow scrolling through rows while overlay is open
            KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
            KeyCode::Down | KeyCode::Char('j') => app.select_next(),
            KeyCode::PageUp => app.select_prev_n(10),
            KeyCode::PageDown => app.select_next_n(10),
            KeyCode::Home => app.select_first(),
            KeyCode::End => app.select_last(),
            _ => {}
        }
        return;
    }

    // If filter input is active, handle text input
    if app.filter_active {
        handle_filter_input(app, key);
        return;
    }

    match key.code {
        // Quit
        KeyCode::Char('q') => app.quit(),

        // View switching
        KeyCode::Tab => {
            if key.modifiers.contains(KeyModifiers::SHIFT) {
                app.prev_view();
            } else {
                app.next_view();
            }
        }
        KeyCode::BackTab => app.prev_view(),

        // Direct view access
        KeyCode::Char(c @ '1'..='5') => {
            let index = c as usize - '1' as usize;
            app.set_view(View::ALL[index]);
        }

        // Navigation (up/down for rows, left/right for tabs)
        KeyCode::Up | KeyCode::Char('k') => app.select_prev(),
        KeyCode::Down | KeyCode::Char('j') => app.select_next(),
        KeyCode::Left | KeyCode::Char('h') => app.prev_view(),
        KeyCode::Right | KeyCode::Char('l') => app.next_view(),
        KeyCode::PageUp => app.select_prev_n(10),
        KeyCode::PageDown => app.select_next_n(10),
        KeyCode::Home => app.select_first(),
        KeyCode::End => app.select_last(),

        // Enter detail overlay
        KeyCode::Enter => app.enter_detail(),

        // Go back (Esc and Backspace)
        KeyCode::Esc | KeyCode::Backspace => app.go_back(),

        // Reload
        KeyCode::Char('r') => app.reload(),

        // Help
        KeyCode::Char('?') => app.toggle_help(),

        // Sorting
        KeyCode::Char('s') => app.cycle_sort(),
        KeyCode::Char('S') => app.toggle_sort_direction(),
        KeyCode::Char('x') => app.clear_sort(),

        // Paging
        KeyCode::Char('n') => app.next_page(),
        KeyCode::Char('p') => app.prev_page(),
        KeyCode::Char('z') => app.cycle_page_size(),

        // Server-side filters
        KeyCode::Char('P') => app.cycle_province(),
        KeyCode::Char('D') => app.cycle_district(),
        KeyCode::Char('v') => app.cycle_risk_level(),

        // Date
        KeyCode::Char('[') => app.shift_date(-1),
        KeyCode::Char(']') => app.shift_date(1),
        KeyCode::Char('X') => app.clear_date_filter(),

        // Filter (start typing to filter)
        KeyCode::Char('/') => app.start_filter(),

        // Clear filter
        KeyCode::Char('c') => {
            if !app.filter_text.is_empty() {
                app.clear_filter();
            }
        }

        // Session and uploads
        KeyCode::Char('u') => app.open_upload(),
        KeyCode::Char('L') => app.logout(),

        // Export
        KeyCode::Char('e') => {
            let export_path = app.export_path();
            match app.export_state(&export_path) {
                Ok(()) => {
                    app.set_status_message(format!("Exported to {}", export_path.display()));
                }
                Err(e) => {
                    app.set_status_message(format!("Export failed: {}", e));
                }
            }
        }

        _ => {}
    }
}

/// Handle key input while filter is active
fn handle_filter_input(app: &mut App, key: KeyEvent) {
    match key.code {
        // Confirm filter
        KeyCode::Enter => {
            app.filter_active = false;
        }

        // Cancel filter (keep text but exit input mode)
        KeyCode::Esc => {
            app.cancel_filter();
        }

        // Backspace
        KeyCode::Backspace => {
            app.filter_pop();
            if app.filter_text.is_empty() {
                app.filter_active = false;
            }
        }

        // Type characters
        KeyCode::Char(c) => {
            app.filter_push(c);
        }

        _ => {}
    }
}

/// Keys for the login form. Enter on the username moves to the password.
fn handle_login_input(app: &mut App, key: KeyEvent) {
    let Some(Prompt::Login(form)) = &mut app.prompt else {
        return;
    };
    if form.submitting {
        return;
    }
    match key.code {
        KeyCode::Tab | KeyCode::BackTab | KeyCode::Up | KeyCode::Down => form.toggle_focus(),
        KeyCode::Backspace => form.pop(),
        KeyCode::Enter => {
            if form.focus == crate::app::LoginField::Username {
                form.toggle_focus();
            } else {
                app.submit_login();
            }
        }
        KeyCode::Char(c) => form.push(c),
        _ => {}
    }
}

fn handle_upload_input(app: &mut App, key: KeyEvent) {
    let Some(Prompt::Upload(form)) = &mut app.prompt else {
        return;
    };
    if form.submitting {
        return;
    }
    match key.code {
        KeyCode::Esc => app.cancel_prompt(),
        KeyCode::Tab | KeyCode::BackTab => form.toggle_focus(),
        KeyCode::Left | KeyCode::Right => form.cycle_kind(),
        KeyCode::Backspace => form.pop(),
        KeyCode::Enter => app.submit_upload(),
        KeyCode::Char(c) => form.push(c),
        _ => {}
    }
}

/// Handle mouse events
pub fn handle_mouse_event(app: &mut App, mouse: MouseEvent, content_start_row: u16) {
    if app.prompt.is_some() || app.show_help {
        return;
    }

    match mouse.kind {
        // Scroll wheel
        MouseEventKind::ScrollUp => {
            app.select_prev();
        }
        MouseEventKind::ScrollDown => {
            app.select_next();
        }

        // Click to select
        MouseEventKind::Down(MouseButton::Left) => {
            let clicked_row = mouse.row;

            // Tabs sit on the row just above the content
            if clicked_row + 1 == content_start_row {
                if let Some(view) = tab_at(mouse.column) {
                    app.set_view(view);
                }
                return;
            }

            let first_item_row = content_start_row + ROWS_ABOVE_ITEMS;
            if clicked_row >= first_item_row && !app.show_detail_overlay {
                app.select_row((clicked_row - first_item_row) as usize);
            }
        }

        // Right-click goes back
        MouseEventKind::Down(MouseButton::Right) => {
            app.go_back();
        }

        _ => {}
    }
}

use std::path::{Path, PathBuf};

use ratatui::layout::Rect;

use crate::api::DocumentClient;
use crate::config::Config;
use crate::controller::{ChatController, TextField};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputMode {
    Normal,
    Editing,
}

pub struct App {
    // Core state
    pub should_quit: bool,
    pub input_mode: InputMode,
    pub controller: ChatController,

    // File prompt state (None when closed)
    pub file_prompt: Option<TextField>,

    // Debug window
    pub show_debug_window: bool,
    pub debug_scroll: u16,

    // Animation state
    pub animation_frame: u8, // 0-2 for ellipsis animation

    // Panel areas for mouse hit-testing (updated during render)
    pub transcript_area: Option<Rect>,
    pub input_area: Option<Rect>,
    pub send_button_area: Option<Rect>,
    pub upload_button_area: Option<Rect>,
}

impl App {
    pub fn new(config: &Config) -> Self {
        let client = DocumentClient::new(&config.base_url);

        Self {
            should_quit: false,
            input_mode: InputMode::Editing,
            controller: ChatController::new(client, config.debug),

            file_prompt: None,

            show_debug_window: config.show_debug_window,
            debug_scroll: 0,

            animation_frame: 0,

            transcript_area: None,
            input_area: None,
            send_button_area: None,
            upload_button_area: None,
        }
    }

    pub fn submit_query(&mut self) {
        self.controller.submit_query();
    }

    pub fn open_file_prompt(&mut self) {
        self.file_prompt = Some(TextField::new());
    }

    pub fn cancel_file_prompt(&mut self) {
        self.file_prompt = None;
    }

    /// Close the prompt and upload whatever path it holds.
    pub fn confirm_file_prompt(&mut self) {
        if let Some(field) = self.file_prompt.take() {
            self.controller.select_file(parse_selection(field.text()));
        }
    }

    pub fn debug_window_visible(&self) -> bool {
        self.controller.is_debug() && self.show_debug_window
    }

    pub fn toggle_debug_window(&mut self) {
        self.show_debug_window = !self.show_debug_window;
    }

    /// The pending indicator only animates while a round trip is in flight
    pub fn is_animating(&self) -> bool {
        self.controller.pending() > 0
    }

    /// Tick animation frame (called by Tick event)
    pub fn tick_animation(&mut self) {
        if self.is_animating() {
            self.animation_frame = (self.animation_frame + 1) % 3;
        }
    }
}

/// Turn prompt text into a file selection. Blank text selects nothing.
pub fn parse_selection(text: &str) -> Option<PathBuf> {
    let text = text.trim();
    if text.is_empty() {
        return None;
    }

    Some(expand_home(Path::new(text)))
}

/// Replace a leading `~` component with the home directory.
pub fn expand_home(path: &Path) -> PathBuf {
    if let Ok(rest) = path.strip_prefix("~") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    path.to_path_buf()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_selection_is_none() {
        assert_eq!(parse_selection(""), None);
        assert_eq!(parse_selection("   "), None);
    }

    #[test]
    fn test_selection_is_trimmed() {
        assert_eq!(parse_selection("  notes.txt "), Some(PathBuf::from("notes.txt")));
    }

    #[test]
    fn test_home_prefix_expands() {
        if let Some(home) = dirs::home_dir() {
            assert_eq!(parse_selection("~/docs/a.pdf"), Some(home.join("docs/a.pdf")));
        }
    }

    #[test]
    fn test_expand_home_keeps_other_paths() {
        assert_eq!(expand_home(Path::new("/tmp/a.pdf")), PathBuf::from("/tmp/a.pdf"));
        assert_eq!(expand_home(Path::new("~notes.txt")), PathBuf::from("~notes.txt"));
        if let Some(home) = dirs::home_dir() {
            assert_eq!(expand_home(Path::new("~/a.pdf")), home.join("a.pdf"));
        }
    }

    #[cfg(unix)]
    #[test]
    fn test_expand_home_keeps_non_utf8_bytes() {
        use std::ffi::OsStr;
        use std::os::unix::ffi::OsStrExt;

        let raw = Path::new(OsStr::from_bytes(b"/tmp/r\xe9sum\xe9.txt"));
        assert_eq!(expand_home(raw), raw.to_path_buf());

        if let Some(home) = dirs::home_dir() {
            let under_home = Path::new(OsStr::from_bytes(b"~/r\xe9sum\xe9.txt"));
            let expanded = expand_home(under_home);
            assert_eq!(expanded, home.join(OsStr::from_bytes(b"r\xe9sum\xe9.txt")));
        }
    }

    #[tokio::test]
    async fn test_animation_runs_only_while_pending() {
        let mut app = App::new(&Config {
            base_url: "http://127.0.0.1:9".to_string(),
            ..Config::new()
        });
        assert!(!app.is_animating());
        app.tick_animation();
        assert_eq!(app.animation_frame, 0);

        app.controller.query_field_mut().set_text("hello");
        app.submit_query();
        assert!(app.is_animating());
        app.tick_animation();
        assert_eq!(app.animation_frame, 1);

        app.controller.settle().await;
        assert!(!app.is_animating());
    }

    #[test]
    fn test_cancelled_prompt_sends_nothing() {
        let mut app = App::new(&Config::new());
        app.open_file_prompt();
        if let Some(field) = app.file_prompt.as_mut() {
            field.set_text("report.pdf");
        }
        app.cancel_file_prompt();

        assert!(app.file_prompt.is_none());
        assert_eq!(app.controller.pending(), 0);
    }

    #[test]
    fn test_confirming_blank_prompt_is_noop() {
        let mut app = App::new(&Config::new());
        app.open_file_prompt();
        app.confirm_file_prompt();

        assert!(app.file_prompt.is_none());
        assert_eq!(app.controller.pending(), 0);
        assert!(app.controller.transcript().is_empty());
    }

    #[test]
    fn test_debug_window_needs_debug_mode() {
        let app = App::new(&Config::new());
        assert!(app.show_debug_window);
        assert!(!app.debug_window_visible());

        let mut app = App::new(&Config { debug: true, ..Config::new() });
        assert!(app.debug_window_visible());
        app.toggle_debug_window();
        assert!(!app.debug_window_visible());
    }
}

//! Request orchestration for the chat screen
//!
//! Each user action is one round trip: the request runs on its own tokio task
//! and its outcome comes back as a [`Reply`] over a channel. Replies are applied
//! to the transcript by whoever owns the controller, so the transcript only
//! ever has one writer. In-flight requests are independent of each other and
//! may complete in any order.

use std::future::Future;
use std::path::{Path, PathBuf};

use tokio::sync::mpsc;

use crate::api::DocumentClient;
use crate::transcript::{Message, Transcript, ERROR_PREFIX, NO_RESULTS_TEXT};

/// Outcome of one round trip
#[derive(Debug, Clone)]
pub struct Reply {
    pub message: Message,
    /// Diagnostics kept for the debug window when debug mode is on
    pub diagnostics: Vec<String>,
}

/// Convert a character index to a byte index for UTF-8 safe string operations
fn char_to_byte_index(s: &str, char_idx: usize) -> usize {
    s.char_indices()
        .nth(char_idx)
        .map(|(i, _)| i)
        .unwrap_or(s.len())
}

/// Single-line editable text with a character cursor
#[derive(Debug, Default, Clone)]
pub struct TextField {
    text: String,
    cursor: usize,
}

impl TextField {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn set_text(&mut self, text: &str) {
        self.text = text.to_string();
        self.cursor = self.text.chars().count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    pub fn insert(&mut self, c: char) {
        let byte_pos = char_to_byte_index(&self.text, self.cursor);
        self.text.insert(byte_pos, c);
        self.cursor += 1;
    }

    pub fn backspace(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn delete(&mut self) {
        let char_count = self.text.chars().count();
        if self.cursor < char_count {
            let byte_pos = char_to_byte_index(&self.text, self.cursor);
            self.text.remove(byte_pos);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        let char_count = self.text.chars().count();
        self.cursor = (self.cursor + 1).min(char_count);
    }

    pub fn move_home(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.text.chars().count();
    }
}

pub struct ChatController {
    client: DocumentClient,
    debug: bool,
    transcript: Transcript,
    query_field: TextField,
    pending: usize,
    debug_log: Vec<String>,
    reply_tx: mpsc::UnboundedSender<Reply>,
    reply_rx: mpsc::UnboundedReceiver<Reply>,
}

impl ChatController {
    pub fn new(client: DocumentClient, debug: bool) -> Self {
        let (reply_tx, reply_rx) = mpsc::unbounded_channel();
        Self {
            client,
            debug,
            transcript: Transcript::new(),
            query_field: TextField::new(),
            pending: 0,
            debug_log: Vec::new(),
            reply_tx,
            reply_rx,
        }
    }

    pub fn client(&self) -> &DocumentClient {
        &self.client
    }

    pub fn is_debug(&self) -> bool {
        self.debug
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn transcript_mut(&mut self) -> &mut Transcript {
        &mut self.transcript
    }

    pub fn query_field(&self) -> &TextField {
        &self.query_field
    }

    pub fn query_field_mut(&mut self) -> &mut TextField {
        &mut self.query_field
    }

    /// Number of round trips that have not been applied yet
    pub fn pending(&self) -> usize {
        self.pending
    }

    pub fn debug_log(&self) -> &[String] {
        &self.debug_log
    }

    /// Send the query field's contents.
    ///
    /// The user message is echoed and the field cleared before the request
    /// resolves. Returns false when the trimmed input is empty, in which case
    /// nothing is appended or sent.
    pub fn submit_query(&mut self) -> bool {
        let query = self.query_field.text().trim().to_string();
        if query.is_empty() {
            return false;
        }

        self.transcript.render(Message::user(query.clone()));
        self.query_field.clear();

        let client = self.client.clone();
        self.spawn(async move { query_round_trip(&client, &query).await });
        true
    }

    /// Upload the selected file, if any. Returns false when nothing was selected.
    pub fn select_file(&mut self, selection: Option<PathBuf>) -> bool {
        let Some(path) = selection else {
            return false;
        };

        let client = self.client.clone();
        self.spawn(async move { upload_round_trip(&client, &path).await });
        true
    }

    fn spawn<F>(&mut self, round_trip: F)
    where
        F: Future<Output = Reply> + Send + 'static,
    {
        self.pending += 1;
        let tx = self.reply_tx.clone();
        tokio::spawn(async move {
            let reply = round_trip.await;
            // The receiver lives as long as the controller
            let _ = tx.send(reply);
        });
    }

    /// Wait for the next finished round trip.
    pub async fn next_reply(&mut self) -> Option<Reply> {
        self.reply_rx.recv().await
    }

    pub fn apply(&mut self, reply: Reply) {
        self.pending = self.pending.saturating_sub(1);
        if self.debug {
            self.debug_log.extend(reply.diagnostics);
        }
        self.transcript.render(reply.message);
    }

    /// Wait for every in-flight round trip and apply it.
    pub async fn settle(&mut self) {
        while self.pending > 0 {
            match self.next_reply().await {
                Some(reply) => self.apply(reply),
                None => break,
            }
        }
    }
}

/// Run one query and turn its outcome into a transcript message.
pub async fn query_round_trip(client: &DocumentClient, query: &str) -> Reply {
    tracing::debug!(query, "sending query");

    match client.query(query).await {
        Ok(response) => {
            let mut diagnostics = vec![format!("Search results: {:?}", response.results)];
            diagnostics.extend(response.debug_logs);

            let message = match response.results {
                Some(results) if !results.is_empty() => {
                    tracing::info!(count = results.len(), "query answered");
                    Message::assistant(results)
                }
                _ => {
                    tracing::info!("query returned no results");
                    Message::assistant(NO_RESULTS_TEXT)
                }
            };

            Reply {
                message,
                diagnostics,
            }
        }
        Err(e) => {
            tracing::error!(error = %e, "query failed");
            let mut diagnostics = vec![format!("Query error: {}", e)];
            diagnostics.extend(e.debug_logs().iter().cloned());
            Reply {
                message: Message::system(format!("{}{}", ERROR_PREFIX, e)),
                diagnostics,
            }
        }
    }
}

/// Upload one file and turn the outcome into a transcript message.
pub async fn upload_round_trip(client: &DocumentClient, path: &Path) -> Reply {
    tracing::debug!(path = %path.display(), "uploading file");

    match client.upload(path).await {
        Ok(response) => {
            tracing::info!(path = %path.display(), "upload finished");
            let text = response
                .message
                .unwrap_or_else(|| format!("Uploaded {}", path.display()));
            Reply {
                diagnostics: vec![format!("Upload response: {}", text)],
                message: Message::system(text),
            }
        }
        Err(e) => {
            tracing::error!(path = %path.display(), error = %e, "upload failed");
            let mut diagnostics = vec![format!("Upload error: {}", e)];
            diagnostics.extend(e.debug_logs().iter().cloned());
            Reply {
                message: Message::system(format!("{}{}", ERROR_PREFIX, e)),
                diagnostics,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transcript::Sender;

    // Nothing listens on the discard port, so requests fail fast
    fn offline_controller() -> ChatController {
        ChatController::new(DocumentClient::new("http://127.0.0.1:9"), false)
    }

    #[test]
    fn test_text_field_editing_is_utf8_safe() {
        let mut field = TextField::new();
        for c in "héllo".chars() {
            field.insert(c);
        }
        field.move_left();
        field.move_left();
        field.backspace();
        assert_eq!(field.text(), "hélo");
        assert_eq!(field.cursor(), 2);

        field.move_home();
        field.delete();
        assert_eq!(field.text(), "élo");

        field.move_end();
        field.insert('!');
        assert_eq!(field.text(), "élo!");
    }

    #[test]
    fn test_cursor_stays_in_bounds() {
        let mut field = TextField::new();
        field.move_left();
        field.backspace();
        assert_eq!(field.cursor(), 0);

        field.set_text("ab");
        field.move_right();
        field.move_right();
        field.delete();
        assert_eq!(field.text(), "ab");
        assert_eq!(field.cursor(), 2);
    }

    #[test]
    fn test_blank_query_is_ignored() {
        let mut controller = offline_controller();
        controller.query_field_mut().set_text("   \t ");

        assert!(!controller.submit_query());
        assert!(controller.transcript().is_empty());
        assert_eq!(controller.pending(), 0);
        // The field is left alone when nothing is sent
        assert_eq!(controller.query_field().text(), "   \t ");
    }

    #[test]
    fn test_missing_file_selection_is_ignored() {
        let mut controller = offline_controller();
        assert!(!controller.select_file(None));
        assert!(controller.transcript().is_empty());
        assert_eq!(controller.pending(), 0);
    }

    #[test]
    fn test_apply_keeps_diagnostics_only_in_debug_mode() {
        let reply = Reply {
            message: Message::system("done"),
            diagnostics: vec!["Upload response: done".to_string()],
        };

        let mut quiet = offline_controller();
        quiet.apply(reply.clone());
        assert!(quiet.debug_log().is_empty());
        assert_eq!(quiet.transcript().last().map(|e| e.sender), Some(Sender::System));

        let mut verbose = ChatController::new(DocumentClient::new("http://127.0.0.1:9"), true);
        verbose.apply(reply);
        assert_eq!(verbose.debug_log().to_vec(), vec!["Upload response: done".to_string()]);
    }

    #[tokio::test]
    async fn test_query_echoes_before_reply_arrives() {
        let mut controller = offline_controller();
        controller.query_field_mut().set_text("  what is this?  ");

        assert!(controller.submit_query());
        assert_eq!(controller.transcript().len(), 1);
        let echoed = &controller.transcript().entries()[0];
        assert_eq!(echoed.sender, Sender::User);
        assert_eq!(echoed.text, "what is this?");
        assert_eq!(controller.query_field().text(), "");
        assert_eq!(controller.pending(), 1);
    }

    #[tokio::test]
    async fn test_unreadable_file_becomes_system_error() {
        let mut controller = offline_controller();
        controller.select_file(Some(PathBuf::from("/definitely/not/here.txt")));
        controller.settle().await;

        let entry = controller.transcript().last().unwrap();
        assert_eq!(entry.sender, Sender::System);
        assert!(entry.text.starts_with("Error: Could not read /definitely/not/here.txt"));
        assert_eq!(controller.pending(), 0);
    }
}

//! Terminal chat client for a document question-answering service.
//!
//! Documents are uploaded to `POST /api/upload` and questions go to
//! `POST /api/query`; every request and its outcome land in an append-only
//! chat transcript.

pub mod api;
pub mod app;
pub mod config;
pub mod controller;
pub mod handler;
pub mod logging;
pub mod transcript;
pub mod tui;
pub mod ui;

// Re-export main types for convenience
pub use api::{ApiError, DocumentClient};
pub use config::Config;
pub use controller::{ChatController, Reply};
pub use transcript::{Entry, Message, MessageBody, Sender, Transcript};

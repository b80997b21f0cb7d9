use std::path::Path;

use reqwest::{multipart, Client, Response, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const UPLOAD_PATH: &str = "/api/upload";
pub const QUERY_PATH: &str = "/api/query";

#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never completed
    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Non-2xx response, with the message derived from its body or status
    #[error("{message}")]
    Server {
        status: StatusCode,
        message: String,
        debug_logs: Vec<String>,
    },

    /// A success response whose body is not the expected JSON
    #[error("Invalid response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Could not read {path}: {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

impl ApiError {
    /// Diagnostic lines the server attached to an error response
    pub fn debug_logs(&self) -> &[String] {
        match self {
            ApiError::Server { debug_logs, .. } => debug_logs,
            _ => &[],
        }
    }
}

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
}

#[derive(Debug, Default, Deserialize)]
pub struct QueryResponse {
    #[serde(default)]
    pub results: Option<Vec<String>>,
    #[serde(default)]
    pub debug_logs: Vec<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct UploadResponse {
    #[serde(default)]
    pub message: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ErrorBody {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    debug_logs: Vec<String>,
}

/// HTTP client for the document service
#[derive(Debug, Clone)]
pub struct DocumentClient {
    client: Client,
    base_url: String,
}

impl DocumentClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    /// Ask the service a question.
    ///
    /// A non-2xx response becomes [`ApiError::Server`] carrying
    /// `Server error: <detail>`, where the detail is the body's `error` field
    /// or the HTTP status text.
    pub async fn query(&self, query: &str) -> Result<QueryResponse, ApiError> {
        let response = self
            .client
            .post(self.endpoint(QUERY_PATH))
            .json(&QueryRequest { query })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response).await;
            let detail = body.error.unwrap_or_else(|| status_text(status));
            return Err(ApiError::Server {
                status,
                message: format!("Server error: {}", detail),
                debug_logs: body.debug_logs,
            });
        }

        decode(response).await
    }

    /// Upload a file as multipart form data under the field `file`.
    pub async fn upload(&self, path: &Path) -> Result<UploadResponse, ApiError> {
        let bytes = tokio::fs::read(path).await.map_err(|source| ApiError::File {
            path: path.display().to_string(),
            source,
        })?;

        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        let mime_type = mime_guess::from_path(path).first_or_octet_stream();

        let part = multipart::Part::bytes(bytes)
            .file_name(file_name)
            .mime_str(mime_type.essence_str())?;
        let form = multipart::Form::new().part("file", part);

        let response = self
            .client
            .post(self.endpoint(UPLOAD_PATH))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = read_error_body(response).await;
            let message = body
                .error
                .unwrap_or_else(|| format!("HTTP error! status: {}", status.as_u16()));
            return Err(ApiError::Server {
                status,
                message,
                debug_logs: body.debug_logs,
            });
        }

        decode(response).await
    }
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
    let text = response.text().await?;
    Ok(serde_json::from_str(&text)?)
}

// Error bodies are best-effort: anything unparseable is treated as empty
async fn read_error_body(response: Response) -> ErrorBody {
    match response.text().await {
        Ok(text) => serde_json::from_str(&text).unwrap_or_default(),
        Err(_) => ErrorBody::default(),
    }
}

fn status_text(status: StatusCode) -> String {
    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| status.as_str().to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_url_trailing_slash_is_trimmed() {
        let client = DocumentClient::new("http://localhost:5000/");
        assert_eq!(client.base_url(), "http://localhost:5000");
        assert_eq!(client.endpoint(QUERY_PATH), "http://localhost:5000/api/query");
    }

    #[test]
    fn test_status_text_uses_reason_phrase() {
        assert_eq!(status_text(StatusCode::INTERNAL_SERVER_ERROR), "Internal Server Error");
        assert_eq!(status_text(StatusCode::from_u16(599).unwrap()), "599");
    }

    #[test]
    fn test_query_response_tolerates_missing_fields() {
        let response: QueryResponse = serde_json::from_str("{}").unwrap();
        assert!(response.results.is_none());
        assert!(response.debug_logs.is_empty());
    }

    #[test]
    fn test_error_body_with_wrong_shape_is_ignored() {
        let body: ErrorBody = serde_json::from_str(r#"{"error": 42}"#).unwrap_or_default();
        assert!(body.error.is_none());
    }

    #[test]
    fn test_server_error_displays_message() {
        let err = ApiError::Server {
            status: StatusCode::BAD_REQUEST,
            message: "Server error: bad input".to_string(),
            debug_logs: vec!["trace".to_string()],
        };
        assert_eq!(err.to_string(), "Server error: bad input");
        assert_eq!(err.debug_logs().to_vec(), vec!["trace".to_string()]);
    }
}

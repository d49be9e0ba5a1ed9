/// Analysis backend client
///
/// Wraps the three remote operations (describe, detail, question) as
/// independent async calls. Each one uploads the image as a multipart
/// body and performs a single round trip: no retries, no caching, no
/// cancellation. The backend is tolerant of partial responses, so a
/// missing expected field resolves to a documented placeholder instead
/// of an error; only transport failures, non-2xx statuses and malformed
/// JSON fail the call.

use std::time::Duration;

use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;

use crate::state::data::CapturedImage;

/// Used when the backend address is not configured via `VISION_BACKEND_URL`
const DEFAULT_BACKEND_URL: &str = "http://localhost:8000";

/// Hard ceiling on a single round trip so a hung backend can never pin a
/// loading flag forever
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Placeholder for a 2xx describe response without a description field
pub const NO_DESCRIPTION: &str = "No description received.";
/// Placeholder for a 2xx details response without its field
pub const NO_DETAIL: &str = "No detailed description received.";
/// Placeholder for a 2xx question response without an answer field
pub const NO_ANSWER: &str = "No answer received.";

#[derive(Debug, Error)]
pub enum RequestError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("service returned {status}: {message}")]
    Status { status: u16, message: String },
}

#[derive(Debug, Deserialize)]
struct DescribeResponse {
    description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct DetailResponse {
    detailed_description: Option<String>,
}

#[derive(Debug, Deserialize)]
struct QuestionResponse {
    answer: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: reqwest::Client,
    base_url: String,
}

impl AnalysisClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        // If the TLS backend cannot even initialize, the app cannot talk
        // to the backend at all, so there is nothing sensible to recover to.
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .expect("Failed to initialize HTTP client");

        Self {
            http,
            base_url: base_url.into(),
        }
    }

    /// Build a client from the `VISION_BACKEND_URL` environment variable,
    /// falling back to a localhost default. Trailing slashes are stripped
    /// so endpoint paths can be appended verbatim.
    pub fn from_env() -> Self {
        let base_url = std::env::var("VISION_BACKEND_URL")
            .ok()
            .map(|value| value.trim().trim_end_matches('/').to_string())
            .filter(|value| !value.is_empty())
            .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string());

        println!("🌐 Analysis backend: {}", base_url);
        Self::new(base_url)
    }

    /// Short description of the image
    pub async fn describe(&self, image: CapturedImage) -> Result<String, RequestError> {
        let body: DescribeResponse = self.post_image("/image/describe", image, None).await?;
        Ok(body
            .description
            .unwrap_or_else(|| NO_DESCRIPTION.to_string()))
    }

    /// Longer, on-demand description of the image
    pub async fn detail(&self, image: CapturedImage) -> Result<String, RequestError> {
        let body: DetailResponse = self.post_image("/image/details", image, None).await?;
        Ok(body
            .detailed_description
            .unwrap_or_else(|| NO_DETAIL.to_string()))
    }

    /// Free-form question about the image
    pub async fn question(
        &self,
        image: CapturedImage,
        text: String,
    ) -> Result<String, RequestError> {
        let body: QuestionResponse = self.post_image("/image/question", image, Some(text)).await?;
        Ok(body.answer.unwrap_or_else(|| NO_ANSWER.to_string()))
    }

    /// One multipart POST: the image under `file`, plus the question text
    /// when present.
    async fn post_image<T: DeserializeOwned>(
        &self,
        path: &str,
        image: CapturedImage,
        question: Option<String>,
    ) -> Result<T, RequestError> {
        let filename = image.upload_filename();
        let part = Part::bytes(image.bytes)
            .file_name(filename)
            .mime_str(&image.mime)?;

        let mut form = Form::new().part("file", part);
        if let Some(text) = question {
            form = form.text("question", text);
        }

        let response = self
            .http
            .post(format!("{}{}", self.base_url, path))
            .multipart(form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RequestError::Status {
                status: status.as_u16(),
                message: error_message(&status, &body),
            });
        }

        // Malformed JSON is a failure; missing fields are handled by the
        // per-operation fallbacks above.
        Ok(response.json::<T>().await?)
    }
}

/// Best-available message for a failed response: a well-known field of a
/// JSON error body if there is one, otherwise the raw body, otherwise the
/// canonical status reason.
fn error_message(status: &reqwest::StatusCode, body: &str) -> String {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        for field in ["detail", "error", "message"] {
            if let Some(text) = value.get(field).and_then(|v| v.as_str()) {
                return text.to_string();
            }
        }
    }
    let trimmed = body.trim();
    if !trimmed.is_empty() {
        return trimmed.to_string();
    }
    status
        .canonical_reason()
        .unwrap_or("unknown error")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Read, Write};
    use std::net::TcpListener;

    #[test]
    fn test_missing_fields_fall_back_to_placeholders() {
        let parsed: DescribeResponse = serde_json::from_str("{}").unwrap();
        assert!(parsed.description.is_none());

        let parsed: DetailResponse = serde_json::from_str("{\"unrelated\": 1}").unwrap();
        assert!(parsed.detailed_description.is_none());

        let parsed: QuestionResponse =
            serde_json::from_str("{\"answer\": \"forty-two\"}").unwrap();
        assert_eq!(parsed.answer.as_deref(), Some("forty-two"));
    }

    #[test]
    fn test_error_message_prefers_json_detail() {
        let status = reqwest::StatusCode::INTERNAL_SERVER_ERROR;
        assert_eq!(
            error_message(&status, "{\"detail\": \"model overloaded\"}"),
            "model overloaded"
        );
        assert_eq!(error_message(&status, "plain text failure"), "plain text failure");
        assert_eq!(error_message(&status, "   "), "Internal Server Error");
    }

    /// Serve exactly one canned HTTP response on a local port, consuming
    /// the request body first so the client can finish its upload.
    fn spawn_stub(status_line: &str, body: &str) -> String {
        let response = format!(
            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            status_line,
            body.len(),
            body
        );

        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();

        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut data = Vec::new();
            let mut buf = [0u8; 16 * 1024];

            // Read headers, then drain exactly Content-Length body bytes
            let header_end = loop {
                let n = stream.read(&mut buf).unwrap_or(0);
                if n == 0 {
                    return;
                }
                data.extend_from_slice(&buf[..n]);
                if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
                    break pos + 4;
                }
            };

            let headers = String::from_utf8_lossy(&data[..header_end]).to_string();
            let content_length = headers
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())?
                })
                .unwrap_or(0);

            let mut body_read = data.len() - header_end;
            while body_read < content_length {
                let n = stream.read(&mut buf).unwrap_or(0);
                if n == 0 {
                    break;
                }
                body_read += n;
            }

            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
        });

        format!("http://{}", addr)
    }

    fn test_image() -> CapturedImage {
        CapturedImage::new(vec![0xFF, 0xD8, 0xFF, 0xD9], "image/jpeg")
    }

    #[tokio::test]
    async fn test_describe_returns_service_text() {
        let base = spawn_stub("200 OK", "{\"description\": \"a red bicycle\"}");
        let client = AnalysisClient::new(base);

        let text = client.describe(test_image()).await.unwrap();
        assert_eq!(text, "a red bicycle");
    }

    #[tokio::test]
    async fn test_describe_without_field_uses_placeholder() {
        let base = spawn_stub("200 OK", "{}");
        let client = AnalysisClient::new(base);

        let text = client.describe(test_image()).await.unwrap();
        assert_eq!(text, NO_DESCRIPTION);
    }

    #[tokio::test]
    async fn test_server_error_becomes_request_error() {
        let base = spawn_stub(
            "500 Internal Server Error",
            "{\"detail\": \"vision model unavailable\"}",
        );
        let client = AnalysisClient::new(base);

        let err = client.describe(test_image()).await.unwrap_err();
        match err {
            RequestError::Status { status, message } => {
                assert_eq!(status, 500);
                assert_eq!(message, "vision model unavailable");
            }
            other => panic!("expected status error, got {:?}", other),
        }
    }
}

//! Remote reasoning service
//!
//! The arbiter only needs one capability: turn a prompt into text. The
//! [`ReasoningService`] trait captures that so tests can inject scripted or
//! faulty services; [`GeminiClient`] is the production implementation over the
//! generative-language REST API.

use reqwest::blocking::Client;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use thiserror::Error;
use tracing::debug;

use crate::config::ArbiterConfig;
use crate::error::ComputeError;

/// Environment variables checked for an API key, in order
pub const API_KEY_VARS: &[&str] = &["GEMINI_API_KEY", "GOOGLE_API_KEY"];

/// Text-generation capability used by the arbiter.
///
/// Implementations must bound each call by their own timeout; the arbiter
/// never waits on a call it cannot abandon.
pub trait ReasoningService: Send + Sync {
    fn generate(&self, prompt: &str) -> Result<String, ReasoningError>;
}

impl<T: ReasoningService + ?Sized> ReasoningService for Arc<T> {
    fn generate(&self, prompt: &str) -> Result<String, ReasoningError> {
        (**self).generate(prompt)
    }
}

/// Failures talking to the reasoning service
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ReasoningError {
    #[error("No API key configured")]
    MissingCredentials,

    #[error("Request timed out: {0}")]
    Timeout(String),

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Rate limited: {0}")]
    RateLimited(String),

    #[error("Server error (status {status}): {message}")]
    Server { status: u16, message: String },

    #[error("Client error (status {status}): {message}")]
    Client { status: u16, message: String },

    #[error("Malformed response envelope: {0}")]
    MalformedResponse(String),
}

impl ReasoningError {
    /// Whether another attempt could plausibly succeed
    pub fn is_retryable(&self) -> bool {
        !matches!(
            self,
            ReasoningError::MissingCredentials | ReasoningError::Client { .. }
        )
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    response_mime_type: &'static str,
    temperature: f64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

/// Blocking client for the `generateContent` endpoint
#[derive(Debug)]
pub struct GeminiClient {
    http: Client,
    url: String,
    api_key: Option<String>,
    temperature: f64,
}

impl GeminiClient {
    /// Build a client. A missing key is not an error here; calls fail with
    /// [`ReasoningError::MissingCredentials`] instead.
    pub fn new(config: &ArbiterConfig, api_key: Option<String>) -> Result<Self, ComputeError> {
        let http = Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|e| ComputeError::ConfigError(format!("HTTP client: {}", e)))?;

        Ok(Self {
            http,
            url: generate_url(&config.endpoint, &config.model),
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            temperature: config.temperature,
        })
    }

    /// Build a client with the key taken from the environment
    pub fn from_env(config: &ArbiterConfig) -> Result<Self, ComputeError> {
        Self::new(config, api_key_from_env())
    }

    pub fn has_credentials(&self) -> bool {
        self.api_key.is_some()
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

impl ReasoningService for GeminiClient {
    fn generate(&self, prompt: &str) -> Result<String, ReasoningError> {
        let api_key = self
            .api_key
            .as_deref()
            .ok_or(ReasoningError::MissingCredentials)?;

        let body = request_body(prompt, self.temperature);
        debug!(url = %self.url, prompt_len = prompt.len(), "Calling reasoning service");

        let response = self
            .http
            .post(&self.url)
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .map_err(transport_error)?;

        let status = response.status();
        let text = response.text().map_err(transport_error)?;

        if !status.is_success() {
            return Err(classify_status(status, text));
        }

        extract_text(&text)
    }
}

/// First non-empty key among [`API_KEY_VARS`]
pub fn api_key_from_env() -> Option<String> {
    API_KEY_VARS
        .iter()
        .filter_map(|var| std::env::var(var).ok())
        .find(|key| !key.trim().is_empty())
}

fn generate_url(endpoint: &str, model: &str) -> String {
    let model = model.trim_start_matches("models/");
    format!(
        "{}/models/{}:generateContent",
        endpoint.trim_end_matches('/'),
        model
    )
}

fn request_body(prompt: &str, temperature: f64) -> GenerateRequest {
    GenerateRequest {
        contents: vec![Content {
            parts: vec![Part {
                text: prompt.to_string(),
            }],
        }],
        generation_config: GenerationConfig {
            response_mime_type: "application/json",
            temperature,
        },
    }
}

fn transport_error(e: reqwest::Error) -> ReasoningError {
    if e.is_timeout() {
        ReasoningError::Timeout(e.to_string())
    } else {
        ReasoningError::Transport(e.to_string())
    }
}

fn classify_status(status: StatusCode, body: String) -> ReasoningError {
    let code = status.as_u16();
    if status == StatusCode::TOO_MANY_REQUESTS {
        ReasoningError::RateLimited(body)
    } else if status.is_server_error() {
        ReasoningError::Server {
            status: code,
            message: body,
        }
    } else {
        ReasoningError::Client {
            status: code,
            message: body,
        }
    }
}

/// Pull the generated text out of a `generateContent` response body
fn extract_text(body: &str) -> Result<String, ReasoningError> {
    let response: GenerateResponse = serde_json::from_str(body)
        .map_err(|e| ReasoningError::MalformedResponse(e.to_string()))?;

    response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .and_then(|content| content.parts.into_iter().next())
        .map(|part| part.text)
        .ok_or_else(|| ReasoningError::MalformedResponse("no candidate text".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};

    #[test]
    fn test_generate_url() {
        assert_eq!(
            generate_url("https://example.test/v1beta/", "models/gemini-flash-latest"),
            "https://example.test/v1beta/models/gemini-flash-latest:generateContent"
        );
    }

    #[test]
    fn test_request_body_shape() {
        let body = serde_json::to_value(request_body("hello", 0.1)).unwrap();
        assert_eq!(body["contents"][0]["parts"][0]["text"], "hello");
        assert_eq!(
            body["generationConfig"]["responseMimeType"],
            "application/json"
        );
        assert_eq!(body["generationConfig"]["temperature"], 0.1);
    }

    #[test]
    fn test_extract_text() {
        let body = r#"{"candidates":[{"content":{"parts":[{"text":"{\"action\":\"WARN\"}"}],"role":"model"}}]}"#;
        assert_eq!(extract_text(body).unwrap(), r#"{"action":"WARN"}"#);
    }

    #[test]
    fn test_extract_text_without_candidates() {
        let err = extract_text(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#).unwrap_err();
        assert!(matches!(err, ReasoningError::MalformedResponse(_)));

        let err = extract_text("<html>").unwrap_err();
        assert!(matches!(err, ReasoningError::MalformedResponse(_)));
    }

    #[test]
    fn test_classify_status() {
        assert!(matches!(
            classify_status(StatusCode::TOO_MANY_REQUESTS, String::new()),
            ReasoningError::RateLimited(_)
        ));
        assert!(matches!(
            classify_status(StatusCode::SERVICE_UNAVAILABLE, String::new()),
            ReasoningError::Server { status: 503, .. }
        ));
        assert!(matches!(
            classify_status(StatusCode::FORBIDDEN, String::new()),
            ReasoningError::Client { status: 403, .. }
        ));
    }

    #[test]
    fn test_retryability() {
        assert!(ReasoningError::Timeout("t".into()).is_retryable());
        assert!(ReasoningError::RateLimited("r".into()).is_retryable());
        assert!(ReasoningError::MalformedResponse("m".into()).is_retryable());
        assert!(!ReasoningError::MissingCredentials.is_retryable());
        assert!(!ReasoningError::Client {
            status: 400,
            message: String::new()
        }
        .is_retryable());
    }

    /// Serve the canned `(status, body)` replies in order, one per connection,
    /// and hand back each raw request
    fn serve(replies: Vec<(u16, &'static str)>) -> (String, JoinHandle<Vec<String>>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let endpoint = format!("http://{}", listener.local_addr().unwrap());

        let handle = thread::spawn(move || {
            let mut requests = Vec::new();
            for (status, body) in replies {
                let (mut stream, _) = listener.accept().unwrap();
                requests.push(read_request(&mut stream));
                let reply = format!(
                    "HTTP/1.1 {status} Canned\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
                stream.write_all(reply.as_bytes()).unwrap();
                stream.flush().unwrap();
            }
            requests
        });

        (endpoint, handle)
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(head_end) = text.find("\r\n\r\n") {
                let content_length = text[..head_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        name.eq_ignore_ascii_case("content-length")
                            .then(|| value.trim().parse::<usize>().ok())
                            .flatten()
                    })
                    .unwrap_or(0);
                if buf.len() >= head_end + 4 + content_length {
                    return text;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    #[test]
    fn test_generate_round_trip_over_http() {
        let envelope = r#"{"candidates":[{"content":{"parts":[{"text":"{\"action\":\"WARN\"}"}]}}]}"#;
        let (endpoint, server) = serve(vec![(503, r#"{"error":"overloaded"}"#), (200, envelope)]);

        let config = ArbiterConfig {
            endpoint,
            model: "test-model".to_string(),
            timeout_ms: 5_000,
            ..ArbiterConfig::default()
        };
        let client = GeminiClient::new(&config, Some("secret-key".to_string())).unwrap();

        let first = client.generate("prompt").unwrap_err();
        assert!(matches!(first, ReasoningError::Server { status: 503, .. }));
        assert!(first.is_retryable());

        assert_eq!(client.generate("prompt").unwrap(), r#"{"action":"WARN"}"#);

        let requests = server.join().unwrap();
        assert_eq!(requests.len(), 2);
        for request in &requests {
            let lower = request.to_ascii_lowercase();
            assert!(request.starts_with("POST /models/test-model:generateContent "));
            assert!(lower.contains("x-goog-api-key: secret-key"));
            assert!(!lower.contains("key=secret-key"));
            assert!(request.contains(r#""text":"prompt""#));
        }
    }

    #[test]
    fn test_missing_key_fails_without_network() {
        let client = GeminiClient::new(&ArbiterConfig::default(), Some("  ".to_string())).unwrap();
        assert!(!client.has_credentials());
        assert_eq!(
            client.generate("prompt"),
            Err(ReasoningError::MissingCredentials)
        );
    }
}

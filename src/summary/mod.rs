//! Natural-language summaries of student records via a text-generation service.
//!
//! Each call is a single non-streaming request to Ollama's `/api/generate` endpoint. There is no
//! retry and no caching; every summary request reaches the provider. The client only reads the
//! student it is given and never touches storage.

use crate::config::get_config;
use crate::student::Student;
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use thiserror::Error;

/// Errors surfaced while requesting a summary.
#[derive(Debug, Error)]
pub enum SummaryError {
    /// Provider was unreachable or the endpoint does not exist.
    #[error("Summary provider unavailable: {0}")]
    ProviderUnavailable(String),
    /// Provider returned an error response.
    #[error("Failed to generate summary: {0}")]
    GenerationFailed(String),
    /// Provider response could not be parsed.
    #[error("Malformed provider response: {0}")]
    InvalidResponse(String),
}

/// Interface implemented by summary providers.
#[async_trait]
pub trait SummaryClient: Send + Sync {
    /// Produce a free-text summary of `student`.
    async fn summarize(&self, student: &Student) -> Result<String, SummaryError>;
}

/// Build the prompt sent to the generation model.
pub fn build_prompt(student: &Student) -> String {
    format!(
        "Generate a brief summary for a student named {}, who is {} years old and has the email {}.",
        student.name, student.age, student.email
    )
}

/// Build a summary client from the loaded configuration.
pub fn get_summary_client() -> Result<OllamaSummaryClient, SummaryError> {
    let config = get_config();
    OllamaSummaryClient::new(config.ollama_url.clone(), config.summary_model.clone())
}

/// Ollama-backed summary client.
pub struct OllamaSummaryClient {
    http: Client,
    base_url: String,
    model: String,
}

impl OllamaSummaryClient {
    /// Construct a client targeting `base_url` with the given model.
    pub fn new(base_url: String, model: String) -> Result<Self, SummaryError> {
        let http = Client::builder()
            .user_agent("student-records/summary")
            .build()
            .map_err(|error| {
                SummaryError::ProviderUnavailable(format!("failed to build HTTP client: {error}"))
            })?;
        Ok(Self {
            http,
            base_url,
            model,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/api/generate", self.base_url.trim_end_matches('/'))
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
    #[serde(default = "default_done")]
    done: bool,
}

fn default_done() -> bool {
    true
}

#[async_trait]
impl SummaryClient for OllamaSummaryClient {
    async fn summarize(&self, student: &Student) -> Result<String, SummaryError> {
        let payload = json!({
            "model": self.model,
            "prompt": build_prompt(student),
            "stream": false,
        });
        tracing::debug!(student_id = student.id, model = %self.model, "Requesting summary");

        let response = self
            .http
            .post(self.endpoint())
            .json(&payload)
            .send()
            .await
            .map_err(|error| {
                SummaryError::ProviderUnavailable(format!(
                    "failed to reach Ollama at {}: {error}",
                    self.base_url
                ))
            })?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(SummaryError::ProviderUnavailable(format!(
                "Ollama endpoint {} returned 404",
                self.endpoint()
            )));
        }

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SummaryError::GenerationFailed(format!(
                "Ollama returned {status}: {body}"
            )));
        }

        let body: GenerateResponse = response.json().await.map_err(|error| {
            SummaryError::InvalidResponse(format!("failed to decode Ollama response: {error}"))
        })?;

        if !body.done {
            return Err(SummaryError::InvalidResponse(
                "Ollama response incomplete (streaming not supported)".into(),
            ));
        }

        Ok(body.response.trim().to_string())
    }
}

//! AI Assist gateway — builds prompts from stored board data and forwards
//! them to Gemini's `generateContent` endpoint, relaying the text verbatim.
//!
//! The external model is an untrusted, possibly-failing dependency: one
//! bounded-timeout call per request, no retries, no streaming. Handlers talk
//! to it through the `TextGenerator` trait so tests can swap in a mock.

use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::models::Task;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const DEFAULT_MODEL: &str = "gemini-2.5-flash";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fallback returned when the call succeeds but yields no text.
pub const NO_RESPONSE_FALLBACK: &str = "No response generated.";

/// Single-shot text generation against an external model.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<String>;
}

// ── Wire types ────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
struct GenerateContentRequest {
    contents: Vec<RequestContent>,
}

#[derive(Debug, Serialize)]
struct RequestContent {
    role: &'static str,
    parts: Vec<RequestPart>,
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Deserialize)]
pub struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Join the first candidate's non-empty text fragments with newlines,
    /// falling back to [`NO_RESPONSE_FALLBACK`] when nothing came back.
    pub fn extract_text(&self) -> String {
        let text = self
            .candidates
            .first()
            .and_then(|c| c.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|p| p.text.as_deref())
                    .filter(|t| !t.is_empty())
                    .collect::<Vec<_>>()
                    .join("\n")
            })
            .unwrap_or_default();
        if text.is_empty() {
            NO_RESPONSE_FALLBACK.to_string()
        } else {
            text
        }
    }
}

// ── Client ────────────────────────────────────────────────────────────

/// Client for Gemini's hosted `generateContent` endpoint.
pub struct GeminiClient {
    http: reqwest::Client,
    api_key: String,
    model: String,
}

impl GeminiClient {
    pub fn new(api_key: String, model: String) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self { http, api_key, model })
    }

    /// Build a client from `GEMINI_API_KEY` / `GEMINI_MODEL`. A missing key
    /// is logged but not fatal: every generate call will then fail and be
    /// surfaced as an AI generation error.
    pub fn from_env() -> Result<Self> {
        let api_key = std::env::var("GEMINI_API_KEY").unwrap_or_default();
        if api_key.is_empty() {
            tracing::warn!("GEMINI_API_KEY is not set; AI endpoints will return errors");
        }
        let model = std::env::var("GEMINI_MODEL").unwrap_or_else(|_| DEFAULT_MODEL.to_string());
        Self::new(api_key, model)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/{}:generateContent", GEMINI_API_BASE, self.model);
        let body = GenerateContentRequest {
            contents: vec![RequestContent {
                role: "user",
                parts: vec![RequestPart {
                    text: prompt.to_string(),
                }],
            }],
        };

        let resp = self
            .http
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await
            .context("Failed to send generate request to Gemini")?
            .error_for_status()
            .context("Gemini generateContent returned error status")?
            .json::<GenerateContentResponse>()
            .await
            .context("Failed to parse Gemini response")?;

        Ok(resp.extract_text())
    }
}

// ── Prompt builders ───────────────────────────────────────────────────

/// One-paragraph project summary prompt over the task list.
pub fn summary_prompt(tasks: &[Task]) -> String {
    let task_details = tasks
        .iter()
        .map(|task| format!("- {} (Status: {})", task.title, task.status))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        "Please provide a one-paragraph, high-level summary for a project manager based on the following task list:\n\n{}",
        task_details
    )
}

/// Free-text question prompt embedding a single task's fields verbatim.
pub fn question_prompt(task: &Task, question: &str) -> String {
    let description = if task.description.is_empty() {
        "No description provided."
    } else {
        &task.description
    };
    format!(
        "Given the following task:\nTitle: {}\nDescription: {}\nStatus: {}\n\nAnswer this question: \"{}\"",
        task.title, description, task.status, question
    )
}

use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::{debug, error};

use crate::core::record::Record;
use crate::oracle::{OracleError, SemanticMatcher, TocCombiner};

pub const DEFAULT_API_BASE: &str = "https://api.openai.com/v1";
pub const DEFAULT_MODEL: &str = "gpt-4o";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Maximum number of bytes of an error body kept in [`OracleError::Status`]
const MAX_ERROR_BODY: usize = 2048;

/// Connection settings for a chat-completions endpoint
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub api_key: String,
    /// Base URL without the trailing `/chat/completions`
    pub api_base: String,
    pub model: String,
    /// Whole-request timeout
    pub timeout: Duration,
}

impl OpenAiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_base: DEFAULT_API_BASE.to_string(),
            model: DEFAULT_MODEL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }

    fn completions_url(&self) -> String {
        format!("{}/chat/completions", self.api_base.trim_end_matches('/'))
    }
}

/// Chat-completions client used both as a [`SemanticMatcher`] and for merging two TOCs
/// into one.
#[derive(Debug, Clone)]
pub struct OpenAiClient {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiClient {
    /// # Errors
    ///
    /// Returns [`OracleError::Transport`] if the HTTP client cannot be built.
    pub fn new(config: OpenAiConfig) -> Result<Self, OracleError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| OracleError::Transport(e.to_string()))?;
        Ok(Self { http, config })
    }

    pub fn config(&self) -> &OpenAiConfig {
        &self.config
    }

    async fn chat(&self, prompt: String, json_mode: bool) -> Result<String, OracleError> {
        let mut body = json!({
            "model": self.config.model,
            "messages": [{"role": "user", "content": prompt}],
        });
        if json_mode {
            body["response_format"] = json!({"type": "json_object"});
        }

        debug!(model = %self.config.model, json_mode, "sending chat completion request");

        let response = self
            .http
            .post(self.config.completions_url())
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| self.map_transport(&e))?;

        let status = response.status();
        if !status.is_success() {
            let mut text = error_body(response.text().await);
            truncate_utf8(&mut text, MAX_ERROR_BODY);
            error!(status = status.as_u16(), "chat completion request rejected");
            return Err(OracleError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let payload: Value = response
            .json()
            .await
            .map_err(|e| OracleError::MalformedResponse(e.to_string()))?;
        extract_message_content(&payload).map(str::to_string)
    }

    fn map_transport(&self, e: &reqwest::Error) -> OracleError {
        if e.is_timeout() {
            OracleError::Timeout(self.config.timeout)
        } else {
            OracleError::Transport(e.to_string())
        }
    }
}

#[async_trait]
impl TocCombiner for OpenAiClient {
    async fn combine(&self, toc1: &Value, toc2: &Value) -> Result<Value, OracleError> {
        let content = self.chat(build_combine_prompt(toc1, toc2), false).await?;
        parse_json_reply(&content)
    }
}

#[async_trait]
impl SemanticMatcher for OpenAiClient {
    async fn match_sequences(
        &self,
        master: &[Record],
        candidate: &[Record],
    ) -> Result<Value, OracleError> {
        let content = self.chat(build_match_prompt(master, candidate), true).await?;
        parse_json_reply(&content)
    }
}

/// Prompt asking for index correspondences between the two sequences
pub fn build_match_prompt(master: &[Record], candidate: &[Record]) -> String {
    format!(
        "You align two Tables of Contents. TOC 1 is the master; its order must be kept.\n\
         For every item decide whether it has a counterpart covering the same concept in the \
         other TOC. Use each index at most once and keep both index sequences increasing.\n\n\
         TOC 1:\n{}\n\nTOC 2:\n{}\n\n\
         Return ONLY a JSON object of the form \
         {{\"rows\": [{{\"masterIndex\": number|null, \"candidateIndex\": number|null, \
         \"rationale\": string}}]}} listing rows in display order.",
        indexed_listing(master),
        indexed_listing(candidate),
    )
}

/// Prompt asking for a single merged TOC
pub fn build_combine_prompt(toc1: &Value, toc2: &Value) -> String {
    format!(
        "You are a helpful assistant.\n\
         Combine the following two Tables of Contents (JSON) into a single coherent JSON \
         Table of Contents.\n\n\
         TOC 1:\n{toc1}\n\n\
         TOC 2:\n{toc2}\n\n\
         Return ONLY valid JSON format for the combined TOC. Do not add markdown formatting."
    )
}

fn indexed_listing(records: &[Record]) -> Value {
    Value::Array(
        records
            .iter()
            .enumerate()
            .map(|(index, r)| {
                json!({
                    "index": index,
                    "concept_id": r.identity(),
                    "label": r.label(),
                    "short_description": r.short_description(),
                })
            })
            .collect(),
    )
}

/// Pull `choices[0].message.content` out of a chat-completions payload
///
/// # Errors
///
/// Returns [`OracleError::MalformedResponse`] if the field is missing.
pub fn extract_message_content(payload: &Value) -> Result<&str, OracleError> {
    payload
        .pointer("/choices/0/message/content")
        .and_then(Value::as_str)
        .ok_or_else(|| {
            OracleError::MalformedResponse("missing choices[0].message.content".to_string())
        })
}

/// Models like to wrap JSON in markdown fences even when told not to
pub fn strip_code_fences(content: &str) -> String {
    content
        .replace("```json", "")
        .replace("```", "")
        .trim()
        .to_string()
}

fn parse_json_reply(content: &str) -> Result<Value, OracleError> {
    serde_json::from_str(&strip_code_fences(content))
        .map_err(|e| OracleError::MalformedResponse(format!("reply is not JSON: {e}")))
}

/// Body of a rejected request, or a note saying why it could not be read
fn error_body<E: std::fmt::Display>(body: Result<String, E>) -> String {
    body.unwrap_or_else(|e| format!("<unreadable body: {e}>"))
}

fn truncate_utf8(text: &mut String, max: usize) {
    if text.len() <= max {
        return;
    }
    let mut end = max;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    text.truncate(end);
}

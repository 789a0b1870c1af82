use anyhow::{Context, Result};
use base64::Engine;
use reqwest::Client;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{debug, warn};

use crate::{config::GeminiConfig, errors::AnalysisError, payload::Payload};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    candidates: Option<Vec<Candidate>>,
    prompt_feedback: Option<PromptFeedback>,
    error: Option<GeminiError>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    parts: Option<Vec<Part>>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    code: Option<i64>,
    message: Option<String>,
}

#[derive(Clone)]
pub struct GeminiClient {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(config: &GeminiConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .context("build http client failed")?;
        Ok(Self {
            client,
            endpoint: format!("{}/models/{}:generateContent", config.base_url, config.model),
            api_key: config.api_key.clone(),
        })
    }

    pub async fn generate_content(
        &self,
        prompt: &str,
        payload: &Payload,
    ) -> Result<String, AnalysisError> {
        let body = build_request_body(prompt, payload);
        debug!(
            endpoint = %self.endpoint,
            mime_type = %payload.mime_type,
            "sending generateContent request"
        );
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            let detail = serde_json::from_str::<GenerateContentResponse>(&text)
                .ok()
                .and_then(|parsed| parsed.error)
                .and_then(|err| err.message)
                .unwrap_or(text);
            warn!(%status, "Gemini request failed");
            return Err(AnalysisError::Downstream(format!("{status} {detail}")));
        }
        parse_response(&text)
    }
}

pub fn build_request_body(prompt: &str, payload: &Payload) -> Value {
    let data = base64::engine::general_purpose::STANDARD.encode(&payload.bytes);
    json!({
        "contents": [
            {
                "parts": [
                    {"text": prompt},
                    {"inline_data": {"mime_type": payload.mime_type, "data": data}}
                ]
            }
        ]
    })
}

fn parse_response(raw: &str) -> Result<String, AnalysisError> {
    let payload: GenerateContentResponse = serde_json::from_str(raw)
        .map_err(|err| AnalysisError::Downstream(format!("malformed response: {err}")))?;
    if let Some(error) = payload.error {
        return Err(AnalysisError::Downstream(format!(
            "code={}, message={}",
            error.code.unwrap_or_default(),
            error.message.unwrap_or_default()
        )));
    }

    let candidate = payload
        .candidates
        .and_then(|candidates| candidates.into_iter().next());
    let Some(candidate) = candidate else {
        return match payload.prompt_feedback.and_then(|feedback| feedback.block_reason) {
            Some(reason) => Err(AnalysisError::Downstream(format!("blocked: {reason}"))),
            None => Err(AnalysisError::EmptyResponse),
        };
    };

    let text = candidate
        .content
        .and_then(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect::<String>();
    let text = text.trim();
    if text.is_empty() {
        if let Some(reason) = candidate.finish_reason {
            debug!(finish_reason = %reason, "candidate carried no text");
        }
        return Err(AnalysisError::EmptyResponse);
    }
    Ok(text.to_string())
}

use async_trait::async_trait;
use chrono::Utc;
use serde::Serialize;
use tracing::{info, warn};

use crate::{
    classify::{self, MimeCategory, MimeType},
    errors::AnalysisError,
    gemini::GeminiClient,
    payload::{self, Payload},
};

const PLANT_DISEASE_PROMPT: &str = concat!(
    "You are a plant pathologist. Carefully analyze this image of a leaf. ",
    "Identify any diseases or symptoms the plant might be suffering from, ",
    "and provide bullet-point remedies. ",
    "Avoid mentioning AI, Gemini, or that this is a generated response."
);

const UNIVERSAL_PROMPT: &str = concat!(
    "Analyze this file thoroughly. Describe what it contains, summarize the key information, ",
    "and point out anything notable or unusual. Format the answer in Markdown."
);

const PLANT_IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg"];

/// Anything that can turn a prompt and a payload into free text.
#[async_trait]
pub trait ContentAnalyzer: Send + Sync {
    async fn analyze(&self, prompt: &str, payload: &Payload) -> Result<String, AnalysisError>;
}

#[async_trait]
impl ContentAnalyzer for GeminiClient {
    async fn analyze(&self, prompt: &str, payload: &Payload) -> Result<String, AnalysisError> {
        self.generate_content(prompt, payload).await
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisProfile {
    PlantDisease,
    Universal,
}

impl AnalysisProfile {
    pub fn prompt(&self) -> &'static str {
        match self {
            Self::PlantDisease => PLANT_DISEASE_PROMPT,
            Self::Universal => UNIVERSAL_PROMPT,
        }
    }

    /// Narrows the global allow-list for this profile.
    pub fn accepts(&self, mime: &str) -> bool {
        match self {
            Self::PlantDisease => PLANT_IMAGE_TYPES.contains(&mime),
            Self::Universal => MimeCategory::of(mime).is_some(),
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::PlantDisease => "plant-disease",
            Self::Universal => "universal",
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisReport {
    pub file_name: String,
    pub mime_type: String,
    pub payload_mime_type: String,
    pub payload_size: usize,
    pub text: String,
    pub analyzed_at: String,
}

/// Classifies, validates and packages one upload, then asks the analyzer once.
pub async fn analyze_upload(
    analyzer: &dyn ContentAnalyzer,
    profile: AnalysisProfile,
    upload: &UploadedFile,
) -> Result<AnalysisReport, AnalysisError> {
    let mime = classify::classify(&upload.name);
    let mime_type = match &mime {
        MimeType::Known(value) if classify::is_supported(&mime) && profile.accepts(value) => {
            value.clone()
        }
        _ => {
            info!(
                file_name = %upload.name,
                mime = %mime,
                profile = profile.name(),
                "rejected unsupported upload"
            );
            return Err(AnalysisError::unsupported(mime.to_string()));
        }
    };
    if upload.bytes.is_empty() {
        return Err(AnalysisError::EmptyUpload);
    }

    let payload = payload::build_payload(&upload.bytes, &mime_type).inspect_err(|err| {
        warn!(file_name = %upload.name, mime = %mime_type, error = %err, "payload build failed");
    })?;
    info!(
        file_name = %upload.name,
        mime = %mime_type,
        payload_mime = %payload.mime_type,
        payload_size = payload.len(),
        digest = %payload.digest(),
        profile = profile.name(),
        "submitting payload for analysis"
    );

    let text = analyzer.analyze(profile.prompt(), &payload).await.inspect_err(|err| {
        warn!(file_name = %upload.name, error = %err, "analysis failed");
    })?;

    Ok(AnalysisReport {
        file_name: upload.name.clone(),
        mime_type,
        payload_mime_type: payload.mime_type,
        payload_size: payload.bytes.len(),
        text,
        analyzed_at: Utc::now().to_rfc3339(),
    })
}

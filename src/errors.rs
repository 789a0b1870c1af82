use axum::http::StatusCode;
use thiserror::Error;

/// Failures that end a single analysis request.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("unsupported file type: {mime}")]
    UnsupportedType { mime: String },

    #[error("uploaded file is empty")]
    EmptyUpload,

    #[error("invalid image data: {0}")]
    InvalidImage(String),

    #[error("model request failed: {0}")]
    Downstream(String),

    #[error("model request timed out")]
    Timeout,

    #[error("model returned no text")]
    EmptyResponse,
}

impl AnalysisError {
    pub fn unsupported(mime: impl Into<String>) -> Self {
        Self::UnsupportedType { mime: mime.into() }
    }

    /// Stable identifier for clients.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::UnsupportedType { .. } => "unsupported_type",
            Self::EmptyUpload => "empty_upload",
            Self::InvalidImage(_) => "invalid_image",
            Self::Downstream(_) => "downstream",
            Self::Timeout => "timeout",
            Self::EmptyResponse => "empty_response",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::UnsupportedType { .. } => StatusCode::UNSUPPORTED_MEDIA_TYPE,
            Self::EmptyUpload => StatusCode::BAD_REQUEST,
            Self::InvalidImage(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::Downstream(_) | Self::EmptyResponse => StatusCode::BAD_GATEWAY,
            Self::Timeout => StatusCode::GATEWAY_TIMEOUT,
        }
    }

    /// Message shown to the person who uploaded the file. Downstream details
    /// stay in the logs.
    pub fn user_message(&self) -> String {
        match self {
            Self::UnsupportedType { mime } => {
                format!("Unsupported file type ({mime}). Please upload a supported file.")
            }
            Self::EmptyUpload => "The uploaded file is empty.".to_string(),
            Self::InvalidImage(_) => {
                "Error processing image. Make sure it's a valid image file.".to_string()
            }
            Self::Downstream(_) | Self::EmptyResponse => {
                "The analysis service could not process this file. Please try again.".to_string()
            }
            Self::Timeout => {
                "The analysis service took too long to respond. Please try again.".to_string()
            }
        }
    }
}

impl From<reqwest::Error> for AnalysisError {
    fn from(error: reqwest::Error) -> Self {
        if error.is_timeout() {
            AnalysisError::Timeout
        } else {
            AnalysisError::Downstream(error.to_string())
        }
    }
}

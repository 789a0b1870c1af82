//! File-name based MIME classification and the fixed allow-list.

use std::fmt;

/// Extension the standard table either lacks or maps outside the allow-list,
/// and what to send instead.
const FALLBACK_EXTENSION: &str = "m4a";
const FALLBACK_MIME: &str = "audio/mp4";

pub const IMAGE_TYPES: &[&str] = &["image/png", "image/jpeg", "image/webp"];

pub const AUDIO_TYPES: &[&str] = &[
    "audio/wav",
    "audio/x-wav",
    "audio/mp3",
    "audio/mpeg",
    "audio/mp4",
    "audio/aac",
    "audio/ogg",
    "audio/flac",
    "audio/aiff",
    "audio/x-aiff",
];

pub const VIDEO_TYPES: &[&str] = &[
    "video/mp4",
    "video/mpeg",
    "video/quicktime",
    "video/webm",
    "video/x-msvideo",
    "video/x-flv",
    "video/3gpp",
];

pub const DOCUMENT_TYPES: &[&str] = &[
    "application/pdf",
    "text/plain",
    "text/html",
    "text/css",
    "text/csv",
    "text/markdown",
    "text/x-markdown",
    "application/json",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MimeCategory {
    Image,
    Audio,
    Video,
    Document,
}

impl MimeCategory {
    /// Allow-list partition the MIME string belongs to, if any.
    pub fn of(mime: &str) -> Option<Self> {
        if IMAGE_TYPES.contains(&mime) {
            Some(Self::Image)
        } else if AUDIO_TYPES.contains(&mime) {
            Some(Self::Audio)
        } else if VIDEO_TYPES.contains(&mime) {
            Some(Self::Video)
        } else if DOCUMENT_TYPES.contains(&mime) {
            Some(Self::Document)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MimeType {
    Known(String),
    Unknown,
}

impl MimeType {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Known(value) => Some(value.as_str()),
            Self::Unknown => None,
        }
    }

    pub fn category(&self) -> Option<MimeCategory> {
        self.as_str().and_then(MimeCategory::of)
    }
}

impl fmt::Display for MimeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Known(value) => f.write_str(value),
            Self::Unknown => f.write_str("unknown"),
        }
    }
}

/// Every MIME type accepted for analysis.
pub fn allow_list() -> impl Iterator<Item = &'static str> {
    IMAGE_TYPES
        .iter()
        .chain(AUDIO_TYPES)
        .chain(VIDEO_TYPES)
        .chain(DOCUMENT_TYPES)
        .copied()
}

pub fn extension_of(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    let ext = ext.trim();
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_lowercase())
}

fn standard_lookup(extension: &str) -> Option<String> {
    mime_guess::from_ext(extension)
        .first_raw()
        .map(str::to_string)
}

pub fn classify(file_name: &str) -> MimeType {
    classify_with(file_name, standard_lookup)
}

/// Same as [`classify`] with an explicit extension table.
pub fn classify_with<F>(file_name: &str, lookup: F) -> MimeType
where
    F: Fn(&str) -> Option<String>,
{
    let Some(extension) = extension_of(file_name) else {
        return MimeType::Unknown;
    };
    let standard = lookup(&extension).map(MimeType::Known);
    match standard {
        Some(mime) if is_supported(&mime) => mime,
        _ if extension == FALLBACK_EXTENSION => MimeType::Known(FALLBACK_MIME.to_string()),
        Some(mime) => mime,
        None => MimeType::Unknown,
    }
}

pub fn is_supported(mime: &MimeType) -> bool {
    match mime {
        MimeType::Known(value) => allow_list().any(|allowed| allowed == value),
        MimeType::Unknown => false,
    }
}

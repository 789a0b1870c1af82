use sha2::{Digest, Sha256};
use tracing::debug;

use crate::{
    classify::MimeCategory,
    errors::AnalysisError,
    image_processing::{self, CANONICAL_MIME_TYPE},
};

/// Bytes and MIME type handed to the model in one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Payload {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl Payload {
    pub fn new(bytes: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes,
            mime_type: mime_type.into(),
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Short hex digest for log correlation.
    pub fn digest(&self) -> String {
        let digest = Sha256::digest(&self.bytes);
        hex::encode(&digest[..8])
    }
}

/// Builds the payload for an allow-listed MIME type. The caller is expected to
/// have checked the allow-list already.
///
/// Images are decoded and re-encoded as PNG whatever their original format;
/// everything else is passed through untouched.
pub fn build_payload(bytes: &[u8], mime_type: &str) -> Result<Payload, AnalysisError> {
    if MimeCategory::of(mime_type) != Some(MimeCategory::Image) {
        return Ok(Payload::new(bytes.to_vec(), mime_type));
    }

    if let Some(sniffed) = image_processing::detect_mime_type(bytes) {
        if sniffed != mime_type {
            debug!(
                declared = mime_type,
                sniffed,
                "image content does not match its extension"
            );
        }
    }

    let (pixels, width, height) = image_processing::decode_image(bytes)
        .map_err(|err| AnalysisError::InvalidImage(err.to_string()))?;
    let png = image_processing::encode_png(&pixels, width, height)
        .map_err(|err| AnalysisError::InvalidImage(err.to_string()))?;
    Ok(Payload::new(png, CANONICAL_MIME_TYPE))
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, GenericImageView, ImageBuffer, ImageFormat, Rgb};

    fn encoded(format: ImageFormat, width: u32, height: u32) -> Vec<u8> {
        let image = ImageBuffer::from_fn(width, height, |x, y| Rgb([x as u8, y as u8, 128]));
        let mut output = Vec::new();
        DynamicImage::ImageRgb8(image)
            .write_to(&mut std::io::Cursor::new(&mut output), format)
            .unwrap();
        output
    }

    #[test]
    fn every_image_type_becomes_png() {
        let cases = [
            ("image/png", encoded(ImageFormat::Png, 12, 7)),
            ("image/jpeg", encoded(ImageFormat::Jpeg, 12, 7)),
            ("image/webp", encoded(ImageFormat::WebP, 12, 7)),
        ];
        for (mime, bytes) in cases {
            let payload = build_payload(&bytes, mime).unwrap();
            assert_eq!(payload.mime_type, CANONICAL_MIME_TYPE, "input {mime}");
            assert_eq!(
                image_processing::detect_mime_type(&payload.bytes),
                Some("image/png")
            );
            let decoded = image::load_from_memory(&payload.bytes).unwrap();
            assert_eq!(decoded.dimensions(), (12, 7));
        }
    }

    #[test]
    fn extension_mismatch_still_decodes() {
        let png = encoded(ImageFormat::Png, 3, 3);
        let payload = build_payload(&png, "image/jpeg").unwrap();
        assert_eq!(payload.mime_type, "image/png");
    }

    #[test]
    fn corrupt_image_is_invalid_image() {
        let err = build_payload(b"not an image at all", "image/png").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidImage(_)));

        let mut truncated = encoded(ImageFormat::Png, 8, 8);
        truncated.truncate(20);
        let err = build_payload(&truncated, "image/png").unwrap_err();
        assert!(matches!(err, AnalysisError::InvalidImage(_)));
    }

    #[test]
    fn non_images_pass_through_verbatim() {
        let payload = build_payload(b"hello", "text/plain").unwrap();
        assert_eq!(payload.bytes, b"hello");
        assert_eq!(payload.mime_type, "text/plain");

        let garbage = vec![0u8, 1, 2, 250, 251];
        let payload = build_payload(&garbage, "audio/mp3").unwrap();
        assert_eq!(payload.bytes, garbage);
        assert_eq!(payload.mime_type, "audio/mp3");
    }

    #[test]
    fn digest_is_stable() {
        let a = Payload::new(b"hello".to_vec(), "text/plain");
        let b = Payload::new(b"hello".to_vec(), "text/markdown");
        assert_eq!(a.digest(), b.digest());
        assert_eq!(a.digest().len(), 16);
    }
}

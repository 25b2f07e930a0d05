//! Shared types passed between the batch, the imaging backend and the
//! archive packager.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IntakeError {
    #[error("{name}: unsupported media type '{media_type}'")]
    UnsupportedMediaType { name: String, media_type: String },
}

/// Raw bytes of an accepted input file.
///
/// Immutable once created. Pixel dimensions are not stored here: the
/// backend reads them from the header when the item is processed, so an
/// undecodable file is accepted into the batch and fails there, not at
/// intake.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceImage {
    name: String,
    media_type: String,
    bytes: Vec<u8>,
}

impl SourceImage {
    /// Accept a file whose declared media type is `image/*`.
    pub fn new(
        name: impl Into<String>,
        media_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Result<Self, IntakeError> {
        let name = name.into();
        let media_type = media_type.into();
        if !media_type.to_ascii_lowercase().starts_with("image/") {
            return Err(IntakeError::UnsupportedMediaType { name, media_type });
        }
        Ok(Self {
            name,
            media_type,
            bytes,
        })
    }

    /// Display name, usually the original filename.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn media_type(&self) -> &str {
        &self.media_type
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }
}

/// Encoded output of a render: bytes plus their media type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EncodedBuffer {
    pub media_type: String,
    #[serde(skip)]
    pub bytes: Vec<u8>,
}

impl EncodedBuffer {
    pub fn new(media_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            media_type: media_type.into(),
            bytes,
        }
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn source_accepts_image_media_types() {
        let src = SourceImage::new("dawn.jpg", "image/jpeg", vec![1, 2, 3]).unwrap();
        assert_eq!(src.name(), "dawn.jpg");
        assert_eq!(src.media_type(), "image/jpeg");
        assert_eq!(src.bytes(), &[1, 2, 3]);
    }

    #[test]
    fn source_media_type_check_is_case_insensitive() {
        assert!(SourceImage::new("a.PNG", "Image/PNG", Vec::new()).is_ok());
    }

    #[test]
    fn source_rejects_non_image_media_types() {
        let err = SourceImage::new("notes.pdf", "application/pdf", vec![0]).unwrap_err();
        assert_eq!(
            err,
            IntakeError::UnsupportedMediaType {
                name: "notes.pdf".into(),
                media_type: "application/pdf".into(),
            }
        );
        assert_eq!(
            err.to_string(),
            "notes.pdf: unsupported media type 'application/pdf'"
        );
    }

    #[test]
    fn source_rejects_empty_media_type() {
        assert!(SourceImage::new("blob", "", vec![0]).is_err());
    }

    #[test]
    fn encoded_buffer_len() {
        let buf = EncodedBuffer::new("image/png", vec![0; 4]);
        assert_eq!(buf.len(), 4);
        assert!(!buf.is_empty());
        assert!(EncodedBuffer::new("image/png", Vec::new()).is_empty());
    }
}

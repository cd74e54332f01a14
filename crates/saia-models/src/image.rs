//! Photo payloads.
//!
//! Person endpoints take photos inline as base64 data URLs.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;

/// A photo plus its MIME type.
#[derive(Clone, PartialEq, Eq)]
pub struct ImageData {
    bytes: Vec<u8>,
    mime_type: String,
}

impl ImageData {
    pub fn new(bytes: impl Into<Vec<u8>>, mime_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            mime_type: mime_type.into(),
        }
    }

    pub fn jpeg(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(bytes, "image/jpeg")
    }

    pub fn png(bytes: impl Into<Vec<u8>>) -> Self {
        Self::new(bytes, "image/png")
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn mime_type(&self) -> &str {
        &self.mime_type
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// File extension for the known image types.
    pub fn extension(&self) -> Option<&'static str> {
        match self.mime_type.as_str() {
            "image/png" => Some("png"),
            "image/jpeg" => Some("jpg"),
            "image/gif" => Some("gif"),
            _ => None,
        }
    }

    /// Upload file name, e.g. `filename.jpg`.
    pub fn file_name(&self) -> String {
        match self.extension() {
            Some(ext) => format!("filename.{}", ext),
            None => "filename".to_string(),
        }
    }

    /// Encode as `data:{mime};base64,{payload}`.
    pub fn to_data_url(&self) -> String {
        format!("data:{};base64,{}", self.mime_type, STANDARD.encode(&self.bytes))
    }
}

impl std::fmt::Debug for ImageData {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ImageData")
            .field("mime_type", &self.mime_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

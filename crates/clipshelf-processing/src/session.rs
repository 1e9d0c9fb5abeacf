use crate::error::{PipelineError, PipelineResult};

/// Subtypes accepted for video uploads.
pub const VIDEO_SUBTYPES: &[&str] = &["mp4"];
/// Subtypes accepted for thumbnail uploads.
pub const THUMBNAIL_SUBTYPES: &[&str] = &["png", "jpeg"];

/// The declared type of an incoming upload.
///
/// Built from the multipart part's `Content-Type` before any bytes are
/// buffered, so rejected uploads never touch the disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadSession {
    content_type: String,
    extension: String,
}

impl UploadSession {
    /// Parse a `type/subtype; params` header and check the subtype against `allowed`.
    pub fn from_content_type(header: Option<&str>, allowed: &[&str]) -> PipelineResult<Self> {
        let header = header
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or_else(|| PipelineError::Validation("Missing content type".to_string()))?;

        let media_type = header
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();

        let (top, subtype) = media_type
            .split_once('/')
            .filter(|(top, subtype)| is_token(top) && is_token(subtype))
            .ok_or_else(|| {
                PipelineError::Validation(format!("Unable to parse media type: {}", header))
            })?;

        if !allowed.contains(&subtype) {
            return Err(PipelineError::Validation(format!(
                "Invalid file type: {}",
                media_type
            )));
        }

        Ok(Self {
            extension: subtype.to_string(),
            content_type: format!("{}/{}", top, subtype),
        })
    }

    /// Normalized `type/subtype`, without parameters
    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn extension(&self) -> &str {
        &self.extension
    }
}

fn is_token(value: &str) -> bool {
    !value.is_empty()
        && value
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c))
}

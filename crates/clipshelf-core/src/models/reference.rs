//! Stored reference to a published video object.
//!
//! A reference is persisted as a single URI, `s3://<bucket>/<key>`. Bucket
//! names never contain `/`, so the first `/` after the scheme is the only
//! separator and the key may contain anything (including `,` and `/`).

use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

pub const REFERENCE_SCHEME: &str = "s3://";

const MAX_BUCKET_LEN: usize = 63;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReferenceError {
    #[error("reference does not start with {REFERENCE_SCHEME}: {0}")]
    MissingScheme(String),

    #[error("reference has no object key: {0}")]
    MissingKey(String),

    #[error("invalid bucket name: {0:?}")]
    InvalidBucket(String),
}

/// Bucket and key of a published object.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct StoredReference {
    bucket: String,
    key: String,
}

impl StoredReference {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Result<Self, ReferenceError> {
        let bucket = bucket.into();
        let key = key.into();
        validate_bucket(&bucket)?;
        if key.is_empty() {
            return Err(ReferenceError::MissingKey(format!("{}{}/", REFERENCE_SCHEME, bucket)));
        }
        Ok(Self { bucket, key })
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }

    /// Canonical persisted form.
    pub fn to_uri(&self) -> String {
        format!("{}{}/{}", REFERENCE_SCHEME, self.bucket, self.key)
    }

    pub fn parse(value: &str) -> Result<Self, ReferenceError> {
        let rest = value
            .strip_prefix(REFERENCE_SCHEME)
            .ok_or_else(|| ReferenceError::MissingScheme(value.to_string()))?;
        let (bucket, key) = rest
            .split_once('/')
            .ok_or_else(|| ReferenceError::MissingKey(value.to_string()))?;
        Self::new(bucket, key)
    }

    pub fn into_parts(self) -> (String, String) {
        (self.bucket, self.key)
    }
}

/// Bucket names allowed in a reference: lowercase letters, digits, `-` and `.`.
pub fn validate_bucket(bucket: &str) -> Result<(), ReferenceError> {
    let valid = !bucket.is_empty()
        && bucket.len() <= MAX_BUCKET_LEN
        && bucket
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(ReferenceError::InvalidBucket(bucket.to_string()))
    }
}

impl Display for StoredReference {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}{}/{}", REFERENCE_SCHEME, self.bucket, self.key)
    }
}

impl FromStr for StoredReference {
    type Err = ReferenceError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_uri_round_trip_keeps_bucket_and_key() {
        let reference = StoredReference::new("clip-videos", "landscape/abc_-DEF.mp4").unwrap();
        let uri = reference.to_uri();
        assert_eq!(uri, "s3://clip-videos/landscape/abc_-DEF.mp4");

        let parsed = StoredReference::parse(&uri).unwrap();
        assert_eq!(parsed, reference);
        assert_eq!(parsed.bucket(), "clip-videos");
        assert_eq!(parsed.key(), "landscape/abc_-DEF.mp4");
    }

    #[test]
    fn test_key_with_commas_is_unambiguous() {
        let reference = StoredReference::new("videos", "other/a,b,c.mp4").unwrap();
        let parsed: StoredReference = reference.to_string().parse().unwrap();
        assert_eq!(parsed.into_parts(), ("videos".to_string(), "other/a,b,c.mp4".to_string()));
    }

    #[test]
    fn test_legacy_comma_joined_value_is_rejected() {
        let err = StoredReference::parse("videos,landscape/abc.mp4").unwrap_err();
        assert!(matches!(err, ReferenceError::MissingScheme(_)));
    }

    #[test]
    fn test_missing_key_is_rejected() {
        assert!(matches!(
            StoredReference::parse("s3://videos"),
            Err(ReferenceError::MissingKey(_))
        ));
        assert!(matches!(
            StoredReference::parse("s3://videos/"),
            Err(ReferenceError::MissingKey(_))
        ));
    }

    #[test]
    fn test_invalid_bucket_is_rejected() {
        assert!(matches!(
            StoredReference::parse("s3:///landscape/a.mp4"),
            Err(ReferenceError::InvalidBucket(_))
        ));
        assert!(matches!(
            StoredReference::new("Videos,Prod", "a.mp4"),
            Err(ReferenceError::InvalidBucket(_))
        ));
    }
}

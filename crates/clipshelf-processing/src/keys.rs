use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::rngs::OsRng;
use rand::TryRngCore;
use std::fmt;

use crate::error::{PipelineError, PipelineResult};
use crate::probe::AspectClass;

const TOKEN_BYTES: usize = 32;

/// Object key of a published video: `{aspect}/{token}.{extension}`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct StorageKey(String);

impl StorageKey {
    /// Derive a fresh key using the operating system's CSPRNG.
    pub fn derive(aspect: AspectClass, extension: &str) -> PipelineResult<Self> {
        Self::derive_with(&mut OsRng, aspect, extension)
    }

    pub fn derive_with<R: TryRngCore>(
        rng: &mut R,
        aspect: AspectClass,
        extension: &str,
    ) -> PipelineResult<Self> {
        if extension.is_empty() || !extension.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(PipelineError::Validation(format!(
                "Invalid file extension: {:?}",
                extension
            )));
        }

        let token = random_token_with(rng)?;
        Ok(Self(format!("{}/{}.{}", aspect, token, extension)))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

/// 32 random bytes from the OS CSPRNG, base64url without padding (43 chars).
pub fn random_token() -> PipelineResult<String> {
    random_token_with(&mut OsRng)
}

fn random_token_with<R: TryRngCore>(rng: &mut R) -> PipelineResult<String> {
    let mut bytes = [0u8; TOKEN_BYTES];
    rng.try_fill_bytes(&mut bytes)
        .map_err(|e| PipelineError::Internal(format!("Unable to generate random key: {}", e)))?;
    Ok(URL_SAFE_NO_PAD.encode(bytes))
}

impl fmt::Display for StorageKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_key_shape() {
        let key = StorageKey::derive(AspectClass::Landscape, "mp4").unwrap();
        let (aspect, file) = key.as_str().split_once('/').unwrap();
        let (token, ext) = file.rsplit_once('.').unwrap();

        assert_eq!(aspect, "landscape");
        assert_eq!(ext, "mp4");
        assert_eq!(token.len(), 43);
        assert!(token
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_'));
    }

    #[test]
    fn test_keys_are_unique() {
        let keys: HashSet<_> = (0..100)
            .map(|_| StorageKey::derive(AspectClass::Other, "mp4").unwrap())
            .collect();
        assert_eq!(keys.len(), 100);
    }

    #[test]
    fn test_bad_extension_rejected() {
        assert!(StorageKey::derive(AspectClass::Portrait, "").is_err());
        assert!(StorageKey::derive(AspectClass::Portrait, "mp4/../x").is_err());
    }

    struct NoEntropy;

    impl TryRngCore for NoEntropy {
        type Error = std::io::Error;

        fn try_next_u32(&mut self) -> Result<u32, Self::Error> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no entropy"))
        }

        fn try_next_u64(&mut self) -> Result<u64, Self::Error> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no entropy"))
        }

        fn try_fill_bytes(&mut self, _dest: &mut [u8]) -> Result<(), Self::Error> {
            Err(std::io::Error::new(std::io::ErrorKind::Other, "no entropy"))
        }
    }

    #[test]
    fn test_entropy_failure_is_internal() {
        let err = StorageKey::derive_with(&mut NoEntropy, AspectClass::Landscape, "mp4").unwrap_err();
        assert!(matches!(err, PipelineError::Internal(_)));
    }
}

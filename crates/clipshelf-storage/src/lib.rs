//! Clipshelf Storage Library
//!
//! Object storage abstraction used to publish processed videos and to hand
//! out short-lived signed URLs for them.
//!
//! # Storage key format
//!
//! Keys are derived by the upload pipeline as `{aspect}/{token}.{ext}`. Keys
//! must not contain `..` or a leading `/`.

pub mod factory;
#[cfg(feature = "storage-local")]
pub mod local;
#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use clipshelf_core::StorageBackend;
#[cfg(feature = "storage-local")]
pub use factory::create_local_storage;
pub use factory::create_storage;
#[cfg(feature = "storage-local")]
pub use local::LocalStorage;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{validate_key, Storage, StorageError, StorageResult};

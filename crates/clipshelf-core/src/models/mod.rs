//! Data models shared across the workspace.

mod reference;
mod video;

pub use reference::{validate_bucket, ReferenceError, StoredReference, REFERENCE_SCHEME};
pub use video::{CreateVideoParams, VideoRecord, VideoView};

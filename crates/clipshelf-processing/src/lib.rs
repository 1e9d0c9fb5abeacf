//! Clipshelf Processing Library
//!
//! The upload pipeline that turns a raw video upload into a published,
//! aspect-classified object, plus the resolver that signs URLs for it on
//! read.
//!
//! External tools (ffmpeg, ffprobe) are invoked through [`CommandRunner`].

pub mod command;
pub mod error;
pub mod keys;
pub mod normalize;
pub mod pipeline;
pub mod probe;
pub mod publish;
pub mod resolve;
pub mod scratch;
pub mod session;
#[cfg(any(test, feature = "test-util"))]
pub mod testing;

// Re-export commonly used types
pub use command::{CommandError, CommandOutput, CommandRunner, TokioCommandRunner};
pub use error::{PipelineError, PipelineResult};
pub use keys::{random_token, StorageKey};
pub use normalize::ContainerNormalizer;
pub use pipeline::{PublishedVideo, UploadPipeline};
pub use probe::{AspectClass, Geometry, GeometryProber};
pub use publish::Publisher;
pub use resolve::ReferenceResolver;
pub use scratch::{ScratchFile, UploadTooLarge};
pub use session::{UploadSession, THUMBNAIL_SUBTYPES, VIDEO_SUBTYPES};

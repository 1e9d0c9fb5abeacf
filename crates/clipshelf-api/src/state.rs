//! Application state shared by every handler.

use crate::auth::JwtValidator;
use clipshelf_core::Config;
use clipshelf_db::VideoRepository;
use clipshelf_processing::{ReferenceResolver, UploadPipeline};
use clipshelf_storage::{LocalStorage, Storage};
use std::sync::Arc;

pub struct AppState {
    pub config: Config,
    pub jwt: JwtValidator,
    pub videos: Arc<dyn VideoRepository>,
    pub storage: Arc<dyn Storage>,
    /// Present when objects live on local disk and this process serves them
    pub local_media: Option<Arc<LocalStorage>>,
    pub pipeline: UploadPipeline,
    pub resolver: ReferenceResolver,
    /// Strip `details` and `error_type` from error bodies
    pub hide_error_details: bool,
}

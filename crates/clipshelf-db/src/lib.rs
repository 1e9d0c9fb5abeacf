//! Clipshelf Database Layer
//!
//! Repositories for video metadata: PostgreSQL through sqlx, and an
//! in-memory implementation for tests and local development.

pub mod memory;
pub mod video;

pub use memory::InMemoryVideoRepository;
pub use video::{PgVideoRepository, VideoRepository};

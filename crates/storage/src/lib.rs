//! Output directory access for generated snippets.
//!
//! The build pipeline never touches the filesystem directly: it lists, writes
//! and deletes through a [`StorageBackend`] so that a run can be pointed at a
//! real project directory ([`LocalBackend`](backend::LocalBackend)) or at an
//! in-memory map in tests (`MockBackend`, behind the `mock` feature).

pub mod backend;
pub mod error;
mod models;
mod path;

pub use crate::backend::StorageBackend;
pub use crate::models::FileInfo;
pub use crate::path::validate as validate_path;
use std::sync::Arc;

pub type BackendHandle = Arc<dyn StorageBackend + Send + Sync>;

//! The cdnjs library catalog.
//!
//! This crate knows what a catalog looks like on the wire
//! ([`CatalogDocument`](models::CatalogDocument)), how library names turn into
//! stable file-name keys ([`CanonicalName`](models::CanonicalName)), how
//! versions order against each other ([`LibraryVersion`](models::LibraryVersion))
//! and where a catalog comes from ([`CatalogSource`]).
//!
//! It performs no filesystem writes and knows nothing about snippets.

pub mod error;
pub mod models;
mod source;

pub use crate::source::{CatalogSource, DEFAULT_CATALOG_URL, HttpCatalog, StaticCatalog};

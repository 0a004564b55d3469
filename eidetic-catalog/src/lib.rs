//! File catalog for the eidetic search engine.
//!
//! This crate provides:
//! - [`CatalogEntry`], one tracked file
//! - The [`Catalog`] trait the search engine consumes
//! - [`DirectoryCatalog`], a catalog over a persisted list of tracked
//!   directories, filtered to plain-text extensions

mod catalog;
mod directory;
mod error;

pub use catalog::{Catalog, CatalogEntry};
pub use directory::DirectoryCatalog;
pub use error::{CatalogError, Result};

//! Game catalog persistence.
//!
//! The catalog is a directory holding one JSON file per game. This crate
//! loads those files into [`GameRecord`] values, fills in derived fields
//! (`id`, `name`, `work_dir`), and writes records back as full-object
//! overwrites. It is a plain library with no async or UI dependencies;
//! the owner of the in-memory catalog calls it synchronously.
//!
//! # Operations
//!
//! - **Load**: enumerate `*.json`, skip malformed files, seed a sample when empty
//! - **Save**: serialize everything except `meta_path` to the backing file
//! - **Quick add**: create a record for an executable without clobbering others

pub mod error;
pub mod record;
pub mod store;

// Re-export primary types for convenience.
pub use error::CatalogError;
pub use record::{GameRecord, UpdateDescriptor};
pub use store::{CatalogStore, slugify};

/// Default catalog directory, relative to the working directory.
pub const DEFAULT_CATALOG_DIR: &str = "games";

/// File extension of a catalog record.
pub const RECORD_EXTENSION: &str = "json";

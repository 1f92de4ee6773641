//! Persistence Layer
//!
//! Two independent stores: a pooled SQLite record store for upload and
//! analysis metadata, and a filesystem blob store for the uploaded bytes.
//! Records reference blobs by opaque key; nothing in the record store ever
//! reads file content.

pub mod blob;
pub mod database;
pub mod records;

pub use blob::{BlobStore, FsBlobStore};
pub use database::{Database, PoolConfig, SharedDatabase};
pub use records::CompletedAnalysis;

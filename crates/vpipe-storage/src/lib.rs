//! Object store client for vpipe artifacts.
//!
//! This crate provides:
//! - Store configuration from the environment
//! - The [`ObjectStore`] seam and its HTTP implementation
//! - Upsert uploads with public or signed access URLs

pub mod client;
pub mod config;
pub mod error;
pub mod uploader;

#[cfg(any(test, feature = "test-util"))]
pub mod memory;

pub use client::{HttpStore, ObjectStore};
pub use config::StoreConfig;
pub use error::{StorageError, StorageResult};
pub use uploader::Uploader;

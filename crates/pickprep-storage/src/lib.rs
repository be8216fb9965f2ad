//! Pickprep Storage Library
//!
//! This crate provides the storage accessor the preloader uses to make remote
//! items locally resolvable, and a local filesystem implementation of it.
//!
//! # Storage key format
//!
//! A locator `scheme://authority/s1/.../sN` is stored under the key
//! `authority/s1/.../sN`. The scheme is not part of the key. Key generation is
//! centralized in the `keys` module.

pub mod factory;
pub(crate) mod keys;
pub mod local;
pub mod traits;

// Re-export commonly used types
pub use factory::create_storage;
pub use local::LocalStorage;
pub use traits::{Storage, StorageError, StorageResult};

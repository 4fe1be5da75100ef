//! # G3MS Core
//!
//! Shared foundation for the G3MS client SDK crates: error types, the
//! tiered key-value storage abstraction, environment/logging bootstrap,
//! and date/random utilities.
//!
//! Everything here is backend-agnostic. The HTTP client lives in
//! `g3ms-client` and the orchestration services in `g3ms-flow`; both
//! build on the seams defined in this crate.

pub mod env;
pub mod error;
pub mod storage;
pub mod util;

pub use error::{CoreError, Result};
pub use storage::{KeyValueStore, MemoryStore, StorageError, TieredStore};

//! # cset-core
//!
//! Foundation crate for the changeset log cache. Defines the shared
//! types, config, constants, errors, and narrow-capability traits that
//! the store, fetcher, workers, and service crates build on.

pub mod config;
pub mod constants;
pub mod errors;
pub mod traits;
pub mod types;

// Re-export the most commonly used types at the crate root.
pub use config::CsetConfig;
pub use errors::{CsetError, CsetResult};
pub use types::{CsetRow, FillBoundary, FillDirection, Revision, PERMANENT_TIMESTAMP};

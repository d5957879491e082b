//! Shared building blocks for the Creatubbles client crates.
//!
//! - `errors`: the per-request error taxonomy and backend `ApiError` items
//! - `config`: API endpoint and application credentials
//! - `storage`: the credential store seam
//! - `parse`: typed, error-accumulating decoding of JSON response bodies

pub mod config;
pub mod errors;
pub mod parse;
pub mod storage;

pub use config::*;
pub use errors::*;
pub use parse::*;
pub use storage::*;

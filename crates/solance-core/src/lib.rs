//! solance-core
//!
//! Pure domain types and store key conventions.
//! No I/O and no async runtime. This is the shared vocabulary of the
//! Solance chat client.

pub mod error;
pub mod models;
pub mod store_keys;

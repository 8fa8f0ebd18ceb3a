//! solance-storage
//!
//! Local key-value persistence. Backends may fail; [`LocalStore`] never
//! does. It degrades to an in-memory shadow and logs instead.

pub mod backend;
pub mod error;
pub mod file;
pub mod state;
pub mod store;

pub use store::LocalStore;

//! solance-llm
//!
//! Model access: the provider seam, the Gemini REST provider, and the
//! failover client that walks models and credentials until one answers.

pub mod error;
pub mod failover;
pub mod gemini;
pub mod notify;
pub mod provider;
pub mod request;

pub use tokio_util::sync::CancellationToken;

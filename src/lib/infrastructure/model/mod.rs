//! Model infrastructure module
//!
//! The language model is a stateless request/response collaborator: it takes
//! an ordered message list and returns the assistant's raw text.
//!
//! # Structure
//! - `types` - Error type
//! - `traits` - ModelProvider trait
//! - `clients` - HTTP client implementations

pub mod clients;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use clients::OpenAIClient;
pub use traits::ModelProvider;
pub use types::ModelError;

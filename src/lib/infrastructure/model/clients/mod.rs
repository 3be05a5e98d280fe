//! Model client implementations

mod base;
mod openai;

pub use base::HttpClientBase;
pub use openai::OpenAIClient;

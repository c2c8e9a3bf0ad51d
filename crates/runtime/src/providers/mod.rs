//! Model provider backends.

mod gemini;

pub use gemini::{GeminiClient, GeminiClientBuilder};

//! AI Playground Server library
//!
//! An HTTP server that pairs each playground page with one endpoint:
//! completion, chat, structured data, image generation, speech synthesis,
//! audio transcription and web-search-augmented chat, all backed by the
//! OpenAI REST API.

// Public modules
pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod middleware;
pub mod schemas;
pub mod server;
pub mod services;
pub mod tools;
pub mod utils;

// Re-export commonly used types
pub use config::Settings;
pub use error::ApiError;
pub use server::App;

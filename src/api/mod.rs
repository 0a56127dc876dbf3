//! API endpoint handlers module
//!
//! Contains all HTTP endpoint handler implementations, one per playground
//! page, plus the shared streaming relay.

pub mod chat;
pub mod client_tools;
pub mod completion;
pub mod generate_image;
pub mod generate_speech;
pub mod health;
pub mod image_tool;
pub mod relay;
pub mod stream;
pub mod structured_data;
pub mod transcribe;
pub mod web_search;

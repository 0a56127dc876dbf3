//! Services module
//!
//! Contains the upstream OpenAI API client.

pub mod openai;

pub use openai::{
    AudioUpload, ChatStream, OpenAiConfig, OpenAiService, OpenAiServiceError, ResponsesStream,
};

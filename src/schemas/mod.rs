//! Schema module
//!
//! Wire types for the upstream OpenAI API and for the browser-facing
//! UI message protocol.

pub mod openai;
pub mod responses;
pub mod ui;

//! Hosted LLM backends.

pub mod openai;

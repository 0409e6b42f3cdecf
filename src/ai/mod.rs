mod analyzer;
mod client;
mod interpreter;
mod prompts;

pub use analyzer::Analyzer;
pub use client::{ClaudeClient, CompletionClient};

#[cfg(test)]
pub(crate) use analyzer::test_support;

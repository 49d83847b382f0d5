pub mod client;
#[cfg(test)]
pub mod fake;
pub mod prompts;
pub mod tasks;
pub mod types;

pub use client::{AnthropicClient, LlmClient};
pub use tasks::{Dispatcher, TaskContext, TaskOutcome};

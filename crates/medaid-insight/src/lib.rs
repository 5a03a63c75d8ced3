//! MedAid Insight crate - short labels for chat conversations.
//!
//! The title summarizer turns the first user message of a conversation into
//! a label of at most 25 characters for the chat history sidebar.

pub mod summarizer;

pub use summarizer::{summarize_title, summarize_title_detailed, Title, TitleRule, MAX_TITLE_LEN};

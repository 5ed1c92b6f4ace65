// Interview engine: question bank, answer classification, the conversation
// state machine and the final summary.
// All LLM calls go through llm_client::Reasoner — no direct HTTP here.

pub mod controller;
pub mod prompts;
pub mod questions;
pub mod skip;
pub mod state;
pub mod summarizer;
pub mod verdict;

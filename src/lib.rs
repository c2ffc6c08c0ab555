//! Ready4Uni - a conversational assistant for choosing a university major
//!
//! A message goes through a crisis screen, LLM intent classification and an
//! LLM-driven tool loop over a static majors dataset, grade analysis and
//! uploaded transcripts, then an LLM-written reply.

pub mod agent;
pub mod catalog;
pub mod config;
pub mod error;
pub mod id;
pub mod llm;
pub mod pdf;
pub mod prompt;
pub mod services;
pub mod session;
pub mod tools;

pub use agent::{ChatResponse, ChatService};
pub use catalog::{Major, MajorCatalog};
pub use config::Config;
pub use error::{Ready4UniError, Result};
pub use session::{ChatSession, UploadedFile};

//! CLI module for ready4uni - command-line interface and subcommands.
//!
//! Provides the main entry point with subcommands for chatting with the
//! assistant and for browsing majors, grade gaps and transcripts offline.

pub mod commands;
pub mod repl;

pub use commands::Cli;

//! Interactive chat loop on stdin/stdout.

use std::io::Write;

use colored::*;
use eyre::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use ready4uni::config::UploadConfig;
use ready4uni::{ChatResponse, ChatService, ChatSession, UploadedFile};

const HELP: &str = "Commands:
  /upload <path or glob>  add a transcript PDF
  /files                  list uploaded files
  /clear                  forget the conversation and uploads
  /quit                   leave";

/// One line of user input
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReplCommand {
    Message(String),
    Upload(String),
    Files,
    Clear,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

pub fn parse_line(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Empty;
    }
    let Some(command) = line.strip_prefix('/') else {
        return ReplCommand::Message(line.to_string());
    };

    let (name, arg) = command.split_once(char::is_whitespace).unwrap_or((command, ""));
    match (name.to_lowercase().as_str(), arg.trim()) {
        ("upload", "") => ReplCommand::Unknown("/upload needs a file path".to_string()),
        ("upload", path) => ReplCommand::Upload(path.to_string()),
        ("files", _) => ReplCommand::Files,
        ("clear", _) => ReplCommand::Clear,
        ("help", _) => ReplCommand::Help,
        ("quit" | "exit", _) => ReplCommand::Quit,
        (other, _) => ReplCommand::Unknown(format!("Unknown command /{}", other)),
    }
}

/// Upload every file matching `pattern`; returns the uploaded names.
pub fn upload_pattern(session: &mut ChatSession, pattern: &str, rules: &UploadConfig) -> Result<Vec<String>> {
    let paths = glob::glob(pattern).context(format!("Invalid file pattern '{}'", pattern))?;

    let mut uploaded = Vec::new();
    for path in paths {
        let path = path?;
        let file = UploadedFile::from_path(&path, rules)?;
        uploaded.push(file.name.clone());
        session.add_upload(file);
    }

    if uploaded.is_empty() {
        eyre::bail!("No files match '{}'", pattern);
    }
    Ok(uploaded)
}

pub fn print_response(response: &ChatResponse, verbose: bool) {
    let label = if response.success {
        "ready4uni>".cyan().bold()
    } else {
        "ready4uni>".red().bold()
    };
    println!("{} {}", label, response.message);

    if !response.suggestions.is_empty() {
        println!();
        for suggestion in &response.suggestions {
            println!("  {} {}", "•".dimmed(), suggestion.dimmed());
        }
    }

    if verbose {
        println!("{}", response.metadata.to_string().dimmed());
    }
    println!();
}

/// Read lines until /quit or end of input
pub async fn run(service: &ChatService, session: &mut ChatSession, uploads: &UploadConfig, verbose: bool) -> Result<()> {
    println!(
        "{} Tell me what you enjoy or upload your transcript. Type /help for commands.\n",
        "Ready4Uni".cyan().bold()
    );

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", "you>".green().bold());
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            println!();
            break;
        };

        match parse_line(&line) {
            ReplCommand::Empty => {}
            ReplCommand::Quit => break,
            ReplCommand::Help => println!("{}\n", HELP),
            ReplCommand::Files => {
                if session.uploads().is_empty() {
                    println!("{}\n", "No files uploaded".dimmed());
                }
                for file in session.uploads() {
                    println!("  {} ({} bytes)", file.name, file.size_bytes);
                }
            }
            ReplCommand::Clear => {
                session.clear();
                println!("{}\n", "Conversation cleared".yellow());
            }
            ReplCommand::Upload(pattern) => match upload_pattern(session, &pattern, uploads) {
                Ok(names) => println!("{} {}\n", "Uploaded:".green(), names.join(", ")),
                Err(e) => println!("{} {}\n", "Upload failed:".red(), e),
            },
            ReplCommand::Unknown(message) => println!("{}\n", message.yellow()),
            ReplCommand::Message(message) => {
                let response = service.process_message(session, &message).await;
                print_response(&response, verbose);
            }
        }
    }

    log::info!("Chat session {} ended", session.id);
    Ok(())
}

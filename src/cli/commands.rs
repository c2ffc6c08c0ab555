//! CLI command definitions using clap.
//!
//! Defines the main CLI structure and subcommands:
//! - chat: interactive conversation (the default)
//! - ask: one question, one answer
//! - majors: browse the majors dataset offline
//! - gaps: compare grades with a major's requirements offline
//! - pdf: inspect a transcript PDF

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Ready4Uni - find the university major that fits you
#[derive(Parser, Debug)]
#[command(name = "ready4uni")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Optional config file path
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

impl Cli {
    /// Check if verbose mode is enabled
    pub fn is_verbose(&self) -> bool {
        self.verbose
    }
}

/// Main subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Start an interactive conversation
    Chat {
        /// Transcript PDFs to upload first (glob patterns allowed)
        #[arg(short, long)]
        upload: Vec<String>,
    },

    /// Ask a single question and print the answer
    Ask {
        /// The question
        message: String,

        /// Transcript PDFs to upload first (glob patterns allowed)
        #[arg(short, long)]
        upload: Vec<String>,
    },

    /// Browse the majors dataset
    Majors {
        #[command(subcommand)]
        command: MajorsCommands,
    },

    /// Check grades against a major's entry requirements
    Gaps {
        /// Major name (e.g. "Computer Science")
        major: String,

        /// Grade as Subject=value on the 0-20 scale (repeatable)
        #[arg(short, long = "grade", value_parser = parse_grade)]
        grades: Vec<(String, f64)>,
    },

    /// Show what can be read from a transcript PDF
    Pdf {
        /// Path to the PDF
        file: PathBuf,

        /// Print the extracted text
        #[arg(short, long)]
        text: bool,
    },
}

/// Majors dataset subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum MajorsCommands {
    /// List every major
    List,

    /// Search majors by name, keyword or description
    Search {
        /// Search text
        query: String,
    },

    /// Show one major
    Info {
        /// Major name or id
        name: String,

        /// Also list similar majors
        #[arg(short, long)]
        similar: bool,
    },

    /// Suggest majors from interests and favourite subjects
    Suggest {
        /// Interest (repeatable)
        #[arg(short, long = "interest")]
        interests: Vec<String>,

        /// Favourite subject (repeatable)
        #[arg(short, long = "subject")]
        subjects: Vec<String>,

        /// Career goal in a few words
        #[arg(long)]
        career: Option<String>,

        /// Number of suggestions
        #[arg(short = 'n', long, default_value_t = 5)]
        top: usize,
    },
}

/// Parse `Subject=14.5`; a decimal comma is accepted.
pub fn parse_grade(s: &str) -> Result<(String, f64), String> {
    let (subject, value) = s
        .split_once('=')
        .ok_or_else(|| format!("expected Subject=grade, got '{}'", s))?;
    let subject = subject.trim();
    if subject.is_empty() {
        return Err(format!("missing subject in '{}'", s));
    }
    let grade: f64 = value
        .trim()
        .replace(',', ".")
        .parse()
        .map_err(|_| format!("'{}' is not a number", value.trim()))?;
    if !(0.0..=20.0).contains(&grade) {
        return Err(format!("grade {} is outside 0-20", grade));
    }
    Ok((subject.to_string(), grade))
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_parse_no_args() {
        // No args means interactive chat
        let cli = Cli::try_parse_from(["ready4uni"]).unwrap();
        assert!(cli.command.is_none());
        assert!(!cli.verbose);
        assert!(cli.config.is_none());
    }

    #[test]
    fn test_cli_verbose_flag() {
        let cli = Cli::try_parse_from(["ready4uni", "-v"]).unwrap();
        assert!(cli.is_verbose());
    }

    #[test]
    fn test_cli_config_option() {
        let cli = Cli::try_parse_from(["ready4uni", "-c", "/path/to/ready4uni.yml"]).unwrap();
        assert_eq!(cli.config.as_ref(), Some(&PathBuf::from("/path/to/ready4uni.yml")));
    }

    #[test]
    fn test_chat_with_uploads() {
        let cli = Cli::try_parse_from(["ready4uni", "chat", "-u", "boletim.pdf", "-u", "docs/*.pdf"]).unwrap();
        match cli.command {
            Some(Commands::Chat { upload }) => {
                assert_eq!(upload, vec!["boletim.pdf", "docs/*.pdf"]);
            }
            _ => panic!("Expected chat command"),
        }
    }

    #[test]
    fn test_ask_command() {
        let cli = Cli::try_parse_from(["ready4uni", "ask", "Which major fits me?"]).unwrap();
        match cli.command {
            Some(Commands::Ask { message, upload }) => {
                assert_eq!(message, "Which major fits me?");
                assert!(upload.is_empty());
            }
            _ => panic!("Expected ask command"),
        }
    }

    #[test]
    fn test_majors_info_similar() {
        let cli = Cli::try_parse_from(["ready4uni", "majors", "info", "Medicine", "--similar"]).unwrap();
        match cli.command {
            Some(Commands::Majors {
                command: MajorsCommands::Info { name, similar },
            }) => {
                assert_eq!(name, "Medicine");
                assert!(similar);
            }
            _ => panic!("Expected majors info command"),
        }
    }

    #[test]
    fn test_majors_suggest() {
        let cli = Cli::try_parse_from([
            "ready4uni", "majors", "suggest", "-i", "programming", "-i", "robots", "-s", "Math", "-n", "3",
        ])
        .unwrap();
        match cli.command {
            Some(Commands::Majors {
                command:
                    MajorsCommands::Suggest {
                        interests,
                        subjects,
                        career,
                        top,
                    },
            }) => {
                assert_eq!(interests, vec!["programming", "robots"]);
                assert_eq!(subjects, vec!["Math"]);
                assert!(career.is_none());
                assert_eq!(top, 3);
            }
            _ => panic!("Expected majors suggest command"),
        }
    }

    #[test]
    fn test_gaps_command() {
        let cli =
            Cli::try_parse_from(["ready4uni", "gaps", "Medicine", "-g", "Biology=15", "--grade", "Math=14,5"]).unwrap();
        match cli.command {
            Some(Commands::Gaps { major, grades }) => {
                assert_eq!(major, "Medicine");
                assert_eq!(
                    grades,
                    vec![("Biology".to_string(), 15.0), ("Math".to_string(), 14.5)]
                );
            }
            _ => panic!("Expected gaps command"),
        }
    }

    #[test]
    fn test_gaps_rejects_bad_grade() {
        assert!(Cli::try_parse_from(["ready4uni", "gaps", "Medicine", "-g", "Biology=25"]).is_err());
        assert!(Cli::try_parse_from(["ready4uni", "gaps", "Medicine", "-g", "Biology"]).is_err());
    }

    #[test]
    fn test_parse_grade() {
        assert_eq!(parse_grade(" Physics = 13 "), Ok(("Physics".to_string(), 13.0)));
        assert!(parse_grade("=13").is_err());
        assert!(parse_grade("Physics=high").is_err());
    }

    #[test]
    fn test_pdf_command() {
        let cli = Cli::try_parse_from(["ready4uni", "pdf", "boletim.pdf", "--text"]).unwrap();
        match cli.command {
            Some(Commands::Pdf { file, text }) => {
                assert_eq!(file, PathBuf::from("boletim.pdf"));
                assert!(text);
            }
            _ => panic!("Expected pdf command"),
        }
    }

    #[test]
    fn test_help_works() {
        // Verify help doesn't panic
        Cli::command().debug_assert();
    }

    #[test]
    fn test_version_flag() {
        let result = Cli::try_parse_from(["ready4uni", "--version"]);
        // Version flag causes early exit with error (expected)
        assert!(result.is_err());
    }
}

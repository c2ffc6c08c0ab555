use clap::Parser;
use colored::*;
use eyre::{Context, Result};
use log::info;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

mod cli;

use cli::Cli;
use cli::commands::{Commands, MajorsCommands};
use ready4uni::config::Config;
use ready4uni::llm::{AnthropicClient, LlmGateway};
use ready4uni::services::{Readiness, identify_grade_gaps, match_interests_to_majors};
use ready4uni::{ChatService, ChatSession, MajorCatalog, pdf};

fn setup_logging() -> Result<()> {
    // Create log directory
    let log_dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("ready4uni")
        .join("logs");

    fs::create_dir_all(&log_dir).context("Failed to create log directory")?;

    let log_file = log_dir.join("ready4uni.log");

    // Setup env_logger with file output
    let target = Box::new(
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_file)
            .context("Failed to open log file")?,
    );

    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(target))
        .init();

    info!("Logging initialized, writing to: {}", log_file.display());
    Ok(())
}

async fn run_application(cli: &Cli, config: &Config) -> Result<()> {
    info!("Starting application");

    if cli.is_verbose() {
        println!("{}", "Verbose mode enabled".yellow());
    }

    let catalog = Arc::new(MajorCatalog::from_config(&config.data).context("Failed to load majors dataset")?);
    info!("Loaded {} majors", catalog.len());

    match &cli.command {
        None => run_chat(&[], catalog, config, cli.is_verbose()).await,
        Some(Commands::Chat { upload }) => run_chat(upload, catalog, config, cli.is_verbose()).await,
        Some(Commands::Ask { message, upload }) => handle_ask(message, upload, catalog, config, cli.is_verbose()).await,
        Some(Commands::Majors { command }) => handle_majors_command(command, &catalog),
        Some(Commands::Gaps { major, grades }) => handle_gaps_command(major, grades, &catalog, config),
        Some(Commands::Pdf { file, text }) => handle_pdf_command(file, *text).await,
    }
}

fn build_service(catalog: Arc<MajorCatalog>, config: &Config) -> Result<(ChatService, Arc<AnthropicClient>)> {
    let client = Arc::new(AnthropicClient::new(config.llm.anthropic()).context("Failed to create LLM client")?);
    let llm = LlmGateway::new(client.clone())
        .with_retry_policy(config.llm.retry_policy())
        .with_max_tokens(config.llm.max_tokens);
    info!("Using model {}", llm.model());
    Ok((ChatService::new(llm, catalog, config)?, client))
}

fn report_usage(client: &AnthropicClient, config: &Config, verbose: bool) {
    let usage = client.total_usage();
    let cost = usage.cost_usd(&config.llm.model);
    info!("Token usage: {} in, {} out (${:.4})", usage.input_tokens, usage.output_tokens, cost);
    if verbose {
        println!("{}", format!("{} tokens, ${:.4}", usage.total(), cost).dimmed());
    }
}

fn start_session(uploads: &[String], config: &Config) -> Result<ChatSession> {
    let mut session = ChatSession::new(&config.session);
    for pattern in uploads {
        let names = cli::repl::upload_pattern(&mut session, pattern, &config.uploads)?;
        println!("{} {}", "Uploaded:".green(), names.join(", "));
    }
    Ok(session)
}

async fn run_chat(uploads: &[String], catalog: Arc<MajorCatalog>, config: &Config, verbose: bool) -> Result<()> {
    let (service, client) = build_service(catalog, config)?;
    let mut session = start_session(uploads, config)?;
    info!("Starting chat session {}", session.id);
    cli::repl::run(&service, &mut session, &config.uploads, verbose).await?;
    report_usage(&client, config, verbose);
    Ok(())
}

async fn handle_ask(
    message: &str,
    uploads: &[String],
    catalog: Arc<MajorCatalog>,
    config: &Config,
    verbose: bool,
) -> Result<()> {
    let (service, client) = build_service(catalog, config)?;
    let mut session = start_session(uploads, config)?;
    let response = service.process_message(&mut session, message).await;
    cli::repl::print_response(&response, verbose);
    report_usage(&client, config, verbose);
    if !response.success {
        eyre::bail!("The assistant could not answer");
    }
    Ok(())
}

fn handle_majors_command(command: &MajorsCommands, catalog: &MajorCatalog) -> Result<()> {
    info!("Handling majors command: {:?}", command);
    match command {
        MajorsCommands::List => {
            for major in catalog.majors() {
                println!("{} {}", major.name.bold(), format!("({})", major.id).dimmed());
            }
        }
        MajorsCommands::Search { query } => {
            let results = catalog.search(query);
            if results.is_empty() {
                println!("{} '{}'", "No majors match".yellow(), query);
            }
            for major in results {
                println!("{} - {}", major.name.bold(), major.description);
            }
        }
        MajorsCommands::Info { name, similar } => {
            let major = catalog
                .find_by_name(name, true)
                .ok_or_else(|| eyre::eyre!("Major '{}' not found", name))?;

            println!("{}", major.name.cyan().bold());
            if let Some(name_pt) = &major.name_pt {
                println!("{}", name_pt.dimmed());
            }
            println!("\n{}\n", major.description);
            println!("{}", "Entry requirements:".green());
            for (subject, grade) in &major.requirements {
                println!("  {:<16} {:>5.1}", subject, grade);
            }
            if !major.career_paths.is_empty() {
                println!("{} {}", "Careers:".green(), major.career_paths.join(", "));
            }
            if !major.universities.is_empty() {
                println!("{} {}", "Universities:".green(), major.universities.join(", "));
            }
            if *similar {
                println!("{}", "Similar majors:".green());
                for (other, score) in catalog.similar(major, 3) {
                    println!("  {} ({:.2})", other.name, score);
                }
            }
        }
        MajorsCommands::Suggest {
            interests,
            subjects,
            career,
            top,
        } => {
            let matches = match_interests_to_majors(catalog, interests, subjects, career.as_deref(), *top);
            if matches.is_empty() {
                println!("{}", "No matching majors found. Try broader or different interests.".yellow());
            }
            for (rank, m) in matches.iter().enumerate() {
                println!("{}. {} {}", rank + 1, m.major.name.bold(), format!("{:.2}", m.score).dimmed());
                for reason in &m.reasons {
                    println!("   - {}", reason);
                }
            }
        }
    }
    Ok(())
}

fn handle_gaps_command(major: &str, grades: &[(String, f64)], catalog: &MajorCatalog, config: &Config) -> Result<()> {
    info!("Checking gaps for {} with {} grades", major, grades.len());
    let grades: BTreeMap<String, f64> = grades.iter().cloned().collect();
    let summary = identify_grade_gaps(catalog, &grades, major, &config.grading)?;

    let verdict = match summary.readiness {
        Readiness::Ready => summary.readiness.as_str().green(),
        Readiness::MostlyReady => summary.readiness.as_str().cyan(),
        Readiness::NeedsImprovement => summary.readiness.as_str().yellow(),
        Readiness::SignificantGaps | Readiness::Unknown => summary.readiness.as_str().red(),
    };
    println!("{}: {}", summary.major.bold(), verdict);

    for gap in &summary.gaps {
        println!(
            "  {:<16} {:>5.1} / {:>5.1}  needs +{:.1} ({:?})",
            gap.subject, gap.current, gap.required, gap.gap, gap.severity
        );
    }
    for strength in &summary.strengths {
        println!(
            "  {:<16} {:>5.1} / {:>5.1}  {}",
            strength.subject,
            strength.grade,
            strength.required,
            "ok".green()
        );
    }
    if !summary.priority_subjects.is_empty() {
        println!("{} {}", "Work on first:".yellow(), summary.priority_subjects.join(", "));
    }
    Ok(())
}

async fn handle_pdf_command(file: &Path, show_text: bool) -> Result<()> {
    info!("Inspecting PDF: {}", file.display());
    let meta = pdf::metadata(file).await?;
    println!("{}", meta.filename.bold());
    println!("  {} pages, {:.2} MB, {} characters", meta.num_pages, meta.file_size_mb, meta.char_count);

    if let Err(e) = pdf::validate_pdf(file).await {
        println!("  {} {}", "Not usable as a transcript:".red(), e);
        return Ok(());
    }
    println!("  {}", "Readable transcript".green());

    if show_text {
        let text = pdf::extract_text(file).await?;
        println!("\n{}", pdf::clean_extracted_text(&text));
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging first
    setup_logging().context("Failed to setup logging")?;

    // Parse CLI arguments
    let cli = Cli::parse();

    // Load configuration
    let config = Config::load(cli.config.as_ref()).context("Failed to load configuration")?;

    info!("Starting with config from: {:?}", cli.config);

    // Run the main application logic
    run_application(&cli, &config).await.context("Application failed")?;

    Ok(())
}

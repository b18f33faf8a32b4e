// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Spoolward: confirmed local printing.
//
// Entry point. Loads the configuration, initialises logging and the backend
// services, and runs one CLI command.

mod services;

use std::io::Read;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use spoolward_core::SpoolConfig;
use spoolward_core::error::{Result, SpoolError};
use spoolward_core::human_errors::humanize_error;
use spoolward_core::types::{
    ContentType, JobStatus, PrintOptions, Priority, QueueEvent, StatusRecord,
};

use services::app_services::{AppServices, ConfigSource, load_config};

#[derive(Parser)]
#[command(name = "spoolward")]
#[command(about = "Print through the OS spooler and confirm the job left it", version)]
struct Cli {
    /// Path to a JSON config file (default: <data dir>/spoolward/config.json)
    #[arg(long, short = 'c', global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the printers the OS knows about
    Printers {
        /// Output in JSON format
        #[arg(long)]
        json: bool,
    },

    /// Queue a document, follow it and exit non-zero unless it completes
    Print {
        /// File to print, or `-` for stdin.  For `pdf` the path itself is queued.
        file: String,

        /// Content type: html, text, pdf or pdf_base64
        #[arg(long = "type", short = 't', default_value = "text")]
        content_type: ContentType,

        #[arg(long, default_value_t = 1)]
        copies: u32,

        /// low, normal or high
        #[arg(long, default_value = "normal")]
        priority: Priority,

        /// Print events as JSON lines
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    Config,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let (config, source) = match load_config(cli.config.as_deref()) {
        Ok(loaded) => loaded,
        Err(e) => {
            eprintln!("Error loading config: {e}");
            return ExitCode::from(2);
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(&config.log_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    tracing::info!(source = ?source, "Spoolward starting");

    let result = match cli.command {
        Commands::Config => run_config(&config, &source),
        Commands::Printers { json } => run_printers(config, json).await,
        Commands::Print {
            file,
            content_type,
            copies,
            priority,
            json,
        } => run_print(config, &file, content_type, PrintOptions { copies, priority }, json).await,
    };

    match result {
        Ok(code) => code,
        Err(e) => {
            let human = humanize_error(&e);
            tracing::error!(error = %e, "command failed");
            eprintln!("{}\n{}", human.message, human.suggestion);
            ExitCode::from(2)
        }
    }
}

fn run_config(config: &SpoolConfig, source: &ConfigSource) -> Result<ExitCode> {
    match source {
        ConfigSource::File(path) => eprintln!("# loaded from {}", path.display()),
        ConfigSource::Defaults => eprintln!("# built-in defaults"),
    }
    println!("{}", serde_json::to_string_pretty(config)?);
    Ok(ExitCode::SUCCESS)
}

async fn run_printers(config: SpoolConfig, json: bool) -> Result<ExitCode> {
    let services = AppServices::init(config)?;
    let printers = services.queue().list_printers().await?;

    if json {
        println!("{}", serde_json::to_string_pretty(&printers)?);
    } else if printers.is_empty() {
        println!("No printers installed.");
    } else {
        for printer in &printers {
            let marker = if printer.is_default { "*" } else { " " };
            println!("{marker} {}", printer.name);
        }
    }
    Ok(ExitCode::SUCCESS)
}

async fn run_print(
    config: SpoolConfig,
    file: &str,
    content_type: ContentType,
    options: PrintOptions,
    json: bool,
) -> Result<ExitCode> {
    let content = read_content(file, content_type)?;
    let services = AppServices::init(config)?;

    let record = services
        .print_and_wait(content, content_type, options, |event| {
            if json {
                print_event_json(event);
            } else {
                print_event(event);
            }
        })
        .await?;

    Ok(if record.status == JobStatus::Completed {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

/// Job payload for `file`: the path for `pdf`, the contents otherwise.
fn read_content(file: &str, content_type: ContentType) -> Result<String> {
    if content_type == ContentType::Pdf {
        if file == "-" {
            return Err(SpoolError::Config("a pdf job needs a file path, not stdin".into()));
        }
        let path = std::fs::canonicalize(file)?;
        return Ok(path.to_string_lossy().into_owned());
    }

    if file == "-" {
        let mut content = String::new();
        std::io::stdin().read_to_string(&mut content)?;
        Ok(content)
    } else {
        Ok(std::fs::read_to_string(file)?)
    }
}

fn print_event(event: &QueueEvent) {
    match event {
        QueueEvent::Queued(job) => println!("queued     {}", job.id),
        QueueEvent::JobStatus(record) => match record.status {
            JobStatus::Printing => println!("printing   attempt {}", record.attempts),
            JobStatus::Queued if record.attempts > 0 => println!(
                "retrying   {}",
                record.error.as_deref().unwrap_or("attempt failed")
            ),
            _ => {}
        },
        QueueEvent::Completed(_) => println!("completed"),
        QueueEvent::Failed(job) => println!(
            "failed     {}",
            job.error.as_deref().unwrap_or("unknown error")
        ),
        QueueEvent::Cancelled(_) => println!("cancelled"),
    }
}

fn print_event_json(event: &QueueEvent) {
    let record = match event {
        QueueEvent::JobStatus(record) => record.clone(),
        QueueEvent::Queued(job)
        | QueueEvent::Completed(job)
        | QueueEvent::Failed(job)
        | QueueEvent::Cancelled(job) => StatusRecord::from_job(job),
    };
    let line = serde_json::json!({ "event": event.name(), "status": record });
    println!("{line}");
}

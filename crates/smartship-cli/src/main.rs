//! smartship CLI: send files to an upload session from the terminal.
//!
//! The backend is picked from the host name unless SMARTSHIP_API_URL is set.
//! MAX_FILE_SIZE_MB sets the per-file ceiling.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;
use smartship_cli::{
    describe_error, format_listing, init_tracing, listing, load_candidates, TerminalNotifier,
};
use smartship_client::{
    progress, ApiClient, PreviewResolver, SessionManager, UploadEvent, UploadEvents,
    UploadOrchestrator,
};
use smartship_core::constants::BYTES_PER_MB;
use smartship_core::{ClientConfig, FileCandidate, FileIntakeValidator, Intake};

#[derive(Parser)]
#[command(name = "smartship", about = "Send files to a smartship upload session")]
struct Cli {
    /// Backend base URL (default: derived from the host name)
    #[arg(long, env = "SMARTSHIP_API_URL", global = true)]
    api_url: Option<String>,
    /// Per-file size ceiling in MiB
    #[arg(long, env = "MAX_FILE_SIZE_MB", global = true)]
    max_file_size_mb: Option<u64>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a new upload session and print its URL
    Session {
        /// Print the session as JSON
        #[arg(long)]
        json: bool,
    },
    /// Upload files; anything over the size ceiling is listed and skipped
    Upload {
        /// Files to send
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Print the candidate listing as JSON and exit without sending
        #[arg(long)]
        dry_run: bool,
    },
    /// Resolve a file preview and describe it
    Preview {
        /// File to preview
        file: PathBuf,
    },
}

#[derive(Serialize)]
struct SessionOutput<'a> {
    id: &'a str,
    url: &'a str,
}

#[derive(Serialize)]
struct PreviewOutput<'a> {
    file: &'a str,
    kind: smartship_core::PreviewKind,
    url: Option<&'a str>,
    bytes: Option<usize>,
}

fn print_json(value: &impl Serialize) -> anyhow::Result<()> {
    let out = serde_json::to_string_pretty(value).context("Serialize output")?;
    println!("{}", out);
    Ok(())
}

fn load_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = ClientConfig::from_env().context("Failed to load configuration")?;
    if let Some(url) = &cli.api_url {
        config = config.with_base_url(url.trim());
    }
    if let Some(mb) = cli.max_file_size_mb {
        config = config.with_max_file_size_mb(mb)?;
    }
    config.validate()?;
    Ok(config)
}

/// Render submission events until the channel closes.
async fn drive_progress_bar(mut events: UploadEvents) {
    let bar = ProgressBar::new(100);
    if let Ok(style) = ProgressStyle::with_template("{bar:40.cyan/blue} {pos:>3}% {msg}") {
        bar.set_style(style.progress_chars("=>-"));
    }

    while let Some(event) = events.next().await {
        match event {
            UploadEvent::Started {
                file_count,
                total_bytes,
            } => bar.set_message(format!(
                "{} file(s), {:.2} MB",
                file_count,
                total_bytes as f64 / BYTES_PER_MB as f64
            )),
            UploadEvent::Progress { percent } => bar.set_position(u64::from(percent)),
            UploadEvent::Succeeded => bar.finish_with_message("done"),
            UploadEvent::Failed { message } => bar.abandon_with_message(message),
        }
    }
}

async fn run_upload(config: &ClientConfig, files: Vec<PathBuf>, dry_run: bool) -> anyhow::Result<()> {
    let mut intake = Intake::new(FileIntakeValidator::new(config.max_file_size_bytes));
    intake.add(load_candidates(&files).await?);

    if dry_run {
        return print_json(&listing(&intake));
    }

    for line in format_listing(&intake) {
        println!("{}", line);
    }
    let summary = intake.summary();
    if !summary.is_clear() {
        eprintln!("{}", summary.message);
    }

    let client = Arc::new(ApiClient::from_config(config)?);
    let notifier = Arc::new(TerminalNotifier);
    let sessions = SessionManager::new(client.clone(), notifier.clone());
    let orchestrator = UploadOrchestrator::new(client, notifier, config.result_display());

    // A missing session is reported by the submit below.
    let _ = sessions.acquire().await;

    let (reporter, events) = progress::channel();
    let bar = tokio::spawn(drive_progress_bar(events));
    let result = orchestrator
        .submit(sessions.current().as_ref(), &mut intake, reporter)
        .await;
    bar.await.context("Progress display task failed")?;

    result
        .map(|_| ())
        .map_err(|e| anyhow::anyhow!(describe_error(&e)))
}

async fn run_preview(file: PathBuf) -> anyhow::Result<()> {
    let candidate = FileCandidate::from_path(&file)
        .await
        .with_context(|| format!("Failed to read {}", file.display()))?;

    let resolver = PreviewResolver::default();
    let mut resource = resolver
        .spawn_resolve(candidate.clone())
        .await
        .context("Preview task failed")??;

    let handle = resource.data.as_ref();
    print_json(&PreviewOutput {
        file: &candidate.name,
        kind: resource.kind,
        url: handle.map(|h| h.as_str()),
        bytes: handle.and_then(|h| h.data()).map(|b| b.len()),
    })?;

    resource.release();
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    dotenvy::dotenv().ok();

    let cli = Cli::parse();
    let config = load_config(&cli)?;

    match cli.command {
        Commands::Session { json } => {
            let client = Arc::new(ApiClient::from_config(&config)?);
            let sessions = SessionManager::new(client, Arc::new(TerminalNotifier));
            let session = sessions
                .acquire()
                .await
                .map_err(|e| anyhow::anyhow!(describe_error(&e)))?;
            if json {
                print_json(&SessionOutput {
                    id: session.id(),
                    url: session.url(),
                })?;
            } else {
                println!("{}", session.url());
                println!("session id: {}", session.id());
            }
        }
        Commands::Upload { files, dry_run } => {
            run_upload(&config, files, dry_run).await?;
        }
        Commands::Preview { file } => {
            run_preview(file).await?;
        }
    }

    Ok(())
}

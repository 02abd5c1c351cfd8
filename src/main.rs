mod cli;
mod config;
mod content;
mod editor;
mod engine;
mod error;
mod pipeline;
mod random;
mod scheduler;
mod seed;
mod seo;
mod store;
mod ui;
mod versions;

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result, bail};
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::{Cli, Command};
use config::KeywriterConfig;
use editor::{AssumeYes, ConfirmPrompt, EditorSession};
use engine::WorkflowEngine;
use error::{KeywriterError, RejectReason};
use pipeline::{JobId, JobStatus};
use random::ThreadRandom;
use seed::{FileDetails, parse_seeds};
use ui::{BatchProgress, TerminalConfirm};

const DEMO_ROWS: &str = "\
seo tools,best seo|top seo
keyword research,
rust web frameworks,axum|actix web|rocket
";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let config = match &cli.config {
        Some(path) => {
            if !path.exists() {
                bail!("config file not found: {}", path.display());
            }
            KeywriterConfig::load_from(path)?
        }
        None => KeywriterConfig::load()?,
    };

    match cli.command {
        Command::Parse { file } => {
            let (text, _) = read_keyword_file(&file)?;
            let seeds = parse_seeds(&text);
            println!("{}", serde_json::to_string_pretty(&seeds)?);
        }
        Command::Run {
            file,
            rounds,
            failure_rate,
            fast,
            json,
        } => {
            let mut config = config;
            if let Some(rate) = failure_rate {
                config.failure_probability = rate;
            }
            if fast {
                config = config.fast();
            }
            config.validate()?;
            run(config, &file, rounds, json).await?;
        }
        Command::Demo { yes } => {
            let mut config = config.fast();
            config.failure_probability = 0.0;
            demo(config, yes).await?;
        }
    }

    Ok(())
}

// Logs go to stderr; `RUST_LOG` overrides the default filter.
fn init_tracing(verbose: bool) {
    let default_filter = if verbose {
        "keywriter=debug"
    } else {
        "keywriter=warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn read_keyword_file(path: &Path) -> Result<(String, FileDetails)> {
    let bytes = std::fs::read(path)
        .with_context(|| format!("failed to read keyword file {}", path.display()))?;
    let details = FileDetails::describe(path, bytes.len() as u64);
    Ok((String::from_utf8_lossy(&bytes).into_owned(), details))
}

async fn run(config: KeywriterConfig, file: &Path, rounds: u32, json: bool) -> Result<()> {
    let (text, details) = read_keyword_file(file)?;
    let seeds = parse_seeds(&text);
    if seeds.is_empty() {
        bail!("no keyword rows in {}", file.display());
    }

    let engine = WorkflowEngine::new(config, Arc::new(ThreadRandom));
    if !json {
        ui::print_file_details(&details);
    }
    engine.ingest(seeds);

    let mut progress = (!json).then(BatchProgress::new);
    for round in 1..=rounds {
        match engine.start_batch() {
            Ok(summary) => {
                tracing::info!(
                    round,
                    batch_id = summary.batch_id,
                    jobs = summary.jobs.len(),
                    doomed = summary.doomed,
                    "Round started",
                );
            }
            Err(KeywriterError::Rejected(RejectReason::NoEligibleJobs)) => break,
            Err(e) => return Err(e.into()),
        }
        if !watch_batch(&engine, progress.as_mut()).await {
            println!("Cancelled; all jobs cleared.");
            return Ok(());
        }
    }
    if let Some(progress) = &progress {
        progress.finish();
    }

    let jobs = engine.store().snapshot();
    if json {
        println!("{}", serde_json::to_string_pretty(&jobs)?);
    } else {
        ui::print_summary(&jobs);
    }
    Ok(())
}

/// Waits for the running batch, refreshing bars if any. Ctrl-C clears
/// everything; returns false in that case.
async fn watch_batch(engine: &WorkflowEngine, mut progress: Option<&mut BatchProgress>) -> bool {
    let mut ticker = tokio::time::interval(Duration::from_millis(100));
    loop {
        tokio::select! {
            _ = engine.wait_idle() => break,
            _ = tokio::signal::ctrl_c() => {
                engine.clear_all();
                return false;
            }
            _ = ticker.tick() => {
                if let Some(progress) = progress.as_deref_mut() {
                    progress.refresh(&engine.store().snapshot());
                }
            }
        }
    }
    if let Some(progress) = progress.as_deref_mut() {
        progress.refresh(&engine.store().snapshot());
    }
    true
}

async fn demo(config: KeywriterConfig, yes: bool) -> Result<()> {
    let engine = WorkflowEngine::new(config, Arc::new(ThreadRandom));
    engine.ingest(parse_seeds(DEMO_ROWS));

    let mut progress = BatchProgress::new();
    engine.start_batch()?;
    if !watch_batch(&engine, Some(&mut progress)).await {
        return Ok(());
    }
    progress.finish();
    ui::print_summary(&engine.store().snapshot());

    let Some(job_id) = engine
        .store()
        .snapshot()
        .iter()
        .find(|j| matches!(j.status(), JobStatus::Done { .. }))
        .map(|j| j.id())
    else {
        bail!("demo batch produced no finished job");
    };

    if yes {
        walk_editor(&engine, engine.editor(AssumeYes), job_id).await?;
    } else {
        walk_editor(&engine, engine.editor(TerminalConfirm::default()), job_id).await?;
    }

    engine.clear_all();
    Ok(())
}

async fn walk_editor<C: ConfirmPrompt>(
    engine: &WorkflowEngine,
    mut editor: EditorSession<C>,
    job_id: JobId,
) -> Result<()> {
    editor.open(job_id)?;

    if let Err(e) = editor.save("   ").await {
        println!("Save refused ({}): {e}", e.code());
    }

    let edited = format!("{} Expanded by hand.", editor.buffer().unwrap_or_default());
    editor.save(edited).await?;
    editor.regenerate()?;
    editor.regenerate()?;
    editor.revert()?;
    if editor.close()? {
        println!("Editor closed after revert.");
    }

    let job = engine
        .store()
        .get(job_id)
        .context("demo job disappeared")?;
    ui::print_history(&job);

    editor.open(job_id)?;
    editor.edit_buffer("Scratch notes that were never saved")?;
    if editor.cancel()? {
        println!("Editor closed, unsaved notes discarded.");
    } else {
        println!("Editor kept open with unsaved notes.");
        editor.reset();
    }
    Ok(())
}

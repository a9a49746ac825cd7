//! CLI entrypoint for ragloop
//!
//! This is the main binary that wires together all layers using
//! dependency injection.

mod args;
mod output;
mod progress;

use anyhow::{Context, Result, anyhow, bail};
use args::{Cli, OutputFormat};
use clap::Parser;
use colored::Colorize;
use output::ConsoleFormatter;
use progress::ProgressReporter;
use ragloop_application::{
    InferenceEngine, NoProgress, Retriever, RunChatError, RunChatInput, RunChatUseCase,
    SharedInference,
};
use ragloop_domain::{ChatOutcome, ConversationTurn, SuppliedChunk};
use ragloop_infrastructure::{
    ConfigLoader, EchoEngine, FileConfig, FileOutputFormat, InMemoryRetriever,
    JsonlConversationLogger,
};
use serde::de::DeserializeOwned;
use std::io::Write;
use std::path::Path;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{EnvFilter, prelude::*};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging(&cli)?;

    info!("Starting ragloop");

    let file_config = if cli.no_config {
        ConfigLoader::load_defaults()
    } else {
        ConfigLoader::load(cli.config.as_ref()).map_err(|e| anyhow!("Configuration error: {}", e))?
    };

    if cli.show_config {
        ConfigLoader::print_config_sources();
        println!();
        println!("{}", toml::to_string_pretty(&file_config)?);
        return Ok(());
    }

    file_config.validate().context("Invalid configuration")?;
    let workflow_config = file_config.to_workflow_config();
    let history_limit = workflow_config.generation.context_message_limit;

    // === Dependency Injection ===
    let retriever = build_retriever(&cli, &file_config)?;
    let engine = build_engine(&cli, &file_config)?;
    let inference = SharedInference::new(engine);
    info!(
        "Using retriever '{}' and model '{}'",
        retriever.name(),
        inference.model_name()
    );

    let token = CancellationToken::new();
    let ctrl_c_token = token.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            ctrl_c_token.cancel();
        }
    });

    let mut use_case =
        RunChatUseCase::new(retriever, inference, workflow_config).with_cancellation(token.clone());
    if let Some(path) = cli.transcript.as_ref().or(file_config.output.transcript.as_ref()) {
        match JsonlConversationLogger::new(path) {
            Some(logger) => {
                info!("Writing run transcript to {}", logger.path().display());
                use_case = use_case.with_conversation_logger(Arc::new(logger));
            }
            None => warn!("Transcript disabled: could not open {}", path.display()),
        }
    }

    if !file_config.output.color {
        colored::control::set_override(false);
    }
    let format = cli.output.unwrap_or(match file_config.output.format {
        FileOutputFormat::Text => OutputFormat::Text,
        FileOutputFormat::Json => OutputFormat::Json,
    });
    let session = Session {
        use_case,
        format,
        show_progress: !cli.quiet && file_config.output.show_progress,
        supplied: match &cli.chunks {
            Some(path) => read_json::<Vec<SuppliedChunk>>(path, "chunks")?,
            None => Vec::new(),
        },
    };
    let history = match &cli.history {
        Some(path) => read_json::<Vec<ConversationTurn>>(path, "history")?,
        None => Vec::new(),
    };

    if cli.chat {
        return session.chat(history, history_limit, token).await;
    }

    let message = match cli.message {
        Some(m) => m,
        None => bail!("Message is required. Use --chat for interactive mode."),
    };

    match session.run(message, history).await {
        Ok(outcome) => {
            session.print(&outcome);
            Ok(())
        }
        Err(RunChatError::Cancelled) => bail!("Cancelled"),
    }
}

/// Everything needed to answer messages, shared by both modes
struct Session {
    use_case: RunChatUseCase,
    format: OutputFormat,
    show_progress: bool,
    supplied: Vec<SuppliedChunk>,
}

impl Session {
    async fn run(
        &self,
        message: String,
        history: Vec<ConversationTurn>,
    ) -> Result<ChatOutcome, RunChatError> {
        let input = RunChatInput::new(message)
            .with_history(history)
            .with_supplied_chunks(self.supplied.clone());

        if self.show_progress {
            let progress = ProgressReporter::new();
            self.use_case.execute(input, &progress).await
        } else {
            self.use_case.execute(input, &NoProgress).await
        }
    }

    fn print(&self, outcome: &ChatOutcome) {
        let output = match self.format {
            OutputFormat::Text => ConsoleFormatter::format(outcome),
            OutputFormat::Json => ConsoleFormatter::format_json(outcome),
        };
        println!("{}", output);
    }

    /// Line-oriented loop over stdin. `/quit` or EOF ends the session.
    async fn chat(
        &self,
        mut history: Vec<ConversationTurn>,
        history_limit: usize,
        token: CancellationToken,
    ) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        if self.show_progress {
            eprintln!("{}", "ragloop chat (/quit to exit)".dimmed());
        }

        loop {
            eprint!("{} ", ">".cyan().bold());
            let _ = std::io::stderr().flush();

            let line = tokio::select! {
                biased;
                _ = token.cancelled() => break,
                line = lines.next_line() => line.context("Failed to read stdin")?,
            };
            let Some(line) = line else { break };
            let message = line.trim();
            if message.is_empty() {
                continue;
            }
            if matches!(message, "/quit" | "/exit") {
                break;
            }

            match self.run(message.to_string(), history.clone()).await {
                Ok(outcome) => {
                    self.print(&outcome);
                    if let Some(reply) = outcome.reply() {
                        history.push(ConversationTurn::user(message));
                        history.push(ConversationTurn::assistant(reply.reply.clone()));
                        let excess = history.len().saturating_sub(history_limit);
                        history.drain(..excess);
                    }
                }
                Err(RunChatError::Cancelled) => {
                    eprintln!("{}", "Cancelled".yellow());
                    break;
                }
            }
        }
        Ok(())
    }
}

fn init_logging(cli: &Cli) -> Result<Option<WorkerGuard>> {
    // Initialize logging based on verbosity level
    let level = match cli.verbose {
        0 => "warn",
        1 => "info",
        2 => "debug",
        _ => "trace", // -vvv or more
    };

    let stderr_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr)
        .with_filter(EnvFilter::new(level));

    let (file_layer, guard) = match &cli.log_dir {
        Some(dir) => {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
            let appender = tracing_appender::rolling::daily(dir, "ragloop.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(writer)
                .with_filter(EnvFilter::new("debug"));
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .init();
    Ok(guard)
}

fn read_json<T: DeserializeOwned>(path: &Path, what: &str) -> Result<T> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {} file {}", what, path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Invalid {} file {}", what, path.display()))
}

fn build_retriever(cli: &Cli, config: &FileConfig) -> Result<Arc<dyn Retriever>> {
    // Command line wins over the config file
    if let Some(path) = &cli.corpus {
        return Ok(Arc::new(InMemoryRetriever::from_json_file(path)?));
    }
    if let Some(url) = &cli.retriever_url {
        return http_retriever(url);
    }
    if let Some(path) = &config.backend.corpus {
        return Ok(Arc::new(InMemoryRetriever::from_json_file(path)?));
    }
    if let Some(url) = &config.backend.retriever_url {
        return http_retriever(url);
    }
    warn!("No retriever configured; only pre-supplied chunks will be used");
    Ok(Arc::new(InMemoryRetriever::default()))
}

#[cfg(feature = "http")]
fn http_retriever(url: &str) -> Result<Arc<dyn Retriever>> {
    Ok(Arc::new(ragloop_infrastructure::HttpRetriever::new(url)))
}

#[cfg(not(feature = "http"))]
fn http_retriever(_url: &str) -> Result<Arc<dyn Retriever>> {
    bail!("HTTP retriever requires the `http` feature")
}

fn build_engine(cli: &Cli, config: &FileConfig) -> Result<Box<dyn InferenceEngine>> {
    if cli.echo {
        return Ok(Box::new(EchoEngine::new()));
    }
    let url = cli
        .llama_url
        .as_ref()
        .or(config.backend.llama_url.as_ref());
    match url {
        Some(url) => llama_engine(url, config),
        None => bail!("No inference engine configured. Pass --llama-url <URL> or --echo."),
    }
}

#[cfg(feature = "http")]
fn llama_engine(url: &str, config: &FileConfig) -> Result<Box<dyn InferenceEngine>> {
    let model_name = config.identity.to_profile().model_name;
    Ok(Box::new(
        ragloop_infrastructure::LlamaServerEngine::new(url, model_name)
            .with_slot_id(config.backend.slot_id),
    ))
}

#[cfg(not(feature = "http"))]
fn llama_engine(_url: &str, _config: &FileConfig) -> Result<Box<dyn InferenceEngine>> {
    bail!("llama.cpp engine requires the `http` feature")
}

//! CLI argument definitions

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// Output format for replies
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Reply text followed by a one-line summary
    Text,
    /// The full outcome, trace included
    Json,
}

/// CLI arguments for ragloop
#[derive(Parser, Debug)]
#[command(name = "ragloop")]
#[command(author, version, about = "Retrieval-orchestrated chat with self-checking replies")]
#[command(long_about = r#"
ragloop answers a message by retrieving evidence, judging whether it is good
enough, refining the search query when it is not, and validating the
generated reply before returning it with a confidence score.

Configuration files are loaded from (in priority order):
1. RAGLOOP_* env vars  e.g. RAGLOOP_RETRIEVAL__TOP_K=3
2. --config <path>     Explicit config file
3. ./ragloop.toml      Project-level config
4. ~/.config/ragloop/config.toml   Global config

Example:
  ragloop --corpus docs.json --echo "프로젝트 일정이 어떻게 되나요?"
  ragloop --retriever-url http://localhost:9000/search --llama-url http://localhost:8080 --chat
"#)]
pub struct Cli {
    /// The message to answer (not required in chat mode)
    pub message: Option<String>,

    /// Read messages from stdin, one per line, keeping recent turns as history
    #[arg(short, long)]
    pub chat: bool,

    /// JSON corpus for the in-memory retriever
    #[arg(long, value_name = "PATH", conflicts_with = "retriever_url")]
    pub corpus: Option<PathBuf>,

    /// Search endpoint for the HTTP retriever
    #[arg(long, value_name = "URL")]
    pub retriever_url: Option<String>,

    /// llama.cpp server base URL
    #[arg(long, value_name = "URL", conflicts_with = "echo")]
    pub llama_url: Option<String>,

    /// Offline engine that answers with the best chunk
    #[arg(long)]
    pub echo: bool,

    /// JSON array of prior turns (`{"role": "user", "content": ...}`)
    #[arg(long, value_name = "PATH")]
    pub history: Option<PathBuf>,

    /// JSON array of pre-fetched chunks (strings or chunk records)
    #[arg(long, value_name = "PATH")]
    pub chunks: Option<PathBuf>,

    /// Output format
    #[arg(short, long, value_enum)]
    pub output: Option<OutputFormat>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress progress indicators
    #[arg(short, long)]
    pub quiet: bool,

    /// Also write logs to a daily file in this directory
    #[arg(long, value_name = "DIR")]
    pub log_dir: Option<PathBuf>,

    /// Append a JSONL transcript of every run
    #[arg(long, value_name = "PATH")]
    pub transcript: Option<PathBuf>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration sources and the effective configuration, then exit
    #[arg(long)]
    pub show_config: bool,
}

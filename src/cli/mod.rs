//! Command-line interface for toc-align.
//!
//! Available commands:
//!
//! - **align**: Align two TOCs row by row, keeping TOC 1's order
//! - **combine**: Merge two TOCs into one via the chat-completions endpoint
//! - **serve**: Start the HTTP API
//!
//! ## Usage
//!
//! ```text
//! # Exact-identity alignment
//! toc-align align toc1.json toc2.json
//!
//! # Semantic alignment (needs OPENAI_API_KEY)
//! toc-align align toc1.json toc2.json --strategy oracle
//!
//! # Markdown table for a README or PR
//! toc-align --format markdown align toc1.json toc2.json
//!
//! # Pipe TOC 1 from another tool
//! cat toc1.json | toc-align align - toc2.json
//!
//! # Start the API on port 3000
//! toc-align serve --port 3000
//! ```

use std::time::Duration;

use clap::{Parser, Subcommand};

use crate::oracle::openai::{OpenAiClient, OpenAiConfig, DEFAULT_API_BASE, DEFAULT_MODEL};

pub mod align;
pub mod combine;

#[derive(Parser)]
#[command(name = "toc-align")]
#[command(version)]
#[command(about = "Align and merge ordered Tables of Contents")]
#[command(
    long_about = "toc-align compares two Tables of Contents (JSON lists of concept records).\n\nIt can:\n- Align them row by row, keeping the master (TOC 1) order, by exact concept_id or with a semantic matcher\n- Merge them into a single TOC with a language model\n- Serve both operations over HTTP"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Output format
    #[arg(short, long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Align two TOCs row by row
    Align(align::AlignArgs),

    /// Merge two TOCs into one
    Combine(combine::CombineArgs),

    /// Start the web server
    Serve(ServeArgs),
}

#[derive(clap::Args)]
pub struct ServeArgs {
    /// Port to listen on
    #[arg(short, long, env = "PORT", default_value = "3000")]
    pub port: u16,

    /// Address to bind to
    #[arg(short, long, default_value = "127.0.0.1")]
    pub address: String,

    #[command(flatten)]
    pub oracle: OracleArgs,
}

/// Settings for the chat-completions endpoint behind the semantic matcher
#[derive(clap::Args, Debug, Clone)]
pub struct OracleArgs {
    /// API key; without one only local alignment is available
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// Base URL of the chat-completions API
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_API_BASE)]
    pub api_base: String,

    /// Model name
    #[arg(long, env = "TOC_ALIGN_MODEL", default_value = DEFAULT_MODEL)]
    pub model: String,

    /// Timeout for one matcher call, in seconds
    #[arg(long, default_value = "60", value_parser = clap::value_parser!(u64).range(1..=600))]
    pub oracle_timeout: u64,
}

impl OracleArgs {
    /// `None` when no API key was given
    pub fn to_config(&self) -> Option<OpenAiConfig> {
        let api_key = self.api_key.as_deref().filter(|k| !k.trim().is_empty())?;
        Some(OpenAiConfig {
            api_key: api_key.to_string(),
            api_base: self.api_base.clone(),
            model: self.model.clone(),
            timeout: Duration::from_secs(self.oracle_timeout),
        })
    }

    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be built.
    pub fn build_client(&self) -> anyhow::Result<Option<OpenAiClient>> {
        match self.to_config() {
            Some(config) => Ok(Some(OpenAiClient::new(config)?)),
            None => Ok(None),
        }
    }
}

#[derive(Clone, Copy, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
    Tsv,
    Markdown,
}

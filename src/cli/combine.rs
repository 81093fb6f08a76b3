use std::path::PathBuf;

use clap::Args;

use crate::cli::{OracleArgs, OutputFormat};
use crate::oracle::TocCombiner;
use crate::parsing::toc::read_json_file;
use crate::render::markdown::json_to_markdown;

#[derive(Args)]
pub struct CombineArgs {
    /// First TOC (any JSON shape). Use '-' for stdin
    #[arg(required = true)]
    pub toc1: PathBuf,

    /// Second TOC (any JSON shape)
    #[arg(required = true)]
    pub toc2: PathBuf,

    #[command(flatten)]
    pub oracle: OracleArgs,
}

/// # Errors
///
/// Returns an error if no API key is configured, an input cannot be read, or the
/// model call fails.
pub fn run(args: CombineArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    if matches!(format, OutputFormat::Tsv) {
        anyhow::bail!("TSV output is not available for combine; use text, markdown or json");
    }

    let client = args.oracle.build_client()?.ok_or_else(|| {
        anyhow::anyhow!("combine needs an API key (set OPENAI_API_KEY or pass --api-key)")
    })?;

    let toc1 = read_json_file(&args.toc1)?;
    let toc2 = read_json_file(&args.toc2)?;

    if verbose {
        eprintln!(
            "Combining {} and {} with {}",
            args.toc1.display(),
            args.toc2.display(),
            client.config().model
        );
    }

    let rt = tokio::runtime::Runtime::new()?;
    let combined = rt.block_on(client.combine(&toc1, &toc2))?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&combined)?),
        OutputFormat::Text | OutputFormat::Markdown | OutputFormat::Tsv => {
            print!("{}", json_to_markdown(&combined));
        }
    }

    Ok(())
}

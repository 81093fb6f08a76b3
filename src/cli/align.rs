use std::path::PathBuf;
use std::sync::Arc;

use clap::Args;

use crate::alignment::AlignmentEngine;
use crate::cli::{OracleArgs, OutputFormat};
use crate::core::record::{RawRecord, Record};
use crate::core::row::{AlignmentRow, AlignmentSummary};
use crate::core::types::StrategyKind;
use crate::parsing::toc::parse_toc_file;
use crate::render::markdown::rows_to_markdown;

#[derive(Args)]
pub struct AlignArgs {
    /// Master TOC (JSON); its order is preserved. Use '-' for stdin
    #[arg(required = true)]
    pub toc1: PathBuf,

    /// Candidate TOC (JSON)
    #[arg(required = true)]
    pub toc2: PathBuf,

    /// How to decide which entries correspond
    #[arg(short, long, value_enum, default_value = "local")]
    pub strategy: StrategyKind,

    #[command(flatten)]
    pub oracle: OracleArgs,
}

/// # Errors
///
/// Returns an error if an input cannot be read or the alignment fails.
pub fn run(args: AlignArgs, format: OutputFormat, verbose: bool) -> anyhow::Result<()> {
    let toc1 = parse_toc_file(&args.toc1)?;
    let toc2 = parse_toc_file(&args.toc2)?;

    if verbose {
        eprintln!("TOC 1: {} entries", toc1.len());
        eprintln!("TOC 2: {} entries", toc2.len());
    }

    let rows = match args.strategy {
        StrategyKind::Local => AlignmentEngine::new().align_local(&toc1, &toc2)?,
        StrategyKind::Oracle => {
            let client = args.oracle.build_client()?.ok_or_else(|| {
                anyhow::anyhow!(
                    "The oracle strategy needs an API key (set OPENAI_API_KEY or pass --api-key)"
                )
            })?;
            let engine = AlignmentEngine::with_matcher(Arc::new(client));
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(engine.align_with_oracle(&toc1, &toc2))?
        }
    };

    match format {
        OutputFormat::Text => print_text_alignment(&args, &toc1, &toc2, &rows, verbose),
        OutputFormat::Json => print_json_alignment(&args, &toc1, &toc2, &rows)?,
        OutputFormat::Tsv => print_tsv_alignment(&rows),
        OutputFormat::Markdown => print!("{}", rows_to_markdown(&rows)),
    }

    Ok(())
}

fn print_text_alignment(
    args: &AlignArgs,
    toc1: &[RawRecord],
    toc2: &[RawRecord],
    rows: &[AlignmentRow],
    verbose: bool,
) {
    let summary = AlignmentSummary::from_rows(rows);

    println!("Alignment Results");
    println!("{}", "=".repeat(60));

    println!("\nTOC 1 (master): {}", args.toc1.display());
    println!("  Entries: {}", toc1.len());
    println!("TOC 2: {}", args.toc2.display());
    println!("  Entries: {}", toc2.len());
    println!("Strategy: {}", args.strategy);

    println!("\nRows: {}", summary.total_rows);
    println!("  Matched: {}", summary.matches);
    println!("  Only in TOC 1: {}", summary.master_only);
    println!("  Only in TOC 2: {}", summary.candidate_only);

    println!();
    println!("{:<16}{:<30}{:<30}", "STATUS", "TOC 1", "TOC 2");
    println!("{}", "-".repeat(76));
    for row in rows {
        println!(
            "{:<16}{:<30}{:<30}",
            row.classification.to_string(),
            describe(row.master_item.as_ref()),
            describe(row.candidate_item.as_ref()),
        );
        if verbose && !row.rationale.is_empty() {
            println!("{:<16}  {}", "", row.rationale);
        }
    }
}

fn describe(record: Option<&Record>) -> String {
    let Some(record) = record else {
        return "-".to_string();
    };
    let text = if record.label().is_empty() {
        record.identity().to_string()
    } else {
        format!("{} {}", record.identity(), record.label())
    };
    if text.chars().count() > 28 {
        let truncated: String = text.chars().take(27).collect();
        format!("{truncated}…")
    } else {
        text
    }
}

fn print_json_alignment(
    args: &AlignArgs,
    toc1: &[RawRecord],
    toc2: &[RawRecord],
    rows: &[AlignmentRow],
) -> anyhow::Result<()> {
    let output = serde_json::json!({
        "toc1": {
            "path": args.toc1.display().to_string(),
            "entry_count": toc1.len(),
        },
        "toc2": {
            "path": args.toc2.display().to_string(),
            "entry_count": toc2.len(),
        },
        "strategy": args.strategy,
        "summary": AlignmentSummary::from_rows(rows),
        "rows": rows,
    });

    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}

fn print_tsv_alignment(rows: &[AlignmentRow]) {
    println!("classification\ttoc1_id\ttoc1_label\ttoc2_id\ttoc2_label\trationale");
    for row in rows {
        println!(
            "{}\t{}\t{}\t{}\t{}\t{}",
            row.classification,
            row.master_identity().unwrap_or(""),
            row.master_item.as_ref().map_or("", Record::label),
            row.candidate_identity().unwrap_or(""),
            row.candidate_item.as_ref().map_or("", Record::label),
            row.rationale,
        );
    }
}

//! Upsert command implementation.

use anyhow::{Context, Result};
use clap::Args;
use indicatif::{ProgressBar, ProgressStyle};
use std::collections::HashSet;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::time::Instant;

use super::index::descriptor_for;
use crate::cli::output::{UpsertStats, get_formatter};
use crate::models::{Config, OutputFormat, Record};
use crate::services::{IndexReady, UpsertOrchestrator, create_backend};

/// Arguments for the upsert command.
#[derive(Debug, Args)]
pub struct UpsertArgs {
    /// Path to a JSON array or JSONL file of records (use - for stdin)
    #[arg()]
    pub file: Option<PathBuf>,

    /// Index name (defaults to [vector_index].index_name)
    #[arg(long, short = 'n')]
    pub index: Option<String>,

    /// Create the index when it is missing
    #[arg(long)]
    pub create_if_missing: bool,

    /// Only validate the input without upserting
    #[arg(long)]
    pub validate_only: bool,
}

/// Handle the upsert command.
pub async fn handle_upsert(args: UpsertArgs, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);
    let start_time = Instant::now();
    let descriptor = descriptor_for(&config, args.index);

    let input = read_input(args.file.as_deref())?;
    let records = parse_records(&input)?;

    if records.is_empty() {
        println!("{}", formatter.format_message("No records found in input."));
        return Ok(());
    }

    validate_records(&records, descriptor.dimension as usize)?;

    if verbose || args.validate_only {
        eprintln!("Found {} records for index '{}'", records.len(), descriptor.name);
    }

    if args.validate_only {
        println!(
            "{}",
            formatter.format_message(&format!(
                "Validation successful: {} records ready for upsert",
                records.len()
            ))
        );
        return Ok(());
    }

    let service = create_backend(&config.vector_index).context("vector index unavailable")?;
    let orchestrator = UpsertOrchestrator::new(service);

    let pb = ProgressBar::new(records.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template(
                "{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})",
            )
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("#>-"),
    );

    let result = orchestrator
        .upsert_all_with_progress(&descriptor, records, args.create_if_missing, |n| {
            pb.set_position(n as u64);
        })
        .await;
    pb.finish_and_clear();

    let summary = result.with_context(|| format!("upsert into '{}' failed", descriptor.name))?;

    let stats = UpsertStats {
        index: descriptor.name,
        records: summary.count as u64,
        batches: summary.batches as u64,
        index_created: summary.provisioned == IndexReady::Created,
        duration_ms: start_time.elapsed().as_millis() as u64,
    };

    print!("{}", formatter.format_upsert_stats(&stats));

    Ok(())
}

/// Read input from file or stdin.
fn read_input(file: Option<&Path>) -> Result<String> {
    match file {
        Some(path) if path.to_string_lossy() != "-" => std::fs::read_to_string(path)
            .with_context(|| format!("failed to read {}", path.display())),
        _ => {
            let mut input = String::new();
            io::stdin()
                .read_to_string(&mut input)
                .context("failed to read stdin")?;
            Ok(input)
        }
    }
}

/// Parse records from a JSON array or JSONL.
fn parse_records(input: &str) -> Result<Vec<Record>> {
    let input = input.trim();

    if input.is_empty() {
        return Ok(Vec::new());
    }

    if input.starts_with('[') {
        return serde_json::from_str(input).context("failed to parse JSON array");
    }

    let mut records = Vec::new();
    for (i, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        let record: Record = serde_json::from_str(line)
            .with_context(|| format!("failed to parse JSON at line {}", i + 1))?;
        records.push(record);
    }

    Ok(records)
}

/// Reject records the index would refuse: blank ids, repeated ids, or
/// vectors of the wrong dimension.
fn validate_records(records: &[Record], dimension: usize) -> Result<()> {
    let mut seen = HashSet::new();
    for (i, record) in records.iter().enumerate() {
        if record.id.trim().is_empty() {
            anyhow::bail!("record {} has an empty id", i + 1);
        }
        if !seen.insert(record.id.as_str()) {
            anyhow::bail!("duplicate record id '{}'", record.id);
        }
        if record.dimension() != dimension {
            anyhow::bail!(
                "record '{}' has dimension {}, index expects {}",
                record.id,
                record.dimension(),
                dimension
            );
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_json_array() {
        let input = r#"[
            {"id": "a", "values": [0.1, 0.2], "metadata": {"text": "hello"}},
            {"id": "b", "values": [0.3, 0.4]}
        ]"#;
        let records = parse_records(input).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].metadata["text"].as_str(), Some("hello"));
        assert!(records[1].metadata.is_empty());
    }

    #[test]
    fn test_parse_jsonl() {
        let input = "{\"id\": \"a\", \"values\": [1.0]}\n\n{\"id\": \"b\", \"values\": [2.0]}\n";
        let records = parse_records(input).unwrap();
        let ids: Vec<&str> = records.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b"]);
    }

    #[test]
    fn test_parse_jsonl_reports_line() {
        let input = "{\"id\": \"a\", \"values\": [1.0]}\nnot json";
        let err = parse_records(input).unwrap_err();
        assert!(err.to_string().contains("line 2"));
    }

    #[test]
    fn test_parse_empty() {
        assert!(parse_records("  \n").unwrap().is_empty());
    }

    #[test]
    fn test_validate_records() {
        let ok = vec![Record::new("a", vec![0.1, 0.2]), Record::new("b", vec![0.3, 0.4])];
        assert!(validate_records(&ok, 2).is_ok());

        let wrong_dim = vec![Record::new("a", vec![0.1])];
        assert!(validate_records(&wrong_dim, 2).is_err());

        let duplicate = vec![Record::new("a", vec![0.1]), Record::new("a", vec![0.2])];
        let err = validate_records(&duplicate, 1).unwrap_err();
        assert!(err.to_string().contains("duplicate"));

        let blank = vec![Record::new(" ", vec![0.1])];
        assert!(validate_records(&blank, 1).is_err());
    }
}

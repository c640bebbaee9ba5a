//! CLI module for the AI helpers.

pub mod commands;
pub mod output;

use clap::{Parser, Subcommand};

use crate::models::OutputFormat;

/// Vector index, OpenAI, and MongoDB helpers from the command line.
#[derive(Debug, Parser)]
#[command(name = "aih")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    #[arg(
        long,
        short = 'f',
        global = true,
        help = "Output format: text, json, or markdown"
    )]
    pub format: Option<OutputFormat>,

    #[arg(long, short = 'v', global = true, help = "Enable verbose output")]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Check vector index, OpenAI, and MongoDB status
    Status,

    /// Manage vector indexes (ensure, delete, list)
    #[command(subcommand)]
    Index(commands::IndexCommand),

    /// Upsert records from JSON/JSONL into an index
    Upsert(commands::UpsertArgs),

    /// Embed a query and search an index
    Search(commands::SearchArgs),

    /// Print the embedding of a text
    Embed(commands::EmbedArgs),

    /// Send a prompt to the chat model
    Chat(commands::ChatArgs),

    /// Transcribe an audio file
    Transcribe(commands::TranscribeArgs),

    /// Synthesize speech to an audio file
    Speak(commands::SpeakArgs),

    /// Query the document store
    #[command(subcommand)]
    Docs(commands::DocsCommand),

    /// Manage configuration
    #[command(subcommand)]
    Config(commands::ConfigCommand),
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_search() {
        let cli = Cli::try_parse_from(["aih", "-f", "json", "search", "rust traits", "-k", "3"])
            .unwrap();
        assert_eq!(cli.format, Some(OutputFormat::Json));
        match cli.command {
            Commands::Search(args) => {
                assert_eq!(args.query, "rust traits");
                assert_eq!(args.top_k, Some(3));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_upsert_flags() {
        let cli = Cli::try_parse_from(["aih", "upsert", "-", "--create-if-missing"]).unwrap();
        match cli.command {
            Commands::Upsert(args) => {
                assert!(args.create_if_missing);
                assert!(!args.validate_only);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }
}

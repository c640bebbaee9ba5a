//! Document store command implementation.

use anyhow::{Context, Result};
use clap::Subcommand;
use mongodb::bson::{Bson, Document};
use std::path::PathBuf;

use crate::cli::output::get_formatter;
use crate::models::{ChunkDocument, Config, OutputFormat};
use crate::services::MongoDatabase;

#[derive(Debug, Subcommand)]
pub enum DocsCommand {
    /// Show the documents holding a chunk, each narrowed to that chunk
    Chunk {
        #[arg(required = true)]
        chunk_id: String,
    },

    /// Show one document by id
    Get {
        #[arg(required = true)]
        id: String,
    },

    /// Find documents matching a JSON filter
    Find {
        /// Filter document, e.g. '{"source": "notes.md"}'
        #[arg(default_value = "{}")]
        filter: String,

        /// Projection document
        #[arg(long)]
        projection: Option<String>,

        /// Sort document, e.g. '{"source": 1}'
        #[arg(long)]
        sort: Option<String>,
    },

    /// Insert a document or append chunks to it, from a JSON file
    Put {
        /// JSON file with `_id`, `source`, and `data` chunks
        #[arg(required = true)]
        file: PathBuf,
    },
}

pub async fn handle_docs(cmd: DocsCommand, format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);

    let uri = config
        .mongo
        .uri
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("MongoDB is not configured (set MONGO_URI or [mongo].uri)"))?;
    let db = MongoDatabase::connect(uri).await?;
    let (database, collection) = (&config.mongo.database, &config.mongo.collection);

    if verbose {
        eprintln!("Collection: {database}.{collection}");
    }

    match cmd {
        DocsCommand::Chunk { chunk_id } => {
            let documents = db
                .get_document_by_chunk_id(database, collection, &chunk_id)
                .await
                .context("chunk lookup failed")?;
            if documents.is_empty() {
                let missing = format!("No document contains chunk '{chunk_id}'.");
                println!("{}", formatter.format_message(&missing));
            } else {
                println!("{}", render_documents(documents)?);
            }
            Ok(())
        }
        DocsCommand::Get { id } => {
            let filter = mongodb::bson::doc! { "_id": id.as_str() };
            let found = db
                .find_one(database, collection, filter, None)
                .await
                .context("lookup failed")?;
            print_found(found, &format!("No document with id '{id}'."), format)
        }
        DocsCommand::Find {
            filter,
            projection,
            sort,
        } => {
            let filter = parse_document(&filter).context("invalid filter")?;
            let projection = projection
                .as_deref()
                .map(parse_document)
                .transpose()
                .context("invalid projection")?;
            let sort = sort
                .as_deref()
                .map(parse_document)
                .transpose()
                .context("invalid sort")?;

            let documents = db
                .find(database, collection, filter, projection, sort)
                .await
                .context("find failed")?;
            println!("{}", render_documents(documents)?);
            Ok(())
        }
        DocsCommand::Put { file } => {
            let content = std::fs::read_to_string(&file)
                .with_context(|| format!("failed to read {}", file.display()))?;
            let document: ChunkDocument =
                serde_json::from_str(&content).context("failed to parse chunk document")?;

            db.insert_or_update_chunk(database, collection, &document)
                .await
                .context("failed to write chunk document")?;

            println!(
                "{}",
                formatter.format_message(&format!(
                    "Stored {} chunk(s) for document '{}'.",
                    document.data.len(),
                    document.id
                ))
            );
            Ok(())
        }
    }
}

fn parse_document(json: &str) -> Result<Document> {
    let value: serde_json::Value = serde_json::from_str(json)?;
    Ok(mongodb::bson::to_document(&value)?)
}

fn to_json(document: Document) -> serde_json::Value {
    Bson::Document(document).into_relaxed_extjson()
}

fn render_documents(documents: Vec<Document>) -> Result<String> {
    let json: Vec<serde_json::Value> = documents.into_iter().map(to_json).collect();
    Ok(serde_json::to_string_pretty(&json)?)
}

fn print_found(found: Option<Document>, missing: &str, format: OutputFormat) -> Result<()> {
    match found {
        Some(document) => {
            println!("{}", serde_json::to_string_pretty(&to_json(document))?);
        }
        None => println!("{}", get_formatter(format).format_message(missing)),
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mongodb::bson::doc;

    #[test]
    fn test_parse_document() {
        let parsed = parse_document(r#"{"source": "notes.md", "n": {"$gt": 1}}"#).unwrap();
        assert_eq!(parsed.get_str("source").unwrap(), "notes.md");
        assert!(parse_document("[1, 2]").is_err());
        assert!(parse_document("not json").is_err());
    }

    #[test]
    fn test_to_json_relaxed() {
        let json = to_json(doc! { "_id": "doc-1", "count": 3_i64 });
        assert_eq!(json["_id"], "doc-1");
        assert_eq!(json["count"], 3);
    }

    #[test]
    fn test_render_documents_keeps_every_match() {
        let rendered = render_documents(vec![
            doc! { "_id": "doc-1", "data": [{ "chunk_id": "shared" }] },
            doc! { "_id": "doc-2", "data": [{ "chunk_id": "shared" }] },
        ])
        .unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&rendered).unwrap();
        let ids: Vec<&str> = parsed
            .as_array()
            .unwrap()
            .iter()
            .map(|d| d["_id"].as_str().unwrap())
            .collect();
        assert_eq!(ids, vec!["doc-1", "doc-2"]);

        assert_eq!(render_documents(Vec::new()).unwrap(), "[]");
    }
}

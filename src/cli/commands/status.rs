use anyhow::Result;

use crate::cli::output::{StatusInfo, get_formatter};
use crate::models::{Config, OutputFormat, VectorDriver};
use crate::services::{MongoDatabase, create_backend};

pub async fn handle_status(format: OutputFormat, verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let formatter = get_formatter(format);
    let index_name = config.vector_index.index_name.clone();

    let (vector_index_connected, index_exists) = match create_backend(&config.vector_index) {
        Ok(service) => {
            let connected = service.health_check().await.unwrap_or(false);
            let exists = if connected {
                service
                    .list_indexes()
                    .await
                    .map(|names| names.contains(&index_name))
                    .unwrap_or(false)
            } else {
                false
            };
            (connected, exists)
        }
        Err(e) => {
            if verbose {
                eprintln!("Vector index: {e}");
            }
            (false, false)
        }
    };

    let mongo_connected = match config.mongo.uri.as_deref() {
        Some(uri) => match MongoDatabase::connect(uri).await {
            Ok(db) => db.ping().await.is_ok(),
            Err(_) => false,
        },
        None => false,
    };

    let status = StatusInfo {
        vector_index_driver: config.vector_index.driver.to_string(),
        vector_index_url: config.vector_index.endpoint().to_string(),
        vector_index_connected,
        index_name,
        index_exists,
        openai_configured: config.openai.api_key.is_some(),
        chat_model: config.openai.chat_model.clone(),
        embedding_model: config.openai.embedding_model.clone(),
        mongo_configured: config.mongo.uri.is_some(),
        mongo_connected,
    };

    print!("{}", formatter.format_status(&status));

    if !vector_index_connected || !status.openai_configured {
        eprintln!();
        if !vector_index_connected {
            match config.vector_index.driver {
                VectorDriver::Pinecone => {
                    eprintln!("Warning: Pinecone not reachable. Check PINECONE_API_KEY.");
                }
                VectorDriver::Qdrant => {
                    eprintln!(
                        "Warning: Qdrant not running. Start with: docker-compose up -d qdrant"
                    );
                }
            }
        }
        if !status.openai_configured {
            eprintln!("Hint: set OPENAI_API_KEY to enable search, embed, chat, and audio.");
        }
    }

    Ok(())
}

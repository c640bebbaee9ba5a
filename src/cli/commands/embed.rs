use anyhow::{Context, Result};
use clap::Args;

use super::openai_client;
use crate::models::{Config, OutputFormat};
use crate::services::EmbeddingClient;

#[derive(Debug, Args)]
pub struct EmbedArgs {
    #[arg(required = true, help = "Text to embed")]
    pub text: String,
}

pub async fn handle_embed(args: EmbedArgs, format: OutputFormat, _verbose: bool) -> Result<()> {
    let config = Config::load()?;
    let client = EmbeddingClient::new(openai_client(&config)?, &config.openai.embedding_model);

    let embedding = client
        .embed(&args.text)
        .await
        .context("failed to generate embedding")?;

    match format {
        OutputFormat::Json => {
            let json = serde_json::json!({
                "model": client.model(),
                "dimension": embedding.len(),
                "embedding": embedding,
            });
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        OutputFormat::Text | OutputFormat::Markdown => {
            print!("{}", EmbeddingClient::display(&embedding));
        }
    }

    Ok(())
}

mod audio;
mod chat;
mod config;
mod docs;
mod embed;
mod index;
mod search;
mod status;
mod upsert;

pub use audio::{SpeakArgs, TranscribeArgs};
pub use chat::ChatArgs;
pub use config::ConfigCommand;
pub use docs::DocsCommand;
pub use embed::EmbedArgs;
pub use index::IndexCommand;
pub use search::SearchArgs;
pub use upsert::UpsertArgs;

pub use audio::{handle_speak, handle_transcribe};
pub use chat::handle_chat;
pub use config::handle_config;
pub use docs::handle_docs;
pub use embed::handle_embed;
pub use index::handle_index;
pub use search::handle_search;
pub use status::handle_status;
pub use upsert::handle_upsert;

use anyhow::{Context, Result};
use std::sync::Arc;

use crate::models::Config;
use crate::services::OpenAiClient;

fn openai_client(config: &Config) -> Result<Arc<OpenAiClient>> {
    let client = OpenAiClient::new(&config.openai)
        .context("OpenAI client unavailable (set OPENAI_API_KEY or [openai].api_key)")?;
    Ok(Arc::new(client))
}

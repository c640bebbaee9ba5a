mod chat;
mod config;
mod document;
mod index;
mod record;
mod search;

pub use chat::{ChatMessage, Role};
pub use config::{
    Config, DEFAULT_DIMENSION, DEFAULT_INDEX_NAME, DEFAULT_OPENAI_URL, DEFAULT_PINECONE_URL,
    DEFAULT_QDRANT_URL, MongoConfig, OpenAiConfig, SearchConfig, VectorDriver, VectorIndexConfig,
};
pub use document::{ChunkDocument, ChunkEntry};
pub use index::{DistanceMetric, IndexDescriptor, ServerlessSpec};
pub use record::{Metadata, MetadataValue, Record};
pub use search::{OutputFormat, QueryMatch, QueryResult, SearchResults};

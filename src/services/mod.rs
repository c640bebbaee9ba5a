mod batch;
mod document_store;
pub mod openai;
mod provision;
mod query;
mod upsert;
pub mod vector_index;

pub use batch::{BatchStats, RecordBatcher, UPSERT_BATCH_SIZE};
pub use document_store::MongoDatabase;
pub use openai::{AudioClient, ChatSession, EmbeddingClient, OpenAiClient, SpeechOptions};
pub use provision::{IndexProvisioner, IndexReady};
pub use query::QueryOrchestrator;
pub use upsert::{UpsertOrchestrator, UpsertSummary};
pub use vector_index::{IndexHandle, VectorIndexService, create_backend};

//! Error types for the AI helpers.

use thiserror::Error;

/// Errors from the OpenAI chat, audio, and embedding endpoints.
#[derive(Debug, Error)]
pub enum OpenAiError {
    #[error("failed to initialize OpenAI client: {0}")]
    ConnectionError(String),

    #[error("OpenAI request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("OpenAI returned status {status}: {body}")]
    ServerError { status: u16, body: String },

    #[error("invalid OpenAI response: {0}")]
    InvalidResponse(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Errors from a vector index backend.
#[derive(Debug, Error)]
pub enum VectorIndexError {
    #[error("failed to initialize vector index client: {0}")]
    ConnectionError(String),

    #[error("list indexes error: {0}")]
    ListError(String),

    #[error("create index error: {0}")]
    CreateError(String),

    #[error("delete index error: {0}")]
    DeleteError(String),

    #[error("index not found: {0}")]
    NotFound(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("query error: {0}")]
    QueryError(String),

    #[error("vector index client error: {0}")]
    ClientError(String),
}

/// Why an index could not be made ready.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("index '{index}' not found")]
    NotFound { index: String },

    #[error("failed to create index '{index}': {cause}")]
    CreateFailed {
        index: String,
        #[source]
        cause: VectorIndexError,
    },

    #[error("failed to list indexes while looking for '{index}': {cause}")]
    ListFailed {
        index: String,
        #[source]
        cause: VectorIndexError,
    },

    #[error("index '{index}' exists but could not be opened: {cause}")]
    Unavailable {
        index: String,
        #[source]
        cause: VectorIndexError,
    },
}

/// A flushed batch was rejected upstream.
#[derive(Debug, Error)]
#[error("upsert of batch {batch_index} failed: {cause}")]
pub struct UpsertFailed {
    /// Zero-based position of the batch in the upsert stream.
    pub batch_index: usize,
    #[source]
    pub cause: VectorIndexError,
}

/// Failure of an upsert or search run, tagged with the stage it stopped at.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error("provision stage failed: {0}")]
    Provision(#[from] ProvisionError),

    #[error("upsert stage failed: {0}")]
    Upsert(#[from] UpsertFailed),

    #[error("query failed: {0}")]
    QueryFailed(#[source] VectorIndexError),

    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}

impl PipelineError {
    pub fn stage(&self) -> &'static str {
        match self {
            PipelineError::Provision(_) => "provision",
            PipelineError::Upsert(_) => "upsert",
            PipelineError::QueryFailed(_) => "query",
            PipelineError::InvalidArgument(_) => "argument",
        }
    }
}

/// Errors from the document database.
#[derive(Debug, Error)]
pub enum DocumentStoreError {
    #[error("failed to connect to MongoDB: {0}")]
    ConnectionError(String),

    #[error("MongoDB error: {0}")]
    DriverError(#[from] mongodb::error::Error),

    #[error("BSON encoding error: {0}")]
    EncodeError(#[from] mongodb::bson::ser::Error),
}

/// Errors related to configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_stage_names() {
        let provision = PipelineError::from(ProvisionError::NotFound {
            index: "docs".to_string(),
        });
        assert_eq!(provision.stage(), "provision");

        let upsert = PipelineError::from(UpsertFailed {
            batch_index: 2,
            cause: VectorIndexError::UpsertError("boom".to_string()),
        });
        assert_eq!(upsert.stage(), "upsert");
        assert_eq!(
            upsert.to_string(),
            "upsert stage failed: upsert of batch 2 failed: upsert error: boom"
        );

        let invalid = PipelineError::InvalidArgument("top_k must be positive".to_string());
        assert_eq!(invalid.stage(), "argument");
    }
}

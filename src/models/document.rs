use serde::{Deserialize, Serialize};

/// A source document and the text chunks extracted from it, as stored in
/// the document database.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkDocument {
    #[serde(rename = "_id")]
    pub id: String,
    pub source: String,
    #[serde(default)]
    pub data: Vec<ChunkEntry>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChunkEntry {
    pub chunk_id: String,
    pub chunk_number: i64,
    pub text: String,
}

impl ChunkDocument {
    pub fn new(id: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            source: source.into(),
            data: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_chunk(
        mut self,
        chunk_id: impl Into<String>,
        chunk_number: i64,
        text: impl Into<String>,
    ) -> Self {
        self.data.push(ChunkEntry {
            chunk_id: chunk_id.into(),
            chunk_number,
            text: text.into(),
        });
        self
    }
}

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    pub doc_id: String,
    pub chunk_id: String,
    pub text: String,
    pub source: String,
    pub offset: (usize, usize), // [start, end) grapheme positions in the document
}

impl Chunk {
    pub fn new(
        doc_id: String,
        text: String,
        source: String,
        offset: (usize, usize),
    ) -> Self {
        let chunk_id = Self::generate_chunk_id(&doc_id, &text, offset);

        Self {
            doc_id,
            chunk_id,
            text,
            source,
            offset,
        }
    }

    fn generate_chunk_id(doc_id: &str, text: &str, offset: (usize, usize)) -> String {
        let mut hasher = Sha256::new();
        hasher.update(doc_id.as_bytes());
        hasher.update(text.as_bytes());
        hasher.update(offset.0.to_string().as_bytes());
        hasher.update(offset.1.to_string().as_bytes());
        let result = hasher.finalize();
        hex::encode(&result[..16]) // first 16 bytes (32 hex chars)
    }

    /// Number of characters covered by this chunk in the source document
    pub fn span_len(&self) -> usize {
        self.offset.1 - self.offset.0
    }
}

/// A loaded source document, before chunking
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub doc_id: String,
    pub source: String,
    pub text: String,
}

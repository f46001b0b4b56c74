pub mod chunk;
pub mod chunker;
pub mod reader;

pub use chunk::{Chunk, Document};
pub use chunker::{Chunker, ChunkerConfig};
pub use reader::{FileReader, MedicalRecord};

use anyhow::Result;
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::info;

/// Generate a stable document ID from its source location
pub fn generate_doc_id(path: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(path.as_bytes());
    let result = hasher.finalize();
    hex::encode(&result[..16])
}

/// Load every supported document under `path` (file or directory)
pub async fn load_documents(path: &Path) -> Result<Vec<Document>> {
    let documents = if path.is_dir() {
        FileReader::read_directory(path).await?
    } else {
        FileReader::read_file(path).await?
    };

    info!(path = %path.display(), documents = documents.len(), "Loaded medical documents");
    Ok(documents)
}

/// Split loaded documents into overlapping passages
pub fn chunk_documents(documents: &[Document], config: ChunkerConfig) -> Vec<Chunk> {
    let chunker = Chunker::new(config);

    let chunks: Vec<Chunk> = documents
        .iter()
        .flat_map(|doc| chunker.chunk_text(&doc.doc_id, &doc.text, &doc.source))
        .collect();

    info!(documents = documents.len(), chunks = chunks.len(), "Split documents into chunks");
    chunks
}

/// Main ingestion pipeline: load and chunk with the default window
pub async fn ingest_path(path: &Path) -> Result<Vec<Chunk>> {
    let documents = load_documents(path).await?;
    Ok(chunk_documents(&documents, ChunkerConfig::default()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_ingest_path_single_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("gvhd.txt");
        std::fs::write(&path, "Cyclosporine and chloroquine are used against GVHD.").unwrap();

        let chunks = ingest_path(&path).await.unwrap();

        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].doc_id, generate_doc_id(&path.to_string_lossy()));
    }
}

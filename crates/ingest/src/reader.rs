use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;
use tokio::fs;
use walkdir::WalkDir;

use crate::chunk::Document;
use crate::generate_doc_id;

/// One expert-annotated literature record (PubMedQA layout).
#[derive(Debug, Clone, Deserialize)]
pub struct MedicalRecord {
    pub question: String,
    #[serde(default)]
    pub context: RecordContext,
    #[serde(default)]
    pub long_answer: String,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct RecordContext {
    #[serde(default)]
    pub contexts: Vec<String>,
}

impl MedicalRecord {
    /// Flatten the record into the text that gets chunked and embedded
    pub fn to_text(&self) -> String {
        format!(
            "Question: {}\nAbstract: {}\nAnswer: {}",
            self.question,
            self.context.contexts.join(" "),
            self.long_answer
        )
    }
}

pub struct FileReader;

impl FileReader {
    pub async fn read_file(path: &Path) -> Result<Vec<Document>> {
        let extension = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("");
        let source = path.to_string_lossy().to_string();

        let content = match extension {
            "txt" | "md" | "json" | "jsonl" => fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read file: {:?}", path))?,
            _ => anyhow::bail!("Unsupported file format: {}", extension),
        };

        match extension {
            "json" => {
                let records: Vec<MedicalRecord> = serde_json::from_str(&content)
                    .with_context(|| format!("Failed to parse record array: {:?}", path))?;
                Ok(Self::records_to_documents(&source, records))
            }
            "jsonl" => {
                let records = Self::parse_jsonl(&content)
                    .with_context(|| format!("Failed to parse records: {:?}", path))?;
                Ok(Self::records_to_documents(&source, records))
            }
            _ => Ok(vec![Document {
                doc_id: generate_doc_id(&source),
                source,
                text: content,
            }]),
        }
    }

    pub async fn read_directory(dir: &Path) -> Result<Vec<Document>> {
        let mut documents = Vec::new();

        for entry in WalkDir::new(dir).sort_by_file_name() {
            let entry = entry.context("Failed to walk directory")?;
            let path = entry.path();

            if !path.is_file() {
                continue;
            }

            let supported = matches!(
                path.extension().and_then(|e| e.to_str()),
                Some("txt" | "md" | "json" | "jsonl")
            );
            if supported {
                documents.extend(Self::read_file(path).await?);
            }
        }

        Ok(documents)
    }

    fn parse_jsonl(content: &str) -> Result<Vec<MedicalRecord>> {
        content
            .lines()
            .enumerate()
            .filter(|(_, line)| !line.trim().is_empty())
            .map(|(i, line)| {
                serde_json::from_str(line).with_context(|| format!("Invalid record on line {}", i + 1))
            })
            .collect()
    }

    fn records_to_documents(source: &str, records: Vec<MedicalRecord>) -> Vec<Document> {
        records
            .iter()
            .enumerate()
            .map(|(i, record)| Document {
                doc_id: generate_doc_id(&format!("{}#{}", source, i)),
                source: source.to_string(),
                text: record.to_text(),
            })
            .collect()
    }
}

use crate::schema::{NodeKind, RelationKind};

/// System turn for pulling entities out of a user question
pub const ENTITY_EXTRACTION_PROMPT: &str = "You are a medical entity extractor. Extract the main medical concepts (diseases, drugs, procedures) from the user question. Return ONLY the entities as a comma-separated list.";

pub fn build_graph_extraction_prompt(document_text: &str) -> String {
    let node_kinds = NodeKind::ALL
        .iter()
        .map(|k| k.label())
        .collect::<Vec<_>>()
        .join(", ");
    let relation_kinds = RelationKind::ALL
        .iter()
        .map(|k| k.rel_type())
        .collect::<Vec<_>>()
        .join(", ");

    format!(
        r#"Extract a medical knowledge graph from the following text.

INSTRUCTIONS:
1. Identify medical entities and give each one a concise, human-readable id (e.g. "GVHD", "Cyclosporine")
2. Extract relationships between the entities
3. Output ONLY valid JSON, nothing else
4. Use the exact schema below

SCHEMA:
{{
  "nodes": [
    {{"id": "Cyclosporine", "type": "Drug"}}
  ],
  "relationships": [
    {{"source": "Cyclosporine", "target": "GVHD", "type": "TREATS"}}
  ]
}}

RULES:
- Node types must be one of: {}
- Relationship types must be one of: {}
- Relationship source and target must be node ids from the "nodes" list
- Output ONLY the JSON object, no markdown, no explanations

TEXT:
{}

JSON OUTPUT:"#,
        node_kinds, relation_kinds, document_text
    )
}

pub fn build_retry_prompt(invalid_json: &str) -> String {
    format!(
        r#"The following JSON is invalid:

{}

Fix this JSON. Output only valid JSON with no markdown formatting, no code blocks, no explanations. Just the raw JSON object."#,
        invalid_json
    )
}

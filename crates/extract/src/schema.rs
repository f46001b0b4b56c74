use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Node labels allowed in the medical knowledge graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NodeKind {
    Disease,
    Drug,
    Symptom,
    Anatomy,
    Test,
    Treatment,
}

impl NodeKind {
    pub const ALL: [NodeKind; 6] = [
        NodeKind::Disease,
        NodeKind::Drug,
        NodeKind::Symptom,
        NodeKind::Anatomy,
        NodeKind::Test,
        NodeKind::Treatment,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            NodeKind::Disease => "Disease",
            NodeKind::Drug => "Drug",
            NodeKind::Symptom => "Symptom",
            NodeKind::Anatomy => "Anatomy",
            NodeKind::Test => "Test",
            NodeKind::Treatment => "Treatment",
        }
    }

    /// Case-insensitive lookup; anything outside the allowed set is `None`
    pub fn parse(raw: &str) -> Option<Self> {
        let raw = raw.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.label().eq_ignore_ascii_case(raw))
    }
}

/// Relationship types allowed in the medical knowledge graph
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationKind {
    Causes,
    Treats,
    AssociatedWith,
    Affects,
    Prevents,
    IsA,
}

impl RelationKind {
    pub const ALL: [RelationKind; 6] = [
        RelationKind::Causes,
        RelationKind::Treats,
        RelationKind::AssociatedWith,
        RelationKind::Affects,
        RelationKind::Prevents,
        RelationKind::IsA,
    ];

    pub fn rel_type(&self) -> &'static str {
        match self {
            RelationKind::Causes => "CAUSES",
            RelationKind::Treats => "TREATS",
            RelationKind::AssociatedWith => "ASSOCIATED_WITH",
            RelationKind::Affects => "AFFECTS",
            RelationKind::Prevents => "PREVENTS",
            RelationKind::IsA => "IS_A",
        }
    }

    /// Accepts "treats", "Associated with", "IS-A" and similar spellings
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .map(|c| if c == ' ' || c == '-' { '_' } else { c.to_ascii_uppercase() })
            .collect();

        Self::ALL
            .into_iter()
            .find(|kind| kind.rel_type() == normalized)
    }
}

/// Read-only projection of one stored edge
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphTriple {
    pub source: String,
    pub relation: String,
    pub target: String,
}

impl GraphTriple {
    pub fn new(
        source: impl Into<String>,
        relation: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            relation: relation.into(),
            target: target.into(),
        }
    }
}

impl fmt::Display for GraphTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.source, self.relation, self.target)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TypedNode {
    pub id: String,
    pub kind: NodeKind,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypedRelation {
    pub source: TypedNode,
    pub target: TypedNode,
    pub kind: RelationKind,
}

/// Typed sub-graph extracted from one document
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphDocument {
    pub nodes: Vec<TypedNode>,
    pub relations: Vec<TypedRelation>,
}

impl GraphDocument {
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relations.is_empty()
    }
}

/// Model output before kind validation
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawGraph {
    #[serde(default)]
    pub nodes: Vec<RawNode>,
    #[serde(default, alias = "relations")]
    pub relationships: Vec<RawRelation>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawNode {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RawRelation {
    pub source: String,
    pub target: String,
    #[serde(rename = "type")]
    pub kind: String,
}

impl RawGraph {
    /// Keep only allowed node and relation kinds. Relations pointing at
    /// dropped or unknown nodes are dropped too.
    pub fn into_document(self) -> GraphDocument {
        let mut nodes: Vec<TypedNode> = Vec::new();
        let mut by_id: HashMap<String, TypedNode> = HashMap::new();

        for raw in self.nodes {
            let id = raw.id.trim();
            if id.is_empty() || by_id.contains_key(id) {
                continue;
            }
            if let Some(kind) = NodeKind::parse(&raw.kind) {
                let node = TypedNode {
                    id: id.to_string(),
                    kind,
                };
                by_id.insert(node.id.clone(), node.clone());
                nodes.push(node);
            }
        }

        let relations = self
            .relationships
            .into_iter()
            .filter_map(|raw| {
                let kind = RelationKind::parse(&raw.kind)?;
                let source = by_id.get(raw.source.trim())?.clone();
                let target = by_id.get(raw.target.trim())?.clone();
                Some(TypedRelation {
                    source,
                    target,
                    kind,
                })
            })
            .collect();

        GraphDocument { nodes, relations }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_parsing() {
        assert_eq!(NodeKind::parse("drug"), Some(NodeKind::Drug));
        assert_eq!(NodeKind::parse("Cell"), None);
        assert_eq!(RelationKind::parse("Associated with"), Some(RelationKind::AssociatedWith));
        assert_eq!(RelationKind::parse("is-a"), Some(RelationKind::IsA));
        assert_eq!(RelationKind::parse("INTERACTS_WITH"), None);
    }

    #[test]
    fn test_triple_display() {
        let triple = GraphTriple::new("Cyclosporine", "TREATS", "GVHD");
        assert_eq!(triple.to_string(), "Cyclosporine TREATS GVHD");
    }

    #[test]
    fn test_raw_graph_filters_disallowed_kinds() {
        let raw: RawGraph = serde_json::from_str(
            r#"{
                "nodes": [
                    {"id": "GVHD", "type": "Disease"},
                    {"id": "Cyclosporine", "type": "Drug"},
                    {"id": "T cells", "type": "Cell"},
                    {"id": "GVHD", "type": "Disease"}
                ],
                "relationships": [
                    {"source": "Cyclosporine", "target": "GVHD", "type": "TREATS"},
                    {"source": "GVHD", "target": "T cells", "type": "CAUSES"},
                    {"source": "Cyclosporine", "target": "GVHD", "type": "CURES"}
                ]
            }"#,
        )
        .unwrap();

        let doc = raw.into_document();

        assert_eq!(doc.nodes.len(), 2);
        assert_eq!(doc.relations.len(), 1);
        assert_eq!(doc.relations[0].kind, RelationKind::Treats);
        assert_eq!(doc.relations[0].source.kind, NodeKind::Drug);
    }
}

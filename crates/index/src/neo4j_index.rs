use anyhow::{Context, Result};
use async_trait::async_trait;
use extract::{GraphDocument, GraphTriple, NodeKind, TypedNode, TypedRelation};
use neo4rs::{Graph, Query};
use tracing::{debug, info, instrument};

use crate::store::{GraphInspector, GraphStats, GraphStore, GraphWriter};

#[derive(Clone)]
pub struct Neo4jGraphStore {
    graph: Graph,
}

impl Neo4jGraphStore {
    pub fn new(graph: Graph) -> Self {
        Self { graph }
    }

    pub async fn connect(uri: &str, user: &str, password: &str) -> Result<Self> {
        let graph = Graph::new(uri, user, password)
            .await
            .with_context(|| format!("Failed to connect to Neo4j at {}", uri))?;
        Ok(Self::new(graph))
    }

    /// MERGE a typed node by id
    async fn write_node(&self, node: &TypedNode) -> Result<()> {
        let query = Query::new(format!("MERGE (n:{} {{id: $id}})", node.kind.label()))
            .param("id", node.id.clone());

        self.graph.run(query).await
            .context("Failed to write node")?;
        Ok(())
    }

    /// MERGE both endpoints and the typed relationship between them
    async fn write_relation(&self, relation: &TypedRelation) -> Result<()> {
        let query = Query::new(format!(
            r#"
            MERGE (s:{} {{id: $source_id}})
            MERGE (t:{} {{id: $target_id}})
            MERGE (s)-[:{}]->(t)
            "#,
            relation.source.kind.label(),
            relation.target.kind.label(),
            relation.kind.rel_type()
        ))
        .param("source_id", relation.source.id.clone())
        .param("target_id", relation.target.id.clone());

        self.graph.run(query).await
            .context("Failed to write relation")?;
        Ok(())
    }

    pub async fn write_document(&self, document: &GraphDocument) -> Result<()> {
        for node in &document.nodes {
            self.write_node(node).await?;
        }
        for relation in &document.relations {
            self.write_relation(relation).await?;
        }
        Ok(())
    }

    async fn count(&self, cypher: &str) -> Result<usize> {
        let mut result = self.graph.execute(Query::new(cypher.to_string())).await?;
        let count = if let Some(row) = result.next().await? {
            row.get::<i64>("count").unwrap_or(0) as usize
        } else {
            0
        };
        Ok(count)
    }

    async fn collect_triples(&self, query: Query) -> Result<Vec<GraphTriple>> {
        let mut result = self.graph.execute(query).await
            .context("Failed to run graph query")?;

        let mut triples = Vec::new();
        while let Some(row) = result.next().await? {
            triples.push(GraphTriple {
                source: row.get("source")?,
                relation: row.get("rel")?,
                target: row.get("target")?,
            });
        }

        Ok(triples)
    }
}

/// Substring match on either endpoint id. The term is embedded as a quoted
/// literal, which is what `extract::sanitize` prepares it for.
fn build_match_query(term: &str) -> String {
    format!(
        r#"
        MATCH (n)-[r]->(m)
        WHERE toLower(n.id) CONTAINS toLower('{term}') OR toLower(m.id) CONTAINS toLower('{term}')
        RETURN n.id AS source, type(r) AS rel, m.id AS target
        LIMIT $limit
        "#
    )
}

#[async_trait]
impl GraphStore for Neo4jGraphStore {
    #[instrument(skip(self))]
    async fn match_triples(&self, term: &str, limit: usize) -> Result<Vec<GraphTriple>> {
        let query = Query::new(build_match_query(term)).param("limit", limit as i64);
        let triples = self.collect_triples(query).await?;

        debug!(matches = triples.len(), "Graph lookup finished");
        Ok(triples)
    }
}

#[async_trait]
impl GraphWriter for Neo4jGraphStore {
    async fn write_documents(&self, documents: &[GraphDocument]) -> Result<()> {
        for document in documents {
            self.write_document(document).await?;
        }
        Ok(())
    }
}

#[async_trait]
impl GraphInspector for Neo4jGraphStore {
    /// Initialize schema: one id index per node label
    async fn init_schema(&self) -> Result<()> {
        for kind in NodeKind::ALL {
            let query = Query::new(format!(
                "CREATE INDEX {}_id_index IF NOT EXISTS FOR (n:{}) ON (n.id)",
                kind.label().to_lowercase(),
                kind.label()
            ));
            self.graph.run(query).await
                .with_context(|| format!("Failed to create index on {}.id", kind.label()))?;
        }

        info!("Neo4j indexes created");
        Ok(())
    }

    async fn ping(&self) -> Result<()> {
        self.graph.run(Query::new("RETURN 1".to_string())).await
            .context("Neo4j did not answer")?;
        Ok(())
    }

    /// First `limit` directed edges in store order, for inspecting a
    /// freshly built graph
    async fn sample_triples(&self, limit: usize) -> Result<Vec<GraphTriple>> {
        let query = Query::new(
            r#"
            MATCH (n)-[r]->(m)
            RETURN n.id AS source, type(r) AS rel, m.id AS target
            LIMIT $limit
            "#.to_string()
        )
        .param("limit", limit as i64);

        self.collect_triples(query).await
    }

    /// Get graph statistics
    async fn get_stats(&self) -> Result<GraphStats> {
        let node_count = self.count("MATCH (n) RETURN count(n) AS count").await?;
        let relation_count = self.count("MATCH ()-[r]->() RETURN count(r) AS count").await?;

        Ok(GraphStats {
            node_count,
            relation_count,
        })
    }
}

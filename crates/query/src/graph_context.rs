use extract::sanitize;
use index::GraphStore;
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, instrument, warn};

/// Placed in the prompt when no entity matched anything
pub const NO_GRAPH_CONNECTIONS: &str = "No direct graph connections found.";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", content = "detail", rename_all = "snake_case")]
pub enum LookupStatus {
    Matched(usize),
    NoMatch,
    /// The entity sanitized to an empty term and was not queried
    Skipped,
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityLookup {
    pub entity: String,
    pub term: String,
    pub status: LookupStatus,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GraphContext {
    pub lines: Vec<String>,
    pub lookups: Vec<EntityLookup>,
}

impl GraphContext {
    /// Lines joined by newlines, or the sentinel when nothing matched
    pub fn text(&self) -> String {
        if self.lines.is_empty() {
            NO_GRAPH_CONNECTIONS.to_string()
        } else {
            self.lines.join("\n")
        }
    }

    pub fn is_degraded(&self) -> bool {
        self.lookups
            .iter()
            .any(|lookup| matches!(lookup.status, LookupStatus::Failed(_)))
    }
}

/// Collects graph relationships around extracted entities.
#[derive(Clone)]
pub struct GraphContextFetcher {
    store: Arc<dyn GraphStore>,
    limit: usize,
}

impl GraphContextFetcher {
    pub fn new(store: Arc<dyn GraphStore>, limit: usize) -> Self {
        Self { store, limit }
    }

    /// Query every entity independently. A failing lookup is logged and
    /// recorded, it never aborts the remaining entities.
    #[instrument(skip(self, entities), fields(entities = entities.len()))]
    pub async fn fetch(&self, entities: &[String]) -> GraphContext {
        let mut context = GraphContext::default();

        for entity in entities {
            let term = sanitize(entity);
            if term.is_empty() {
                debug!(entity = %entity, "Skipping blank entity");
                context.lookups.push(EntityLookup {
                    entity: entity.clone(),
                    term,
                    status: LookupStatus::Skipped,
                });
                continue;
            }

            let status = match self.store.match_triples(&term, self.limit).await {
                Ok(triples) if triples.is_empty() => LookupStatus::NoMatch,
                Ok(triples) => {
                    let matched = triples.len();
                    context
                        .lines
                        .extend(triples.iter().map(|triple| triple.to_string()));
                    LookupStatus::Matched(matched)
                }
                Err(e) => {
                    warn!(entity = %entity, error = %e, "Graph lookup failed");
                    LookupStatus::Failed(format!("{:#}", e))
                }
            };

            context.lookups.push(EntityLookup {
                entity: entity.clone(),
                term,
                status,
            });
        }

        context
    }
}

//! Full schema build: classify classes, query endpoints per edge class,
//! normalize, deduplicate.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures_util::{stream, StreamExt};

use super::{
    dedup_relationships, find_subclasses, inheritance_relationships, normalize_pair, ClassEntry, ClassTable,
    RawEndpointPair, Relationship, SchemaClass, SchemeDocument,
};
use crate::config::Config;
use crate::db::SchemaSource;
use crate::{Result, SchemeError};

/// Knobs for a schema build
#[derive(Debug, Clone)]
pub struct BuildOptions {
    pub vertex_root: String,
    pub edge_root: String,
    pub max_depth: usize,
    /// Deadline for each individual database call
    pub query_timeout: Duration,
    /// Endpoint queries allowed in flight at once
    pub max_concurrent_queries: usize,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            vertex_root: "V".to_string(),
            edge_root: "E".to_string(),
            max_depth: 64,
            query_timeout: Duration::from_secs(30),
            max_concurrent_queries: 8,
        }
    }
}

impl BuildOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            vertex_root: config.schema.vertex_root.clone(),
            edge_root: config.schema.edge_root.clone(),
            max_depth: config.schema.max_depth,
            query_timeout: config.query_timeout(),
            max_concurrent_queries: config.database.max_concurrent_queries,
        }
    }
}

/// Builds a [`SchemeDocument`] from a live database.
pub struct SchemaBuilder {
    source: Arc<dyn SchemaSource>,
    options: BuildOptions,
}

impl SchemaBuilder {
    pub fn new(source: Arc<dyn SchemaSource>, options: BuildOptions) -> Self {
        Self { source, options }
    }

    pub fn options(&self) -> &BuildOptions {
        &self.options
    }

    /// Walk the database schema and produce a deduplicated document.
    ///
    /// Fails if the class listing fails (connection, rejection or timeout).
    /// A failing endpoint query only drops that edge class's relationships.
    pub async fn build(&self) -> Result<SchemeDocument> {
        let opts = &self.options;
        let start = std::time::Instant::now();

        let classes = with_deadline(opts.query_timeout, "class listing", self.source.list_classes()).await?;
        let table = ClassTable::new(classes);

        let vertices = find_subclasses(&table, &opts.vertex_root, opts.max_depth)?;
        let edges = find_subclasses(&table, &opts.edge_root, opts.max_depth)?;
        log::info!(
            "Classes: {} vertices: {} edges: {}",
            table.len(),
            vertices.len(),
            edges.len()
        );

        let mut relationships = inheritance_relationships(&table, &opts.vertex_root, &opts.edge_root);
        let inheritance_count = relationships.len();

        let endpoint_sets = self.fetch_endpoints(&edges).await;
        for (edge, pairs) in edges.iter().zip(endpoint_sets) {
            for pair in pairs {
                let normalized = normalize_pair(&table, &pair, &opts.vertex_root);
                relationships.push(Relationship::data_link(
                    &edge.class_name,
                    normalized.from_class,
                    normalized.to_class,
                ));
            }
        }

        let candidates = relationships.len();
        let relationships = dedup_relationships(relationships)?;
        log::info!(
            "Schema built in {:?}: {} relationships ({} inheritance, {} duplicates dropped)",
            start.elapsed(),
            relationships.len(),
            inheritance_count,
            candidates - relationships.len()
        );

        Ok(SchemeDocument {
            vertices: vertices.into_iter().map(ClassEntry::from).collect(),
            edges: edges.into_iter().map(ClassEntry::from).collect(),
            relationships,
            extra: Default::default(),
        })
    }

    /// Endpoint pairs for every edge class, in the order of `edges`.
    async fn fetch_endpoints(&self, edges: &[SchemaClass]) -> Vec<Vec<RawEndpointPair>> {
        // `buffered` yields in input order regardless of completion order
        stream::iter(edges.iter().map(|edge| self.endpoints_for(&edge.class_name)))
            .buffered(self.options.max_concurrent_queries.max(1))
            .collect()
            .await
    }

    async fn endpoints_for(&self, edge: &str) -> Vec<RawEndpointPair> {
        let query = self.source.list_distinct_endpoints(edge);
        match with_deadline(self.options.query_timeout, edge, query).await {
            Ok(pairs) => {
                if pairs.is_empty() {
                    log::debug!("{}: no relation found", edge);
                } else {
                    log::debug!("{}: {} endpoint pairs", edge, pairs.len());
                }
                pairs
            }
            Err(e) => {
                log::warn!("Skipping edge class {}: {}", edge, e);
                Vec::new()
            }
        }
    }
}

async fn with_deadline<T>(deadline: Duration, what: &str, call: impl Future<Output = Result<T>>) -> Result<T> {
    match tokio::time::timeout(deadline, call).await {
        Ok(result) => result,
        Err(_) => Err(SchemeError::Timeout(format!("{} exceeded {:?}", what, deadline))),
    }
}

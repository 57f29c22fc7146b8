//! In-memory `SchemaSource` for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;

use super::SchemaSource;
use crate::error::{Result, SchemeError};
use crate::schema::{ClassDescriptor, RawEndpointPair};

#[derive(Default)]
pub(crate) struct FakeSource {
    classes: Vec<ClassDescriptor>,
    endpoints: HashMap<String, Vec<RawEndpointPair>>,
    failing_edges: HashSet<String>,
    edge_delays: HashMap<String, Duration>,
    class_delay: Option<Duration>,
    rejected: bool,
    pub unreachable: AtomicBool,
    in_flight: AtomicUsize,
    pub max_in_flight: AtomicUsize,
    pub endpoint_calls: Mutex<Vec<String>>,
    pub class_calls: AtomicUsize,
}

impl FakeSource {
    pub fn with_classes(classes: &[(&str, Option<&str>)]) -> Self {
        Self {
            classes: classes
                .iter()
                .map(|(name, parent)| ClassDescriptor::new(*name, *parent))
                .collect(),
            ..Default::default()
        }
    }

    pub fn endpoints(mut self, edge: &str, pairs: &[(&str, &str)]) -> Self {
        self.endpoints.insert(
            edge.to_string(),
            pairs.iter().map(|(f, t)| RawEndpointPair::new(*f, *t)).collect(),
        );
        self
    }

    pub fn failing(mut self, edge: &str) -> Self {
        self.failing_edges.insert(edge.to_string());
        self
    }

    pub fn edge_delay(mut self, edge: &str, delay: Duration) -> Self {
        self.edge_delays.insert(edge.to_string(), delay);
        self
    }

    pub fn class_delay(mut self, delay: Duration) -> Self {
        self.class_delay = Some(delay);
        self
    }

    pub fn rejecting_metadata(mut self) -> Self {
        self.rejected = true;
        self
    }
}

/// Counts a call as in flight until dropped, including when a deadline cancels it.
struct InFlight<'a>(&'a AtomicUsize);

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        self.0.fetch_sub(1, Ordering::SeqCst);
    }
}

impl FakeSource {
    pub fn in_flight(&self) -> usize {
        self.in_flight.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SchemaSource for FakeSource {
    async fn list_classes(&self) -> Result<Vec<ClassDescriptor>> {
        self.class_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.class_delay {
            tokio::time::sleep(delay).await;
        }
        if self.unreachable.load(Ordering::SeqCst) {
            return Err(SchemeError::Connection("connection refused".to_string()));
        }
        if self.rejected {
            return Err(SchemeError::SchemaQuery("syntax error".to_string()));
        }
        Ok(self.classes.clone())
    }

    async fn list_distinct_endpoints(&self, edge_class: &str) -> Result<Vec<RawEndpointPair>> {
        self.endpoint_calls.lock().unwrap().push(edge_class.to_string());
        let now = self.in_flight.fetch_add(1, Ordering::SeqCst) + 1;
        self.max_in_flight.fetch_max(now, Ordering::SeqCst);
        let _guard = InFlight(&self.in_flight);

        if let Some(delay) = self.edge_delays.get(edge_class) {
            tokio::time::sleep(*delay).await;
        }

        if self.failing_edges.contains(edge_class) {
            return Err(SchemeError::EdgeQuery {
                edge: edge_class.to_string(),
                reason: "class not found".to_string(),
            });
        }
        Ok(self.endpoints.get(edge_class).cloned().unwrap_or_default())
    }
}

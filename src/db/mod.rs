//! Database boundary: the two metadata queries a schema build needs.

mod orientdb;
#[cfg(test)]
pub(crate) mod testing;

pub use orientdb::{validate_class_name, OrientDbClient};

use async_trait::async_trait;

use crate::error::Result;
use crate::schema::{ClassDescriptor, RawEndpointPair};

/// Source of schema metadata for a graph database.
///
/// Implementations should map an unreachable database to
/// [`SchemeError::Connection`](crate::SchemeError::Connection) and a rejected
/// metadata query to [`SchemeError::SchemaQuery`](crate::SchemeError::SchemaQuery).
/// Retries, if any, belong here; the schema builder never retries.
#[async_trait]
pub trait SchemaSource: Send + Sync {
    /// Every class with its immediate superclass.
    async fn list_classes(&self) -> Result<Vec<ClassDescriptor>>;

    /// Distinct (source class, target class) pairs among the instances of `edge_class`.
    /// An edge class without instances yields an empty list.
    async fn list_distinct_endpoints(&self, edge_class: &str) -> Result<Vec<RawEndpointPair>>;
}

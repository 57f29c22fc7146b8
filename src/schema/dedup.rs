//! Stable, first-seen-wins relationship deduplication.

use std::collections::HashSet;

use super::Relationship;
use crate::{Result, SchemeError};

/// Identity of a relationship: `(edgeName, from, to)`. Color is not part of it.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationshipKey {
    pub edge_name: String,
    pub from: String,
    pub to: String,
}

impl RelationshipKey {
    /// Key for `rel`; an empty component is rejected rather than silently merged.
    pub fn of(rel: &Relationship) -> Result<Self> {
        if rel.edge_name.is_empty() || rel.from.is_empty() || rel.to.is_empty() {
            return Err(SchemeError::InvalidRelationship(format!(
                "empty component in ({:?}, {:?}, {:?})",
                rel.edge_name, rel.from, rel.to
            )));
        }
        Ok(Self {
            edge_name: rel.edge_name.clone(),
            from: rel.from.clone(),
            to: rel.to.clone(),
        })
    }
}

/// Keep the first relationship for each key, preserving input order.
pub fn dedup_relationships(relationships: Vec<Relationship>) -> Result<Vec<Relationship>> {
    let mut seen = HashSet::with_capacity(relationships.len());
    let mut unique = Vec::with_capacity(relationships.len());

    for rel in relationships {
        let key = RelationshipKey::of(&rel)?;
        if seen.insert(key) {
            unique.push(rel);
        } else {
            log::debug!("Dropping duplicate relationship {} {} -> {}", rel.edge_name, rel.from, rel.to);
        }
    }

    Ok(unique)
}

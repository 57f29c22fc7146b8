//! Endpoint normalization: lift concrete endpoint classes to their grouping class.

use super::{ClassTable, RawEndpointPair};

/// Normalize one side of an endpoint pair.
///
/// A class is replaced by its immediate superclass, unless that superclass is
/// the vertex root (the class is already top-level) or there is none.
fn normalize_class(table: &ClassTable, class_name: &str, vertex_root: &str) -> String {
    match table.super_class_of(class_name) {
        Some(parent) if parent != vertex_root => parent.to_string(),
        _ => class_name.to_string(),
    }
}

/// Normalize both sides of a raw endpoint pair against the class table.
pub fn normalize_pair(table: &ClassTable, pair: &RawEndpointPair, vertex_root: &str) -> RawEndpointPair {
    RawEndpointPair {
        from_class: normalize_class(table, &pair.from_class, vertex_root),
        to_class: normalize_class(table, &pair.to_class, vertex_root),
    }
}

//! Class hierarchy lookups and the recursive subclass walk.

use std::collections::HashMap;

use super::{ClassDescriptor, Relationship, SchemaClass};
use crate::{Result, SchemeError};

/// Snapshot of the database class list with name and child indexes.
///
/// Listing order is preserved: children are reported in the order the
/// database returned them.
#[derive(Debug, Clone, Default)]
pub struct ClassTable {
    classes: Vec<ClassDescriptor>,
    by_name: HashMap<String, usize>,
    children: HashMap<String, Vec<usize>>,
}

impl ClassTable {
    pub fn new(classes: Vec<ClassDescriptor>) -> Self {
        let mut by_name = HashMap::with_capacity(classes.len());
        let mut children: HashMap<String, Vec<usize>> = HashMap::new();

        for (idx, class) in classes.iter().enumerate() {
            // First listing wins on duplicate names
            by_name.entry(class.name.clone()).or_insert(idx);
            if let Some(parent) = &class.super_class {
                children.entry(parent.clone()).or_default().push(idx);
            }
        }

        Self {
            classes,
            by_name,
            children,
        }
    }

    pub fn classes(&self) -> &[ClassDescriptor] {
        &self.classes
    }

    pub fn len(&self) -> usize {
        self.classes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&ClassDescriptor> {
        self.by_name.get(name).map(|&idx| &self.classes[idx])
    }

    /// Immediate superclass of `name`, if the class is known and has one.
    pub fn super_class_of(&self, name: &str) -> Option<&str> {
        self.get(name).and_then(|class| class.super_class.as_deref())
    }

    /// Direct subclasses of `name` in listing order.
    pub fn children_of<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a ClassDescriptor> + 'a {
        self.children
            .get(name)
            .into_iter()
            .flatten()
            .map(move |&idx| &self.classes[idx])
    }
}

/// Every class that descends (transitively) from `root`, excluding `root`.
///
/// Output order: direct children of `root` in listing order, followed by each
/// child's own descendants in the same fashion. Walks deeper than `max_depth`
/// levels fail with [`SchemeError::HierarchyTooDeep`]; an acyclic schema never
/// gets there.
pub fn find_subclasses(table: &ClassTable, root: &str, max_depth: usize) -> Result<Vec<SchemaClass>> {
    let mut found = Vec::new();
    collect_subclasses(table, root, root, 1, max_depth, &mut found)?;
    Ok(found)
}

fn collect_subclasses(
    table: &ClassTable,
    root: &str,
    parent: &str,
    depth: usize,
    max_depth: usize,
    found: &mut Vec<SchemaClass>,
) -> Result<()> {
    let children: Vec<&ClassDescriptor> = table.children_of(parent).collect();
    if children.is_empty() {
        return Ok(());
    }
    if depth > max_depth {
        return Err(SchemeError::HierarchyTooDeep {
            root: root.to_string(),
            depth: max_depth,
        });
    }

    found.extend(children.iter().map(|&class| SchemaClass::from(class)));
    for child in children {
        collect_subclasses(table, root, &child.name, depth + 1, max_depth, found)?;
    }
    Ok(())
}

/// Superclass links for every class whose superclass is not a root marker,
/// in listing order.
pub fn inheritance_relationships(table: &ClassTable, vertex_root: &str, edge_root: &str) -> Vec<Relationship> {
    table
        .classes()
        .iter()
        .filter_map(|class| {
            let parent = class.super_class.as_deref()?;
            if parent == vertex_root || parent == edge_root {
                return None;
            }
            Some(Relationship::inheritance(parent, &class.name))
        })
        .collect()
}

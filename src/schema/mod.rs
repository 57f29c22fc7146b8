//! Graph schema model: class hierarchy classification, endpoint normalization
//! and relationship deduplication.
//!
//! The persisted `scheme.json` document is the serde form of [`SchemeDocument`].

mod builder;
mod dedup;
mod hierarchy;
mod normalize;

pub use builder::{BuildOptions, SchemaBuilder};
pub use dedup::{dedup_relationships, RelationshipKey};
pub use hierarchy::{find_subclasses, inheritance_relationships, ClassTable};
pub use normalize::normalize_pair;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// `edgeName` used for superclass links.
pub const INHERITANCE_EDGE: &str = "Inheritance";

/// Stand-in for an endpoint whose class could not be determined.
pub const UNKNOWN_CLASS: &str = "Unknown";

/// One schema class as listed by the database metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDescriptor {
    pub name: String,
    #[serde(rename = "superClass", default)]
    pub super_class: Option<String>,
}

impl ClassDescriptor {
    pub fn new(name: impl Into<String>, super_class: Option<&str>) -> Self {
        Self {
            name: name.into(),
            super_class: super_class.map(str::to_string),
        }
    }
}

/// A class classified as vertex- or edge-derived.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SchemaClass {
    #[serde(rename = "className")]
    pub class_name: String,
    /// Outer `None`: no `superClass` key. `Some(None)`: an explicit `null`.
    #[serde(
        rename = "superClass",
        default,
        deserialize_with = "present",
        skip_serializing_if = "Option::is_none"
    )]
    pub super_class: Option<Option<String>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SchemaClass {
    pub fn new(class_name: impl Into<String>, super_class: Option<&str>) -> Self {
        Self {
            class_name: class_name.into(),
            super_class: super_class.map(|parent| Some(parent.to_string())),
            extra: Map::new(),
        }
    }

    pub fn super_class(&self) -> Option<&str> {
        self.super_class.as_ref().and_then(|parent| parent.as_deref())
    }
}

impl From<&ClassDescriptor> for SchemaClass {
    fn from(class: &ClassDescriptor) -> Self {
        Self::new(class.name.clone(), class.super_class.as_deref())
    }
}

/// Marks a key as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> std::result::Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    T::deserialize(deserializer).map(Some)
}

/// Entry of the `vertices`/`edges` arrays.
///
/// Older scheme files list bare class names; current ones write full objects.
/// Each entry re-serializes in the shape it was read in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ClassEntry {
    Class(SchemaClass),
    Name(String),
}

impl ClassEntry {
    pub fn name(&self) -> &str {
        match self {
            ClassEntry::Class(class) => &class.class_name,
            ClassEntry::Name(name) => name,
        }
    }
}

impl From<SchemaClass> for ClassEntry {
    fn from(class: SchemaClass) -> Self {
        ClassEntry::Class(class)
    }
}

/// A distinct (source class, target class) combination seen on an edge class.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawEndpointPair {
    pub from_class: String,
    pub to_class: String,
}

impl RawEndpointPair {
    pub fn new(from_class: impl Into<String>, to_class: impl Into<String>) -> Self {
        Self {
            from_class: from_class.into(),
            to_class: to_class.into(),
        }
    }
}

/// vis-network edge color block. Purely presentational.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColorSpec {
    pub color: String,
    pub highlight: String,
    pub hover: String,
    pub inherit: String,
    /// Kept as a raw JSON number so `1` and `1.0` survive a load/save cycle unchanged.
    pub opacity: serde_json::Number,
}

impl ColorSpec {
    fn solid(color: &str, highlight: &str) -> Self {
        Self {
            color: color.to_string(),
            highlight: highlight.to_string(),
            hover: highlight.to_string(),
            inherit: "from".to_string(),
            opacity: serde_json::Number::from(1),
        }
    }

    /// Color for superclass links.
    pub fn inheritance() -> Self {
        Self::solid("#55aaff", "#0055ff")
    }

    /// Color for links observed in edge data.
    pub fn data_link() -> Self {
        Self::solid("#848484", "#00aaff")
    }
}

/// A directed link between two classes in the schema graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Relationship {
    #[serde(rename = "edgeName")]
    pub edge_name: String,
    pub from: String,
    pub to: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<ColorSpec>,
    /// vis-network options (arrows, labels, ...) added by hand or by older tools.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Relationship {
    pub fn inheritance(super_class: &str, class_name: &str) -> Self {
        Self {
            edge_name: INHERITANCE_EDGE.to_string(),
            from: super_class.to_string(),
            to: class_name.to_string(),
            color: Some(ColorSpec::inheritance()),
            extra: Map::new(),
        }
    }

    pub fn data_link(edge_name: &str, from: impl Into<String>, to: impl Into<String>) -> Self {
        Self {
            edge_name: edge_name.to_string(),
            from: from.into(),
            to: to.into(),
            color: Some(ColorSpec::data_link()),
            extra: Map::new(),
        }
    }

    pub fn is_inheritance(&self) -> bool {
        self.edge_name == INHERITANCE_EDGE
    }
}

/// The persisted schema graph (`scheme.json`).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemeDocument {
    pub vertices: Vec<ClassEntry>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub edges: Vec<ClassEntry>,
    pub relationships: Vec<Relationship>,
    /// Top-level keys this version does not know about, carried through untouched.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SchemeDocument {
    pub fn vertex_names(&self) -> impl Iterator<Item = &str> {
        self.vertices.iter().map(ClassEntry::name)
    }

    pub fn edge_names(&self) -> impl Iterator<Item = &str> {
        self.edges.iter().map(ClassEntry::name)
    }
}

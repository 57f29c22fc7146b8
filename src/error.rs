use thiserror::Error;

/// Main error type for SchemeGraph
#[derive(Error, Debug)]
pub enum SchemeError {
    /// The database could not be reached (or refused our credentials)
    #[error("Connection error: {0}")]
    Connection(String),

    /// The class metadata listing was rejected; fatal for a whole build
    #[error("Schema query error: {0}")]
    SchemaQuery(String),

    /// A query was rejected by the database before the caller classified it
    #[error("Query error: {0}")]
    Query(String),

    /// Endpoint listing for a single edge class failed
    #[error("Endpoint query for edge class '{edge}' failed: {reason}")]
    EdgeQuery { edge: String, reason: String },

    /// A database call exceeded its deadline
    #[error("Timed out: {0}")]
    Timeout(String),

    /// Subclass walk exceeded the configured depth (cyclic or absurdly deep schema)
    #[error("Class hierarchy below '{root}' exceeds depth {depth}; is the schema cyclic?")]
    HierarchyTooDeep { root: String, depth: usize },

    /// Class name that cannot be safely placed in a query
    #[error("Invalid class name: {0:?}")]
    InvalidClassName(String),

    /// Relationship that cannot produce a deduplication key
    #[error("Invalid relationship: {0}")]
    InvalidRelationship(String),

    /// A schema build is already running
    #[error("A schema build is already in progress")]
    BuildInProgress,

    /// No schema document is held in memory yet
    #[error("Schema document not loaded")]
    NotLoaded,

    /// File system I/O errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON (de)serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Convenient Result type using SchemeError
pub type Result<T> = std::result::Result<T, SchemeError>;

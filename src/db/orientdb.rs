use crate::config::Config;
use crate::error::{Result, SchemeError};
use crate::schema::{ClassDescriptor, RawEndpointPair, UNKNOWN_CLASS};
use async_trait::async_trait;
use regex::Regex;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;
use std::time::Duration;
use url::Url;

use super::SchemaSource;

const CLASSES_QUERY: &str =
    "SELECT name, superClass, superClasses FROM (SELECT expand(classes) FROM metadata:schema) ORDER BY name";

/// Request body for the REST command endpoint
#[derive(Serialize)]
struct CommandRequest<'a> {
    command: &'a str,
}

/// Response body from the REST command endpoint
#[derive(Deserialize)]
struct CommandResponse<T> {
    #[serde(default = "Vec::new")]
    result: Vec<T>,
}

/// Error body OrientDB sends with non-2xx responses
#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<ErrorEntry>,
}

#[derive(Deserialize)]
struct ErrorEntry {
    #[serde(default)]
    content: String,
}

/// Row of the metadata:schema listing
#[derive(Deserialize)]
struct ClassRow {
    name: String,
    #[serde(rename = "superClass", default)]
    super_class: Option<String>,
    #[serde(rename = "superClasses", default)]
    super_classes: Option<Vec<String>>,
}

impl From<ClassRow> for ClassDescriptor {
    fn from(row: ClassRow) -> Self {
        // Multiple inheritance servers may only fill superClasses
        let super_class = row
            .super_class
            .or_else(|| row.super_classes.and_then(|parents| parents.into_iter().next()));
        ClassDescriptor {
            name: row.name,
            super_class,
        }
    }
}

/// Row of the distinct endpoint listing
#[derive(Deserialize)]
struct EndpointRow {
    #[serde(rename = "fromClass", default)]
    from_class: Option<String>,
    #[serde(rename = "toClass", default)]
    to_class: Option<String>,
}

impl From<EndpointRow> for RawEndpointPair {
    fn from(row: EndpointRow) -> Self {
        RawEndpointPair {
            from_class: row.from_class.unwrap_or_else(|| UNKNOWN_CLASS.to_string()),
            to_class: row.to_class.unwrap_or_else(|| UNKNOWN_CLASS.to_string()),
        }
    }
}

/// Reject names that cannot be placed inside a backtick-quoted identifier.
pub fn validate_class_name(name: &str) -> Result<()> {
    static VALID: OnceLock<Regex> = OnceLock::new();
    let valid = VALID.get_or_init(|| Regex::new(r"^[^`\p{Cc}]+$").expect("Invalid regex pattern"));
    if valid.is_match(name) {
        Ok(())
    } else {
        Err(SchemeError::InvalidClassName(name.to_string()))
    }
}

/// OrientDB client over the HTTP REST API
///
/// Each call is a stateless authenticated request, so there is no session to
/// keep alive. Requests are bounded by the client timeout.
pub struct OrientDbClient {
    client: Client,
    base_url: Url,
    database: String,
    user: String,
    password: Option<String>,
}

impl OrientDbClient {
    /// Create a new client
    ///
    /// # Arguments
    ///
    /// * `base_url` - Server address, e.g. `http://localhost:2480`
    /// * `database` - Database name
    /// * `user` / `password` - Basic auth credentials
    /// * `timeout` - Per-request deadline
    pub fn new(
        base_url: Url,
        database: impl Into<String>,
        user: impl Into<String>,
        password: Option<String>,
        timeout: Duration,
    ) -> Result<Self> {
        if base_url.cannot_be_a_base() {
            return Err(SchemeError::Config(format!("Invalid database address: {}", base_url)));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SchemeError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url,
            database: database.into(),
            user: user.into(),
            password,
        })
    }

    /// Build a client from `[database]` settings.
    ///
    /// A missing password is logged rather than fatal: the server may still be
    /// able to serve a persisted scheme, and the database will reject the
    /// request if it really needs one.
    pub fn from_config(config: &Config) -> Result<Self> {
        let base_url = config
            .database_url()
            .map_err(|e| SchemeError::Config(e.to_string()))?;
        let password = match config.database_password() {
            Ok(password) => Some(password),
            Err(e) => {
                log::warn!("{}", e);
                None
            }
        };

        Self::new(
            base_url,
            config.database.database.clone(),
            config.database.user.clone(),
            password,
            config.query_timeout(),
        )
    }

    pub fn database(&self) -> &str {
        &self.database
    }

    fn url(&self, segments: &[&str]) -> Result<Url> {
        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| SchemeError::Config(format!("Invalid database address: {}", self.base_url)))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    /// Check that the server is reachable and accepts our credentials
    pub async fn ping(&self) -> Result<()> {
        let url = self.url(&["connect", &self.database])?;
        let response = self
            .client
            .get(url)
            .basic_auth(&self.user, self.password.as_deref())
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if is_auth_failure(status) {
            return Err(auth_error(status));
        }
        if !status.is_success() {
            return Err(SchemeError::Connection(format!(
                "database {} not available ({})",
                self.database, status
            )));
        }
        Ok(())
    }

    /// Run one SQL command and decode the `result` rows
    async fn command<T: DeserializeOwned>(&self, sql: &str) -> Result<Vec<T>> {
        let url = self.url(&["command", &self.database, "sql"])?;
        log::debug!("OrientDB command: {}", sql);

        let response = self
            .client
            .post(url)
            .basic_auth(&self.user, self.password.as_deref())
            .json(&CommandRequest { command: sql })
            .send()
            .await
            .map_err(classify_transport_error)?;

        let status = response.status();
        if is_auth_failure(status) {
            return Err(auth_error(status));
        }

        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unable to read error response".to_string());
            return Err(SchemeError::Query(format!("{}: {}", status, error_reason(&body))));
        }

        let body: CommandResponse<T> = response
            .json()
            .await
            .map_err(|e| SchemeError::Query(format!("Failed to parse response: {}", e)))?;

        Ok(body.result)
    }
}

#[async_trait]
impl SchemaSource for OrientDbClient {
    async fn list_classes(&self) -> Result<Vec<ClassDescriptor>> {
        let rows: Vec<ClassRow> = self.command(CLASSES_QUERY).await.map_err(|e| match e {
            SchemeError::Query(reason) => SchemeError::SchemaQuery(reason),
            other => other,
        })?;
        Ok(rows.into_iter().map(ClassDescriptor::from).collect())
    }

    async fn list_distinct_endpoints(&self, edge_class: &str) -> Result<Vec<RawEndpointPair>> {
        validate_class_name(edge_class)?;
        let sql = format!(
            "SELECT DISTINCT out.@class AS fromClass, in.@class AS toClass FROM `{}`",
            edge_class
        );

        let rows: Vec<EndpointRow> = self.command(&sql).await.map_err(|e| match e {
            SchemeError::Query(reason) => SchemeError::EdgeQuery {
                edge: edge_class.to_string(),
                reason,
            },
            other => other,
        })?;
        Ok(rows.into_iter().map(RawEndpointPair::from).collect())
    }
}

fn classify_transport_error(e: reqwest::Error) -> SchemeError {
    if e.is_timeout() {
        SchemeError::Timeout(format!("database request: {}", e))
    } else {
        SchemeError::Connection(format!("Network error: {}", e))
    }
}

fn is_auth_failure(status: StatusCode) -> bool {
    status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN
}

fn auth_error(status: StatusCode) -> SchemeError {
    SchemeError::Connection(format!("authentication rejected ({})", status))
}

/// Pull the human-readable message out of an OrientDB error body.
fn error_reason(body: &str) -> String {
    serde_json::from_str::<ErrorResponse>(body)
        .ok()
        .and_then(|parsed| parsed.errors.into_iter().next())
        .map(|entry| entry.content)
        .filter(|content| !content.is_empty())
        .unwrap_or_else(|| body.trim().to_string())
}

pub mod config;
pub mod db;
pub mod error;
pub mod schema;
pub mod server;
pub mod store;

pub use config::Config;
pub use error::{Result, SchemeError};
pub use schema::{Relationship, SchemeDocument};
pub use store::SchemeStore;

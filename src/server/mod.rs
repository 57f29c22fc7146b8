pub mod http;
pub mod service;

pub use http::{create_router, run};
pub use service::SchemeService;

//! axum glue: request extraction, error responses, layout endpoints and the
//! HTTP middleware stack.

pub mod config;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod response;

pub use config::HttpConfig;
pub use extract::GridParams;
pub use handlers::layout_routes;
pub use middleware::build_http_layers;

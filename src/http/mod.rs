//! The request/response front end: a JSON API over HTTP built on axum.

pub mod error;
pub mod handlers;
pub mod routes;
pub mod server;
pub mod state;

pub use routes::router;
pub use server::HttpServer;
pub use state::AppState;

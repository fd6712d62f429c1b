//! JSON HTTP API over the analysis session, catalog and translation service.

mod handlers;
mod models;
mod state;

pub use handlers::run_server;

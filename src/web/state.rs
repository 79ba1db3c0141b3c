//! # Web API Application State
//!
//! Shared state handed to every handler: the signature flow engine, the
//! optional database connection used by the health probe, and the web
//! configuration.

use crate::config::WebConfig;
use crate::database::DatabaseConnection;
use crate::flow::SignatureFlowEngine;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct AppState {
    pub engine: Arc<SignatureFlowEngine>,
    /// Absent when the server runs on the in-memory store
    pub database: Option<DatabaseConnection>,
    pub config: Arc<WebConfig>,
    pub environment: String,
}

impl AppState {
    pub fn new(engine: SignatureFlowEngine, config: WebConfig, environment: impl Into<String>) -> Self {
        Self {
            engine: Arc::new(engine),
            database: None,
            config: Arc::new(config),
            environment: environment.into(),
        }
    }

    pub fn with_database(mut self, database: DatabaseConnection) -> Self {
        self.database = Some(database);
        self
    }
}

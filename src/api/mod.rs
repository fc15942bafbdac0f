//! HTTP API for the browser front end.
//!
//! Exposes the studio's workflows as JSON endpoints.

use anyhow::Result;
use std::sync::Arc;
use tracing::info;

use crate::config::Config;
use crate::studio::Studio;

pub mod handlers;
pub mod models;
pub mod server;

/// API server bound to one studio session
pub struct ApiServer {
    studio: Arc<Studio>,
    config: Arc<Config>,
}

impl ApiServer {
    pub fn new(studio: Arc<Studio>, config: Arc<Config>) -> Self {
        Self { studio, config }
    }

    /// Run the API server until it stops
    pub async fn start(self) -> Result<()> {
        info!(
            "🚀 Starting API server on {}:{}",
            self.config.server.host, self.config.server.port
        );
        server::start_http_server(self.studio, self.config).await
    }
}

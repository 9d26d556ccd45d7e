//! Application state.

use std::sync::Arc;

use sitereel_engine::{
    EngineConfig, GeminiSummarizer, HttpRendererProvider, Orchestrator, ReplicateSynthesizer,
};

use crate::config::ApiConfig;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: ApiConfig,
    pub orchestrator: Arc<Orchestrator>,
}

impl AppState {
    /// Create state with the production collaborators.
    pub fn new(config: ApiConfig, engine_config: EngineConfig) -> Self {
        let renderers = Arc::new(HttpRendererProvider::new(engine_config.fetch_timeout));
        let orchestrator = Orchestrator::new(
            engine_config,
            renderers,
            Arc::new(GeminiSummarizer::from_env()),
            Arc::new(ReplicateSynthesizer::from_env()),
        );
        Self {
            config,
            orchestrator: Arc::new(orchestrator),
        }
    }

    /// Create state around an existing orchestrator (used by tests).
    pub fn with_orchestrator(config: ApiConfig, orchestrator: Arc<Orchestrator>) -> Self {
        Self {
            config,
            orchestrator,
        }
    }
}

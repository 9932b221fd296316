pub mod api;
pub mod config;
pub mod logic;
pub mod model;
pub mod seed;
pub mod store;

// Export API types
pub use api::handlers;
pub use api::routes;

// Export logic types
pub use logic::{ApplyReport, CommitStatus, MeasureUpdatePipeline};

// Export all model types
pub use model::*;

// Export store types
pub use store::{MemoryModelServer, ModelServer, ModelSession};

/// Build the HTTP application around an engine
pub fn app<M: ModelServer + 'static>(server: M, connection_string: impl Into<String>) -> axum::Router {
    let state = std::sync::Arc::new(api::handlers::ServiceState::new(server, connection_string));
    api::routes::create_router().with_state(state)
}

/// Build the in-memory engine described by the configuration
pub fn build_engine(config: &config::AppConfig) -> anyhow::Result<MemoryModelServer> {
    let server = MemoryModelServer::new();

    if let Some(path) = &config.engine.model_path {
        for model in seed::load_models_from_file(path)? {
            log::info!("Loaded model '{}' from {}", model.name, path);
            server.add_model(model);
        }
    }

    if std::env::var("LOAD_SEED_DATA").unwrap_or_default() == "true" {
        seed::load_seed_data(&server);
    }

    Ok(server)
}

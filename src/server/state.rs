//! Application state management

use std::sync::Arc;
use tracing::{info, warn};

use crate::error::Result;
use crate::model::DelayModel;

use super::ServerConfig;

/// Application state shared across handlers
///
/// The model is built once before serving and only read afterwards.
pub struct AppState {
    pub config: ServerConfig,
    pub model: Arc<DelayModel>,
    pub started_at: chrono::DateTime<chrono::Utc>,
}

impl AppState {
    pub fn new(config: ServerConfig, model: DelayModel) -> Self {
        Self {
            config,
            model: Arc::new(model),
            started_at: chrono::Utc::now(),
        }
    }

    /// Build state from the configured model file, or start cold without one
    pub fn from_config(config: ServerConfig) -> Result<Self> {
        let model = match &config.model_path {
            Some(path) => {
                let model = DelayModel::load(path)?;
                info!(
                    path = %path.display(),
                    trained = model.is_trained(),
                    features = model.schema().len(),
                    "Loaded delay model"
                );
                model
            }
            None => {
                warn!("No MODEL_PATH configured, serving untrained model (all predictions 0)");
                DelayModel::new()
            }
        };
        Ok(Self::new(config, model))
    }
}

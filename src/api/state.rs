use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::AppConfig;
use crate::pipeline::EngineEvent;
use crate::storage::JsonlStore;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<JsonlStore>,
    /// Trigger queue feeding the pipeline worker
    pub events: mpsc::Sender<EngineEvent>,
    pub config: Arc<AppConfig>,
}

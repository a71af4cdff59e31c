use metrics_exporter_prometheus::PrometheusHandle;
use sourcer::config::DataConfig;
use sourcer::error::AppError;
use sourcer::workflows::estimation::{EstimationEngine, LookupTables};
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
    pub(crate) engine: Arc<EstimationEngine>,
}

/// Builds the engine from `SOURCER_DATA_DIR` when set, otherwise from the bundled tables.
pub(crate) fn load_engine(data: &DataConfig) -> Result<EstimationEngine, AppError> {
    let tables = match &data.dir {
        Some(dir) => {
            info!(dir = %dir.display(), "loading lookup tables from data directory");
            LookupTables::from_dir(dir)?
        }
        None => LookupTables::bundled()?,
    };
    Ok(EstimationEngine::new(tables))
}

use std::sync::Arc;

use tracing::{error, info};

use taskbot_core::{
    config::Config, export::CsvExporter, logging, logging::component_span, store::TaskStore,
};

#[tokio::main]
async fn main() -> Result<(), taskbot_core::Error> {
    let cfg = Arc::new(Config::load()?);
    logging::init("taskbot", &cfg.log_level)?;
    info!("starting taskbot");

    let store = Arc::new(TaskStore::new(
        cfg.database_path.clone(),
        component_span("store"),
    ));
    store.connect().await?;
    store.create_schema().await?;

    let exporter = Arc::new(CsvExporter::new(
        cfg.export_dir.clone(),
        component_span("csv_export"),
    ));

    let result = tokio::select! {
        res = taskbot_telegram::router::run_polling(cfg.clone(), store.clone(), exporter) => {
            res.map_err(|e| taskbot_core::Error::External(format!("telegram bot failed: {e}")))
        }
        _ = tokio::signal::ctrl_c() => {
            info!("received shutdown signal");
            Ok(())
        }
    };

    if let Err(e) = store.close().await {
        error!(error = %e, "failed to close database");
    }
    info!("taskbot stopped");

    result
}

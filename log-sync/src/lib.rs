pub mod api;
pub mod batch;
pub mod config;
pub mod entry;
pub mod errors;
pub mod metrics_defs;
pub mod sheets;
pub mod timestamp;

#[cfg(test)]
mod testutils;

use api::AppState;
use config::Listener;
use sheets::{GoogleSheets, SheetAppender};
use shared::admin_service::AdminService;
use shared::http::run_http_service;
use std::sync::Arc;
use tokio::net::TcpListener;

#[derive(thiserror::Error, Debug)]
pub enum LogSyncError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Config(#[from] config::ValidationError),
    #[error("spreadsheet client error: {0}")]
    Sheets(#[from] sheets::SheetsError),
}

pub async fn run(config: config::Config) -> Result<(), LogSyncError> {
    config.validate()?;
    shared::metrics_defs::describe_all(metrics_defs::ALL_METRICS);

    let sheets = Arc::new(GoogleSheets::new(&config.spreadsheet)?);

    // Requests retry the load on their own, this only primes `/ready`.
    if let Err(e) = sheets.connect().await {
        tracing::error!(error = %e, "Error building Google Sheets client");
    }

    let api_task = serve_api(&config.listener, AppState::new(sheets.clone()));

    match &config.admin_listener {
        Some(admin_listener) => {
            let admin_service = AdminService::new(move || sheets.is_ready());
            let admin_task = run_http_service::<_, _, LogSyncError>(
                &admin_listener.host,
                admin_listener.port,
                admin_service,
            );
            tracing::info!(
                host = %admin_listener.host,
                port = admin_listener.port,
                "Admin listener started"
            );
            tokio::try_join!(api_task, admin_task)?;
        }
        None => api_task.await?,
    }

    Ok(())
}

async fn serve_api(listener: &Listener, state: AppState) -> Result<(), LogSyncError> {
    let addr = format!("{}:{}", listener.host, listener.port);
    let tcp_listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, "log-sync listening");

    axum::serve(tcp_listener, api::router(state)).await?;
    Ok(())
}

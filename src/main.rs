use anyhow::Context;
use dotenv::dotenv;
use folder_todo::app_env::AppConfig;
use folder_todo::{SharedData, app_env, db, logging, persistence, routes};
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> Result<(), anyhow::Error> {
    dotenv().ok();
    let config = AppConfig::from_env()?;

    let otel_exporters = match &config.otel {
        Some(endpoints) => Some(logging::init_exporters(endpoints)?),
        None => None,
    };
    logging::setup_logging_and_tracing(logging::init_env_filter()?, otel_exporters);

    if config.ephemeral_session_key {
        warn!(
            "{} is not set, generated a random session key. Sessions will not survive a restart.",
            app_env::SESSION_SECRET
        );
    }

    let db_pool = db::connect_sqlx(&config.db_url).await?;
    let shared_data = Arc::new(SharedData {
        ext_cxn: persistence::ExternalConnectivity::new(db_pool),
    });
    let router = routes::build_router(shared_data, config.session_key);

    let listener = tokio::net::TcpListener::bind(config.listen_addr)
        .await
        .with_context(|| format!("binding to {}", config.listen_addr))?;
    info!("Starting server on {}", config.listen_addr);
    axum::serve(listener, router).await.context("serving HTTP requests")?;

    Ok(())
}

use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use personalization_service::error::json_error_handler;
use personalization_service::{configure, Config, PersonalizationState};

/// Largest accepted JSON body (item lists can be long)
const MAX_JSON_PAYLOAD_BYTES: usize = 1024 * 1024;

#[actix_web::main]
async fn main() -> Result<()> {
    // Load configuration before tracing so LOG_FORMAT can pick the layer
    let config = Config::from_env().context("Failed to load configuration")?;

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,personalization_service=debug".into());
    if config.log_format.eq_ignore_ascii_case("json") {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }

    info!(
        "Starting personalization-service v{}",
        env!("CARGO_PKG_VERSION")
    );

    config
        .validate()
        .context("Configuration validation failed")?;
    info!(
        cookie_name = %config.cookie_name,
        cookie_expiry_days = config.cookie_expiry_days,
        max_cookie_bytes = config.max_cookie_bytes,
        "Configuration loaded and validated"
    );

    let http_host = config.http_host.clone();
    let http_port = config.http_port;
    let state = web::Data::new(PersonalizationState::new(config));

    info!("Starting HTTP server on {}:{}", http_host, http_port);

    HttpServer::new(move || {
        App::new()
            .wrap(tracing_actix_web::TracingLogger::default())
            .app_data(state.clone())
            .app_data(
                web::JsonConfig::default()
                    .limit(MAX_JSON_PAYLOAD_BYTES)
                    .error_handler(json_error_handler),
            )
            .configure(configure)
    })
    .bind((http_host.as_str(), http_port))
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error")
}

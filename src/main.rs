use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::Context;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::EnvFilter;

use bookwell::config::AppConfig;
use bookwell::db;
use bookwell::handlers;
use bookwell::services::messaging::logging::LogSmsProvider;
use bookwell::services::messaging::twilio::TwilioSmsProvider;
use bookwell::services::messaging::MessagingProvider;
use bookwell::services::sweeper;
use bookwell::state::AppState;

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "failed to register SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };
    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {}
        _ = terminate => {}
    }
    tracing::info!("shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let config = AppConfig::from_env();
    if config.admin_password == "changeme" {
        tracing::warn!("ADMIN_PASSWORD is not set, using the default password");
    }

    let conn = db::init_db(&config.database_url)
        .with_context(|| format!("failed to open database {}", config.database_url))?;

    let messaging: Box<dyn MessagingProvider> = if config.twilio_configured() {
        tracing::info!("sending SMS via Twilio (from {})", config.twilio_phone_number);
        Box::new(TwilioSmsProvider::from_config(&config)?)
    } else {
        tracing::info!("Twilio not configured, SMS will be logged only");
        Box::new(LogSmsProvider)
    };

    let db = Arc::new(Mutex::new(conn));
    tokio::spawn(sweeper::run_sweeper(
        Arc::clone(&db),
        Duration::from_secs(config.sweep_interval_secs.max(1)),
    ));

    let state = Arc::new(AppState {
        db,
        config: config.clone(),
        messaging,
    });

    let mut app = handlers::router(state).layer(TraceLayer::new_for_http());
    if let Some(origin) = &config.cors_allowed_origin {
        let origin: HeaderValue = origin
            .parse()
            .with_context(|| format!("invalid CORS_ALLOWED_ORIGIN {origin}"))?;
        let cors = CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([CONTENT_TYPE, AUTHORIZATION])
            .allow_credentials(true);
        app = app.layer(cors);
    }

    let addr = format!("0.0.0.0:{}", config.port);
    tracing::info!("starting server on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

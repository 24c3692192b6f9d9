use actix_cors::Cors;
use actix_web::{web, App, HttpServer};
use clap::Parser;
use std::sync::Arc;
use tracing_subscriber::prelude::*;

use roster_api::config::ApiConfig;
use roster_api::{handlers, helpers, ListManager};

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(long)]
    log_file_path: Option<String>,

    /// Config file to use instead of the platform default
    #[arg(long)]
    config: Option<std::path::PathBuf>,
}

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    let args = Args::parse();

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    if let Some(log_path) = args.log_file_path {
        let log_path = std::path::Path::new(&log_path);
        let file_appender = tracing_appender::rolling::never(
            log_path.parent().unwrap_or(std::path::Path::new(".")),
            log_path
                .file_name()
                .unwrap_or(std::ffi::OsStr::new("roster-api.log")),
        );
        let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
        std::mem::forget(guard);

        tracing_subscriber::registry()
            .with(env_filter.clone())
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(true)
                    .with_writer(std::io::stdout),
            )
            .with(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_writer(non_blocking),
            )
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(env_filter).init();
    }

    let loaded = match &args.config {
        Some(path) => ApiConfig::load_from(path),
        None => ApiConfig::load(),
    };
    let (config, config_path) = loaded.map_err(std::io::Error::other)?;
    tracing::info!("Loaded config from {}", config_path.display());

    let db = helpers::database::initialize_database(&config).map_err(std::io::Error::other)?;

    let manager = Arc::new(ListManager::new(db.async_connection.clone()));

    let (host, port) = config.server_address();
    let max_file_size = config.max_file_size_bytes();

    tracing::info!("Server will listen on {}:{}", host, port);

    let server = HttpServer::new(move || {
        let cors = if let Some(cors_config) = &config.cors {
            let mut cors_builder = Cors::default();
            for origin in &cors_config.allowed_origins {
                cors_builder = cors_builder.allowed_origin(origin);
            }
            cors_builder
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type", "X-User-Id"])
                .max_age(3600)
        } else {
            Cors::default()
                .allow_any_origin()
                .allowed_methods(vec!["GET", "POST", "PUT", "DELETE", "OPTIONS"])
                .allowed_headers(vec!["Authorization", "Accept", "Content-Type", "X-User-Id"])
                .max_age(3600)
        };

        App::new()
            .wrap(cors)
            .app_data(web::PayloadConfig::new(max_file_size))
            .app_data(web::Data::new(db.clone()))
            .app_data(web::Data::new(manager.clone()))
            .configure(handlers::configure)
    })
    .bind((host.as_str(), port))?
    .run();

    let handle = server.handle();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }

        tracing::info!("Ctrl+C received, shutting down...");
        handle.stop(true).await;
    });

    server.await
}

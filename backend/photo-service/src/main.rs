use actix_web::{web, App, HttpServer};
use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;
use tracing_actix_web::TracingLogger;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use photo_service::config::StorageBackend;
use photo_service::db::{create_pool, run_migrations, MemoryStore, PgStore};
use photo_service::handlers;
use photo_service::media::{LocalMediaStore, MediaStore};
use photo_service::services::UploadLimits;
use photo_service::{AppState, Config};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "info,actix_web=info,sqlx=warn".into());

    let json = std::env::var("LOG_FORMAT")
        .map(|v| v.eq_ignore_ascii_case("json"))
        .unwrap_or(false);

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer().json().with_target(false))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(tracing_subscriber::fmt::layer())
            .init();
    }
}

#[actix_web::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = Config::from_env().context("Failed to load configuration")?;
    info!(
        env = %config.app.env,
        port = config.app.port,
        backend = ?config.storage.backend,
        "Starting photo-service"
    );

    let media: Arc<dyn MediaStore> = Arc::new(
        LocalMediaStore::new(&config.media)
            .await
            .context("Failed to prepare upload directory")?,
    );

    let state = match config.storage.backend {
        StorageBackend::Postgres => {
            let pool = create_pool(&config.database)
                .await
                .context("Failed to connect to database")?;
            run_migrations(&pool)
                .await
                .context("Failed to run database migrations")?;
            info!("Database ready");

            AppState::new(
                Arc::new(PgStore::new(pool)),
                media,
                config.session.clone(),
                UploadLimits::from(&config.media),
            )
        }
        StorageBackend::Memory => {
            info!("Using in-memory store; data is lost on restart");
            AppState::new(
                Arc::new(MemoryStore::new()),
                media,
                config.session.clone(),
                UploadLimits::from(&config.media),
            )
        }
    };

    let state = web::Data::new(state);
    let bind_addr = format!("{}:{}", config.app.host, config.app.port);

    info!(address = %bind_addr, "HTTP server listening");

    HttpServer::new(move || {
        App::new()
            .app_data(state.clone())
            .wrap(TracingLogger::default())
            .configure(handlers::configure)
    })
    .bind(&bind_addr)
    .context("Failed to bind HTTP server")?
    .run()
    .await
    .context("HTTP server error")?;

    info!("photo-service stopped");
    Ok(())
}

//! Irrigation Advisory - Backend Server

use std::{net::SocketAddr, sync::Arc, time::Duration};

use advisory_backend::{
    create_app,
    services::{AdvisoryPipeline, MemoryRecordSink, PgRecordSink, RecordSink},
    AppState, Config,
};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                "advisory_server=debug,advisory_backend=debug,tower_http=debug,sqlx=warn".into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    dotenvy::dotenv().ok();
    let config = Config::load()?;

    tracing::info!("Starting Irrigation Advisory Server");
    tracing::info!("Environment: {}", config.environment);

    let db_pool = match &config.database.url {
        Some(url) => {
            tracing::info!("Connecting to database...");
            let pool = PgPoolOptions::new()
                .max_connections(config.database.max_connections)
                .min_connections(config.database.min_connections)
                .acquire_timeout(Duration::from_secs(30))
                .connect(url)
                .await?;
            tracing::info!("Database connection established");

            // Run migrations in development
            if config.environment == "development" {
                tracing::info!("Running database migrations...");
                sqlx::migrate!("./migrations").run(&pool).await?;
                tracing::info!("Migrations completed");
            }
            Some(pool)
        }
        None => {
            tracing::warn!("No database configured; only the most recent advisory records are kept in memory");
            None
        }
    };

    let sink: Arc<dyn RecordSink> = match &db_pool {
        Some(pool) => Arc::new(PgRecordSink::new(pool.clone())),
        None => Arc::new(MemoryRecordSink::new()),
    };
    let pipeline = Arc::new(AdvisoryPipeline::from_config(&config)?.with_sink(sink));

    // Periodic cache housekeeping
    let purge_interval = config.pipeline.cache_purge_interval().max(Duration::from_secs(1));
    let purge_pipeline = Arc::clone(&pipeline);
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(purge_interval);
        ticker.tick().await;
        loop {
            ticker.tick().await;
            let removed = purge_pipeline.purge_caches().await;
            if removed > 0 {
                tracing::debug!(removed, "Purged expired cache entries");
            }
        }
    });

    // Create application state
    let state = AppState {
        pipeline,
        db: db_pool,
        config: Arc::new(config.clone()),
    };

    // Build application
    let app = create_app(state);

    // Start server
    let ip: std::net::IpAddr = config.server.host.parse()?;
    let addr = SocketAddr::from((ip, config.server.port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

mod analysis;
mod config;
mod db;
mod editor;
mod errors;
mod export;
mod models;
mod render;
mod routes;
mod sections;
mod state;
mod store;

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use aws_config::Region;
use aws_sdk_s3::config::Credentials;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::Config;
use crate::db::create_pool;
use crate::editor::SessionRegistry;
use crate::export::{HttpPdfRenderer, S3Archive};
use crate::render::{ResumeRenderer, TemplateCatalog};
use crate::routes::build_router;
use crate::state::AppState;
use crate::store::{MemoryResumeStore, PgResumeStore, ResumeStore};

#[tokio::main]
async fn main() -> Result<()> {
    // Load configuration first (fails on missing required env vars)
    let config = Config::from_env()?;

    // Initialize structured logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| {
            EnvFilter::new(format!(
                "{}={}",
                env!("CARGO_PKG_NAME").replace('-', "_"),
                &config.rust_log
            ))
        }))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Vitae API v{}", env!("CARGO_PKG_VERSION"));

    // Initialize PostgreSQL, or keep resumes in memory for local runs
    let store: Arc<dyn ResumeStore> = match &config.database_url {
        Some(url) => {
            let db = create_pool(url).await?;
            sqlx::migrate!("./migrations").run(&db).await?;
            info!("Database migrations applied");
            Arc::new(PgResumeStore::new(db))
        }
        None => {
            warn!("DATABASE_URL not set, resumes are kept in memory only");
            Arc::new(MemoryResumeStore::new())
        }
    };

    // Initialize S3 / MinIO
    let s3 = build_s3_client(&config).await;
    info!("S3 client initialized");

    // Templates are compiled once; a broken template fails startup
    let renderer = ResumeRenderer::new()?;
    let catalog = TemplateCatalog::builtin();
    info!(
        "Loaded {} templates, {} section variants",
        catalog.all().len(),
        renderer.variants().all().count()
    );

    let pdf = HttpPdfRenderer::new(config.pdf_renderer_url.clone())?;
    info!("PDF renderer at {}", config.pdf_renderer_url);

    let sessions = Arc::new(SessionRegistry::new());
    let idle = Duration::from_secs(config.session_idle_secs);
    Arc::clone(&sessions).spawn_eviction(idle);
    info!("Idle edit sessions expire after {}s", config.session_idle_secs);

    // Build app state
    let state = AppState {
        store,
        sessions,
        renderer: Arc::new(renderer),
        catalog: Arc::new(catalog),
        pdf: Arc::new(pdf),
        archive: Arc::new(S3Archive::new(s3, config.s3_bucket.clone())),
    };

    // Build router
    let app = build_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive()); // TODO: restrict origins once the editor host is fixed

    let addr: SocketAddr = format!("0.0.0.0:{}", config.port).parse()?;
    info!("Listening on {addr}");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Constructs an S3 client configured for MinIO (local) or AWS (production).
async fn build_s3_client(config: &Config) -> aws_sdk_s3::Client {
    let credentials = Credentials::new(
        &config.aws_access_key_id,
        &config.aws_secret_access_key,
        None,
        None,
        "vitae-static",
    );

    let s3_config = aws_config::defaults(aws_config::BehaviorVersion::latest())
        .region(Region::new("us-east-1"))
        .credentials_provider(credentials)
        .endpoint_url(&config.s3_endpoint)
        .load()
        .await;

    aws_sdk_s3::Client::new(&s3_config)
}

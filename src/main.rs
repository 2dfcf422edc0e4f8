use std::sync::Arc;

use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod api;
mod config;
mod error;
mod models;
mod services;
mod storage;

use config::{Config, RelayBackend};
use services::{
    accounts::AccountsService,
    clock::{Clock, SystemClock},
    mailer::{LogMailer, Mailer},
    presence::PresenceTracker,
    rfid_relay::RfidRelay,
};
use storage::{
    devices::PgDeviceStore,
    mailbox::{MailboxStore, MemoryMailbox},
    minio::MinioClient,
    redis::{RedisClient, RedisMailbox},
};

#[derive(Clone)]
pub struct AppState {
    pub db: sqlx::PgPool,
    pub minio: MinioClient,
    pub config: Arc<Config>,
    pub clock: Arc<dyn Clock>,
    pub mailer: Arc<dyn Mailer>,
    pub presence: PresenceTracker,
    pub rfid: RfidRelay,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "attendance_backend=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = Config::load();
    tracing::info!("Starting server in {} mode", config.server.environment);

    // Initialize database pool
    let db = PgPoolOptions::new()
        .max_connections(config.database.max_connections)
        .connect(&config.database_url())
        .await?;
    tracing::info!("Connected to PostgreSQL");

    // Run migrations
    sqlx::migrate!("./migrations").run(&db).await?;
    tracing::info!("Database migrations completed");

    // Live RFID mailbox
    let mailbox: Arc<dyn MailboxStore> = match config.relay.backend {
        RelayBackend::Memory => Arc::new(MemoryMailbox::new()),
        RelayBackend::Redis => {
            let redis = RedisClient::new(&config.redis_url()).await?;
            tracing::info!("Connected to Redis; live RFID mailbox is shared");
            Arc::new(RedisMailbox::new(redis))
        }
    };

    // Initialize MinIO
    let minio = MinioClient::new(&config.minio);
    minio.ensure_buckets().await?;
    tracing::info!("Connected to MinIO");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let mailer: Arc<dyn Mailer> = Arc::new(LogMailer::new(
        config.mail.from.clone(),
        config.is_development(),
    ));

    AccountsService::new(db.clone(), mailer.clone())
        .ensure_default_admin(&config.seed.admin_username, &config.seed.admin_password)
        .await?;

    // Create app state
    let state = AppState {
        presence: PresenceTracker::new(
            Arc::new(PgDeviceStore::new(db.clone())),
            clock.clone(),
            config.presence.stale_window,
        ),
        rfid: RfidRelay::new(mailbox, clock.clone(), config.relay.active_window),
        db,
        minio,
        config: Arc::new(config.clone()),
        clock,
        mailer,
    };

    let app = api::router::app(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

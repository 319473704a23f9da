// src/main.rs

use dotenvy::dotenv;
use estatistico::config::Config;
use estatistico::models::user::ROLE_TEACHER;
use estatistico::routes;
use estatistico::state::AppState;
use estatistico::utils::hash::hash_password;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::net::SocketAddr;
use std::time::Duration;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

const DB_CONNECT_RETRIES: u32 = 5;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load .env file (if present)
    dotenv().ok();

    let config = Config::from_env().map_err(|e| format!("Invalid configuration: {}", e))?;

    let file_appender = tracing_appender::rolling::daily(&config.log_dir, "estatistico.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    tracing::info!(
        "Level thresholds: {:?}",
        config
            .level_table
            .tiers()
            .iter()
            .map(|tier| tier.min_xp)
            .collect::<Vec<_>>()
    );

    tracing::info!(
        "Answer writes retry up to {} times ({:?} total backoff)",
        config.write_retry.max_attempts,
        config.write_retry.total_backoff()
    );

    let pool = connect_with_retry(&config.database_url).await?;
    tracing::info!("Database connected...");

    tracing::info!("Running migrations...");
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Migrations applied successfully.");

    if let Err(e) = seed_teacher_account(&pool, &config).await {
        tracing::error!("Failed to seed teacher account: {:?}", e);
    }

    let port = config.port;
    let app = routes::create_router(AppState::new(pool, config));

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}

/// Waits for the database to come up, as it often starts alongside the app.
async fn connect_with_retry(database_url: &str) -> Result<PgPool, sqlx::Error> {
    let mut retry_count = 0;
    loop {
        match PgPoolOptions::new()
            .max_connections(5)
            .acquire_timeout(Duration::from_secs(3))
            .connect(database_url)
            .await
        {
            Ok(pool) => return Ok(pool),
            Err(e) if retry_count < DB_CONNECT_RETRIES => {
                retry_count += 1;
                tracing::warn!(
                    "Database not ready ({}), retrying in 2s... (Attempt {})",
                    e,
                    retry_count
                );
                tokio::time::sleep(Duration::from_secs(2)).await;
            }
            Err(e) => {
                tracing::error!(
                    "Failed to connect to database after {} retries",
                    DB_CONNECT_RETRIES
                );
                return Err(e);
            }
        }
    }
}

async fn seed_teacher_account(
    pool: &PgPool,
    config: &Config,
) -> Result<(), Box<dyn std::error::Error>> {
    let (Some(username), Some(password)) = (
        &config.seed_teacher_username,
        &config.seed_teacher_password,
    ) else {
        return Ok(());
    };

    let exists: Option<i64> = sqlx::query_scalar("SELECT id FROM users WHERE username = $1")
        .bind(username)
        .fetch_optional(pool)
        .await?;

    if exists.is_none() {
        tracing::info!("Seeding teacher account: {}", username);
        let hashed_password = hash_password(password)?;

        sqlx::query("INSERT INTO users (username, password, role) VALUES ($1, $2, $3)")
            .bind(username)
            .bind(hashed_password)
            .bind(ROLE_TEACHER)
            .execute(pool)
            .await?;
        tracing::info!("Teacher account created successfully.");
    }
    Ok(())
}

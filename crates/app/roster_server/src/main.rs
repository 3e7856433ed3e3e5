//! Roster API server binary.
//!
//! Serves the REST API over PostgreSQL, or over an in-memory store with
//! `--in-memory` for local development.

use std::sync::Arc;
use std::time::Duration;

use clap::Parser;
use roster_core::auth::password::PasswordHasher;
use roster_core::store::{MemoryUserStore, PgUserStore, UserStore};
use sqlx::postgres::PgPoolOptions;
use tracing::{info, warn};

/// CLI arguments for the API server.
#[derive(Parser, Debug)]
#[command(name = "roster_server", about = "Roster API server")]
struct Args {
    /// Host to bind.
    #[arg(long, env = "HOST", default_value = "127.0.0.1")]
    host: String,

    /// Port to listen on (0 = ephemeral).
    #[arg(long, env = "PORT", default_value_t = 3100)]
    port: u16,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/roster"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 5)]
    max_connections: u32,

    /// Keep users in memory instead of PostgreSQL. Data is lost on exit.
    #[arg(long, default_value_t = false)]
    in_memory: bool,

    /// Email of an admin account to create or promote at startup.
    #[arg(long, env = "ADMIN_EMAIL")]
    admin_email: Option<String>,

    /// Password for a newly created admin account.
    #[arg(long, env = "ADMIN_PASSWORD", hide_env_values = true)]
    admin_password: Option<String>,

    /// Display name for a newly created admin account.
    #[arg(long, env = "ADMIN_NAME", default_value = "Admin")]
    admin_name: String,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,roster_api=debug,roster_core=debug".into()),
        )
        .init();

    let args = Args::parse();

    let mut config = roster_api::config::ApiConfig::from_env();
    config.bind_addr = format!("{}:{}", args.host, args.port);
    config.pg_connection_url = args.database_url.clone();

    let store: Arc<dyn UserStore> = if args.in_memory {
        warn!("using in-memory user store; data will not survive a restart");
        Arc::new(MemoryUserStore::new())
    } else {
        info!(max_connections = args.max_connections, "configuring connection pool");
        let pool = PgPoolOptions::new()
            .max_connections(args.max_connections)
            .acquire_timeout(Duration::from_secs(30))
            .connect(&args.database_url)
            .await?;

        info!("running database migrations");
        roster_api::migrate(&pool).await?;
        Arc::new(PgUserStore::new(pool))
    };

    if let Some(email) = args.admin_email.as_deref() {
        match args.admin_password.as_deref() {
            Some(password) => {
                let hasher = PasswordHasher::new(config.bcrypt_cost)?;
                roster_core::seed::ensure_admin(
                    store.as_ref(),
                    &hasher,
                    email,
                    &args.admin_name,
                    password,
                )
                .await?;
            }
            None => warn!(email, "ADMIN_EMAIL set without ADMIN_PASSWORD; skipping admin seed"),
        }
    }

    let state = roster_api::AppState::new(store, config.clone())?;
    let app = roster_api::router(state);

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    let local_addr = listener.local_addr()?;
    info!(addr = %local_addr, "REST API listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("server stopped");
    Ok(())
}

/// Resolves on Ctrl-C.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

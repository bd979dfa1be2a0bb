//! Young Money admin server binary.
//!
//! Serves the RPC API, the OAuth callback and the compiled dashboard from
//! one port.

use std::net::SocketAddr;

use clap::Parser;
use sqlx::postgres::PgPoolOptions;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

/// Consecutive ports tried when the preferred one is taken.
const PORT_ATTEMPTS: u16 = 20;

/// CLI arguments for the admin server.
#[derive(Parser, Debug)]
#[command(name = "ym_server", about = "Young Money admin server", version)]
struct Args {
    /// Preferred port; the next free one is used if it is busy.
    #[arg(long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// PostgreSQL connection URL.
    #[arg(
        long,
        env = "DATABASE_URL",
        default_value = "postgres://localhost:5432/youngmoney"
    )]
    database_url: String,

    /// Maximum number of database connections in the pool.
    #[arg(long, default_value_t = 10)]
    max_connections: u32,

    /// Directory holding the compiled dashboard bundle.
    #[arg(long, env = "STATIC_DIR", default_value = "dist/public")]
    static_dir: String,

    /// Do not run embedded migrations at startup.
    #[arg(long, default_value_t = false)]
    skip_migrations: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,ym_api=debug,ym_core=debug")),
        )
        .init();

    let args = Args::parse();

    info!(version = ym_core::version(), port = args.port, "starting ym_server");
    info!(
        max_connections = args.max_connections,
        "configuring connection pool"
    );

    let pool = PgPoolOptions::new()
        .max_connections(args.max_connections)
        .acquire_timeout(std::time::Duration::from_secs(30))
        .connect(&args.database_url)
        .await?;

    if args.skip_migrations {
        warn!("skipping database migrations");
    } else {
        info!("running database migrations");
        ym_api::migrate(&pool).await?;
    }

    let mut config = ym_api::config::AdminConfig::from_env();
    config.database_url = args.database_url;
    config.static_dir = args.static_dir;
    info!(
        static_dir = %config.static_dir,
        sql_console = config.sql_console_enabled,
        require_admin_auth = config.require_admin_auth,
        "configuration loaded"
    );

    let state = ym_api::AppState::postgres(pool, config)?;
    let app = ym_api::router(state);

    let listener = bind_available(args.port).await?;
    let local_addr = listener.local_addr()?;
    if local_addr.port() != args.port {
        info!(preferred = args.port, "port busy, using {}", local_addr.port());
    }
    info!(addr = %local_addr, "admin server listening");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("server stopped");
    Ok(())
}

/// Bind the first free port in `preferred..preferred + PORT_ATTEMPTS`.
async fn bind_available(preferred: u16) -> std::io::Result<TcpListener> {
    let mut last_err = None;
    for port in (preferred..=u16::MAX).take(PORT_ATTEMPTS as usize) {
        match TcpListener::bind(("0.0.0.0", port)).await {
            Ok(listener) => return Ok(listener),
            Err(e) => last_err = Some(e),
        }
    }
    Err(last_err.unwrap_or_else(|| {
        std::io::Error::new(
            std::io::ErrorKind::AddrInUse,
            format!("no available port found starting from {preferred}"),
        )
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("failed to listen for shutdown signal: {e}");
        std::future::pending::<()>().await;
    }
    info!("shutdown signal received");
}

//! statusboard server binary.
//!
//! Loads configuration, prepares the database (migrations, configured
//! services), then serves the JSON API until SIGINT or SIGTERM.

use statusboard_db::{DbPool, SqliteStore};
use statusboard_server::config::{self, Config, LoggingConfig};
use statusboard_server::{app, AppState};
use std::error::Error;
use std::net::SocketAddr;
use std::process::ExitCode;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Config path from the first CLI argument, then `STATUSBOARD_CONFIG_PATH`,
/// then [`DEFAULT_CONFIG_PATH`], with the name of the source used.
fn config_path() -> (String, &'static str) {
    let non_blank = |v: &String| !v.trim().is_empty();
    if let Some(path) = std::env::args().nth(1).filter(non_blank) {
        return (path, "cli-arg");
    }
    if let Some(path) = std::env::var("STATUSBOARD_CONFIG_PATH").ok().filter(non_blank) {
        return (path, "env-var");
    }
    (DEFAULT_CONFIG_PATH.to_string(), "default")
}

fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_new(&logging.level).unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

fn prepare_database(config: &Config) -> Result<DbPool, Box<dyn Error>> {
    let pool = statusboard_db::create_pool(
        &config.database.path,
        config.database.runtime_settings(),
    )?;
    let conn = pool.get()?;

    let applied = statusboard_db::run_migrations(&conn)?;
    if applied > 0 {
        tracing::info!(count = applied, "database schema updated");
    }

    let created =
        statusboard_core::services::sync_services(&SqliteStore::new(&conn), &config.services)?;
    tracing::info!(
        configured = config.services.len(),
        created,
        "service registry ready"
    );

    drop(conn);
    Ok(pool)
}

async fn run(config: Config) -> Result<(), Box<dyn Error>> {
    let pool = prepare_database(&config)?;

    let notifier = config.notifier.build();
    tracing::info!(enabled = notifier.is_some(), "notifier configured");

    let state = AppState::new(pool, config.website.core_settings(), notifier);
    let addr = SocketAddr::new(config.server.host, config.server.port);
    let listener = TcpListener::bind(addr).await?;
    tracing::info!(%addr, "statusboard listening");

    axum::serve(listener, app(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    let (path, source) = config_path();
    let config = match config::load_config(Some(path.as_str())) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("statusboard-server: {e}");
            return ExitCode::FAILURE;
        }
    };

    init_tracing(&config.logging);
    tracing::info!(%path, source, "configuration loaded");

    match run(config).await {
        Ok(()) => {
            tracing::info!("statusboard stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            tracing::error!(error = %e, "statusboard failed");
            ExitCode::FAILURE
        }
    }
}

/// Resolves on the first SIGINT or (on Unix) SIGTERM.
async fn shutdown_signal() {
    let interrupt = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!(error = %e, "cannot listen for SIGINT");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                tracing::warn!(error = %e, "cannot listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    let received = tokio::select! {
        () = interrupt => "SIGINT",
        () = terminate => "SIGTERM",
    };
    tracing::info!(signal = received, "shutting down");
}

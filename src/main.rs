//! GCM server entry point.
//!
//! Loads configuration, wires the crates together, and runs the TCP server
//! until Ctrl+C or SIGTERM.

mod cli;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt};

use gcm_auth::PasswordHasher;
use gcm_core::config::{AppConfig, LoggingConfig};
use gcm_database::DatabasePool;
use gcm_database::migration::run_migrations;
use gcm_entity::user::NewUser;
use gcm_protocol::ServerContext;

use cli::{Cli, Command, CreateUserArgs, ServeArgs};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let config = match AppConfig::load_from(&cli.config_dir, &cli.env) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load configuration: {e}");
            std::process::exit(1);
        }
    };

    init_logging(&config.logging);

    let result = match cli.command {
        None => serve(config, ServeArgs::default()).await,
        Some(Command::Serve(args)) => serve(config, args).await,
        Some(Command::Migrate) => migrate(config).await,
        Some(Command::CreateUser(args)) => create_user(config, args).await,
    };

    if let Err(e) = result {
        tracing::error!(error = format!("{e:#}"), "Fatal error");
        std::process::exit(1);
    }
}

/// Initialize tracing/logging
fn init_logging(config: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    match config.format.as_str() {
        "json" => {
            fmt()
                .json()
                .with_env_filter(filter)
                .with_target(true)
                .with_thread_ids(true)
                .init();
        }
        _ => {
            fmt()
                .pretty()
                .with_env_filter(filter)
                .with_target(true)
                .init();
        }
    }
}

async fn serve(mut config: AppConfig, args: ServeArgs) -> anyhow::Result<()> {
    tracing::info!(version = env!("CARGO_PKG_VERSION"), "Starting GCM server");
    if let Some(port) = args.port {
        config.server.port = port;
    }

    let db = DatabasePool::connect(&config.database)
        .await
        .context("database connection failed")?;
    if !args.skip_migrations {
        run_migrations(db.pool()).await.context("migration failed")?;
    }

    let context = ServerContext::build(config, db.user_store(), db.catalog_store())?;
    let resumed = context.resume_background_tasks().await?;
    tracing::info!(resumed, "Unblock timers resumed");

    let server = context.bind().await?;
    let shutdown = context.shutdown_token();
    let server_task = tokio::spawn(server.run());

    shutdown_signal().await;
    tracing::info!("Shutdown signal received, starting graceful shutdown");
    shutdown.cancel();

    server_task
        .await
        .context("server task panicked")?
        .context("server stopped with an error")?;
    context.shutdown().await;
    db.close().await;

    tracing::info!("GCM server shut down gracefully");
    Ok(())
}

async fn migrate(config: AppConfig) -> anyhow::Result<()> {
    let db = DatabasePool::connect(&config.database).await?;
    run_migrations(db.pool()).await?;
    db.close().await;
    tracing::info!("All migrations applied");
    Ok(())
}

async fn create_user(config: AppConfig, args: CreateUserArgs) -> anyhow::Result<()> {
    let hasher = PasswordHasher::from_config(&config.auth)?;
    let password_hash = hasher.hash_password(&args.password)?;

    let db = DatabasePool::connect(&config.database).await?;
    let user = db
        .user_store()
        .create(&NewUser {
            display_name: args.display_name.unwrap_or_else(|| args.username.clone()),
            username: args.username,
            email: args.email,
            password_hash,
            role: args.role,
        })
        .await
        .context("failed to create user")?;
    db.close().await;

    tracing::info!(user_id = %user.id, username = %user.username, role = %user.role, "User created");
    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

//! HTTP server command
//!
//! Connects to Postgres, applies migrations and serves the tracker API.

use anyhow::{Context, Result};
use clap::Parser;
use std::net::SocketAddr;

use tracker_ai::GenerativeClient;
use tracker_core::TrackerConfig;
use tracker_server::db::{create_pool_with_options, migrations};
use tracker_server::http::{run_server, AppState, ServerConfig};

/// Arguments for the serve command
#[derive(Parser, Debug)]
pub struct ServeArgs {
    /// Address to bind to (default: [server] bind, or 127.0.0.1:3030)
    #[arg(long, short = 'b')]
    pub bind: Option<SocketAddr>,

    /// Allow permissive CORS (all origins) - use with caution
    #[arg(long)]
    pub cors_permissive: bool,

    /// Database URL (overrides config/environment)
    #[arg(long, env = "DATABASE_URL")]
    pub database_url: Option<String>,

    /// Skip running migrations on startup
    #[arg(long)]
    pub no_migrate: bool,
}

/// Run the HTTP server
pub async fn run_serve(args: ServeArgs, mut config: TrackerConfig) -> Result<()> {
    if let Some(url) = args.database_url {
        config.database.url = Some(url);
    }

    let server_config = ServerConfig {
        bind_addr: resolve_bind(args.bind, &config)?,
        cors_permissive: args.cors_permissive || config.server.cors_permissive,
    };
    let database_url = config.database_url()?;

    tracing::info!("Starting tracker server on {}", server_config.bind_addr);

    let pool = create_pool_with_options(database_url, config.database.max_connections)
        .await
        .context("Failed to create database pool")?;

    if args.no_migrate {
        tracing::info!("Skipping migrations (--no-migrate)");
    } else {
        migrations::run(&pool)
            .await
            .context("Failed to run migrations")?;
    }

    let state = AppState::new(pool, GenerativeClient::from_config(&config.ai));

    // Blocks until shutdown
    run_server(state, server_config)
        .await
        .context("Server error")?;

    Ok(())
}

fn resolve_bind(flag: Option<SocketAddr>, config: &TrackerConfig) -> Result<SocketAddr> {
    match flag {
        Some(addr) => Ok(addr),
        None => config
            .server
            .bind
            .parse()
            .with_context(|| format!("invalid bind address '{}'", config.server.bind)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flag_overrides_config_bind() {
        let config = TrackerConfig::default();
        let flag: SocketAddr = "0.0.0.0:8080".parse().unwrap();
        assert_eq!(resolve_bind(Some(flag), &config).unwrap(), flag);
        assert_eq!(resolve_bind(None, &config).unwrap().port(), 3030);
    }

    #[test]
    fn malformed_config_bind_is_an_error() {
        let mut config = TrackerConfig::default();
        config.server.bind = "localhost".into();
        let err = resolve_bind(None, &config).unwrap_err();
        assert!(err.to_string().contains("invalid bind address"));
    }
}

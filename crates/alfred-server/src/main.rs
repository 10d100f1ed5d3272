//! Alfred server binary.
//!
//! # Usage
//!
//! ```bash
//! # Ephemeral, in-memory storage (development)
//! MASTER_KEY_V1=... MASTER_KEY_VERSION=1 alfred-server --bind 127.0.0.1:8080
//!
//! # Durable storage, keys from a .env file
//! alfred-server --database /var/lib/alfred/alfred.redb --env-file /etc/alfred/.env
//! ```

use std::path::PathBuf;

use alfred_server::{KeyConfig, Server, ServerRuntimeConfig};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// Alfred key custody server
#[derive(Parser, Debug)]
#[command(name = "alfred-server")]
#[command(about = "Per-tenant key delivery and opaque secret custody")]
#[command(version)]
struct Args {
    /// Address to bind to
    #[arg(short, long, env = "ALFRED_BIND", default_value = "0.0.0.0:8080")]
    bind: String,

    /// Redb database file (in-memory storage if omitted)
    #[arg(short, long, env = "ALFRED_DATABASE")]
    database: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,

    /// Environment file holding MASTER_KEY_V<n> and MASTER_KEY_VERSION.
    /// Read after argument parsing, so ALFRED_* values must come from the
    /// real environment.
    #[arg(long, default_value = ".env")]
    env_file: PathBuf,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    // Variables already set in the environment win over the file
    let env_file = &args.env_file;
    let env_loaded = dotenvy::from_path(env_file);

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!("Alfred server starting");
    match env_loaded {
        Ok(()) => tracing::info!("Loaded environment from {}", env_file.display()),
        Err(e) if e.not_found() => {
            tracing::debug!("No environment file at {}", env_file.display());
        },
        Err(e) => tracing::warn!("Failed to load {}: {}", env_file.display(), e),
    }

    let keys = KeyConfig::from_env()?;

    let config = ServerRuntimeConfig {
        bind_address: args.bind,
        database_path: args.database,
        ..Default::default()
    };

    tracing::info!("Binding to {}", config.bind_address);

    let server = Server::bind(config, keys).await?;

    tracing::info!("Server listening on {}", server.local_addr()?);

    server.run().await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;

    use super::*;

    #[test]
    fn args_definition_is_valid() {
        Args::command().debug_assert();
    }

    #[test]
    fn env_file_defaults_and_overrides() {
        let args = Args::try_parse_from(["alfred-server"]).unwrap();
        assert_eq!(args.env_file, PathBuf::from(".env"));

        let args = Args::try_parse_from(["alfred-server", "--env-file", "/etc/alfred/.env"]).unwrap();
        assert_eq!(args.env_file, PathBuf::from("/etc/alfred/.env"));

        let args = Args::try_parse_from(["alfred-server", "--env-file=keys.env"]).unwrap();
        assert_eq!(args.env_file, PathBuf::from("keys.env"));
    }
}

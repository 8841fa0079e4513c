//! Warden - Command-line entry point
//!
//! Loads settings, wires the session manager to the reqwest and file
//! adapters, and runs one command against the stored session.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};
use warden_application::{KeyValueStorage, SessionManager};
use warden_domain::{ApiRequest, SessionSettings, token_preview};
use warden_infrastructure::{
    FileStorage, HttpRefreshClient, MemoryStorage, ReqwestTransport, SystemClock, load_settings,
};

type Manager = SessionManager<ReqwestTransport, HttpRefreshClient>;

#[derive(Debug, Parser)]
#[command(name = "warden", version, about = "Authenticated session and token refresh coordinator")]
struct Cli {
    /// JSON settings file.
    #[arg(long, global = true, env = "WARDEN_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Show session health and lifecycle state.
    Status,
    /// Store credentials obtained from a login exchange.
    Login {
        /// Access credential.
        #[arg(long)]
        access: String,
        /// Refresh credential.
        #[arg(long)]
        refresh: Option<String>,
    },
    /// Exchange the refresh credential now.
    Refresh,
    /// Clear the stored credentials.
    Logout,
    /// Send an authenticated GET request.
    Get {
        /// Path relative to the base URL.
        path: String,
    },
}

fn build_manager(settings: &SessionSettings) -> Result<Manager, Box<dyn std::error::Error>> {
    let storage: Arc<dyn KeyValueStorage> = match &settings.storage_path {
        Some(path) => Arc::new(FileStorage::new(path)),
        None => {
            tracing::warn!("no storage_path configured, credentials will not persist");
            Arc::new(MemoryStorage::new())
        }
    };
    Ok(SessionManager::new(
        settings,
        storage,
        Arc::new(SystemClock::new()),
        ReqwestTransport::new(settings)?,
        HttpRefreshClient::new(settings)?,
    ))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let settings = load_settings(cli.config.as_deref())?;
    tracing::debug!(base_url = %settings.base_url, "settings loaded");

    let manager = build_manager(&settings)?;
    let _expired = manager.subscribe(|event| {
        eprintln!("session expired: {}", event.reason);
    });

    match cli.command {
        Command::Status => {
            let health = manager.health();
            println!("status:  {}", health.status.as_str());
            println!("state:   {}", manager.state().as_str());
            println!("message: {}", health.message);
            if let Some(access) = manager.store().access()? {
                println!("access:  {}", token_preview(&access));
            }
        }
        Command::Login { access, refresh } => {
            manager.login(&access, refresh.as_deref())?;
            println!("{}", manager.health().message);
        }
        Command::Refresh => {
            manager.coordinator().refresh_now().await?;
            println!("{}", manager.health().message);
        }
        Command::Logout => {
            manager.logout("user logout");
        }
        Command::Get { path } => {
            let response = manager.execute(ApiRequest::get(path)).await?;
            println!("{}", response.status);
            println!("{}", response.body);
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_login() {
        let cli = Cli::try_parse_from(["warden", "login", "--access", "a1", "--refresh", "r1"])
            .expect("valid arguments");
        assert!(matches!(
            cli.command,
            Command::Login { ref access, refresh: Some(ref refresh) } if access == "a1" && refresh == "r1"
        ));
    }

    #[test]
    fn test_global_config_flag() {
        let cli = Cli::try_parse_from(["warden", "status", "--config", "warden.json"])
            .expect("valid arguments");
        assert_eq!(cli.config, Some(PathBuf::from("warden.json")));
    }
}

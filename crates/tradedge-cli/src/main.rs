//! TradEdge CLI - drive the dashboard session from a terminal.
//!
//! Resumes the stored session, logs in with a login-provider payload, logs
//! out, and lists purchased packages. Routing decisions the browser
//! dashboard would act on are printed instead.

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use tradedge_core::auth::{CredentialStore, FileStore, KeyValueStore, KeyringStore};
use tradedge_core::{
    route_after_bootstrap, ApiClient, Config, HistoryMode, LoginPayload, Navigator, Route,
    SessionManager, SessionSnapshot, StorageBackend,
};

#[derive(Parser)]
#[command(name = "tradedge")]
#[command(about = "TradEdge CLI - dashboard session from the terminal", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Resume the stored session and show it
    Status,
    /// Log in (prompts for the token if omitted)
    Login {
        /// User id, with or without the provider prefix
        user_id: String,
        access_token: Option<String>,
    },
    /// Clear the stored session
    Logout,
    /// List purchased package ids
    Packages,
}

/// Prints navigation requests instead of routing.
struct PrintNavigator;

impl Navigator for PrintNavigator {
    fn navigate(&self, route: Route, mode: HistoryMode) {
        let how = match mode {
            HistoryMode::Push => "push",
            HistoryMode::Replace => "replace",
        };
        println!("-> {} ({})", route, how);
    }
}

/// Initialize the tracing subscriber for logging.
///
/// Returns the appender guard when logging to a file; it must live until exit.
fn init_tracing() -> Option<tracing_appender::non_blocking::WorkerGuard> {
    // Use RUST_LOG env var to control log level (e.g., RUST_LOG=debug)
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    match std::env::var("TRADEDGE_LOG_FILE") {
        Ok(path) => {
            let path = std::path::PathBuf::from(path);
            let dir = path.parent().map(|p| p.to_path_buf()).unwrap_or_else(|| ".".into());
            let file_name = path
                .file_name()
                .map(|n| n.to_os_string())
                .unwrap_or_else(|| "tradedge.log".into());
            let appender = tracing_appender::rolling::never(dir, file_name);
            let (writer, guard) = tracing_appender::non_blocking(appender);

            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(writer).with_ansi(false))
                .with(filter)
                .init();
            Some(guard)
        }
        Err(_) => {
            tracing_subscriber::registry()
                .with(fmt::layer().with_writer(io::stderr))
                .with(filter)
                .init();
            None
        }
    }
}

fn open_store(config: &Config) -> Result<Arc<dyn KeyValueStore>> {
    match config.storage {
        StorageBackend::File => {
            let cache_dir = config.cache_dir()?;
            Ok(Arc::new(FileStore::new(&cache_dir)))
        }
        StorageBackend::Keyring => Ok(Arc::new(KeyringStore::new())),
    }
}

fn print_snapshot(snapshot: &SessionSnapshot) {
    let session = &snapshot.session;
    println!("active:        {}", session.is_active);
    println!("bootstrapping: {}", session.is_bootstrapping);

    match (&snapshot.profile.data, &snapshot.profile.error) {
        (_, Some(err)) => println!("profile:       unavailable ({})", err),
        (Some(profile), None) => {
            println!("profile:       {} (id {})", profile.display_name(), profile.user_id)
        }
        (None, None) => println!("profile:       -"),
    }

    match &snapshot.transactions.error {
        Some(err) => println!("transactions:  unavailable ({})", err),
        None => println!(
            "transactions:  {} records, {} purchased",
            snapshot.transactions.data.len(),
            snapshot.purchased.len()
        ),
    }

    if let Some(route) = route_after_bootstrap(snapshot) {
        println!("-> {} (replace)", route);
    }
}

async fn run(command: Commands, manager: &SessionManager) -> Result<()> {
    match command {
        Commands::Status => {
            let snapshot = manager.bootstrap().await;
            print_snapshot(&snapshot);
        }
        Commands::Packages => {
            let snapshot = manager.bootstrap().await;
            if !snapshot.is_active() {
                anyhow::bail!("Not logged in");
            }
            if let Some(err) = &snapshot.transactions.error {
                anyhow::bail!("Transactions unavailable: {}", err);
            }
            for id in &snapshot.purchased {
                println!("{}", id);
            }
        }
        Commands::Login {
            user_id,
            access_token,
        } => {
            let access_token = match access_token {
                Some(token) => token,
                None => rpassword::prompt_password("Access token: ")
                    .context("Failed to read access token")?,
            };

            // Login replaces whatever session was stored
            manager.bootstrap().await;
            let result = manager.login(LoginPayload::new(user_id, access_token)).await;

            let snapshot = manager.snapshot();
            if let Err(e) = result {
                let banner = snapshot.session.login_error.unwrap_or_else(|| e.to_string());
                anyhow::bail!("{}", banner);
            }
            print_snapshot(&snapshot);
        }
        Commands::Logout => {
            manager.logout().context("Failed to clear stored session")?;
            println!("Logged out");
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let _log_guard = init_tracing();

    let cli = Cli::parse();

    let config = Config::load().context("Failed to load config")?;
    let store = CredentialStore::new(open_store(&config)?);
    let api = ApiClient::new(&config)?;
    let manager = SessionManager::new(Arc::new(api), store, &config)
        .with_navigator(Arc::new(PrintNavigator));

    info!("tradedge starting");
    run(cli.command, &manager).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_login_with_and_without_token() {
        let cli = Cli::try_parse_from(["tradedge", "login", "LNUSR42", "tok"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Login { ref user_id, access_token: Some(ref t) } if user_id == "LNUSR42" && t == "tok"
        ));

        let cli = Cli::try_parse_from(["tradedge", "login", "LNUSR42"]).unwrap();
        assert!(matches!(cli.command, Commands::Login { access_token: None, .. }));
    }

    #[test]
    fn test_unknown_command_is_rejected() {
        assert!(Cli::try_parse_from(["tradedge", "purge"]).is_err());
        assert!(Cli::try_parse_from(["tradedge", "login"]).is_err());
    }
}

//! CampusConnect session CLI - login, session restore, and sign-out.

use std::path::PathBuf;
use std::sync::Arc;

use campus_config_and_utils::{init_logging, Config, Paths};
use campus_storage::create_vault;
use clap::{Parser, Subcommand};
use mikasa::{ProviderClient, RestProfileProbe, SessionCoordinator, SessionState};
use tracing::debug;

/// CampusConnect session command-line interface.
#[derive(Parser)]
#[command(name = "campus-session")]
#[command(about = "Manage the CampusConnect login session")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, default_value = "info", global = true)]
    log_level: String,

    /// Base directory for credentials and config. Defaults to ~/.campusconnect
    #[arg(long, global = true)]
    base_dir: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the current session as JSON
    Status,
    /// Send a one-time login code to an email address
    Login {
        /// Campus email address
        email: String,
    },
    /// Redeem a one-time login code
    Verify {
        /// Campus email address the code was sent to
        email: String,
        /// The code from the email
        code: String,
    },
    /// Restore the persisted session
    Restore,
    /// Sign out and clear local credentials
    Logout,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(&cli.log_level);

    // Load configuration
    let paths = match cli.base_dir {
        Some(base) => Paths::with_base_dir(base),
        None => Paths::new()?,
    };
    paths.ensure_dirs()?;
    let config = Config::load(&paths)?;

    let coordinator = build_coordinator(&config, &paths)?;

    match cli.command {
        Some(Commands::Login { email }) => {
            coordinator.send_login_code(&email).await?;
            println!("Login code sent to {}", email);
        }
        Some(Commands::Verify { email, code }) => {
            let state = coordinator.verify_login_code(&email, &code).await?;
            println!("{}", describe(state));
        }
        Some(Commands::Restore) => {
            let state = coordinator.initialize_session().await;
            println!("{}", describe(state));
        }
        Some(Commands::Logout) => {
            coordinator.sign_out().await;
            println!("Signed out");
        }
        Some(Commands::Status) | None => {
            // Default to status if no command given
            let snapshot = coordinator.snapshot().await;
            println!("{}", serde_json::to_string_pretty(&snapshot)?);
        }
    }

    Ok(())
}

fn build_coordinator(
    config: &Config,
    paths: &Paths,
) -> Result<Arc<SessionCoordinator>, Box<dyn std::error::Error>> {
    debug!(path = %paths.credentials_file().display(), "Opening credential store");

    let vault = create_vault(paths.credentials_file())?;
    let provider = ProviderClient::new(&config.supabase_url, &config.supabase_publishable_key)?;
    let profile = RestProfileProbe::new(&config.supabase_url, &config.supabase_publishable_key)?;

    Ok(Arc::new(SessionCoordinator::new(
        vault,
        Arc::new(provider),
        Arc::new(profile),
    )))
}

fn describe(state: SessionState) -> &'static str {
    match state {
        SessionState::NeedsLogin => "Not logged in",
        SessionState::AuthenticatedNeedsProfile => "Logged in, profile setup required",
        SessionState::AuthenticatedWithProfile => "Logged in",
    }
}

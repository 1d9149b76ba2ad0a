//! Desktop shell configuration tool.
//!
//! Loads the application's section/key configuration file through the same
//! pipeline the shell uses at startup and prints what the shell would see.
//!
//! ```text
//! shell-config [--config config.ini] [--env-var APP_ENV] <command>
//!
//!   check    validate and list advisories
//!   show     full configuration, credentials masked
//!   public   projection exposed to the UI layer
//!   harden   apply security defaults, then show
//!   watch    reload on every change until Ctrl-C
//! ```

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde::Serialize;

use shell_config::config::{advisories, ConfigLoader, ConfigStore, DEFAULT_ENV_VAR};
use shell_config::observability::logging;

#[derive(Parser)]
#[command(name = "shell-config")]
#[command(about = "Load, validate and inspect desktop shell configuration", long_about = None)]
struct Cli {
    /// Configuration source file.
    #[arg(short, long, env = "APP_CONFIG", default_value = "config.ini")]
    config: PathBuf,

    /// Variable that selects the environment when the file does not.
    #[arg(long, default_value = DEFAULT_ENV_VAR)]
    env_var: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Validate the configuration and list advisories
    Check,
    /// Print the full configuration with credentials masked
    Show,
    /// Print the projection exposed to the UI layer
    Public,
    /// Apply security defaults, then print the masked configuration
    Harden,
    /// Reload whenever the file changes
    Watch,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let loader = ConfigLoader::new(&cli.config).with_env_var(&cli.env_var);
    let store = Arc::new(ConfigStore::new(loader));

    // Load under a console subscriber so pipeline warnings are visible
    // before `[log]` is known.
    let config = tracing::subscriber::with_default(logging::bootstrap(), || store.load())
        .inspect_err(|e| eprintln!("Failed to load configuration: {e}"))?;
    let _guard = logging::init(&config.log)?;

    run(cli.command, store)
        .await
        .inspect_err(|e| tracing::error!("{}", e))
}

async fn run(command: Commands, store: Arc<ConfigStore>) -> Result<(), Box<dyn std::error::Error>> {
    match command {
        Commands::Check => {
            let config = store.current()?;
            let findings = advisories(&config);
            for finding in &findings {
                println!("warning: {finding}");
            }
            println!(
                "{} ({}) is valid for {} with {} advisories",
                store.loader().path().display(),
                config.app.name,
                config.app.environment,
                findings.len()
            );
        }
        Commands::Show => print_json(&store.sanitized()?)?,
        Commands::Public => print_json(&store.public()?)?,
        Commands::Harden => {
            store.apply_security_defaults()?;
            print_json(&store.sanitized()?)?;
        }
        Commands::Watch => watch(store).await?,
    }

    Ok(())
}

async fn watch(store: Arc<ConfigStore>) -> Result<(), Box<dyn std::error::Error>> {
    let (watcher, mut updates) = shell_config::config::watcher::ConfigWatcher::new(Arc::clone(&store));
    let _watcher = watcher.run()?;

    loop {
        tokio::select! {
            Some(config) = updates.recv() => {
                tracing::info!(
                    environment = %config.app.environment,
                    name = %config.app.name,
                    "New configuration published"
                );
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Stopping config watcher");
                break;
            }
        }
    }

    Ok(())
}

fn print_json<T: Serialize>(value: &T) -> Result<(), serde_json::Error> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

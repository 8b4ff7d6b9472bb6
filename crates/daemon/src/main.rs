//! dirbrowse
//!
//! Sandboxed web directory listing service.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use dirbrowse::config::{default_config_path, Config};
use dirbrowse::AppState;
use tracing_subscriber::EnvFilter;

/// dirbrowse - browse a directory tree over HTTP.
#[derive(Parser, Debug)]
#[command(name = "dirbrowse")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands.
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Run the HTTP service
    Serve {
        /// Directory to serve (overrides config and environment)
        #[arg(long, value_name = "DIR")]
        root: Option<PathBuf>,

        /// Address to listen on (overrides config and environment)
        #[arg(long, value_name = "ADDR")]
        bind: Option<SocketAddr>,
    },

    /// Inspect or create the configuration file
    #[command(subcommand)]
    Config(ConfigCommands),
}

/// Subcommands for configuration management.
#[derive(Subcommand, Debug, Clone)]
pub enum ConfigCommands {
    /// Print the effective configuration
    Show,

    /// Write the default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let mut config = Config::load(&config_path)?;

    // Logging starts before the overrides are applied so they get logged
    init_tracing(cli.verbose, &config.effective_log_level());
    tracing::debug!("Using config file: {:?}", config_path);

    config.apply_env_overrides();

    match cli.command {
        Commands::Serve { root, bind } => {
            if let Some(root) = root {
                config.files.root = root;
            }
            if let Some(bind) = bind {
                config.server.bind = bind;
            }

            config.validate()?;
            run_server(config).await?;
        }
        Commands::Config(ConfigCommands::Show) => {
            print!("{}", config.to_toml()?);
        }
        Commands::Config(ConfigCommands::Init { force }) => {
            if config_path.exists() && !force {
                anyhow::bail!(
                    "Config file already exists at {} (use --force to overwrite)",
                    config_path.display()
                );
            }

            Config::default().save(&config_path)?;
            println!("Wrote default configuration to {}", config_path.display());
        }
    }

    Ok(())
}

/// Install the global subscriber.
///
/// `--verbose` wins, then `RUST_LOG`, then the configured level.
fn init_tracing(verbose: bool, log_level: &str) {
    let filter = if verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    let state = Arc::new(AppState::from_config(&config).context("Failed to open root directory")?);

    let listener = tokio::net::TcpListener::bind(config.server.bind)
        .await
        .with_context(|| format!("Failed to bind to {}", config.server.bind))?;

    tracing::info!("dirbrowse starting");
    dirbrowse::server::serve(listener, state, wait_for_shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("dirbrowse stopped");
    Ok(())
}

/// Wait for a shutdown signal (SIGTERM or SIGINT).
async fn wait_for_shutdown_signal() {
    use tokio::signal::unix::{signal, SignalKind};

    let (mut sigterm, mut sigint) = match (
        signal(SignalKind::terminate()),
        signal(SignalKind::interrupt()),
    ) {
        (Ok(term), Ok(int)) => (term, int),
        (Err(e), _) | (_, Err(e)) => {
            tracing::warn!("Cannot register signal handlers: {}", e);
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Cannot wait for Ctrl-C: {}", e);
                std::future::pending::<()>().await;
            }
            return;
        }
    };

    tokio::select! {
        _ = sigterm.recv() => {
            tracing::info!("Received SIGTERM");
        }
        _ = sigint.recv() => {
            tracing::info!("Received SIGINT");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_debug_assert() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_serve_command() {
        let cli = Cli::try_parse_from(["dirbrowse", "serve"]).unwrap();
        match cli.command {
            Commands::Serve { root, bind } => {
                assert!(root.is_none());
                assert!(bind.is_none());
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_serve_with_overrides() {
        let cli = Cli::try_parse_from([
            "dirbrowse",
            "serve",
            "--root",
            "/srv/files",
            "--bind",
            "0.0.0.0:9000",
        ])
        .unwrap();
        match cli.command {
            Commands::Serve { root, bind } => {
                assert_eq!(root, Some(PathBuf::from("/srv/files")));
                assert_eq!(bind, Some("0.0.0.0:9000".parse().unwrap()));
            }
            _ => panic!("Expected Serve command"),
        }
    }

    #[test]
    fn test_serve_rejects_bad_bind() {
        assert!(Cli::try_parse_from(["dirbrowse", "serve", "--bind", "nowhere"]).is_err());
    }

    #[test]
    fn test_config_show_command() {
        let cli = Cli::try_parse_from(["dirbrowse", "config", "show"]).unwrap();
        assert!(matches!(cli.command, Commands::Config(ConfigCommands::Show)));
    }

    #[test]
    fn test_config_init_command() {
        let cli = Cli::try_parse_from(["dirbrowse", "config", "init", "--force"]).unwrap();
        match cli.command {
            Commands::Config(ConfigCommands::Init { force }) => assert!(force),
            _ => panic!("Expected Config Init command"),
        }
    }

    #[test]
    fn test_global_flags() {
        let cli =
            Cli::try_parse_from(["dirbrowse", "serve", "-v", "--config", "/tmp/dirbrowse.toml"])
                .unwrap();
        assert!(cli.verbose);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/dirbrowse.toml")));
    }

    #[test]
    fn test_missing_subcommand_fails() {
        assert!(Cli::try_parse_from(["dirbrowse"]).is_err());
    }
}

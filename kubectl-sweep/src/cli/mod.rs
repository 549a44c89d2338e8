//! The `kubectl-sweep` command line.
//!
//! Installed on the `PATH`, the binary is picked up by kubectl as the `sweep`
//! plugin and deletes pods stuck in a terminal phase.
//!
//! # Examples
//!
//! ```bash
//! # Delete failed pods in the current namespace
//! kubectl sweep
//!
//! # Show what would be deleted across all namespaces
//! kubectl sweep -A --dry-run
//!
//! # Also remove completed pods of batch jobs
//! kubectl sweep -n batch --phase Failed --phase Succeeded
//! ```

pub mod error;
mod internal;
mod sweep;

use std::{io::Write, path::PathBuf};

use clap::{CommandFactory, Parser, Subcommand};
use snafu::ResultExt;
use sweep_base::CLI_PROGRAM_NAME;
use tokio::runtime::Runtime;

pub use self::error::Error;
use self::sweep::SweepCommand;
use crate::{config::Config, shadow};

/// `Cli` is the entry point of the plugin.
///
/// Without a subcommand it sweeps pods using the flattened [`SweepCommand`]
/// flags.
#[derive(Parser)]
#[command(
    name = CLI_PROGRAM_NAME,
    author,
    version,
    long_version = shadow::CLAP_LONG_VERSION,
    about = "Delete pods that are stuck in a terminal failed phase.",
    args_conflicts_with_subcommands = true,
    color = clap::ColorChoice::Auto
)]
pub struct Cli {
    #[clap(subcommand)]
    commands: Option<Commands>,

    #[command(flatten)]
    sweep: SweepCommand,

    /// Path to the configuration file.
    ///
    /// When omitted, `~/.config/kubectl-sweep/config.yaml` is used if it
    /// exists and built-in defaults otherwise.
    #[clap(
        long = "config",
        short = 'c',
        env = "KUBECTL_SWEEP_CONFIG_FILE_PATH",
        help = "Specify a configuration file. Defaults to ~/.config/kubectl-sweep/config.yaml \
                or KUBECTL_SWEEP_CONFIG_FILE_PATH env var."
    )]
    config_file: Option<PathBuf>,

    #[clap(
        long = "log-level",
        env = "KUBECTL_SWEEP_LOG_LEVEL",
        help = "Set the logging level (e.g., info, debug, trace)."
    )]
    log_level: Option<tracing::Level>,
}

#[derive(Clone, Subcommand)]
pub enum Commands {
    #[command(about = "Display client and server version information")]
    Version {
        #[clap(long = "client", help = "If true, shows client version only (no server required).")]
        client: bool,
    },

    #[command(about = "Generate shell completion script for the specified shell (bash, zsh, fish)")]
    Completions { shell: clap_complete::Shell },

    #[command(about = "Output the default configuration in YAML format")]
    DefaultConfig,
}

impl Default for Cli {
    fn default() -> Self { Self::parse() }
}

impl Cli {
    /// Loads the configuration file and applies the `--log-level` override.
    ///
    /// An explicitly given file must exist. Otherwise the default locations
    /// are searched and a missing file means built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an `Error` if the selected file cannot be read or parsed.
    fn load_config(&self) -> Result<Config, Error> {
        let mut config = match self.config_file.clone().or_else(Config::search_config_file_path) {
            Some(path) => Config::load(path)?,
            None => Config::default(),
        };

        if let Some(log_level) = self.log_level {
            config.log.level = log_level;
        }

        Ok(config)
    }

    /// Runs the selected subcommand, or a sweep when there is none.
    ///
    /// `version --client`, `completions` and `default-config` never touch
    /// the cluster. Everything else initializes logging, builds a Kubernetes
    /// client from the active kubeconfig and runs on a fresh tokio runtime.
    ///
    /// # Errors
    ///
    /// Returns an `Error` if:
    /// - The configuration cannot be loaded.
    /// - The Kubernetes client or the tokio runtime cannot be initialized.
    /// - The sweep itself fails.
    /// - Writing to stdout fails.
    pub fn run(self) -> Result<i32, Error> {
        let client_version = Self::command().get_version().unwrap_or_default().to_string();
        let mut stdout = std::io::stdout();
        match self.commands {
            Some(Commands::Version { client }) if client => {
                stdout
                    .write_all(Self::command().render_long_version().as_bytes())
                    .context(error::WriteStdoutSnafu)?;
                stdout
                    .write_all(format!("Client Version: {client_version}\n").as_bytes())
                    .context(error::WriteStdoutSnafu)?;
                return Ok(0);
            }
            Some(Commands::Completions { shell }) => {
                let mut app = Self::command();
                let bin_name = app.get_name().to_string();
                clap_complete::generate(shell, &mut app, bin_name, &mut stdout);
                return Ok(0);
            }
            Some(Commands::DefaultConfig) => {
                stdout
                    .write_all(Config::default().to_yaml()?.as_bytes())
                    .context(error::WriteStdoutSnafu)?;
                return Ok(0);
            }
            _ => {}
        }

        let config = self.load_config()?;
        config.log.registry();

        let fut = async move {
            let kube_client = kube::Client::try_default().await.context(error::KubeConfigSnafu)?;
            match self.commands {
                Some(Commands::Version { .. }) => {
                    let server_version = kube_client.apiserver_version().await.map_or_else(
                        |_| "unknown".to_string(),
                        |info| format!("{}.{}", info.major, info.minor),
                    );
                    let info = format!(
                        "Client Version: {client_version}\nServer Version: {server_version}\n",
                    );
                    stdout
                        .write_all(Self::command().render_long_version().as_bytes())
                        .context(error::WriteStdoutSnafu)?;
                    stdout.write_all(info.as_bytes()).context(error::WriteStdoutSnafu)?;
                }
                Some(Commands::Completions { .. } | Commands::DefaultConfig) => {}
                None => self.sweep.run(kube_client, config).await?,
            }

            Ok(0)
        };

        Runtime::new().context(error::InitializeTokioRuntimeSnafu)?.block_on(fut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{ext::PodPhase, sweep::DryRunStrategy};

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(std::iter::once(CLI_PROGRAM_NAME).chain(args.iter().copied())).unwrap()
    }

    #[test]
    fn test_verify_cli() { Cli::command().debug_assert(); }

    #[test]
    fn test_sweep_is_the_default_command() {
        let cli = parse(&["-n", "batch", "--chunk-size", "20"]);
        assert!(cli.commands.is_none());
        assert_eq!(cli.sweep.namespace.as_deref(), Some("batch"));
        assert_eq!(cli.sweep.chunk_size, Some(20));
        assert_eq!(cli.sweep.dry_run, None);
    }

    #[test]
    fn test_bare_dry_run_means_client() {
        assert_eq!(parse(&["--dry-run"]).sweep.dry_run, Some(DryRunStrategy::Client));
        assert_eq!(parse(&["--dry-run=server"]).sweep.dry_run, Some(DryRunStrategy::Server));
        assert_eq!(parse(&["--dry-run=none"]).sweep.dry_run, Some(DryRunStrategy::None));
    }

    #[test]
    fn test_phases_are_repeatable() {
        let cli = parse(&["-A", "--phase", "Failed", "--phase", "succeeded"]);
        assert!(cli.sweep.all_namespaces);
        assert_eq!(cli.sweep.phases, vec![PodPhase::Failed, PodPhase::Succeeded]);
    }

    #[test]
    fn test_subcommands() {
        assert!(matches!(
            parse(&["version", "--client"]).commands,
            Some(Commands::Version { client: true })
        ));
        assert!(matches!(parse(&["default-config"]).commands, Some(Commands::DefaultConfig)));
    }

    #[test]
    fn test_load_config_applies_log_level_override() {
        let path = std::env::temp_dir()
            .join(format!("kubectl-sweep-cli-{}.yaml", std::process::id()));
        std::fs::write(&path, "chunkSize: 7\n").unwrap();
        let path_arg = path.to_string_lossy().into_owned();

        let config = parse(&["--config", path_arg.as_str(), "--log-level", "debug"])
            .load_config()
            .unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.chunk_size, 7);
        assert_eq!(config.log.level, tracing::Level::DEBUG);
    }
}

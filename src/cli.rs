//! CLI interface for DeployKit

use crate::config::load_config;
use crate::logging::{init_logging, LogConfig, LogFormat, LogLevel};
use crate::remote::ssh::SshRemote;
use crate::remote::Remote;
use crate::tasks::{DeployOptions, TaskRunner};
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use tracing::info;

/// DeployKit - Configuration-driven SSH deployment task runner
#[derive(Parser, Debug)]
#[command(name = "deploykit")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Configuration-driven SSH deployment task runner", long_about = None)]
pub struct Cli {
    /// Path to the INI configuration file
    #[arg(short, long, default_value = "env.ini", global = true)]
    pub config: PathBuf,

    /// Target host (repeat for multiple hosts, processed in order)
    #[arg(short = 'H', long = "host", global = true)]
    pub hosts: Vec<String>,

    /// SSH port
    #[arg(long, default_value = "22", global = true)]
    pub port: u16,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,

    /// Log format (pretty or json)
    #[arg(long, default_value = "pretty", global = true)]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Install the project on the remote host
    Install {
        /// Remove the project directory first (destructive)
        #[arg(long)]
        force: bool,
    },

    /// Upload a local file into the remote project directory
    Upload {
        /// Local file path
        #[arg(long)]
        local: PathBuf,

        /// Destination path, relative to the project directory
        #[arg(long)]
        remote: String,
    },

    /// Download a file from the remote project directory
    Download {
        /// Source path, relative to the project directory
        #[arg(long)]
        remote: String,

        /// Local destination path
        #[arg(long)]
        local: PathBuf,
    },

    /// Deploy updates: update code, install, migrate, restart
    Deploy {
        /// Branch to check out and pull
        #[arg(long, default_value = "master")]
        branch: String,

        /// Skip dependency installation
        #[arg(long)]
        no_deps: bool,

        /// Skip database migrations
        #[arg(long)]
        no_migrate: bool,

        /// Collect static assets
        #[arg(long)]
        collectstatic: bool,
    },

    /// Fetch and pull a branch in the remote project directory
    UpdateCode {
        /// Branch to check out and pull
        #[arg(long, default_value = "master")]
        branch: String,
    },

    /// Control a system service on the remote host
    Service {
        /// Service name
        #[arg(long, default_value = "nginx")]
        name: String,

        /// Service action
        #[arg(long, default_value = "restart")]
        action: ServiceAction,
    },
}

/// Actions accepted by the `service` subcommand.
#[derive(Debug, Clone, ValueEnum)]
pub enum ServiceAction {
    Status,
    Start,
    Stop,
    Restart,
}

impl ServiceAction {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceAction::Status => "status",
            ServiceAction::Start => "start",
            ServiceAction::Stop => "stop",
            ServiceAction::Restart => "restart",
        }
    }
}

impl Cli {
    /// Initialize logging based on CLI arguments
    pub fn init_logging(&self) -> anyhow::Result<()> {
        let log_level: LogLevel = self.log_level.as_str().into();
        let log_format = match self.log_format.as_str() {
            "json" => LogFormat::Json,
            _ => LogFormat::Pretty,
        };

        let config = LogConfig {
            level: log_level,
            format: log_format,
        };

        init_logging(&config)
    }

    /// Execute the CLI command against every selected host, in order.
    ///
    /// The first failure aborts the run; remaining hosts are not attempted.
    pub fn execute(&self) -> anyhow::Result<()> {
        let config = load_config(&self.config)?;
        info!("Configuration loaded from {:?}", self.config);

        if self.hosts.is_empty() {
            return Err(anyhow::anyhow!(
                "No target hosts selected. Pass at least one -H/--host."
            ));
        }

        let runner = TaskRunner::new(&config);

        for host in &self.hosts {
            let mut remote =
                SshRemote::connect(host, self.port, &config.username, Some(&config.git_key))?;
            self.run_task(&runner, &mut remote)?;
            info!("Task completed on {}", host);
        }

        Ok(())
    }

    /// Run the selected task against one connected remote
    fn run_task(&self, runner: &TaskRunner, remote: &mut dyn Remote) -> anyhow::Result<()> {
        match &self.command {
            Commands::Install { force } => {
                runner.install(remote, *force)?;
            }
            Commands::Upload { local, remote: rel } => {
                runner.upload(remote, local, rel)?;
            }
            Commands::Download { remote: rel, local } => {
                runner.download(remote, rel, local)?;
            }
            Commands::Deploy {
                branch,
                no_deps,
                no_migrate,
                collectstatic,
            } => {
                let opts = DeployOptions {
                    branch: branch.clone(),
                    migrate: !no_migrate,
                    deps: !no_deps,
                    collectstatic: *collectstatic,
                };
                runner.deploy(remote, &opts)?;
            }
            Commands::UpdateCode { branch } => {
                runner.update_code(remote, branch)?;
            }
            Commands::Service { name, action } => {
                runner.service(remote, name, action.as_str())?;
            }
        }
        Ok(())
    }
}

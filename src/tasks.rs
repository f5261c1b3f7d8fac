//! Deployment task runner
//!
//! Each task is a short, ordered sequence of remote shell commands built from
//! the deployment configuration. There is no retry and no rollback: the first
//! failing command aborts the invocation, leaving the remote host in whatever
//! state the completed prefix produced.
//!
//! # Example
//!
//! ```no_run
//! use deploykit::config::load_config;
//! use deploykit::remote::ssh::SshRemote;
//! use deploykit::tasks::{DeployOptions, TaskRunner};
//!
//! # fn example() -> deploykit::error::Result<()> {
//! let config = load_config("env.ini")?;
//! let mut remote = SshRemote::connect("app1.example.com", 22, &config.username,
//!     Some(&config.git_key))?;
//!
//! let runner = TaskRunner::new(&config);
//! runner.deploy(&mut remote, &DeployOptions::default())?;
//! # Ok(())
//! # }
//! ```

use crate::config::DeployConfig;
use crate::error::{DeployError, Result};
use crate::remote::{sh_quote, Remote, RunOutput};
use tracing::info;

/// Parameters for the `deploy` task
#[derive(Debug, Clone)]
pub struct DeployOptions {
    /// Branch checked out and pulled before anything else
    pub branch: String,
    /// Run database migrations
    pub migrate: bool,
    /// Install dependencies
    pub deps: bool,
    /// Collect static assets
    pub collectstatic: bool,
}

impl Default for DeployOptions {
    fn default() -> Self {
        Self {
            branch: "master".to_string(),
            migrate: true,
            deps: true,
            collectstatic: false,
        }
    }
}

/// Executes deployment tasks against a caller-supplied remote connection
///
/// Borrows the configuration for the duration of a task; holds no connection
/// state of its own. The same runner may be applied to several hosts in turn,
/// each invocation independent of the others.
pub struct TaskRunner<'a> {
    config: &'a DeployConfig,
}

impl<'a> TaskRunner<'a> {
    pub fn new(config: &'a DeployConfig) -> Self {
        Self { config }
    }

    /// Install the project on the remote host.
    ///
    /// With `force`, removes the project directory first. If the directory
    /// already exists (and `force` is false), returns silently: repeated
    /// installs are a no-op. Otherwise creates the directory, clones the
    /// configured repository at depth 1, and installs dependencies with the
    /// virtualenv placed inside the project.
    pub fn install(&self, remote: &mut dyn Remote, force: bool) -> Result<()> {
        let path = sh_quote(&self.config.path);

        if force {
            self.exec(remote, &format!("rm -rf {}", path))?;
        }

        // Exit 0 means the directory is absent
        let probe = remote.run(&format!("[ ! -d {} ]", path))?;
        if !probe.success() {
            return Ok(());
        }

        info!("Installing project into {}", self.config.path);
        self.exec(remote, &format!("mkdir {}", path))?;
        self.exec(
            remote,
            &self.in_project(&format!(
                "git clone -q --depth 1 {} .",
                sh_quote(&self.config.git_repository)
            )),
        )?;
        self.exec(
            remote,
            &self.in_project("export PIPENV_VENV_IN_PROJECT=1 && pipenv install"),
        )?;

        Ok(())
    }

    /// Upload a local file to a path relative to the project directory
    pub fn upload(
        &self,
        remote: &mut dyn Remote,
        local: &std::path::Path,
        relative: &str,
    ) -> Result<()> {
        remote.put(local, &self.remote_path(relative))
    }

    /// Download a path relative to the project directory to a local file
    pub fn download(
        &self,
        remote: &mut dyn Remote,
        relative: &str,
        local: &std::path::Path,
    ) -> Result<()> {
        remote.get(&self.remote_path(relative), local)
    }

    /// Deploy updates to the remote host.
    ///
    /// Strict order: update code, then (optionally) install dependencies,
    /// run migrations, collect static assets, and finally restart the
    /// configured service. Each step is unconditional once reached.
    pub fn deploy(&self, remote: &mut dyn Remote, opts: &DeployOptions) -> Result<()> {
        self.update_code(remote, &opts.branch)?;

        if opts.deps {
            info!("Installing dependencies");
            self.exec(remote, &self.in_project("pipenv install"))?;
        }
        if opts.migrate {
            info!("Migrating database");
            self.exec(remote, &self.in_project("pipenv run python manage.py migrate"))?;
        }
        if opts.collectstatic {
            info!("Running collectstatic");
            self.exec(
                remote,
                &self.in_project("pipenv run python manage.py collectstatic"),
            )?;
        }

        self.service(remote, &self.config.systemd_service, "restart")
    }

    /// Fetch, check out, and pull the given branch inside the project directory
    pub fn update_code(&self, remote: &mut dyn Remote, branch: &str) -> Result<()> {
        info!("Updating code to branch {}", branch);
        let branch = sh_quote(branch);
        self.exec(
            remote,
            &self.in_project(&format!(
                "git fetch origin && git checkout {} && git pull origin {}",
                branch, branch
            )),
        )?;
        Ok(())
    }

    /// Control a system service: status, start, stop, or restart
    pub fn service(&self, remote: &mut dyn Remote, name: &str, action: &str) -> Result<()> {
        info!("Service {}: {}", name, action);
        self.exec(
            remote,
            &format!("sudo service {} {}", sh_quote(name), sh_quote(action)),
        )?;
        Ok(())
    }

    /// Run a command, treating a non-zero exit as a task-aborting failure
    fn exec(&self, remote: &mut dyn Remote, command: &str) -> Result<RunOutput> {
        let output = remote.run(command)?;
        if !output.success() {
            return Err(DeployError::CommandFailed {
                command: command.to_string(),
                exit_code: output.exit_code,
            });
        }
        Ok(output)
    }

    /// Scope a command to the project directory
    fn in_project(&self, command: &str) -> String {
        format!("cd {} && {}", sh_quote(&self.config.path), command)
    }

    /// Absolute remote path for a project-relative path
    fn remote_path(&self, relative: &str) -> String {
        format!("{}/{}", self.config.path, relative)
    }
}

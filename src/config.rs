//! Deployment configuration loaded from a static INI file
//!
//! Configuration lives in a `[deploy]` section of an INI file (default
//! `env.ini`) and is loaded exactly once at process start. The resulting
//! [`DeployConfig`] is an explicit value passed into every task invocation
//! rather than ambient global state, so tests can inject alternates.
//!
//! # Example
//!
//! ```ini
//! [deploy]
//! systemd_service = logbook
//! username = deploy
//! path = /srv/logbook
//! git_repository = git@github.com:example/logbook.git
//! git_key = /home/deploy/.ssh/id_rsa
//! ```

use crate::error::{DeployError, Result};
use config::{Config, File, FileFormat};
use serde::Deserialize;
use std::path::Path;

/// Deployment settings from the `[deploy]` section
///
/// All fields are required and must be non-empty; an absent or empty field
/// is a fatal startup error, raised before any task runs.
#[derive(Debug, Clone, Deserialize)]
pub struct DeployConfig {
    /// Systemd service restarted at the end of a deploy
    pub systemd_service: String,
    /// Remote user for the SSH connection
    pub username: String,
    /// Absolute project path on the remote host
    pub path: String,
    /// Source repository cloned during install
    pub git_repository: String,
    /// Path to the SSH private key used for authentication
    pub git_key: String,
}

impl DeployConfig {
    /// Verify that every field carries a non-empty value
    pub fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("systemd_service", &self.systemd_service),
            ("username", &self.username),
            ("path", &self.path),
            ("git_repository", &self.git_repository),
            ("git_key", &self.git_key),
        ] {
            if value.is_empty() {
                return Err(DeployError::EmptyConfigValue { key });
            }
        }
        Ok(())
    }
}

/// Load and validate deployment configuration from an INI file.
///
/// # Arguments
///
/// * `path` - Path to the INI configuration file
///
/// # Errors
///
/// * `DeployError::Config` - If the file cannot be read or a key is missing
/// * `DeployError::EmptyConfigValue` - If a key is present but empty
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<DeployConfig> {
    let settings = Config::builder()
        .add_source(File::from(path.as_ref()).format(FileFormat::Ini))
        .build()?;

    let deploy: DeployConfig = settings.get("deploy")?;
    deploy.validate()?;

    Ok(deploy)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_ini(content: &str) -> NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".ini").tempfile().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file.flush().unwrap();
        file
    }

    const VALID_INI: &str = r#"
[deploy]
systemd_service = logbook
username = deploy
path = /srv/logbook
git_repository = git@github.com:example/logbook.git
git_key = /home/deploy/.ssh/id_rsa
"#;

    #[test]
    fn test_load_valid_config() {
        let file = write_ini(VALID_INI);
        let config = load_config(file.path()).unwrap();

        assert_eq!(config.systemd_service, "logbook");
        assert_eq!(config.username, "deploy");
        assert_eq!(config.path, "/srv/logbook");
        assert_eq!(config.git_repository, "git@github.com:example/logbook.git");
        assert_eq!(config.git_key, "/home/deploy/.ssh/id_rsa");
    }

    #[test]
    fn test_missing_file_is_fatal() {
        let result = load_config("/nonexistent/env.ini");
        assert!(matches!(result, Err(DeployError::Config(_))));
    }

    #[test]
    fn test_missing_key_is_fatal() {
        let file = write_ini(
            r#"
[deploy]
systemd_service = logbook
username = deploy
path = /srv/logbook
git_repository = git@github.com:example/logbook.git
"#,
        );
        let result = load_config(file.path());
        assert!(matches!(result, Err(DeployError::Config(_))));
    }

    #[test]
    fn test_missing_section_is_fatal() {
        let file = write_ini("[other]\nkey = value\n");
        let result = load_config(file.path());
        assert!(result.is_err());
    }

    #[test]
    fn test_empty_value_is_fatal() {
        let config = DeployConfig {
            systemd_service: "logbook".to_string(),
            username: String::new(),
            path: "/srv/logbook".to_string(),
            git_repository: "git@github.com:example/logbook.git".to_string(),
            git_key: "/home/deploy/.ssh/id_rsa".to_string(),
        };
        let result = config.validate();
        assert!(matches!(
            result,
            Err(DeployError::EmptyConfigValue { key: "username" })
        ));
    }
}

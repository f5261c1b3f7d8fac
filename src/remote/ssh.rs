//! SSH transport for remote command execution and file transfer
//!
//! Key-based authentication only, no password support. Each process run opens
//! one connection per target host and keeps it for the duration of the task
//! invocation; there is no pooling and no reconnect.

use crate::error::{DeployError, Result};
use crate::remote::{truncate_output, Remote, RunOutput, MAX_COMMAND_LEN};
use ssh2::Session;
use std::fs;
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::path::Path;
use std::time::Duration;
use tracing::{debug, info, warn};

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);
const STREAM_TIMEOUT: Duration = Duration::from_secs(30);

/// One authenticated SSH connection to a target host
pub struct SshRemote {
    host: String,
    session: Session,
}

impl SshRemote {
    /// Connect and authenticate to `host:port` as `user` with a private key.
    ///
    /// Hostname resolution uses the system resolver; the first resolved
    /// address is used. Falls back to `$HOME/.ssh/id_rsa` when `key_path`
    /// is `None`.
    ///
    /// # Errors
    ///
    /// * `DeployError::Validation` - Unresolvable host or missing key file
    /// * `DeployError::Ssh` - Connect, handshake, or authentication failure
    pub fn connect(host: &str, port: u16, user: &str, key_path: Option<&str>) -> Result<Self> {
        let target = format!("{}:{}", host, port);
        debug!("Creating SSH session to {}", target);

        let addr = target
            .to_socket_addrs()
            .map_err(|e| DeployError::Validation(format!("Cannot resolve {}: {}", target, e)))?
            .next()
            .ok_or_else(|| {
                DeployError::Validation(format!("No addresses resolved for {}", target))
            })?;

        let tcp = TcpStream::connect_timeout(&addr, CONNECT_TIMEOUT).map_err(|e| {
            DeployError::Ssh {
                host: host.to_string(),
                message: format!("Failed to connect: {}", e),
            }
        })?;
        tcp.set_read_timeout(Some(STREAM_TIMEOUT))
            .map_err(DeployError::Io)?;
        tcp.set_write_timeout(Some(STREAM_TIMEOUT))
            .map_err(DeployError::Io)?;

        let mut session = Session::new().map_err(|e| DeployError::Ssh {
            host: host.to_string(),
            message: format!("Failed to create SSH session: {}", e),
        })?;

        session.set_tcp_stream(tcp);
        session.handshake().map_err(|e| DeployError::Ssh {
            host: host.to_string(),
            message: format!("SSH handshake failed: {}", e),
        })?;

        // Key-based authentication only
        let default_key = std::env::var("HOME")
            .ok()
            .map(|home| format!("{}/.ssh/id_rsa", home));
        let key_path = key_path
            .map(str::to_string)
            .or(default_key)
            .ok_or_else(|| DeployError::Ssh {
                host: host.to_string(),
                message: "No SSH key path specified and default key not found".to_string(),
            })?;

        if !Path::new(&key_path).exists() {
            return Err(DeployError::Validation(format!(
                "SSH key file not found: {}",
                key_path
            )));
        }

        debug!("Authenticating with key: {}", key_path);
        session
            .userauth_pubkey_file(user, None, Path::new(&key_path), None)
            .map_err(|e| DeployError::Ssh {
                host: host.to_string(),
                message: format!("Authentication failed: {}", e),
            })?;

        if !session.authenticated() {
            return Err(DeployError::Ssh {
                host: host.to_string(),
                message: "Authentication failed".to_string(),
            });
        }

        info!("SSH session established to {}", target);

        Ok(Self {
            host: host.to_string(),
            session,
        })
    }

    fn ssh_err(&self, message: String) -> DeployError {
        DeployError::Ssh {
            host: self.host.clone(),
            message,
        }
    }
}

impl Remote for SshRemote {
    fn run(&mut self, command: &str) -> Result<RunOutput> {
        if command.is_empty() {
            return Err(DeployError::Validation(
                "Remote command cannot be empty".to_string(),
            ));
        }
        if command.len() > MAX_COMMAND_LEN {
            return Err(DeployError::CommandTooLong {
                limit: MAX_COMMAND_LEN,
            });
        }

        debug!("Executing command on {}: {}", self.host, command);

        let mut channel = self
            .session
            .channel_session()
            .map_err(|e| self.ssh_err(format!("Failed to open channel: {}", e)))?;

        channel
            .exec(command)
            .map_err(|e| self.ssh_err(format!("Failed to execute command: {}", e)))?;

        let mut stdout = String::new();
        channel
            .read_to_string(&mut stdout)
            .map_err(|e| self.ssh_err(format!("Failed to read stdout: {}", e)))?;

        let mut stderr = String::new();
        channel
            .stderr()
            .read_to_string(&mut stderr)
            .map_err(|e| self.ssh_err(format!("Failed to read stderr: {}", e)))?;

        channel
            .wait_close()
            .map_err(|e| self.ssh_err(format!("Failed to close channel: {}", e)))?;

        let exit_code = channel
            .exit_status()
            .map_err(|e| self.ssh_err(format!("Failed to get exit status: {}", e)))?;

        let (stdout, stdout_truncated) = truncate_output(&stdout);
        let (stderr, stderr_truncated) = truncate_output(&stderr);
        let truncated = stdout_truncated || stderr_truncated;

        if truncated {
            warn!("Output truncated for command on {}", self.host);
        }

        debug!("Command exit code: {}", exit_code);

        Ok(RunOutput {
            exit_code,
            stdout,
            stderr,
            truncated,
        })
    }

    fn put(&mut self, local: &Path, remote_path: &str) -> Result<()> {
        info!(
            "Uploading {} to {}:{}",
            local.display(),
            self.host,
            remote_path
        );

        let data = fs::read(local).map_err(DeployError::Io)?;

        let sftp = self
            .session
            .sftp()
            .map_err(|e| self.ssh_err(format!("Failed to open SFTP session: {}", e)))?;

        let mut file = sftp
            .create(Path::new(remote_path))
            .map_err(|e| self.ssh_err(format!("Failed to create {}: {}", remote_path, e)))?;

        file.write_all(&data)
            .map_err(|e| self.ssh_err(format!("Failed to write {}: {}", remote_path, e)))?;

        Ok(())
    }

    fn get(&mut self, remote_path: &str, local: &Path) -> Result<()> {
        info!(
            "Downloading {}:{} to {}",
            self.host,
            remote_path,
            local.display()
        );

        let sftp = self
            .session
            .sftp()
            .map_err(|e| self.ssh_err(format!("Failed to open SFTP session: {}", e)))?;

        let mut file = sftp
            .open(Path::new(remote_path))
            .map_err(|e| self.ssh_err(format!("Failed to open {}: {}", remote_path, e)))?;

        let mut data = Vec::new();
        file.read_to_end(&mut data)
            .map_err(|e| self.ssh_err(format!("Failed to read {}: {}", remote_path, e)))?;

        fs::write(local, data).map_err(DeployError::Io)?;

        Ok(())
    }

    fn host(&self) -> &str {
        &self.host
    }
}

// Integration tests with actual SSH connections would require a test SSH
// server; command-construction coverage lives in the task runner tests
// against a recording double.

use crate::domain::ports::ServiceRestarter;
use crate::utils::error::{RenewError, Result};
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncReadExt;

pub const DEFAULT_RESTART_COMMAND: [&str; 3] = ["systemctl", "restart", "nginx"];
pub const DEFAULT_RESTART_TIMEOUT: Duration = Duration::from_secs(30);

/// Runs a restart command; any stderr output counts as failure.
#[derive(Debug, Clone)]
pub struct CommandRestarter {
    program: String,
    args: Vec<String>,
    timeout: Duration,
}

impl CommandRestarter {
    pub fn new(command: &[String], timeout: Duration) -> Result<Self> {
        let (program, args) = command.split_first().ok_or_else(|| RenewError::ConfigError {
            message: "restart command is empty".to_string(),
        })?;
        Ok(Self {
            program: program.clone(),
            args: args.to_vec(),
            timeout,
        })
    }

    fn display(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

#[async_trait]
impl ServiceRestarter for CommandRestarter {
    async fn restart(&self) -> Result<()> {
        let command = self.display();
        tracing::info!("Running: {}", command);

        let mut child = tokio::process::Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| RenewError::RestartError {
                message: format!("failed to spawn {}: {}", self.program, e),
            })?;

        let mut stdout_handle = child.stdout.take();
        let mut stderr_handle = child.stderr.take();

        let (status, stdout, stderr) = tokio::select! {
            result = async {
                tokio::join!(
                    child.wait(),
                    async {
                        let mut buf = Vec::new();
                        if let Some(ref mut h) = stdout_handle {
                            h.read_to_end(&mut buf).await?;
                        }
                        Ok::<_, std::io::Error>(buf)
                    },
                    async {
                        let mut buf = Vec::new();
                        if let Some(ref mut h) = stderr_handle {
                            h.read_to_end(&mut buf).await?;
                        }
                        Ok::<_, std::io::Error>(buf)
                    },
                )
            } => result,
            () = tokio::time::sleep(self.timeout) => {
                tracing::warn!("Command timed out: {}", command);
                let _ = child.kill().await;
                return Err(RenewError::TimeoutError {
                    operation: command,
                    seconds: self.timeout.as_secs(),
                });
            }
        };

        let status = status?;
        let stdout = captured("stdout", &command, stdout)?;
        let stderr = captured("stderr", &command, stderr)?;
        if !stdout.is_empty() {
            tracing::debug!("{} stdout: {}", command, String::from_utf8_lossy(&stdout).trim());
        }

        if !status.success() {
            return Err(RenewError::RestartError {
                message: format!(
                    "{} exited with {}: {}",
                    command,
                    status,
                    String::from_utf8_lossy(&stderr).trim()
                ),
            });
        }

        if !stderr.is_empty() {
            return Err(RenewError::RestartError {
                message: String::from_utf8_lossy(&stderr).trim().to_string(),
            });
        }

        Ok(())
    }
}

/// A stream that cannot be read fails the restart.
fn captured(stream: &str, command: &str, read: std::io::Result<Vec<u8>>) -> Result<Vec<u8>> {
    read.map_err(|e| RenewError::RestartError {
        message: format!("reading {} of {}: {}", stream, command, e),
    })
}

#[cfg(test)]
mod capture_tests {
    use super::*;

    #[test]
    fn test_stream_read_error_fails_restart() {
        let read = Err(std::io::Error::new(std::io::ErrorKind::InvalidData, "broken pipe"));
        match captured("stderr", "systemctl restart nginx", read) {
            Err(RenewError::RestartError { message }) => {
                assert!(message.contains("stderr"));
                assert!(message.contains("broken pipe"));
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn test_stream_contents_pass_through() {
        let out = captured("stdout", "true", Ok(b"ok".to_vec())).unwrap();
        assert_eq!(out, b"ok");
    }
}

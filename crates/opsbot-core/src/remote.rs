//! Remote command gateway: runs read-only shell commands on the monitored
//! host over SSH.
//!
//! The gateway never returns `Err`: connection, authentication and execution
//! failures all come back as a [`RemoteCommandResult`] with `succeeded ==
//! false` so the dispatcher can reply and move on.

use std::{
    io::Read,
    net::{TcpStream, ToSocketAddrs},
    sync::Arc,
    time::Duration,
};

use async_trait::async_trait;
use ssh2::Session;
use tokio::sync::Semaphore;

use crate::{config::Config, formatting};

/// Sentinel reply for a command that produced no output on either stream.
pub const NO_DATA: &str = "No data";

const ERROR_DETAIL_LIMIT: usize = 150;

/// Outcome of one remote command. Failures travel as data, not errors.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RemoteCommandResult {
    pub output: String,
    pub succeeded: bool,
    pub error_detail: Option<String>,
}

impl RemoteCommandResult {
    pub fn ok(output: String) -> Self {
        Self {
            output,
            succeeded: true,
            error_detail: None,
        }
    }

    pub fn failed(detail: impl Into<String>) -> Self {
        let detail = formatting::clip(&detail.into(), ERROR_DETAIL_LIMIT);
        Self {
            output: String::new(),
            succeeded: false,
            error_detail: Some(detail),
        }
    }

    /// Text shown to the user, already capped at the reply limit.
    pub fn user_text(&self) -> String {
        if self.succeeded {
            formatting::truncate_reply(&self.output)
        } else {
            let detail = self.error_detail.as_deref().unwrap_or("unknown error");
            format!("Command failed: {detail}")
        }
    }
}

#[async_trait]
pub trait RemoteGateway: Send + Sync {
    async fn execute(&self, command: &str) -> RemoteCommandResult;
}

/// SSH executor. One fresh session per command, bounded by a semaphore so a
/// burst of chats cannot pile unbounded connections onto the host.
pub struct RemoteExec {
    host: String,
    port: u16,
    user: String,
    password: String,
    timeout: Duration,
    limit: Arc<Semaphore>,
}

impl RemoteExec {
    pub fn new(cfg: &Config) -> Self {
        Self {
            host: cfg.remote_host.clone(),
            port: cfg.remote_port,
            user: cfg.remote_user.clone(),
            password: cfg.remote_password.clone(),
            timeout: cfg.ssh_timeout,
            limit: Arc::new(Semaphore::new(cfg.remote_max_concurrency)),
        }
    }
}

#[async_trait]
impl RemoteGateway for RemoteExec {
    async fn execute(&self, command: &str) -> RemoteCommandResult {
        let _permit = match self.limit.clone().acquire_owned().await {
            Ok(permit) => permit,
            Err(_) => return RemoteCommandResult::failed("remote limiter closed"),
        };

        let host = self.host.clone();
        let port = self.port;
        let user = self.user.clone();
        let password = self.password.clone();
        let timeout = self.timeout;
        let command = command.to_string();

        // libssh2 is blocking; keep it off the async runtime.
        let joined = tokio::task::spawn_blocking(move || {
            exec_blocking(&host, port, &user, &password, timeout, &command)
        })
        .await;

        match joined {
            Ok(result) => result,
            Err(e) => {
                tracing::error!("remote exec task failed: {e}");
                RemoteCommandResult::failed("remote exec task failed")
            }
        }
    }
}

fn exec_blocking(
    host: &str,
    port: u16,
    user: &str,
    password: &str,
    timeout: Duration,
    command: &str,
) -> RemoteCommandResult {
    match exec_inner(host, port, user, password, timeout, command) {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!("remote command failed: {e}");
            RemoteCommandResult::failed(e)
        }
    }
}

fn exec_inner(
    host: &str,
    port: u16,
    user: &str,
    password: &str,
    timeout: Duration,
    command: &str,
) -> Result<RemoteCommandResult, String> {
    let addr = format!("{host}:{port}")
        .to_socket_addrs()
        .map_err(|e| format!("resolve {host}:{port}: {e}"))?
        .next()
        .ok_or_else(|| format!("no address for {host}:{port}"))?;

    let stream =
        TcpStream::connect_timeout(&addr, timeout).map_err(|e| format!("connect: {e}"))?;
    stream
        .set_read_timeout(Some(timeout))
        .and_then(|_| stream.set_write_timeout(Some(timeout)))
        .map_err(|e| format!("socket timeout: {e}"))?;

    let mut session = Session::new().map_err(|e| format!("session: {e}"))?;
    session.set_tcp_stream(stream);
    session.set_timeout(timeout.as_millis() as u32);
    session.handshake().map_err(|e| format!("handshake: {e}"))?;
    session
        .userauth_password(user, password)
        .map_err(|e| format!("auth: {e}"))?;

    let mut channel = session
        .channel_session()
        .map_err(|e| format!("channel: {e}"))?;
    channel.exec(command).map_err(|e| format!("exec: {e}"))?;

    let mut stdout = Vec::new();
    channel
        .read_to_end(&mut stdout)
        .map_err(|e| format!("read stdout: {e}"))?;
    let mut stderr = Vec::new();
    channel
        .stderr()
        .read_to_end(&mut stderr)
        .map_err(|e| format!("read stderr: {e}"))?;
    let _ = channel.wait_close();

    // Prefer stdout, fall back to stderr, then the no-output sentinel.
    let stdout = String::from_utf8_lossy(&stdout).trim().to_string();
    let stderr = String::from_utf8_lossy(&stderr).trim().to_string();
    let output = if !stdout.is_empty() {
        stdout
    } else if !stderr.is_empty() {
        stderr
    } else {
        NO_DATA.to_string()
    };

    Ok(RemoteCommandResult::ok(formatting::truncate_reply(&output)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formatting::REPLY_LIMIT;

    #[test]
    fn failed_detail_is_bounded() {
        let result = RemoteCommandResult::failed("e".repeat(500));
        assert!(!result.succeeded);
        assert_eq!(result.error_detail.as_ref().unwrap().chars().count(), 150);
        assert!(result.user_text().starts_with("Command failed: "));
    }

    #[test]
    fn user_text_is_capped() {
        let result = RemoteCommandResult::ok("x".repeat(REPLY_LIMIT + 1000));
        let text = result.user_text();
        assert_eq!(text.chars().count(), REPLY_LIMIT);
        assert!(text.ends_with("..."));
    }

    #[test]
    fn short_output_passes_through() {
        let result = RemoteCommandResult::ok("up 3 days".to_string());
        assert_eq!(result.user_text(), "up 3 days");
    }
}

//! Line-oriented channels to a move-search engine.

use std::process::Stdio;
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, Lines};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::mpsc;

use crate::protocol::EngineCommand;
use crate::EngineError;

const SHUTDOWN_TIMEOUT: Duration = Duration::from_secs(2);

/// A bidirectional text channel to an engine, one line per message.
#[async_trait]
pub trait EngineTransport: Send {
    async fn send_line(&mut self, line: &str) -> Result<(), EngineError>;

    /// Next line of engine output; `None` once the engine has closed it.
    async fn recv_line(&mut self) -> Result<Option<String>, EngineError>;

    /// Releases the engine. Further sends fail with [`EngineError::Closed`].
    async fn close(&mut self);
}

/// An engine running as a child process speaking UCI over stdio.
pub struct ProcessTransport {
    child: Child,
    stdin: Option<ChildStdin>,
    stdout: Lines<BufReader<ChildStdout>>,
}

impl ProcessTransport {
    pub fn spawn(command: &str, args: &[String]) -> Result<Self, EngineError> {
        let spawn_error = |source| EngineError::Spawn {
            command: command.to_string(),
            source,
        };

        let mut child = Command::new(command)
            .args(args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::null())
            .kill_on_drop(true)
            .spawn()
            .map_err(spawn_error)?;

        let stdin = child.stdin.take().ok_or(EngineError::Closed)?;
        let stdout = child.stdout.take().ok_or(EngineError::Closed)?;
        tracing::info!(command, pid = child.id(), "engine process started");

        Ok(Self {
            child,
            stdin: Some(stdin),
            stdout: BufReader::new(stdout).lines(),
        })
    }
}

#[async_trait]
impl EngineTransport for ProcessTransport {
    async fn send_line(&mut self, line: &str) -> Result<(), EngineError> {
        let stdin = self.stdin.as_mut().ok_or(EngineError::Closed)?;
        stdin.write_all(line.as_bytes()).await?;
        stdin.write_all(b"\n").await?;
        stdin.flush().await?;
        Ok(())
    }

    async fn recv_line(&mut self) -> Result<Option<String>, EngineError> {
        Ok(self.stdout.next_line().await?)
    }

    async fn close(&mut self) {
        if let Some(mut stdin) = self.stdin.take() {
            let quit = format!("{}\n", EngineCommand::Quit);
            let _ = stdin.write_all(quit.as_bytes()).await;
            let _ = stdin.flush().await;
        }
        match tokio::time::timeout(SHUTDOWN_TIMEOUT, self.child.wait()).await {
            Ok(Ok(status)) => tracing::debug!(%status, "engine process exited"),
            _ => {
                tracing::warn!("engine process did not exit after quit, killing it");
                let _ = self.child.kill().await;
            }
        }
    }
}

/// In-memory transport. The paired [`EngineEndpoint`] plays the engine,
/// which makes it suitable for in-process engines and scripted tests.
pub struct ChannelTransport {
    to_engine: Option<mpsc::UnboundedSender<String>>,
    from_engine: mpsc::UnboundedReceiver<String>,
}

/// The engine's side of a [`ChannelTransport`].
pub struct EngineEndpoint {
    from_client: mpsc::UnboundedReceiver<String>,
    to_client: mpsc::UnboundedSender<String>,
}

impl ChannelTransport {
    pub fn pair() -> (Self, EngineEndpoint) {
        let (to_engine, from_client) = mpsc::unbounded_channel();
        let (to_client, from_engine) = mpsc::unbounded_channel();
        (
            Self {
                to_engine: Some(to_engine),
                from_engine,
            },
            EngineEndpoint {
                from_client,
                to_client,
            },
        )
    }
}

#[async_trait]
impl EngineTransport for ChannelTransport {
    async fn send_line(&mut self, line: &str) -> Result<(), EngineError> {
        let sender = self.to_engine.as_ref().ok_or(EngineError::Closed)?;
        sender
            .send(line.to_string())
            .map_err(|_| EngineError::Closed)
    }

    async fn recv_line(&mut self) -> Result<Option<String>, EngineError> {
        Ok(self.from_engine.recv().await)
    }

    async fn close(&mut self) {
        self.to_engine = None;
        self.from_engine.close();
    }
}

impl EngineEndpoint {
    /// Next line sent by the client; `None` once the client is gone.
    pub async fn recv(&mut self) -> Option<String> {
        self.from_client.recv().await
    }

    /// Sends a line to the client. Returns false if the client is gone.
    pub fn send(&self, line: impl Into<String>) -> bool {
        self.to_client.send(line.into()).is_ok()
    }

    /// Answers the UCI handshake: waits for `uci`, `ucinewgame` and
    /// `isready`, replying `uciok` and `readyok`.
    pub async fn accept_handshake(&mut self) -> bool {
        while let Some(line) = self.recv().await {
            match line.as_str() {
                "uci" => {
                    self.send("id name scripted");
                    self.send("uciok");
                }
                "isready" => return self.send("readyok"),
                _ => {}
            }
        }
        false
    }

    /// Waits for a `position` + `go` pair and returns both lines.
    pub async fn next_search(&mut self) -> Option<(String, String)> {
        let mut position = None;
        while let Some(line) = self.recv().await {
            if line.starts_with("position") {
                position = Some(line);
            } else if line.starts_with("go") {
                return position.map(|p| (p, line));
            }
        }
        None
    }
}

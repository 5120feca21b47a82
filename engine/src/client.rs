use std::time::Duration;

use quizchess_core::Move;

use crate::protocol::{EngineCommand, EngineLine};
use crate::transport::EngineTransport;
use crate::EngineError;

/// Default bound on any single wait for engine output.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Speaks UCI to one engine over a transport.
///
/// Requests are strictly sequential: each method sends its commands and
/// consumes engine output up to the line that answers them.
pub struct UciClient<T> {
    transport: T,
    timeout: Duration,
}

impl<T: EngineTransport> UciClient<T> {
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// `uci` → `uciok`, then `ucinewgame`, then `isready` → `readyok`.
    pub async fn handshake(&mut self) -> Result<(), EngineError> {
        self.send(EngineCommand::Uci).await?;
        self.read_until(|line| (line == EngineLine::UciOk).then_some(()))
            .await?;
        self.send(EngineCommand::UciNewGame).await?;
        self.send(EngineCommand::IsReady).await?;
        self.read_until(|line| (line == EngineLine::ReadyOk).then_some(()))
            .await?;
        tracing::debug!("engine handshake complete");
        Ok(())
    }

    /// Searches `fen` to `depth` plies. `Ok(None)` means the engine reported
    /// no move (or an unreadable one).
    pub async fn request_move(&mut self, fen: &str, depth: u8) -> Result<Option<Move>, EngineError> {
        self.send(EngineCommand::Position {
            fen: fen.to_string(),
        })
        .await?;
        self.send(EngineCommand::Go { depth }).await?;
        self.read_until(|line| match line {
            EngineLine::BestMove(mv) => Some(mv),
            _ => None,
        })
        .await
    }

    /// Interrupts a search that outlived its timeout and consumes its
    /// `bestmove`, so the next request reads only its own reply.
    pub async fn stop_search(&mut self) -> Result<(), EngineError> {
        self.send(EngineCommand::Stop).await?;
        self.read_until(|line| matches!(line, EngineLine::BestMove(_)).then_some(()))
            .await?;
        tracing::debug!("abandoned search stopped");
        Ok(())
    }

    /// Tells the engine to quit and releases the transport.
    pub async fn quit(mut self) {
        self.transport.close().await;
    }

    async fn send(&mut self, command: EngineCommand) -> Result<(), EngineError> {
        let line = command.to_string();
        tracing::debug!(%line, "-> engine");
        self.transport.send_line(&line).await
    }

    async fn read_until<R>(
        &mut self,
        mut accept: impl FnMut(EngineLine) -> Option<R> + Send,
    ) -> Result<R, EngineError> {
        let limit = self.timeout;
        let transport = &mut self.transport;
        let wait = async move {
            loop {
                let Some(line) = transport.recv_line().await? else {
                    return Err(EngineError::Closed);
                };
                tracing::trace!(%line, "<- engine");
                if let Some(result) = accept(EngineLine::parse(&line)) {
                    return Ok(result);
                }
            }
        };
        tokio::time::timeout(limit, wait)
            .await
            .map_err(|_| EngineError::Timeout(limit))?
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::ChannelTransport;

    #[tokio::test]
    async fn test_handshake() {
        let (transport, mut endpoint) = ChannelTransport::pair();
        let engine = tokio::spawn(async move {
            let ok = endpoint.accept_handshake().await;
            (ok, endpoint)
        });

        let mut client = UciClient::new(transport);
        client.handshake().await.unwrap();
        let (ok, _endpoint) = engine.await.unwrap();
        assert!(ok);
    }

    #[tokio::test]
    async fn test_request_move_skips_info() {
        let (transport, mut endpoint) = ChannelTransport::pair();
        let engine = tokio::spawn(async move {
            let (position, go) = endpoint.next_search().await.unwrap();
            endpoint.send("info depth 1 score cp 10 pv e7e5");
            endpoint.send("bestmove e7e5 ponder g1f3");
            (position, go)
        });

        let mut client = UciClient::new(transport);
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        let mv = client.request_move(fen, 4).await.unwrap();
        assert_eq!(mv.map(|m| m.to_string()), Some("e7e5".to_string()));

        let (position, go) = engine.await.unwrap();
        assert_eq!(position, format!("position fen {fen}"));
        assert_eq!(go, "go depth 4");
    }

    #[tokio::test]
    async fn test_no_move_reply() {
        let (transport, mut endpoint) = ChannelTransport::pair();
        tokio::spawn(async move {
            endpoint.next_search().await;
            endpoint.send("bestmove (none)");
            endpoint
        });

        let mut client = UciClient::new(transport);
        let mv = client.request_move("7k/8/8/8/8/8/8/K7 w - - 0 1", 1).await.unwrap();
        assert_eq!(mv, None);
    }

    #[tokio::test]
    async fn test_engine_hangup() {
        let (transport, endpoint) = ChannelTransport::pair();
        drop(endpoint);
        let mut client = UciClient::new(transport);
        assert!(matches!(
            client.request_move("8/8/8/8/8/8/8/8 w - - 0 1", 1).await,
            Err(EngineError::Closed)
        ));
    }

    #[tokio::test]
    async fn test_stop_search_resynchronizes() {
        let (transport, mut endpoint) = ChannelTransport::pair();
        let engine = tokio::spawn(async move {
            endpoint.next_search().await;
            // Only answers once told to stop.
            while let Some(line) = endpoint.recv().await {
                if line == "stop" {
                    endpoint.send("bestmove e7e5");
                    break;
                }
            }
            endpoint.next_search().await;
            endpoint.send("bestmove d7d5");
            endpoint
        });

        let mut client = UciClient::new(transport).with_timeout(Duration::from_millis(100));
        let fen = "rnbqkbnr/pppppppp/8/8/4P3/8/PPPP1PPP/RNBQKBNR b KQkq - 0 1";
        assert!(matches!(
            client.request_move(fen, 20).await,
            Err(EngineError::Timeout(_))
        ));
        client.stop_search().await.unwrap();

        let mv = client.request_move(fen, 2).await.unwrap();
        assert_eq!(mv.map(|m| m.to_string()), Some("d7d5".to_string()));
        let _endpoint = engine.await.unwrap();
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout() {
        let (transport, _endpoint) = ChannelTransport::pair();
        let mut client = UciClient::new(transport).with_timeout(Duration::from_millis(50));
        assert!(matches!(
            client.handshake().await,
            Err(EngineError::Timeout(_))
        ));
    }
}

//! Async match driver: one [`Session`], one engine worker, and background
//! score persistence.
//!
//! The worker task owns the engine client. The driver sends it at most one
//! search job at a time and keeps the matching reply receiver next to the
//! ticket the session issued, so a reply can only ever be applied to the
//! request it answers. Dropping or closing the driver stops the worker,
//! which closes the engine.

use std::sync::Arc;
use std::time::Duration;

use quizchess_core::{Catalog, Move, Promotion, RulesAuthority, Square, StandardRules};
use quizchess_engine::{EngineError, EngineTransport, ProcessTransport, UciClient};
use rand::Rng;
use rand_chacha::ChaCha8Rng;
use tokio::runtime::Handle;
use tokio::sync::{mpsc, oneshot};
use tokio::task::JoinHandle;

use crate::config::{Config, ConfigError};
use crate::leaderboard::{qualifies, Leaderboard, LeaderboardError, ScoreRecord};
use crate::session::{AnswerEffect, EngineRequest, MoveEffect, ReplyEffect, Rejection, Session};

/// How long `close` waits for the engine to quit before aborting the worker.
const CLOSE_GRACE: Duration = Duration::from_secs(3);

type EngineReply = Result<Option<Move>, EngineError>;

struct EngineJob {
    fen: String,
    depth: u8,
    reply: oneshot::Sender<EngineReply>,
}

struct PendingReply {
    ticket: u64,
    reply: oneshot::Receiver<EngineReply>,
}

/// State of the score submission started when the session ends.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PersistenceStatus {
    /// The session is still running.
    Idle,
    Pending,
    Submitted,
    /// The score did not make the top list and was not submitted.
    NotQualified,
    /// Inline notice describing what went wrong.
    Failed(String),
}

#[derive(Debug, thiserror::Error)]
pub enum StartError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error(transparent)]
    Engine(#[from] EngineError),
    #[error(transparent)]
    Leaderboard(#[from] LeaderboardError),
}

pub struct Match<R, G> {
    session: Session<R, G>,
    jobs: Option<mpsc::Sender<EngineJob>>,
    worker: Option<JoinHandle<()>>,
    pending: Option<PendingReply>,
    leaderboard: Arc<dyn Leaderboard>,
    top_n: usize,
    runtime: Handle,
    persistence: Option<oneshot::Receiver<PersistenceStatus>>,
    status: PersistenceStatus,
}

impl Match<StandardRules, ChaCha8Rng> {
    /// Starts a match from configuration with a subprocess engine.
    pub async fn launch(config: &Config, catalog: &Catalog) -> Result<Self, StartError> {
        let settings = config.session_settings()?;
        let leaderboard = config.leaderboard.build()?;
        let session = Session::new(StandardRules::new(), catalog, settings, config.rng());
        let transport = ProcessTransport::spawn(&config.engine.command, &config.engine.args)?;
        let started = Self::start(
            session,
            transport,
            config.engine.timeout(),
            leaderboard,
            config.leaderboard.top_n,
        )
        .await?;
        Ok(started)
    }
}

impl<R: RulesAuthority, G: Rng> Match<R, G> {
    /// Completes the engine handshake and starts the worker. Must be called
    /// inside a tokio runtime.
    pub async fn start<T: EngineTransport + 'static>(
        session: Session<R, G>,
        transport: T,
        timeout: Duration,
        leaderboard: Arc<dyn Leaderboard>,
        top_n: usize,
    ) -> Result<Self, EngineError> {
        let mut client = UciClient::new(transport).with_timeout(timeout);
        client.handshake().await?;

        let (jobs, queue) = mpsc::channel(1);
        let worker = tokio::spawn(run_worker(client, queue));

        Ok(Self {
            session,
            jobs: Some(jobs),
            worker: Some(worker),
            pending: None,
            leaderboard,
            top_n,
            runtime: Handle::current(),
            persistence: None,
            status: PersistenceStatus::Idle,
        })
    }

    pub fn session(&self) -> &Session<R, G> {
        &self.session
    }

    pub fn is_engine_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn submit_move(
        &mut self,
        from: Square,
        to: Square,
        promotion: Option<Promotion>,
    ) -> Result<MoveEffect, Rejection> {
        let effect = self.session.submit_move(from, to, promotion)?;
        if let MoveEffect::SessionOver { .. } = effect {
            self.persist();
        }
        Ok(effect)
    }

    /// Answers the quiz. A search request is handed to the engine worker;
    /// collect its result with [`Match::await_engine`].
    pub fn answer_quiz(&mut self, choice: usize) -> Result<AnswerEffect, Rejection> {
        if self.pending.is_some() {
            return Err(Rejection::WrongPhase(self.session.phase()));
        }
        let effect = self.session.answer_quiz(choice)?;
        match &effect {
            AnswerEffect::EngineRequested(request) => self.dispatch(request),
            AnswerEffect::RandomMove {
                outcome: Some(_), ..
            } => self.persist(),
            AnswerEffect::RandomMove { outcome: None, .. } => {}
        }
        Ok(effect)
    }

    /// Waits for the engine reply in flight and applies it. A failed search
    /// counts as the engine having no move.
    pub async fn await_engine(&mut self) -> Result<ReplyEffect, Rejection> {
        let Some(pending) = self.pending.take() else {
            return Err(Rejection::WrongPhase(self.session.phase()));
        };

        let best_move = match pending.reply.await {
            Ok(Ok(best_move)) => best_move,
            Ok(Err(e)) => {
                tracing::warn!(error = %e, ticket = pending.ticket, "engine search failed");
                None
            }
            Err(_) => {
                tracing::warn!(ticket = pending.ticket, "engine worker is gone");
                None
            }
        };

        let effect = self.session.receive_engine_reply(pending.ticket, best_move)?;
        if let ReplyEffect::SessionOver { .. } = effect {
            self.persist();
        }
        Ok(effect)
    }

    /// Current persistence state. Never blocks.
    pub fn persistence(&mut self) -> PersistenceStatus {
        if let Some(rx) = &mut self.persistence {
            match rx.try_recv() {
                Ok(status) => {
                    self.status = status;
                    self.persistence = None;
                }
                Err(oneshot::error::TryRecvError::Empty) => {}
                Err(oneshot::error::TryRecvError::Closed) => {
                    self.status = PersistenceStatus::Failed(
                        "Score submission was interrupted.".to_string(),
                    );
                    self.persistence = None;
                }
            }
        }
        self.status.clone()
    }

    /// Waits for persistence to settle.
    pub async fn wait_persistence(&mut self) -> PersistenceStatus {
        if let Some(rx) = self.persistence.take() {
            self.status = rx.await.unwrap_or_else(|_| {
                PersistenceStatus::Failed("Score submission was interrupted.".to_string())
            });
        }
        self.status.clone()
    }

    /// Shuts the engine down. Any reply still in flight is discarded.
    pub async fn close(mut self) {
        self.pending = None;
        self.jobs = None;
        if let Some(mut worker) = self.worker.take() {
            if tokio::time::timeout(CLOSE_GRACE, &mut worker).await.is_err() {
                tracing::warn!("engine did not shut down in time, aborting");
                worker.abort();
            }
        }
        tracing::debug!("match closed");
    }

    fn dispatch(&mut self, request: &EngineRequest) {
        let (reply, receiver) = oneshot::channel();
        let job = EngineJob {
            fen: request.fen.clone(),
            depth: request.depth,
            reply,
        };
        // A refused job drops its reply sender, which `await_engine` reads as
        // no move.
        match &self.jobs {
            Some(jobs) => {
                if let Err(e) = jobs.try_send(job) {
                    tracing::warn!(error = %e, "engine worker refused the job");
                }
            }
            None => tracing::warn!("engine already closed"),
        }
        self.pending = Some(PendingReply {
            ticket: request.ticket,
            reply: receiver,
        });
    }

    fn persist(&mut self) {
        let Some(record) = self.session.score_record() else {
            return;
        };
        let (tx, rx) = oneshot::channel();
        let leaderboard = Arc::clone(&self.leaderboard);
        let top_n = self.top_n;
        self.runtime.spawn(async move {
            let status = persist_score(leaderboard.as_ref(), &record, top_n).await;
            let _ = tx.send(status);
        });
        self.persistence = Some(rx);
        self.status = PersistenceStatus::Pending;
    }
}

impl<R, G> Drop for Match<R, G> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.abort();
        }
    }
}

async fn run_worker<T: EngineTransport>(
    mut client: UciClient<T>,
    mut jobs: mpsc::Receiver<EngineJob>,
) {
    while let Some(job) = jobs.recv().await {
        let result = client.request_move(&job.fen, job.depth).await;
        let timed_out = matches!(result, Err(EngineError::Timeout(_)));
        let failed = result.is_err();
        if job.reply.send(result).is_err() {
            tracing::debug!("engine reply discarded");
        }
        if timed_out {
            if let Err(e) = client.stop_search().await {
                tracing::warn!(error = %e, "engine did not stop the abandoned search");
                break;
            }
        } else if failed {
            break;
        }
    }
    client.quit().await;
    tracing::debug!("engine worker stopped");
}

async fn persist_score(
    leaderboard: &dyn Leaderboard,
    record: &ScoreRecord,
    top_n: usize,
) -> PersistenceStatus {
    let top = match leaderboard.top(top_n).await {
        Ok(top) => top,
        Err(e) => {
            tracing::warn!(error = %e, "leaderboard fetch failed");
            return PersistenceStatus::Failed(format!("Could not load the leaderboard: {e}"));
        }
    };
    if !qualifies(&top, top_n, record.score) {
        tracing::info!(score = record.score, "score did not make the leaderboard");
        return PersistenceStatus::NotQualified;
    }
    match leaderboard.submit(record).await {
        Ok(()) => {
            tracing::info!(name = %record.name, score = record.score, "score submitted");
            PersistenceStatus::Submitted
        }
        Err(e) => {
            tracing::warn!(error = %e, "score submission failed");
            PersistenceStatus::Failed(format!("Could not submit your score: {e}"))
        }
    }
}

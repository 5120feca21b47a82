//! High-score storage: a remote append/query service or an in-memory table.

use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// One leaderboard entry.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScoreRecord {
    pub name: String,
    pub score: u32,
}

#[derive(Debug, thiserror::Error)]
pub enum LeaderboardError {
    #[error("leaderboard request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("leaderboard answered with status {0}")]
    Status(u16),
}

#[async_trait]
pub trait Leaderboard: Send + Sync {
    async fn submit(&self, record: &ScoreRecord) -> Result<(), LeaderboardError>;

    /// Best `n` records, highest score first.
    async fn top(&self, n: usize) -> Result<Vec<ScoreRecord>, LeaderboardError>;
}

/// A score qualifies if the top-`n` list has room, or it strictly beats the
/// `n`th entry.
pub fn qualifies(top: &[ScoreRecord], n: usize, score: u32) -> bool {
    if n == 0 {
        return false;
    }
    match top.get(n - 1) {
        None => true,
        Some(last) => score > last.score,
    }
}

/// Process-local leaderboard.
#[derive(Debug, Default)]
pub struct InMemoryLeaderboard {
    records: Mutex<Vec<ScoreRecord>>,
}

impl InMemoryLeaderboard {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Leaderboard for InMemoryLeaderboard {
    async fn submit(&self, record: &ScoreRecord) -> Result<(), LeaderboardError> {
        let mut records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        records.push(record.clone());
        // Stable sort keeps earlier entries ahead on ties.
        records.sort_by(|a, b| b.score.cmp(&a.score));
        Ok(())
    }

    async fn top(&self, n: usize) -> Result<Vec<ScoreRecord>, LeaderboardError> {
        let records = self.records.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(records.iter().take(n).cloned().collect())
    }
}

/// JSON-over-HTTP leaderboard service.
///
/// `POST {base}/scores` appends a record; `GET {base}/scores?limit=n`
/// returns the top `n` as a JSON array.
#[derive(Clone, Debug)]
pub struct HttpLeaderboard {
    client: reqwest::Client,
    base_url: String,
}

impl HttpLeaderboard {
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, LeaderboardError> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Ok(Self { client, base_url })
    }

    fn check(response: &reqwest::Response) -> Result<(), LeaderboardError> {
        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(LeaderboardError::Status(status.as_u16()))
        }
    }
}

#[async_trait]
impl Leaderboard for HttpLeaderboard {
    async fn submit(&self, record: &ScoreRecord) -> Result<(), LeaderboardError> {
        let response = self
            .client
            .post(format!("{}/scores", self.base_url))
            .json(record)
            .send()
            .await?;
        Self::check(&response)?;
        tracing::debug!(name = %record.name, score = record.score, "score submitted");
        Ok(())
    }

    async fn top(&self, n: usize) -> Result<Vec<ScoreRecord>, LeaderboardError> {
        let response = self
            .client
            .get(format!("{}/scores?limit={n}", self.base_url))
            .send()
            .await?;
        Self::check(&response)?;
        Ok(response.json().await?)
    }
}

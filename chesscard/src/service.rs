//! The caller-facing facade: ingest, evaluation and the analytics views over
//! one [`Database`].

use analysis::{
    build_report, clock_differential, evaluation_loss, evaluation_series, move_ranks,
    side_summaries, ClockPoint, GameReport, LossPoint, PlyRecord, RankPoint, SeriesPoint,
    SideSummaries,
};
use chess::pgn::{parse_archive, PgnError};
use chess::GameArchive;
use engine::EvaluatorFactory;

use crate::evaluation::{BatchReport, EvaluationScheduler, SchedulerConfig, SchedulerError};
use crate::persistence::{
    now_timestamp, AnalyticsRepository, Database, IngestReport, IngestRepository,
    PersistenceError,
};

#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    #[error("PGN error: {0}")]
    Pgn(#[from] PgnError),
    #[error(transparent)]
    Persistence(#[from] PersistenceError),
    #[error(transparent)]
    Scheduler(#[from] SchedulerError),
    #[error("Unknown game {0}")]
    UnknownGame(String),
}

pub struct ChessCard<F: EvaluatorFactory> {
    db: Database,
    scheduler: EvaluationScheduler<F>,
    config: SchedulerConfig,
}

impl<F: EvaluatorFactory> ChessCard<F> {
    pub fn new(db: Database, factory: F, config: SchedulerConfig) -> Self {
        Self {
            db,
            scheduler: EvaluationScheduler::new(factory),
            config,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    pub async fn ingest_archive(&self, archive: &GameArchive) -> Result<IngestReport, ServiceError> {
        Ok(self.db.ingest().ingest(archive).await?)
    }

    /// Read a PGN archive and ingest it. Unreadable games of a multi-game
    /// archive are listed in the report's `skipped`.
    ///
    /// With `fetched_for` set, that user's last-fetch time is updated after
    /// a successful ingest.
    pub async fn ingest_pgn(
        &self,
        text: &str,
        fetched_for: Option<&str>,
    ) -> Result<IngestReport, ServiceError> {
        let parsed = parse_archive(text)?;
        let mut report = IngestReport {
            skipped: parsed.skipped,
            ..Default::default()
        };
        report.merge(self.ingest_archive(&parsed.archive).await?);

        if let Some(username) = fetched_for {
            self.db
                .ingest()
                .record_user_fetch(username, now_timestamp())
                .await?;
        }
        Ok(report)
    }

    /// Record when a user's account was opened.
    pub async fn record_account_open(
        &self,
        username: &str,
        opened_at: u64,
    ) -> Result<(), ServiceError> {
        Ok(self
            .db
            .ingest()
            .record_account_open(username, opened_at)
            .await?)
    }

    pub async fn evaluate_game(&self, game_id: &str) -> Result<BatchReport, ServiceError> {
        if !self.db.ingest().game_exists(game_id).await? {
            return Err(ServiceError::UnknownGame(game_id.to_string()));
        }
        Ok(self
            .scheduler
            .evaluate_game(&self.db.positions(), game_id, &self.config)
            .await?)
    }

    pub async fn evaluate_next_n(
        &self,
        n: usize,
        prefer_game: Option<&str>,
    ) -> Result<BatchReport, ServiceError> {
        Ok(self
            .scheduler
            .evaluate_next_n(&self.db.positions(), n, prefer_game, &self.config)
            .await?)
    }

    pub async fn evaluation_series(&self, game_id: &str) -> Result<Vec<SeriesPoint>, ServiceError> {
        Ok(evaluation_series(&self.plies(game_id).await?))
    }

    pub async fn clock_differential(&self, game_id: &str) -> Result<Vec<ClockPoint>, ServiceError> {
        Ok(clock_differential(&self.plies(game_id).await?))
    }

    pub async fn evaluation_loss(&self, game_id: &str) -> Result<Vec<LossPoint>, ServiceError> {
        Ok(evaluation_loss(&self.plies(game_id).await?))
    }

    pub async fn move_ranks(&self, game_id: &str) -> Result<Vec<RankPoint>, ServiceError> {
        Ok(move_ranks(&self.plies(game_id).await?))
    }

    pub async fn side_summaries(&self, game_id: &str) -> Result<SideSummaries, ServiceError> {
        Ok(side_summaries(&self.plies(game_id).await?))
    }

    /// All views of one game plus its headline.
    pub async fn report(&self, game_id: &str) -> Result<GameReport, ServiceError> {
        let summary = self
            .db
            .analytics()
            .game_summary(game_id)
            .await?
            .ok_or_else(|| ServiceError::UnknownGame(game_id.to_string()))?;
        let plies = self.db.analytics().game_plies(game_id).await?;
        Ok(build_report(summary, &plies))
    }

    async fn plies(&self, game_id: &str) -> Result<Vec<PlyRecord>, ServiceError> {
        let plies = self.db.analytics().game_plies(game_id).await?;
        if plies.is_empty() && !self.db.ingest().game_exists(game_id).await? {
            return Err(ServiceError::UnknownGame(game_id.to_string()));
        }
        Ok(plies)
    }
}

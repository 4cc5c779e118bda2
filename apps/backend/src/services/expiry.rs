//! Periodic retirement of expired play requests.

use std::sync::Arc;
use std::time::Duration;

use time::OffsetDateTime;
use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::errors::domain::DomainError;
use crate::repos::{ExpiryReport, MatchStore};

pub struct ExpirySweeper {
    store: Arc<dyn MatchStore>,
    every: Duration,
}

impl ExpirySweeper {
    pub fn new(store: Arc<dyn MatchStore>, every: Duration) -> Self {
        Self { store, every }
    }

    /// One sweep: requests with `expires_at < now` go, their games follow.
    pub async fn tick(&self, now: OffsetDateTime) -> Result<ExpiryReport, DomainError> {
        self.store.expire_play_requests(now).await
    }

    /// Sweep every interval until `shutdown` fires. A failed sweep is logged
    /// and retried on the next tick.
    pub async fn run(self, shutdown: CancellationToken) {
        let mut ticker = interval(self.every);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        info!(interval_secs = self.every.as_secs_f64(), "expiry sweeper started");

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {
                    match self.tick(OffsetDateTime::now_utc()).await {
                        Ok(report) if report.expired_requests > 0 => info!(
                            expired_requests = report.expired_requests,
                            games_updated = report.games_updated,
                            games_deleted = report.games_deleted,
                            "expired play requests removed"
                        ),
                        Ok(_) => debug!("expiry sweep found nothing"),
                        Err(e) if e.is_optimistic_lock() => {
                            warn!(error = %e, "expiry sweep kept losing to game writers")
                        }
                        Err(e) => error!(error = %e, "expiry sweep failed"),
                    }
                }
            }
        }

        info!("expiry sweeper stopped");
    }

    pub fn spawn(self, shutdown: CancellationToken) -> JoinHandle<()> {
        tokio::spawn(self.run(shutdown))
    }
}

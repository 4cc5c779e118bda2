//! Compare-and-swap persistence and the bounded retry loop built on it.
//!
//! Writers read a value with its version token, edit a copy, and write it
//! back only if the stored version is still the one they read. Losing
//! writers re-read and try again; no lock is held in between.

use std::time::Duration;

use async_trait::async_trait;
use rand::random;
use serde::Serialize;
use tokio::time::sleep;
use tracing::{debug, warn};

use crate::domain::Mutation;
use crate::errors::domain::{ConflictKind, DomainError};

/// A value together with the version token it was read at.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Versioned<V> {
    #[serde(flatten)]
    pub value: V,
    pub version: i32,
}

impl<V> Versioned<V> {
    pub fn new(value: V, version: i32) -> Self {
        Self { value, version }
    }
}

/// Result of a single conditional write.
#[derive(Debug, Clone, PartialEq)]
pub enum WriteOutcome<V> {
    /// Stored; carries the new version.
    Written(Versioned<V>),
    /// Someone else wrote first.
    Stale,
}

#[async_trait]
pub trait ConditionalStore<K, V>: Send + Sync
where
    K: Send + Sync,
    V: Send + Sync,
{
    async fn read(&self, key: &K) -> Result<Option<Versioned<V>>, DomainError>;

    /// Replace the stored value only if its version equals `expected_version`.
    /// A successful write bumps the version by exactly one.
    async fn write_if(
        &self,
        key: &K,
        value: &V,
        expected_version: i32,
    ) -> Result<WriteOutcome<V>, DomainError>;

    /// Error to report when `key` does not exist.
    fn missing(&self, key: &K) -> DomainError;
}

/// Attempt budget and backoff for [`update_with_retry`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_attempts: u32,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

const JITTER_PERCENT: f64 = 0.5;

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            base_delay: Duration::from_millis(5),
            max_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts.max(1);
        self
    }

    /// Exponential backoff capped at `max_delay`, plus or minus half as jitter.
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let exp = attempt.saturating_sub(1).min(16) as i32;
        let base = self.base_delay.as_secs_f64() * 2f64.powi(exp);
        let capped = base.min(self.max_delay.as_secs_f64());
        let jitter = (random::<f64>() * 2.0 - 1.0) * capped * JITTER_PERCENT;
        Duration::from_secs_f64((capped + jitter).max(0.0))
    }
}

/// What [`update_with_retry`] ended up doing.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateOutcome<V> {
    Updated(Versioned<V>),
    /// The edit was a no-op; nothing was written and the version is untouched.
    Unchanged(Versioned<V>),
}

impl<V> UpdateOutcome<V> {
    pub fn into_inner(self) -> Versioned<V> {
        match self {
            UpdateOutcome::Updated(v) | UpdateOutcome::Unchanged(v) => v,
        }
    }

    pub fn changed(&self) -> bool {
        matches!(self, UpdateOutcome::Updated(_))
    }
}

/// Read, edit and conditionally write `key`, retrying on stale writes.
///
/// `apply` runs against a fresh copy on every attempt. Returning
/// `Mutation::Unchanged` ends the loop without a write; returning an error
/// aborts it. After `policy.max_attempts` stale writes the call fails with
/// `ConflictKind::RetriesExhausted`.
pub async fn update_with_retry<K, V, S, F>(
    store: &S,
    key: &K,
    policy: &RetryPolicy,
    mut apply: F,
) -> Result<UpdateOutcome<V>, DomainError>
where
    S: ConditionalStore<K, V> + ?Sized,
    K: Send + Sync + std::fmt::Display,
    V: Clone + Send + Sync,
    F: FnMut(&mut V) -> Result<Mutation, DomainError> + Send,
{
    let max_attempts = policy.max_attempts.max(1);

    for attempt in 1..=max_attempts {
        let current = store
            .read(key)
            .await?
            .ok_or_else(|| store.missing(key))?;

        let mut next = current.value.clone();
        if apply(&mut next)? == Mutation::Unchanged {
            return Ok(UpdateOutcome::Unchanged(current));
        }

        match store.write_if(key, &next, current.version).await? {
            WriteOutcome::Written(stored) => {
                debug!(key = %key, version = stored.version, attempt, "Conditional write applied");
                return Ok(UpdateOutcome::Updated(stored));
            }
            WriteOutcome::Stale => {
                warn!(
                    key = %key,
                    expected_version = current.version,
                    attempt,
                    max_attempts,
                    "Stale version on conditional write"
                );
                if attempt < max_attempts {
                    sleep(policy.delay_for(attempt)).await;
                }
            }
        }
    }

    Err(DomainError::conflict(
        ConflictKind::RetriesExhausted,
        format!("{key} was modified concurrently {max_attempts} times in a row; please retry"),
    ))
}

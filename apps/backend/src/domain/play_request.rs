use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use uuid::Uuid;

use super::geo::GeoPoint;
use crate::errors::domain::{DomainError, ValidationKind};

/// A player's standing request to play an activity near a location.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayRequest {
    pub id: Uuid,
    pub requester_id: Uuid,
    pub activity: String,
    pub lat: f64,
    pub lon: f64,
    pub range_km: f64,
    #[serde(with = "time::serde::rfc3339::option")]
    pub starts_at: Option<OffsetDateTime>,
    #[serde(with = "time::serde::rfc3339")]
    pub expires_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl PlayRequest {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    pub fn is_expired(&self, now: OffsetDateTime) -> bool {
        self.expires_at < now
    }
}

/// Inbound request before it has an identity. Pings and explicit
/// play-request creation both end up here.
#[derive(Debug, Clone, PartialEq)]
pub struct PlayRequestDraft {
    pub requester_id: Uuid,
    pub activity: String,
    pub lat: f64,
    pub lon: f64,
    pub range_km: f64,
    pub starts_at: Option<OffsetDateTime>,
    pub expires_at: OffsetDateTime,
}

impl PlayRequestDraft {
    pub fn point(&self) -> GeoPoint {
        GeoPoint::new(self.lat, self.lon)
    }

    /// Check every field and normalise the activity name.
    pub fn validate(mut self, max_range_km: f64, now: OffsetDateTime) -> Result<Self, DomainError> {
        self.activity = normalize_activity(&self.activity)?;
        self.point().validate()?;

        if !self.range_km.is_finite() || self.range_km <= 0.0 {
            return Err(DomainError::validation(
                ValidationKind::InvalidRange,
                format!("range_km must be positive, got {}", self.range_km),
            ));
        }
        if self.range_km > max_range_km {
            return Err(DomainError::validation(
                ValidationKind::InvalidRange,
                format!(
                    "range_km {} exceeds the maximum of {max_range_km}",
                    self.range_km
                ),
            ));
        }
        if self.expires_at <= now {
            return Err(DomainError::validation(
                ValidationKind::InvalidExpiry,
                "expiry must be in the future",
            ));
        }
        if let Some(start) = self.starts_at {
            if start >= self.expires_at {
                return Err(DomainError::validation(
                    ValidationKind::InvalidWindow,
                    "start must be before end",
                ));
            }
        }
        Ok(self)
    }
}

/// Activities compare case-insensitively and ignore surrounding whitespace.
pub fn normalize_activity(raw: &str) -> Result<String, DomainError> {
    let activity = raw.trim().to_lowercase();
    if activity.is_empty() {
        return Err(DomainError::validation(
            ValidationKind::InvalidActivity,
            "activity must not be empty",
        ));
    }
    Ok(activity)
}

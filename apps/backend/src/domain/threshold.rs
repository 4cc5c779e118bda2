use std::collections::HashMap;

use serde::Serialize;

/// Minimum participant counts per activity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ThresholdPolicy {
    default_min: usize,
    per_activity: HashMap<String, usize>,
}

impl Default for ThresholdPolicy {
    fn default() -> Self {
        Self::new(2).with_activity("volleyball", 4)
    }
}

impl ThresholdPolicy {
    pub fn new(default_min: usize) -> Self {
        Self {
            default_min,
            per_activity: HashMap::new(),
        }
    }

    pub fn with_activity(mut self, activity: &str, min: usize) -> Self {
        self.per_activity.insert(activity.trim().to_lowercase(), min);
        self
    }

    pub fn default_min(&self) -> usize {
        self.default_min
    }

    pub fn min_participants(&self, activity: &str) -> usize {
        self.per_activity
            .get(activity.trim().to_lowercase().as_str())
            .copied()
            .unwrap_or(self.default_min)
    }

    /// Whether `participants` people are enough to form a game.
    pub fn at_threshold(&self, activity: &str, participants: usize) -> bool {
        participants >= self.min_participants(activity)
    }
}

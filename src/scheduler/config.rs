//! Engine tuning.

use serde::{Deserialize, Serialize};

use crate::models::Timestamp;

/// Tunable constants of the scheduler.
///
/// # Priority
///
/// `priority = value_weight × (value / value_scale) − time_weight × creation_time`
///
/// Earlier creation dominates; higher value breaks near-ties.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Weight of the normalized order value.
    pub value_weight: f64,
    /// Weight of the creation time.
    pub time_weight: f64,
    /// Divisor normalizing order value.
    pub value_scale: f64,
    /// Priority step used by placement repair.
    pub repair_epsilon: f64,
    /// Upper bound on repair steps for one create.
    pub max_repair_steps: usize,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            value_weight: 0.3,
            time_weight: 0.7,
            value_scale: 50.0,
            repair_epsilon: 0.01,
            max_repair_steps: 10_000,
        }
    }
}

impl SchedulerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the value and time weights.
    pub fn with_weights(mut self, value_weight: f64, time_weight: f64) -> Self {
        self.value_weight = value_weight;
        self.time_weight = time_weight;
        self
    }

    /// Sets the value normalization divisor.
    pub fn with_value_scale(mut self, value_scale: f64) -> Self {
        self.value_scale = value_scale;
        self
    }

    /// Sets the repair step.
    pub fn with_repair_epsilon(mut self, epsilon: f64) -> Self {
        self.repair_epsilon = epsilon;
        self
    }

    /// Sets the repair step bound.
    pub fn with_max_repair_steps(mut self, steps: usize) -> Self {
        self.max_repair_steps = steps;
        self
    }

    /// Priority of a new order.
    pub fn priority(&self, creation_time: Timestamp, value: i64) -> f64 {
        let normalized_value = value as f64 / self.value_scale;
        self.value_weight * normalized_value - self.time_weight * creation_time as f64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_priority_formula() {
        let config = SchedulerConfig::default();
        assert!((config.priority(0, 50) - 0.3).abs() < 1e-12);
        assert!((config.priority(5, 100) - (-2.9)).abs() < 1e-12);
    }

    #[test]
    fn test_builder() {
        let config = SchedulerConfig::new()
            .with_weights(1.0, 0.0)
            .with_value_scale(1.0)
            .with_repair_epsilon(0.5)
            .with_max_repair_steps(3);
        assert_eq!(config.priority(1000, 7), 7.0);
        assert_eq!(config.repair_epsilon, 0.5);
        assert_eq!(config.max_repair_steps, 3);
    }

    #[test]
    fn test_partial_json_falls_back_to_defaults() {
        let config: SchedulerConfig = serde_json::from_str(r#"{"repair_epsilon": 0.05}"#).unwrap();
        assert_eq!(config.repair_epsilon, 0.05);
        assert_eq!(config.value_scale, 50.0);
    }
}

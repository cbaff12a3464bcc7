//! Marketplace configuration.

use serde::{Deserialize, Serialize};

use marketsim_core::{MarketError, MarketResult};

/// Settings fixed at marketplace construction.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MarketConfig {
    /// Maximum number of listed (unsold) items per producer.
    pub queue_size_per_producer: usize,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            queue_size_per_producer: 8,
        }
    }
}

impl MarketConfig {
    pub fn new(queue_size_per_producer: usize) -> MarketResult<Self> {
        Self::default()
            .with_queue_size_per_producer(queue_size_per_producer)
            .validate()
    }

    pub fn with_queue_size_per_producer(mut self, size: usize) -> Self {
        self.queue_size_per_producer = size;
        self
    }

    /// A ceiling of zero would make every publish fail forever.
    pub fn validate(self) -> MarketResult<Self> {
        if self.queue_size_per_producer == 0 {
            return Err(MarketError::invalid_config(
                "queue_size_per_producer must be at least 1",
            ));
        }
        Ok(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_capacity_is_rejected() {
        let err = MarketConfig::new(0).unwrap_err();
        assert!(matches!(err, MarketError::InvalidConfig(_)));
    }

    #[test]
    fn deserializes_from_scenario_json() {
        let cfg: MarketConfig =
            serde_json::from_str(r#"{ "queue_size_per_producer": 3 }"#).unwrap();
        assert_eq!(cfg, MarketConfig::new(3).unwrap());
    }
}

//! Scenario files: what gets produced, who buys what, and how big the market is.
//!
//! ```json
//! {
//!   "products": { "id1": { "product_type": "Tea", "name": "Linden", "type": "Herbal", "price": 9 } },
//!   "producers": [{ "name": "prod1", "products": [["id1", 2, 0.1]], "republish_wait_time": 0.2 }],
//!   "consumers": [{ "name": "cons1", "retry_wait_time": 0.1,
//!                   "carts": [[{ "type": "add", "product": "id1", "quantity": 2 }]] }],
//!   "marketplace": { "queue_size_per_producer": 8 }
//! }
//! ```

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use marketsim_actors::{CartOp, CartOpKind, CatalogEntry, ConsumerConfig, ProducerConfig, ShoppingList};
use marketsim_core::MarketError;
use marketsim_market::MarketConfig;

use crate::product::Product;

#[derive(Debug, Error)]
pub enum ScenarioError {
    #[error("cannot read scenario {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed scenario: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("{owner} refers to unknown product '{product}'")]
    UnknownProduct { owner: String, product: String },

    #[error("{owner}: {field} must be a finite, non-negative number of seconds (got {value})")]
    InvalidDuration {
        owner: String,
        field: &'static str,
        value: f64,
    },

    #[error(transparent)]
    Market(#[from] MarketError),
}

/// One shopping-list line as written in the scenario file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    #[serde(rename = "type")]
    pub kind: CartOpKind,
    pub product: String,
    pub quantity: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProducerPlan {
    pub name: String,
    /// `[product_id, quantity, production_delay_secs]` triples.
    pub products: Vec<(String, usize, f64)>,
    pub republish_wait_time: f64,
    /// Stop after this many passes over `products`. Absent means produce
    /// until the run ends.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rounds: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsumerPlan {
    pub name: String,
    pub retry_wait_time: f64,
    pub carts: Vec<Vec<CartLine>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_retries: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub products: BTreeMap<String, Product>,
    #[serde(default)]
    pub producers: Vec<ProducerPlan>,
    #[serde(default)]
    pub consumers: Vec<ConsumerPlan>,
    #[serde(default)]
    pub marketplace: MarketConfig,
}

impl Scenario {
    pub fn from_json_str(json: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_json::from_str(json)?;
        scenario.validate()?;
        Ok(scenario)
    }

    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ScenarioError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&json)
    }

    /// Check every cross-reference and number without starting anything.
    pub fn validate(&self) -> Result<(), ScenarioError> {
        self.marketplace.validate()?;
        for producer in &self.producers {
            self.catalog_for(producer)?;
            self.producer_config(producer)?;
        }
        for consumer in &self.consumers {
            self.lists_for(consumer)?;
            self.consumer_config(consumer)?;
        }
        Ok(())
    }

    pub fn product(&self, owner: &str, id: &str) -> Result<&Product, ScenarioError> {
        self.products
            .get(id)
            .ok_or_else(|| ScenarioError::UnknownProduct {
                owner: owner.to_string(),
                product: id.to_string(),
            })
    }

    pub fn catalog_for(&self, plan: &ProducerPlan) -> Result<Vec<CatalogEntry<Product>>, ScenarioError> {
        plan.products
            .iter()
            .map(|(id, quantity, delay)| {
                let item = self.product(&plan.name, id)?.clone();
                let delay = seconds(&plan.name, "production delay", *delay)?;
                Ok(CatalogEntry::new(item, *quantity, delay))
            })
            .collect()
    }

    pub fn producer_config(&self, plan: &ProducerPlan) -> Result<ProducerConfig, ScenarioError> {
        let wait = seconds(&plan.name, "republish_wait_time", plan.republish_wait_time)?;
        let config = ProducerConfig::default()
            .with_name(plan.name.clone())
            .with_republish_wait(wait);
        Ok(match plan.rounds {
            Some(rounds) => config.with_rounds(rounds),
            None => config,
        })
    }

    pub fn lists_for(&self, plan: &ConsumerPlan) -> Result<Vec<ShoppingList<Product>>, ScenarioError> {
        plan.carts
            .iter()
            .map(|cart| {
                cart.iter()
                    .map(|entry| {
                        let item = self.product(&plan.name, &entry.product)?.clone();
                        Ok(CartOp {
                            kind: entry.kind,
                            item,
                            quantity: entry.quantity,
                        })
                    })
                    .collect()
            })
            .collect()
    }

    pub fn consumer_config(&self, plan: &ConsumerPlan) -> Result<ConsumerConfig, ScenarioError> {
        let wait = seconds(&plan.name, "retry_wait_time", plan.retry_wait_time)?;
        let config = ConsumerConfig::default()
            .with_name(plan.name.clone())
            .with_retry_wait(wait);
        Ok(match plan.max_retries {
            Some(max) => config.with_max_retries(max),
            None => config,
        })
    }
}

fn seconds(owner: &str, field: &'static str, value: f64) -> Result<Duration, ScenarioError> {
    Duration::try_from_secs_f64(value).map_err(|_| ScenarioError::InvalidDuration {
        owner: owner.to_string(),
        field,
        value,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"{
        "products": {
            "id1": { "product_type": "Tea", "name": "Linden", "type": "Herbal", "price": 9 }
        },
        "producers": [{ "name": "prod1", "products": [["id1", 2, 0.25]], "republish_wait_time": 0.5 }],
        "consumers": [{
            "name": "cons1",
            "retry_wait_time": 0.1,
            "carts": [[
                { "type": "add", "product": "id1", "quantity": 2 },
                { "type": "remove", "product": "id1", "quantity": 1 }
            ]]
        }],
        "marketplace": { "queue_size_per_producer": 3 }
    }"#;

    #[test]
    fn minimal_scenario_resolves_products_and_durations() {
        let scenario = Scenario::from_json_str(MINIMAL).unwrap();

        let catalog = scenario.catalog_for(&scenario.producers[0]).unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].quantity, 2);
        assert_eq!(catalog[0].production_delay, Duration::from_millis(250));
        assert_eq!(catalog[0].item.name(), "Linden");

        let lists = scenario.lists_for(&scenario.consumers[0]).unwrap();
        assert_eq!(lists[0][1].kind, CartOpKind::Remove);

        let config = scenario.producer_config(&scenario.producers[0]).unwrap();
        assert_eq!(config.republish_wait, Duration::from_millis(500));
        assert_eq!(scenario.marketplace.queue_size_per_producer, 3);
    }

    #[test]
    fn unknown_product_is_reported_with_its_owner() {
        let json = MINIMAL.replace(r#""product": "id1""#, r#""product": "id9""#);
        match Scenario::from_json_str(&json).unwrap_err() {
            ScenarioError::UnknownProduct { owner, product } => {
                assert_eq!(owner, "cons1");
                assert_eq!(product, "id9");
            }
            other => panic!("expected UnknownProduct, got {other:?}"),
        }
    }

    #[test]
    fn negative_wait_is_rejected() {
        let json = MINIMAL.replace(r#""republish_wait_time": 0.5"#, r#""republish_wait_time": -1.0"#);
        assert!(matches!(
            Scenario::from_json_str(&json),
            Err(ScenarioError::InvalidDuration { field: "republish_wait_time", .. })
        ));
    }

    #[test]
    fn zero_capacity_is_rejected() {
        let json = MINIMAL.replace(
            r#""queue_size_per_producer": 3"#,
            r#""queue_size_per_producer": 0"#,
        );
        assert!(matches!(
            Scenario::from_json_str(&json),
            Err(ScenarioError::Market(MarketError::InvalidConfig(_)))
        ));
    }

    #[test]
    fn missing_file_is_an_io_error() {
        let err = Scenario::from_path("/nonexistent/scenario.json").unwrap_err();
        assert!(matches!(err, ScenarioError::Io { .. }));
    }
}

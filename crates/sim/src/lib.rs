//! Scenario-driven marketplace simulation.
//!
//! A scenario file describes a product catalog, producers with what they
//! make, consumers with their shopping lists, and the marketplace capacity.
//! [`run_scenario`] plays it out on real threads and prints one receipt line
//! per purchased item.

pub mod product;
pub mod runner;
pub mod scenario;

pub use product::Product;
pub use runner::{RunReport, RunSummary, run_scenario};
pub use scenario::{CartLine, ConsumerPlan, ProducerPlan, Scenario, ScenarioError};

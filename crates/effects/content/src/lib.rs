//! Data-driven effect content and loaders.
//!
//! This crate turns authored data files into engine inputs:
//! - Effect definitions (RON catalog)
//! - Curve tables sampled by scalable values (RON)
//! - Engine configuration (TOML)
//! - Scenarios driving the simulator (RON)
//!
//! Definitions are shared read-only through a [`DefinitionCatalog`]; nothing
//! here ever touches live aggregators.

pub mod catalog;

#[cfg(feature = "loaders")]
pub mod loaders;

pub use catalog::DefinitionCatalog;

#[cfg(feature = "loaders")]
pub use loaders::{
    ConfigLoader, Content, ContentFactory, CurveLoader, DefinitionLoader, Scenario, ScenarioLoader,
    ScenarioStep, TargetSpec,
};

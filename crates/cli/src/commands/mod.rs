//! CLI command implementations

pub mod demo;
pub mod health;
pub mod metrics;
pub mod model;
pub mod predict;

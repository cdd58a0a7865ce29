//! Library exports for reuse in benchmarks and tests.
/// Application directory helpers.
pub mod app_dirs;
/// Code generation for the trained classifiers.
pub mod codegen;
/// Serial sample collection into CSV logs.
pub mod collector;
/// TOML configuration.
pub mod config;
/// Live serial dashboard.
pub mod dashboard;
/// CSV dataset loading.
pub mod dataset;
/// Tracing setup.
pub mod logging;
/// Classifiers, validation and metrics.
pub mod ml;
/// BME688 readings and the serial protocol.
pub mod sensor;
/// Training pipeline and exports.
pub mod trainer;

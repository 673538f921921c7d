//! Configuration for lottery-agents.
//!
//! Settings come from an optional YAML file overlaid with environment
//! variables. Required values are checked before any network activity so a
//! misconfigured run fails without side effects.

mod model;
mod operations;
pub mod types;

#[cfg(test)]
mod tests;

// Re-export public API
pub use model::Config;

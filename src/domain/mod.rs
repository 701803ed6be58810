//! Core domain types and logic.

pub mod signal;
pub mod registry;
pub mod coherency;
pub mod aggregator;
pub mod allocation;
pub mod asset;
pub mod relative_strength;
pub mod tournament;
pub mod engine;
pub mod config_validation;
pub mod error;

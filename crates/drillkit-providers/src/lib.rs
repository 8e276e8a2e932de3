//! Question sources and configuration.
//!
//! Implements the `QuestionProvider` trait for a fixed question bank, a
//! randomized template generator, and a remote HTTP endpoint, plus the
//! simulated upload parser and configuration loading.

pub mod config;
pub mod fixture;
pub mod remote;
pub mod template;
pub mod upload;

pub use config::{create_provider, load_config, DrillkitConfig, ProviderConfig};
pub use drillkit_core::error::ProviderError;

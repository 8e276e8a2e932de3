//! Quiz sessions, scoring, and the error book.
//!
//! This crate defines the data model, the session state machine, the scorer,
//! error collection, and the slot-based persistence adapter that the rest of
//! drillkit builds on.

pub mod catalog;
pub mod engine;
pub mod error;
pub mod errorbook;
pub mod model;
pub mod parser;
pub mod plan;
pub mod report;
pub mod scoring;
pub mod session;
pub mod store;
pub mod traits;

pub use error::{DrillError, ProviderError};

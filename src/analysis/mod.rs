//! Analysis modules.
//!
//! The summary table and the sweep that fills it.

pub mod aggregator;
pub mod table;

pub use aggregator::Aggregator;

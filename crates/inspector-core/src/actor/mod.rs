//! Actor implementations

pub mod aggregator;

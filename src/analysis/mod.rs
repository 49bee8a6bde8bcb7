//! Analysis module for turning counts into shares.

mod aggregator;

pub use aggregator::*;

//! # IronMeta Bench
//!
//! Fixtures for IronMeta performance testing.

pub mod fixtures;

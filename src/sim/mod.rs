//! Scenario generation and script execution for stress testing.

pub mod scenario;

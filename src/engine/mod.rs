//! Execution engine for onboard
//!
//! The engine orchestrates:
//! 1. Planning - Build declarations and actions from the declaration file
//! 2. Diffing - Probe and show what a run would change
//! 3. Executing - Reconcile with progress and print the report

pub mod differ;
pub mod executor;
pub mod planner;

pub use executor::{ExecuteOptions, execute};
pub use planner::Services;

//! Workflow types and logic.

pub mod algorithm;
pub mod workspace;
pub mod invocation;
pub mod harvest;
pub mod results;
pub mod menu;
pub mod generated;
pub mod strategy_check;
pub mod error;

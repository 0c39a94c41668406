//! leanbox — run algorithms inside a long-lived Lean engine container and
//! collect what they leave behind.
//!
//! Hexagonal architecture: workflow logic in [`domain`], port traits in [`ports`],
//! concrete implementations in [`adapters`].

pub mod domain;
pub mod ports;
pub mod adapters;
pub mod cli;

//! Concrete adapter implementations for ports.

pub mod docker_engine;
pub mod file_config_adapter;
pub mod terminal;

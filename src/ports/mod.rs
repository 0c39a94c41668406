//! Port traits between the workflow and the outside world.

pub mod config_port;
pub mod engine_port;

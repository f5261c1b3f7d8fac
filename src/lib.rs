//! DeployKit - Configuration-driven SSH deployment task runner

pub mod cli;
pub mod config;
pub mod error;
pub mod logging;
pub mod remote;
pub mod tasks;

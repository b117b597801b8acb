//! specforge library
//!
//! OpenAPI validation, service synthesis, deployment orchestration and
//! health scheduling for generated mock servers.

pub mod app;
pub mod codegen;
pub mod config;
pub mod deploy;
pub mod errors;
pub mod health;
pub mod logs;
pub mod server;
pub mod service;
pub mod spec;
pub mod store;
pub mod utils;
pub mod workers;

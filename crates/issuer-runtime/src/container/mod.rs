//! # Service Container
//!
//! Configuration plus the services built from it.

pub mod config;
pub mod services;

pub use config::{
    ConfigError, IssuerConfig, KeyValueConfig, QueuesConfig, StorageBackend, StorageConfig,
};
pub use services::{ContainerError, ServiceContainer};

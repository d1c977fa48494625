//! # Issuer Runtime Library
//!
//! Composition root of the issuance pipeline. The `issuer-runtime` binary
//! is a thin shell around these modules; they are exposed for the
//! end-to-end tests.
//!
//! - `container/` - configuration and service construction
//! - `registry/` - the queue registry ([`QueueService`])
//! - `worker/` - the per-queue fetch/dispatch loop
//! - `handlers/` - one downstream operation per queue
//! - `adapters/` - RocksDB implementations of the storage ports
//! - `metrics` - Prometheus scrape endpoint

#![allow(clippy::type_complexity)]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

pub mod adapters;
pub mod container;
pub mod handlers;
pub mod metrics;
pub mod registry;
pub mod worker;

pub use container::{ContainerError, IssuerConfig, ServiceContainer};
pub use handlers::{HandlerError, Pipeline};
pub use registry::{QueueKind, QueueService};
pub use worker::{TaskHandler, Worker, WorkerError};

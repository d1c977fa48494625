//! # VC Issuer Test Suite
//!
//! End-to-end tests that run the queue service against real stores.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/
//!     ├── harness.rs    # Container + queue service on in-memory backends
//!     ├── flows.rs      # Handler flows driven through the queues
//!     └── delivery.rs   # FIFO, redelivery and shutdown guarantees
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p vc-tests
//!
//! # By category
//! cargo test -p vc-tests integration::flows::
//! cargo test -p vc-tests integration::delivery::
//! ```

pub mod integration;

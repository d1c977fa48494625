//! # Integration Tests
//!
//! The runtime wired the way `issuer-runtime` wires it at startup, with
//! in-memory backends and a scripted signing authority.

#[cfg(test)]
mod harness;

pub mod delivery;
pub mod flows;

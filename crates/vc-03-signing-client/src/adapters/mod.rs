//! # Adapters Module
//!
//! - `http`: reqwest client for the signing authority's JSON API

pub mod http;

pub use http::HttpSigningClient;

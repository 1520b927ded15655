//! Ember & Wick Core - Shared types library.
//!
//! This crate provides common types used across all Ember & Wick components:
//! - `storefront` - Public JSON API, admin API and image proxy
//! - `cli` - Operational utilities over the catalog
//!
//! # Architecture
//!
//! The core crate contains only types and validation - no I/O, no document
//! store access, no HTTP clients. This keeps it lightweight and allows it to
//! be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Document IDs, prices, emails, order statuses, shipping
//!   addresses and candle customizations

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;

//! Ember & Wick storefront library.
//!
//! The JSON API behind the candle shop: catalog, session cart, checkout,
//! candle customization, site content, contact inbox, image proxies and the
//! token-guarded admin API. Data lives in a document store; the binary uses
//! Firestore, tests use the in-memory backend.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod config;
pub mod db;
pub mod error;
pub mod extract;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;
pub mod store;

#[cfg(test)]
mod testing;

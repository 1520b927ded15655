//! Core types for Ember & Wick.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod customization;
pub mod email;
pub mod id;
pub mod price;
pub mod status;

pub use address::{AddressError, AddressField, ShippingAddress};
pub use customization::CandleCustomization;
pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, Price};
pub use status::OrderStatus;

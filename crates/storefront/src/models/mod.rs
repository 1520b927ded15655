//! Domain models for the storefront.
//!
//! Every entity mirrors a document in the managed store. Keys are camelCase
//! and every field is defaulted on read, so documents written by older
//! admin tooling (or by hand in the console) still decode.
//!
//! # Collections
//!
//! - `products` - [`Product`]
//! - `orders` - [`Order`]
//! - `contactMessages` - [`ContactMessage`]
//! - `candleTemplates` - [`CandleTemplate`]
//! - `customFonts` - [`CustomFont`]
//! - `banners` - [`Banner`]
//! - `testimonials` - [`Testimonial`]
//! - `siteConfig/{heroPopup,customization,business}` - singleton documents
//!
//! The cart ([`Cart`]) is not persisted in the store; it lives in the
//! visitor's session.

pub mod business;
pub mod cart;
pub mod contact;
pub mod content;
pub mod customization;
pub mod order;
pub mod product;

pub use business::BusinessConfig;
pub use cart::{Cart, CartItem};
pub use contact::ContactMessage;
pub use content::{Banner, HeroPopupConfig, Testimonial};
pub use customization::{
    CandleTemplate, CustomFont, CustomizationConfig, CustomizationError, SizeOption, TextArea,
};
pub use order::{Order, OrderItem};
pub use product::{CustomizationOptions, Product};

//! Services for the storefront.
//!
//! # Services
//!
//! - `catalog` - Cached product reads
//! - `storage` - Upload service client (images for products, content and
//!   customer designs)
//! - `text_detection` - Fixed-response text-area detection for designs

pub mod catalog;
pub mod storage;
pub mod text_detection;

pub use catalog::Catalog;
pub use storage::{ImageFile, StorageError, UploadClient, UploadedImage};
pub use text_detection::{DetectedTextArea, TextDetector};

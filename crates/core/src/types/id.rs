//! Newtype document IDs for type-safe entity references.
//!
//! Documents in the managed store are keyed by opaque strings. Use the
//! `define_id!` macro to wrap them so a product ID can never be passed where
//! an order ID is expected.

/// Macro to define a type-safe document ID wrapper.
///
/// Creates a newtype wrapper around `String` with:
/// - `Serialize`/`Deserialize` with `#[serde(transparent)]`
/// - `Debug`, `Clone`, `Default`, `PartialEq`, `Eq`, `Hash`, `PartialOrd`, `Ord`
/// - Conversion methods: `new()`, `as_str()`, `into_inner()`
/// - `From<String>`, `From<&str>`, `Display` and `AsRef<str>`
///
/// # Example
///
/// ```rust
/// # use ember_wick_core::define_id;
/// define_id!(WickId);
/// define_id!(JarId);
///
/// let wick = WickId::new("cotton-01");
/// assert_eq!(wick.as_str(), "cotton-01");
///
/// // These are different types, so this won't compile:
/// // let _: JarId = wick;
/// ```
#[macro_export]
macro_rules! define_id {
    ($name:ident) => {
        #[derive(
            Debug,
            Clone,
            Default,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            ::serde::Serialize,
            ::serde::Deserialize
        )]
        #[serde(transparent)]
        pub struct $name(String);

        impl $name {
            /// Wrap a document ID.
            #[must_use]
            pub fn new(id: impl Into<String>) -> Self {
                Self(id.into())
            }

            /// Borrow the raw document ID.
            #[must_use]
            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Consume the wrapper and return the raw document ID.
            #[must_use]
            pub fn into_inner(self) -> String {
                self.0
            }
        }

        impl ::core::fmt::Display for $name {
            fn fmt(&self, f: &mut ::core::fmt::Formatter<'_>) -> ::core::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl ::core::convert::AsRef<str> for $name {
            fn as_ref(&self) -> &str {
                &self.0
            }
        }

        impl From<String> for $name {
            fn from(id: String) -> Self {
                Self(id)
            }
        }

        impl From<&str> for $name {
            fn from(id: &str) -> Self {
                Self(id.to_owned())
            }
        }

        impl From<$name> for String {
            fn from(id: $name) -> Self {
                id.0
            }
        }
    };
}

define_id!(ProductId);
define_id!(OrderId);
define_id!(ContactMessageId);
define_id!(TemplateId);
define_id!(FontId);
define_id!(BannerId);
define_id!(TestimonialId);

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_transparent_in_json() {
        let id = ProductId::new("lavender-dream");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"lavender-dream\"");

        let parsed: OrderId = serde_json::from_str("\"abc123\"").unwrap();
        assert_eq!(parsed.as_str(), "abc123");
    }

    #[test]
    fn test_display_and_conversions() {
        let id = FontId::from("playfair");
        assert_eq!(id.to_string(), "playfair");
        let raw: String = id.into();
        assert_eq!(raw, "playfair");
    }
}

//! Ordered, switchable site content: templates, fonts, banners, testimonials.

use super::{Entity, Repository, RepositoryError};
use crate::models::{Banner, CandleTemplate, CustomFont, Testimonial};
use crate::store::DocumentStore;

/// Content that an admin can toggle and reorder.
pub trait Positioned: Entity {
    fn is_active(&self) -> bool;
    fn position(&self) -> i32;
    fn sort_name(&self) -> &str;
}

macro_rules! impl_positioned {
    ($ty:ty, $name:ident) => {
        impl Positioned for $ty {
            fn is_active(&self) -> bool {
                self.active
            }

            fn position(&self) -> i32 {
                self.position
            }

            fn sort_name(&self) -> &str {
                &self.$name
            }
        }
    };
}

impl_positioned!(CandleTemplate, name);
impl_positioned!(CustomFont, name);
impl_positioned!(Banner, title);
impl_positioned!(Testimonial, author);

/// Sort by position, then name.
pub fn sort_by_position<T: Positioned>(items: &mut [T]) {
    items.sort_by(|a, b| {
        a.position()
            .cmp(&b.position())
            .then_with(|| a.sort_name().cmp(b.sort_name()))
    });
}

/// Every item, ordered for the admin list.
///
/// # Errors
///
/// Returns `RepositoryError::Store` if the request fails.
pub async fn all_ordered<T: Positioned>(store: &DocumentStore) -> Result<Vec<T>, RepositoryError> {
    let mut items = Repository::<T>::new(store).list().await?;
    sort_by_position(&mut items);
    Ok(items)
}

/// Active items only, ordered for display.
///
/// # Errors
///
/// Returns `RepositoryError::Store` if the request fails.
pub async fn active_ordered<T: Positioned>(
    store: &DocumentStore,
) -> Result<Vec<T>, RepositoryError> {
    let mut items = all_ordered::<T>(store).await?;
    items.retain(|item| item.is_active());
    Ok(items)
}

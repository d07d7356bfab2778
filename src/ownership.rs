use uuid::Uuid;

use crate::{businesses::repo_types::Business, error::AppError, products::repo_types::Product};

/// A mutable resource together with whatever is needed to find its owner.
#[derive(Debug, Clone, Copy)]
pub enum Owned<'a> {
    Business(&'a Business),
    Product {
        product: &'a Product,
        business: &'a Business,
    },
}

impl Owned<'_> {
    /// Follows the ownership chain down to a user id. A product paired with a
    /// business it does not belong to has no owner.
    pub fn owner(&self) -> Option<Uuid> {
        match self {
            Owned::Business(business) => Some(business.owner_id),
            Owned::Product { product, business } => {
                (product.business_id == business.id).then_some(business.owner_id)
            }
        }
    }
}

pub fn authorize_owner(resource: Owned<'_>, acting_user: Uuid) -> bool {
    resource.owner() == Some(acting_user)
}

/// Result of a store operation that checks ownership and mutates in one step.
#[derive(Debug, Clone, PartialEq)]
pub enum Guarded<T> {
    Applied(T),
    NotOwner,
    Missing,
}

impl<T> Guarded<T> {
    pub fn into_result(self, what: &'static str) -> Result<T, AppError> {
        match self {
            Guarded::Applied(value) => Ok(value),
            Guarded::NotOwner => Err(AppError::UnauthorizedAction),
            Guarded::Missing => Err(AppError::NotFound(what)),
        }
    }
}

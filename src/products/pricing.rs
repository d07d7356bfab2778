use time::Date;

use crate::{
    error::AppError,
    products::repo_types::{MAX_CATEGORY_LEN, MAX_PRODUCT_NAME_LEN},
    validation::bounded,
};

/// Discount percentage for a price drop from `original` to `new`.
///
/// Undefined (`None`) unless `original` is strictly positive; both prices must
/// be finite. A `new` above `original` yields a negative discount.
pub fn compute_discount(original: f64, new: f64) -> Option<f64> {
    if !original.is_finite() || !new.is_finite() || original <= 0.0 {
        return None;
    }
    Some((original - new) / original * 100.0)
}

/// Product fields that passed the pricing rule and the column limits. The only
/// way to build one is [`PricedProduct::new`], so a stored discount always
/// matches its prices.
#[derive(Debug, Clone, PartialEq)]
pub struct PricedProduct {
    pub name: String,
    pub category: String,
    pub original_price: f64,
    pub new_price: f64,
    pub offer_expiration_date: Option<Date>,
    percentage_discount: f64,
}

impl PricedProduct {
    pub fn new(
        name: String,
        category: String,
        original_price: f64,
        new_price: f64,
        offer_expiration_date: Option<Date>,
    ) -> Result<Self, AppError> {
        let name = bounded("name", &name, MAX_PRODUCT_NAME_LEN).map_err(AppError::Validation)?;
        let category =
            bounded("category", &category, MAX_CATEGORY_LEN).map_err(AppError::Validation)?;
        let percentage_discount = compute_discount(original_price, new_price).ok_or_else(|| {
            AppError::Validation("original_price must be greater than zero".into())
        })?;
        Ok(Self {
            name,
            category,
            original_price,
            new_price,
            offer_expiration_date,
            percentage_discount,
        })
    }

    pub fn percentage_discount(&self) -> f64 {
        self.percentage_discount
    }
}

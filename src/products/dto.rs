use serde::{Deserialize, Serialize};
use time::Date;
use uuid::Uuid;

use crate::{error::AppError, products::pricing::PricedProduct, products::repo_types::Product};

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

/// Create/update body. `percentage_discount` is not accepted from clients.
#[derive(Debug, Deserialize)]
pub struct ProductInput {
    pub name: String,
    pub category: String,
    pub original_price: f64,
    pub new_price: f64,
    #[serde(default, with = "iso_date::option")]
    pub offer_expiration_date: Option<Date>,
    /// Target business on create; defaults to the caller's own.
    #[serde(default)]
    pub business_id: Option<Uuid>,
}

impl ProductInput {
    pub fn priced(self) -> Result<PricedProduct, AppError> {
        PricedProduct::new(
            self.name,
            self.category,
            self.original_price,
            self.new_price,
            self.offer_expiration_date,
        )
    }
}

/// A product plus a presigned URL for its image.
#[derive(Debug, Serialize)]
pub struct ProductView {
    #[serde(flatten)]
    pub product: Product,
    pub image_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct BusinessDetails {
    pub name: String,
    pub city: String,
    pub region: String,
    pub description: Option<String>,
    pub logo: Option<String>,
    pub owner_id: Uuid,
    pub email: String,
    pub join_date: String,
}

#[derive(Debug, Serialize)]
pub struct ProductDetails {
    pub product_details: ProductView,
    pub business_details: BusinessDetails,
}

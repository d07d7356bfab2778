use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::{Date, OffsetDateTime};
use uuid::Uuid;

pub const MAX_PRODUCT_NAME_LEN: usize = 100;
pub const MAX_CATEGORY_LEN: usize = 30;

time::serde::format_description!(iso_date, Date, "[year]-[month]-[day]");

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Product {
    pub id: Uuid,
    pub business_id: Uuid,
    pub name: String,
    pub category: String,
    pub original_price: f64,
    pub new_price: f64,
    pub percentage_discount: f64,
    #[serde(default, with = "iso_date::option")]
    pub offer_expiration_date: Option<Date>,
    pub product_image: Option<String>, // storage key
    #[serde(with = "time::serde::rfc3339")]
    pub date_published: OffsetDateTime,
}

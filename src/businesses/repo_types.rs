use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{error::AppError, validation::bounded};

pub const UNSPECIFIED: &str = "Unspecified";
pub const MAX_BUSINESS_NAME_LEN: usize = 20;
pub const MAX_PLACE_LEN: usize = 100;
/// How many default names a new account tries before giving up.
pub const BUSINESS_NAME_ATTEMPTS: u32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Business {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub business_name: String,
    pub city: String,
    pub region: String,
    pub business_description: Option<String>,
    pub logo: Option<String>, // storage key
}

/// Name given to a new account's business on its `attempt`-th try (from 1):
/// the username, then `username-2`, `username-3`, ... cut to fit the column.
pub fn default_business_name(username: &str, attempt: u32) -> String {
    let suffix = if attempt <= 1 {
        String::new()
    } else {
        format!("-{attempt}")
    };
    let keep = MAX_BUSINESS_NAME_LEN.saturating_sub(suffix.len());
    let base: String = username.chars().take(keep).collect();
    format!("{base}{suffix}")
}

/// Partial update of the display metadata. `owner_id` is deliberately absent.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BusinessPatch {
    pub business_name: Option<String>,
    pub city: Option<String>,
    pub region: Option<String>,
    pub business_description: Option<String>,
}

impl BusinessPatch {
    /// Trims every field and checks the bounded ones against their columns.
    pub fn normalized(self) -> Result<Self, AppError> {
        let field = |name: &str, value: Option<String>, max: usize| {
            value
                .map(|v| bounded(name, &v, max))
                .transpose()
                .map_err(AppError::Validation)
        };
        Ok(Self {
            business_name: field("business_name", self.business_name, MAX_BUSINESS_NAME_LEN)?,
            city: field("city", self.city, MAX_PLACE_LEN)?,
            region: field("region", self.region, MAX_PLACE_LEN)?,
            business_description: self
                .business_description
                .map(|d| d.trim().to_string()),
        })
    }

    pub fn apply(&self, business: &mut Business) {
        if let Some(name) = &self.business_name {
            business.business_name = name.clone();
        }
        if let Some(city) = &self.city {
            business.city = city.clone();
        }
        if let Some(region) = &self.region {
            business.region = region.clone();
        }
        if let Some(description) = &self.business_description {
            business.business_description = Some(description.clone());
        }
    }
}

use serde::Serialize;
use uuid::Uuid;

use crate::businesses::repo_types::Business;

/// A business as returned to clients; `logo` is a presigned URL.
#[derive(Debug, Serialize)]
pub struct BusinessView {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub business_name: String,
    pub city: String,
    pub region: String,
    pub business_description: Option<String>,
    pub logo: Option<String>,
}

impl BusinessView {
    pub fn new(business: Business, logo: Option<String>) -> Self {
        Self {
            id: business.id,
            owner_id: business.owner_id,
            business_name: business.business_name,
            city: business.city,
            region: business.region,
            business_description: business.business_description,
            logo,
        }
    }
}

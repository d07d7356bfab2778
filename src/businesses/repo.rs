use anyhow::Context;
use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    businesses::repo_types::{Business, BusinessPatch},
    ownership::{authorize_owner, Guarded, Owned},
    store::{map_unique, PgStore},
};

#[async_trait]
pub trait BusinessRepo: Send + Sync {
    async fn find_business(&self, id: Uuid) -> anyhow::Result<Option<Business>>;

    async fn business_of_owner(&self, owner_id: Uuid) -> anyhow::Result<Option<Business>>;

    /// Applies `patch` if `acting_user` owns the business.
    async fn update_business(
        &self,
        id: Uuid,
        acting_user: Uuid,
        patch: &BusinessPatch,
    ) -> anyhow::Result<Guarded<Business>>;

    /// Points the logo at `logo_key` if `acting_user` owns the business.
    /// Also returns the key of the logo it replaced.
    async fn set_logo(
        &self,
        id: Uuid,
        acting_user: Uuid,
        logo_key: &str,
    ) -> anyhow::Result<Guarded<(Business, Option<String>)>>;
}

/// Loads a business with a row lock held until `tx` ends.
pub(crate) async fn lock_business(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
) -> anyhow::Result<Option<Business>> {
    let business = sqlx::query_as::<_, Business>(
        r#"
        SELECT id, owner_id, business_name, city, region, business_description, logo
        FROM businesses
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .context("lock business")?;
    Ok(business)
}

#[async_trait]
impl BusinessRepo for PgStore {
    async fn find_business(&self, id: Uuid) -> anyhow::Result<Option<Business>> {
        let business = sqlx::query_as::<_, Business>(
            r#"
            SELECT id, owner_id, business_name, city, region, business_description, logo
            FROM businesses
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find business")?;
        Ok(business)
    }

    async fn business_of_owner(&self, owner_id: Uuid) -> anyhow::Result<Option<Business>> {
        let business = sqlx::query_as::<_, Business>(
            r#"
            SELECT id, owner_id, business_name, city, region, business_description, logo
            FROM businesses
            WHERE owner_id = $1
            "#,
        )
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .context("find business by owner")?;
        Ok(business)
    }

    async fn update_business(
        &self,
        id: Uuid,
        acting_user: Uuid,
        patch: &BusinessPatch,
    ) -> anyhow::Result<Guarded<Business>> {
        let mut tx = self.pool.begin().await.context("begin tx")?;
        let Some(mut business) = lock_business(&mut tx, id).await? else {
            return Ok(Guarded::Missing);
        };
        if !authorize_owner(Owned::Business(&business), acting_user) {
            return Ok(Guarded::NotOwner);
        }
        patch.apply(&mut business);

        let updated = sqlx::query_as::<_, Business>(
            r#"
            UPDATE businesses
               SET business_name = $2, city = $3, region = $4, business_description = $5
             WHERE id = $1
            RETURNING id, owner_id, business_name, city, region, business_description, logo
            "#,
        )
        .bind(business.id)
        .bind(&business.business_name)
        .bind(&business.city)
        .bind(&business.region)
        .bind(&business.business_description)
        .fetch_one(&mut *tx)
        .await
        .map_err(|e| map_unique(e, "business name"))?;

        tx.commit().await.context("commit tx")?;
        Ok(Guarded::Applied(updated))
    }

    async fn set_logo(
        &self,
        id: Uuid,
        acting_user: Uuid,
        logo_key: &str,
    ) -> anyhow::Result<Guarded<(Business, Option<String>)>> {
        let mut tx = self.pool.begin().await.context("begin tx")?;
        let Some(business) = lock_business(&mut tx, id).await? else {
            return Ok(Guarded::Missing);
        };
        if !authorize_owner(Owned::Business(&business), acting_user) {
            return Ok(Guarded::NotOwner);
        }

        let updated = sqlx::query_as::<_, Business>(
            r#"
            UPDATE businesses
               SET logo = $2
             WHERE id = $1
            RETURNING id, owner_id, business_name, city, region, business_description, logo
            "#,
        )
        .bind(id)
        .bind(logo_key)
        .fetch_one(&mut *tx)
        .await
        .context("set business logo")?;

        tx.commit().await.context("commit tx")?;
        Ok(Guarded::Applied((updated, business.logo)))
    }
}

use anyhow::Context;
use async_trait::async_trait;
use sqlx::{Postgres, Transaction};
use uuid::Uuid;

use crate::{
    businesses::{repo::lock_business, repo_types::Business},
    ownership::{authorize_owner, Guarded, Owned},
    products::{pricing::PricedProduct, repo_types::Product},
    store::PgStore,
};

#[async_trait]
pub trait ProductRepo: Send + Sync {
    async fn list_products(&self) -> anyhow::Result<Vec<Product>>;

    async fn find_product(&self, id: Uuid) -> anyhow::Result<Option<Product>>;

    /// Inserts a product into `business_id` if `acting_user` owns that business.
    async fn create_product(
        &self,
        business_id: Uuid,
        acting_user: Uuid,
        fields: &PricedProduct,
    ) -> anyhow::Result<Guarded<Product>>;

    /// Replaces the priced fields and bumps `date_published`.
    async fn update_product(
        &self,
        id: Uuid,
        acting_user: Uuid,
        fields: &PricedProduct,
    ) -> anyhow::Result<Guarded<Product>>;

    /// Also returns the key of the image it replaced.
    async fn set_product_image(
        &self,
        id: Uuid,
        acting_user: Uuid,
        image_key: &str,
    ) -> anyhow::Result<Guarded<(Product, Option<String>)>>;

    /// Returns the deleted row.
    async fn delete_product(&self, id: Uuid, acting_user: Uuid)
        -> anyhow::Result<Guarded<Product>>;
}

/// Locks a product and its business for the rest of `tx`, then runs the
/// ownership check on the pair.
async fn lock_owned_product(
    tx: &mut Transaction<'_, Postgres>,
    id: Uuid,
    acting_user: Uuid,
) -> anyhow::Result<Guarded<(Product, Business)>> {
    let product = sqlx::query_as::<_, Product>(
        r#"
        SELECT id, business_id, name, category, original_price, new_price,
               percentage_discount, offer_expiration_date, product_image, date_published
        FROM products
        WHERE id = $1
        FOR UPDATE
        "#,
    )
    .bind(id)
    .fetch_optional(&mut **tx)
    .await
    .context("lock product")?;
    let Some(product) = product else {
        return Ok(Guarded::Missing);
    };
    let Some(business) = lock_business(tx, product.business_id).await? else {
        return Ok(Guarded::Missing);
    };

    let owned = Owned::Product {
        product: &product,
        business: &business,
    };
    if !authorize_owner(owned, acting_user) {
        return Ok(Guarded::NotOwner);
    }
    Ok(Guarded::Applied((product, business)))
}

#[async_trait]
impl ProductRepo for PgStore {
    async fn list_products(&self) -> anyhow::Result<Vec<Product>> {
        let rows = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, business_id, name, category, original_price, new_price,
                   percentage_discount, offer_expiration_date, product_image, date_published
            FROM products
            ORDER BY date_published DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .context("list products")?;
        Ok(rows)
    }

    async fn find_product(&self, id: Uuid) -> anyhow::Result<Option<Product>> {
        let row = sqlx::query_as::<_, Product>(
            r#"
            SELECT id, business_id, name, category, original_price, new_price,
                   percentage_discount, offer_expiration_date, product_image, date_published
            FROM products
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .context("find product")?;
        Ok(row)
    }

    async fn create_product(
        &self,
        business_id: Uuid,
        acting_user: Uuid,
        fields: &PricedProduct,
    ) -> anyhow::Result<Guarded<Product>> {
        let mut tx = self.pool.begin().await.context("begin tx")?;
        let Some(business) = lock_business(&mut tx, business_id).await? else {
            return Ok(Guarded::Missing);
        };
        if !authorize_owner(Owned::Business(&business), acting_user) {
            return Ok(Guarded::NotOwner);
        }

        let product = sqlx::query_as::<_, Product>(
            r#"
            INSERT INTO products (business_id, name, category, original_price, new_price,
                                  percentage_discount, offer_expiration_date)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, business_id, name, category, original_price, new_price,
                      percentage_discount, offer_expiration_date, product_image, date_published
            "#,
        )
        .bind(business.id)
        .bind(&fields.name)
        .bind(&fields.category)
        .bind(fields.original_price)
        .bind(fields.new_price)
        .bind(fields.percentage_discount())
        .bind(fields.offer_expiration_date)
        .fetch_one(&mut *tx)
        .await
        .context("insert product")?;

        tx.commit().await.context("commit tx")?;
        Ok(Guarded::Applied(product))
    }

    async fn update_product(
        &self,
        id: Uuid,
        acting_user: Uuid,
        fields: &PricedProduct,
    ) -> anyhow::Result<Guarded<Product>> {
        let mut tx = self.pool.begin().await.context("begin tx")?;
        match lock_owned_product(&mut tx, id, acting_user).await? {
            Guarded::Applied(_) => {}
            Guarded::NotOwner => return Ok(Guarded::NotOwner),
            Guarded::Missing => return Ok(Guarded::Missing),
        }

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
               SET name = $2, category = $3, original_price = $4, new_price = $5,
                   percentage_discount = $6, offer_expiration_date = $7,
                   date_published = now()
             WHERE id = $1
            RETURNING id, business_id, name, category, original_price, new_price,
                      percentage_discount, offer_expiration_date, product_image, date_published
            "#,
        )
        .bind(id)
        .bind(&fields.name)
        .bind(&fields.category)
        .bind(fields.original_price)
        .bind(fields.new_price)
        .bind(fields.percentage_discount())
        .bind(fields.offer_expiration_date)
        .fetch_one(&mut *tx)
        .await
        .context("update product")?;

        tx.commit().await.context("commit tx")?;
        Ok(Guarded::Applied(product))
    }

    async fn set_product_image(
        &self,
        id: Uuid,
        acting_user: Uuid,
        image_key: &str,
    ) -> anyhow::Result<Guarded<(Product, Option<String>)>> {
        let mut tx = self.pool.begin().await.context("begin tx")?;
        let replaced = match lock_owned_product(&mut tx, id, acting_user).await? {
            Guarded::Applied((product, _)) => product.product_image,
            Guarded::NotOwner => return Ok(Guarded::NotOwner),
            Guarded::Missing => return Ok(Guarded::Missing),
        };

        let product = sqlx::query_as::<_, Product>(
            r#"
            UPDATE products
               SET product_image = $2
             WHERE id = $1
            RETURNING id, business_id, name, category, original_price, new_price,
                      percentage_discount, offer_expiration_date, product_image, date_published
            "#,
        )
        .bind(id)
        .bind(image_key)
        .fetch_one(&mut *tx)
        .await
        .context("set product image")?;

        tx.commit().await.context("commit tx")?;
        Ok(Guarded::Applied((product, replaced)))
    }

    async fn delete_product(
        &self,
        id: Uuid,
        acting_user: Uuid,
    ) -> anyhow::Result<Guarded<Product>> {
        let mut tx = self.pool.begin().await.context("begin tx")?;
        let product = match lock_owned_product(&mut tx, id, acting_user).await? {
            Guarded::Applied((product, _)) => product,
            Guarded::NotOwner => return Ok(Guarded::NotOwner),
            Guarded::Missing => return Ok(Guarded::Missing),
        };

        sqlx::query("DELETE FROM products WHERE id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await
            .context("delete product")?;

        tx.commit().await.context("commit tx")?;
        Ok(Guarded::Applied(product))
    }
}

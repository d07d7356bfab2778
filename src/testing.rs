//! In-memory stand-ins for the database, blob store and SMTP relay.

use std::{
    collections::HashMap,
    io::Cursor,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard,
    },
};

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request},
};
use bytes::Bytes;
use time::OffsetDateTime;
use uuid::Uuid;

use crate::{
    auth::{
        password::hash_password,
        repo::UserRepo,
        repo_types::{NewUser, User},
    },
    businesses::{
        repo::BusinessRepo,
        repo_types::{
            default_business_name, Business, BusinessPatch, BUSINESS_NAME_ATTEMPTS, UNSPECIFIED,
        },
    },
    config::{AppConfig, JwtConfig, SmtpConfig, StorageConfig},
    email::{Mailer, OutgoingEmail},
    ownership::{authorize_owner, Guarded, Owned},
    products::{pricing::PricedProduct, repo::ProductRepo, repo_types::Product},
    state::AppState,
    storage::StorageClient,
    store::AlreadyExists,
};

#[derive(Default)]
struct Tables {
    users: HashMap<Uuid, User>,
    businesses: HashMap<Uuid, Business>,
    products: HashMap<Uuid, Product>,
}

impl Tables {
    fn owned_product(&self, id: Uuid, acting_user: Uuid) -> Guarded<()> {
        let Some(product) = self.products.get(&id) else {
            return Guarded::Missing;
        };
        let Some(business) = self.businesses.get(&product.business_id) else {
            return Guarded::Missing;
        };
        let owned = Owned::Product { product, business };
        if authorize_owner(owned, acting_user) {
            Guarded::Applied(())
        } else {
            Guarded::NotOwner
        }
    }

    fn owned_business(&self, id: Uuid, acting_user: Uuid) -> Guarded<()> {
        match self.businesses.get(&id) {
            None => Guarded::Missing,
            Some(b) if authorize_owner(Owned::Business(b), acting_user) => Guarded::Applied(()),
            Some(_) => Guarded::NotOwner,
        }
    }
}

/// Every operation runs under one mutex, so check-and-apply is atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    fn tables(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store poisoned")
    }

    pub fn product_count(&self) -> usize {
        self.tables().products.len()
    }

    pub fn business_count(&self) -> usize {
        self.tables().businesses.len()
    }
}

#[async_trait]
impl UserRepo for MemoryStore {
    async fn find_user(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        Ok(self.tables().users.get(&id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|u| u.username == username)
            .cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> anyhow::Result<Option<User>> {
        Ok(self
            .tables()
            .users
            .values()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn create_account(&self, new_user: NewUser) -> anyhow::Result<(User, Business)> {
        let mut t = self.tables();
        if t.users
            .values()
            .any(|u| u.username == new_user.username || u.email == new_user.email)
        {
            return Err(AlreadyExists("account").into());
        }
        let Some(business_name) = (1..=BUSINESS_NAME_ATTEMPTS)
            .map(|attempt| default_business_name(&new_user.username, attempt))
            .find(|name| !t.businesses.values().any(|b| &b.business_name == name))
        else {
            return Err(AlreadyExists("business").into());
        };

        let user = User {
            id: Uuid::new_v4(),
            username: new_user.username,
            email: new_user.email,
            password_hash: new_user.password_hash,
            is_verified: false,
            join_date: OffsetDateTime::now_utc(),
        };
        let business = Business {
            id: Uuid::new_v4(),
            owner_id: user.id,
            business_name,
            city: UNSPECIFIED.into(),
            region: UNSPECIFIED.into(),
            business_description: None,
            logo: None,
        };
        t.users.insert(user.id, user.clone());
        t.businesses.insert(business.id, business.clone());
        Ok((user, business))
    }

    async fn mark_verified(&self, id: Uuid) -> anyhow::Result<Option<User>> {
        let mut t = self.tables();
        Ok(t.users.get_mut(&id).map(|u| {
            u.is_verified = true;
            u.clone()
        }))
    }
}

#[async_trait]
impl BusinessRepo for MemoryStore {
    async fn find_business(&self, id: Uuid) -> anyhow::Result<Option<Business>> {
        Ok(self.tables().businesses.get(&id).cloned())
    }

    async fn business_of_owner(&self, owner_id: Uuid) -> anyhow::Result<Option<Business>> {
        Ok(self
            .tables()
            .businesses
            .values()
            .find(|b| b.owner_id == owner_id)
            .cloned())
    }

    async fn update_business(
        &self,
        id: Uuid,
        acting_user: Uuid,
        patch: &BusinessPatch,
    ) -> anyhow::Result<Guarded<Business>> {
        let mut t = self.tables();
        match t.owned_business(id, acting_user) {
            Guarded::Applied(()) => {}
            Guarded::NotOwner => return Ok(Guarded::NotOwner),
            Guarded::Missing => return Ok(Guarded::Missing),
        }
        if let Some(name) = &patch.business_name {
            if t.businesses
                .values()
                .any(|b| b.id != id && &b.business_name == name)
            {
                return Err(AlreadyExists("business name").into());
            }
        }
        let Some(business) = t.businesses.get_mut(&id) else {
            return Ok(Guarded::Missing);
        };
        patch.apply(business);
        Ok(Guarded::Applied(business.clone()))
    }

    async fn set_logo(
        &self,
        id: Uuid,
        acting_user: Uuid,
        logo_key: &str,
    ) -> anyhow::Result<Guarded<(Business, Option<String>)>> {
        let mut t = self.tables();
        match t.owned_business(id, acting_user) {
            Guarded::Applied(()) => {}
            Guarded::NotOwner => return Ok(Guarded::NotOwner),
            Guarded::Missing => return Ok(Guarded::Missing),
        }
        let Some(business) = t.businesses.get_mut(&id) else {
            return Ok(Guarded::Missing);
        };
        let replaced = business.logo.replace(logo_key.to_string());
        Ok(Guarded::Applied((business.clone(), replaced)))
    }
}

#[async_trait]
impl ProductRepo for MemoryStore {
    async fn list_products(&self) -> anyhow::Result<Vec<Product>> {
        let mut rows: Vec<Product> = self.tables().products.values().cloned().collect();
        rows.sort_by(|a, b| b.date_published.cmp(&a.date_published));
        Ok(rows)
    }

    async fn find_product(&self, id: Uuid) -> anyhow::Result<Option<Product>> {
        Ok(self.tables().products.get(&id).cloned())
    }

    async fn create_product(
        &self,
        business_id: Uuid,
        acting_user: Uuid,
        fields: &PricedProduct,
    ) -> anyhow::Result<Guarded<Product>> {
        let mut t = self.tables();
        match t.owned_business(business_id, acting_user) {
            Guarded::Applied(()) => {}
            Guarded::NotOwner => return Ok(Guarded::NotOwner),
            Guarded::Missing => return Ok(Guarded::Missing),
        }
        let product = Product {
            id: Uuid::new_v4(),
            business_id,
            name: fields.name.clone(),
            category: fields.category.clone(),
            original_price: fields.original_price,
            new_price: fields.new_price,
            percentage_discount: fields.percentage_discount(),
            offer_expiration_date: fields.offer_expiration_date,
            product_image: None,
            date_published: OffsetDateTime::now_utc(),
        };
        t.products.insert(product.id, product.clone());
        Ok(Guarded::Applied(product))
    }

    async fn update_product(
        &self,
        id: Uuid,
        acting_user: Uuid,
        fields: &PricedProduct,
    ) -> anyhow::Result<Guarded<Product>> {
        let mut t = self.tables();
        match t.owned_product(id, acting_user) {
            Guarded::Applied(()) => {}
            Guarded::NotOwner => return Ok(Guarded::NotOwner),
            Guarded::Missing => return Ok(Guarded::Missing),
        }
        let Some(product) = t.products.get_mut(&id) else {
            return Ok(Guarded::Missing);
        };
        product.name = fields.name.clone();
        product.category = fields.category.clone();
        product.original_price = fields.original_price;
        product.new_price = fields.new_price;
        product.percentage_discount = fields.percentage_discount();
        product.offer_expiration_date = fields.offer_expiration_date;
        product.date_published = OffsetDateTime::now_utc();
        Ok(Guarded::Applied(product.clone()))
    }

    async fn set_product_image(
        &self,
        id: Uuid,
        acting_user: Uuid,
        image_key: &str,
    ) -> anyhow::Result<Guarded<(Product, Option<String>)>> {
        let mut t = self.tables();
        match t.owned_product(id, acting_user) {
            Guarded::Applied(()) => {}
            Guarded::NotOwner => return Ok(Guarded::NotOwner),
            Guarded::Missing => return Ok(Guarded::Missing),
        }
        let Some(product) = t.products.get_mut(&id) else {
            return Ok(Guarded::Missing);
        };
        let replaced = product.product_image.replace(image_key.to_string());
        Ok(Guarded::Applied((product.clone(), replaced)))
    }

    async fn delete_product(
        &self,
        id: Uuid,
        acting_user: Uuid,
    ) -> anyhow::Result<Guarded<Product>> {
        let mut t = self.tables();
        match t.owned_product(id, acting_user) {
            Guarded::Applied(()) => {}
            Guarded::NotOwner => return Ok(Guarded::NotOwner),
            Guarded::Missing => return Ok(Guarded::Missing),
        }
        Ok(t.products
            .remove(&id)
            .map_or(Guarded::Missing, Guarded::Applied))
    }
}

#[derive(Default)]
pub struct FakeStorage {
    objects: Mutex<HashMap<String, (Bytes, String)>>,
}

impl FakeStorage {
    pub fn contains(&self, key: &str) -> bool {
        self.objects.lock().unwrap().contains_key(key)
    }

    pub fn keys(&self) -> Vec<String> {
        self.objects.lock().unwrap().keys().cloned().collect()
    }
}

#[async_trait]
impl StorageClient for FakeStorage {
    async fn put_object(&self, key: &str, body: Bytes, content_type: &str) -> anyhow::Result<()> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_string(), (body, content_type.to_string()));
        Ok(())
    }

    async fn delete_object(&self, key: &str) -> anyhow::Result<()> {
        self.objects.lock().unwrap().remove(key);
        Ok(())
    }

    async fn presign_get(&self, key: &str, _seconds: u64) -> anyhow::Result<String> {
        Ok(format!("https://fake.local/{}", key))
    }
}

/// Keeps every message instead of sending it; can be told to fail.
#[derive(Default)]
pub struct RecordingMailer {
    sent: Mutex<Vec<OutgoingEmail>>,
    failing: AtomicBool,
}

impl RecordingMailer {
    pub fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.lock().unwrap().clone()
    }

    pub fn fail_sends(&self, failing: bool) {
        self.failing.store(failing, Ordering::SeqCst);
    }
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: OutgoingEmail) -> anyhow::Result<()> {
        if self.failing.load(Ordering::SeqCst) {
            anyhow::bail!("smtp unavailable");
        }
        self.sent.lock().unwrap().push(email);
        Ok(())
    }
}

pub fn test_config() -> AppConfig {
    AppConfig {
        database_url: "postgres://unused".into(),
        public_base_url: "http://shop.test".into(),
        jwt: JwtConfig {
            secret: "test-secret".into(),
            issuer: "test-issuer".into(),
            audience: "test-aud".into(),
            session_ttl_minutes: None,
            verification_ttl_minutes: None,
        },
        smtp: SmtpConfig {
            host: "localhost".into(),
            port: 2525,
            username: "shop@example.com".into(),
            password: "unused".into(),
            from_address: "shop@example.com".into(),
            timeout_secs: 2,
        },
        storage: StorageConfig {
            endpoint: "fake".into(),
            bucket: "fake".into(),
            access_key: "fake".into(),
            secret_key: "fake".into(),
            region: "us-east-1".into(),
        },
    }
}

/// An [`AppState`] wired to in-memory fakes, with handles to inspect them.
pub struct TestContext {
    pub state: AppState,
    pub store: Arc<MemoryStore>,
    pub storage: Arc<FakeStorage>,
    pub mailer: Arc<RecordingMailer>,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::default());
        let storage = Arc::new(FakeStorage::default());
        let mailer = Arc::new(RecordingMailer::default());
        let state = AppState::from_parts(
            store.clone(),
            Arc::new(test_config()),
            storage.clone(),
            mailer.clone(),
        )
        .expect("test state");
        Self {
            state,
            store,
            storage,
            mailer,
        }
    }

    /// Creates a user and its business directly in the store, no email sent.
    pub async fn seed_user(&self, username: &str, password: &str) -> (User, Business) {
        self.store
            .create_account(NewUser {
                username: username.into(),
                email: format!("{username}@example.com"),
                password_hash: hash_password(password).unwrap(),
            })
            .await
            .unwrap()
    }

    pub fn access_token(&self, user: &User) -> String {
        self.state.keys.sign_access(user.id, &user.username).unwrap()
    }
}

pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_pixel(width, height, image::Rgba([200, 30, 30, 255]));
    let mut out = Cursor::new(Vec::new());
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut out, image::ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

pub async fn body_json(res: axum::response::Response) -> serde_json::Value {
    let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

const BOUNDARY: &str = "easyshop-test-boundary";

/// A multipart request body with a single `file` field.
pub fn multipart_file(uri: &str, token: &str, filename: &str, data: &[u8]) -> Request<Body> {
    let mut body = Vec::new();
    body.extend_from_slice(
        format!(
            "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"file\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
        )
        .as_bytes(),
    );
    body.extend_from_slice(data);
    body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());

    Request::post(uri)
        .header(header::AUTHORIZATION, format!("Bearer {token}"))
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

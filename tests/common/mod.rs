//! Shared test harness for integration tests.
//!
//! [`TestHarness::start`] builds an in-memory DB, a temp-dir image store and a
//! full [`AppContext`], seeds one administrator and serves the router on a
//! random port.

#![allow(dead_code)]

use std::io::Cursor;
use std::net::SocketAddr;

use image::{ImageFormat, Rgb, RgbImage, Rgba, RgbaImage};
use tempfile::TempDir;

use vt_core::config::Config;
use vt_core::ItemId;
use vt_db::fields::ItemDraft;
use vt_db::pool::{init_memory_pool, DbPool};
use vt_server::context::AppContext;
use vt_server::router::build_router;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const ADMIN_PASSWORD: &str = "correct horse battery staple";

pub struct TestHarness {
    pub ctx: AppContext,
    pub db: DbPool,
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    _storage: TempDir,
}

impl TestHarness {
    /// Start a server with test defaults.
    pub async fn start() -> Self {
        Self::start_with(|_| {}).await
    }

    /// Start a server after letting the caller adjust the configuration.
    pub async fn start_with(configure: impl FnOnce(&mut Config)) -> Self {
        let storage = tempfile::tempdir().expect("failed to create temp dir");

        let mut config = Config::default();
        config.auth.secret = "test-secret-0123456789abcdef0123456789".into();
        config.auth.bcrypt_cost = 4;
        config.images.storage_dir = storage.path().join("images");
        config.images.max_concurrent_transforms = 2;
        configure(&mut config);

        let db = init_memory_pool().expect("failed to create in-memory pool");
        {
            let conn = vt_db::pool::get_conn(&db).expect("failed to get db connection");
            let hash = vt_server::token::hash_password(ADMIN_PASSWORD, 4).expect("hash");
            vt_db::queries::users::create_user(&conn, ADMIN_EMAIL, &hash, "admin")
                .expect("failed to seed admin");
        }

        let ctx = AppContext::new(db.clone(), config);
        ctx.images
            .store()
            .ensure_dir()
            .await
            .expect("failed to create image store");

        let app = build_router(ctx.clone());
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        Self {
            ctx,
            db,
            addr,
            client: reqwest::Client::new(),
            _storage: storage,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    /// Get a database connection from the pool.
    pub fn conn(&self) -> vt_db::pool::PooledConnection {
        vt_db::pool::get_conn(&self.db).expect("failed to get db connection")
    }

    /// Log in as the seeded administrator and return the bearer token.
    pub async fn login(&self) -> String {
        let resp = self
            .client
            .post(self.url("/admin/login"))
            .json(&serde_json::json!({ "email": ADMIN_EMAIL, "password": ADMIN_PASSWORD }))
            .send()
            .await
            .unwrap();
        assert_eq!(resp.status(), 200);
        let body: serde_json::Value = resp.json().await.unwrap();
        body["token"].as_str().unwrap().to_string()
    }

    /// Insert an item directly and return its ID.
    pub fn create_item(&self, name: &str) -> ItemId {
        let draft = ItemDraft {
            name: name.into(),
            description: None,
            sku: None,
            price_cents: None,
            is_active: None,
        };
        vt_db::queries::items::create_item(&self.conn(), &draft)
            .unwrap()
            .id
    }

    /// Upload `bytes` as the `image` field for `item_id`.
    pub async fn upload(
        &self,
        token: &str,
        item_id: &str,
        bytes: Vec<u8>,
        file_name: &str,
        mime: &str,
    ) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(bytes)
            .file_name(file_name.to_string())
            .mime_str(mime)
            .unwrap();
        let form = reqwest::multipart::Form::new().part("image", part);
        self.client
            .post(self.url(&format!("/item/image/upload/{item_id}")))
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .unwrap()
    }

    /// Upload a fixture and return the stored file name.
    pub async fn upload_fixture(&self, token: &str, item_id: ItemId) -> String {
        let resp = self
            .upload(token, &item_id.to_string(), jpeg_fixture(64, 48), "photo.jpg", "image/jpeg")
            .await;
        assert_eq!(resp.status(), 201);
        let body: serde_json::Value = resp.json().await.unwrap();
        body["fileName"].as_str().unwrap().to_string()
    }
}

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        Rgb([(x * 255 / width.max(1)) as u8, (y * 255 / height.max(1)) as u8, 128])
    })
}

pub fn jpeg_fixture(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    gradient(width, height)
        .write_to(&mut out, ImageFormat::Jpeg)
        .unwrap();
    out.into_inner()
}

pub fn png_fixture(width: u32, height: u32) -> Vec<u8> {
    let mut out = Cursor::new(Vec::new());
    gradient(width, height)
        .write_to(&mut out, ImageFormat::Png)
        .unwrap();
    out.into_inner()
}

pub fn gif_fixture(width: u32, height: u32) -> Vec<u8> {
    let img = RgbaImage::from_fn(width, height, |x, _| Rgba([(x % 256) as u8, 0, 200, 255]));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Gif).unwrap();
    out.into_inner()
}

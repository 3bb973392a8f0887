//! Shared test harness for integration tests.
//!
//! Provides [`TestHarness`] which creates a temporary data file and upload
//! directory, a known edit key, and a full [`AppContext`]. The
//! [`TestHarness::with_server`] constructor starts Axum on a random port for
//! HTTP-level testing.

#![allow(dead_code)]

use std::net::SocketAddr;

use serde_json::{json, Value};
use tempfile::TempDir;

use vogel_core::config::Config;
use vogel_server::context::AppContext;
use vogel_server::router::build_router;
use vogel_store::JsonStore;

/// Edit key configured on every harness.
pub const EDIT_KEY: &str = "test-edit-key";

/// Test harness wrapping an [`AppContext`] backed by a temporary directory.
pub struct TestHarness {
    pub ctx: AppContext,
    pub addr: SocketAddr,
    pub client: reqwest::Client,
    _dir: TempDir,
}

impl TestHarness {
    /// Default configuration rooted in `dir`.
    pub fn config_in(dir: &TempDir) -> Config {
        let mut config = Config::default();
        config.storage.data_file = dir.path().join("birds.data.json");
        config.uploads.dir = dir.path().join("uploads");
        config.auth.edit_key = EDIT_KEY.into();
        config
    }

    /// Start a server with default test configuration.
    pub async fn with_server() -> Self {
        Self::with_server_config(|_| {}).await
    }

    /// Start a server after letting `customize` adjust the configuration.
    pub async fn with_server_config(customize: impl FnOnce(&mut Config)) -> Self {
        let dir = tempfile::tempdir().expect("failed to create temp dir");
        let mut config = Self::config_in(&dir);
        customize(&mut config);

        let store = JsonStore::open(&config.storage.data_file).expect("failed to open store");
        let ctx = AppContext::new(config, store);
        ctx.images.ensure_dirs().expect("failed to create image dirs");
        let app = build_router(ctx.clone(), None);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind random port");
        let addr = listener.local_addr().expect("failed to get local addr");

        tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let client = reqwest::Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .expect("failed to build client");

        Self {
            ctx,
            addr,
            client,
            _dir: dir,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client.get(self.url(path)).send().await.unwrap()
    }

    /// POST JSON with the edit key header.
    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .header("x-edit-key", EDIT_KEY)
            .json(body)
            .send()
            .await
            .unwrap()
    }

    /// PUT JSON with the edit key header.
    pub async fn put_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .header("x-edit-key", EDIT_KEY)
            .json(body)
            .send()
            .await
            .unwrap()
    }

    /// DELETE with the edit key header.
    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .header("x-edit-key", EDIT_KEY)
            .send()
            .await
            .unwrap()
    }

    /// Create a species through the API.
    pub async fn create_species(&self, id: &str) -> Value {
        let resp = self.post_json("/species", &species_json(id)).await;
        assert_eq!(resp.status(), 201);
        resp.json().await.unwrap()
    }

    /// Create an observation through the API.
    pub async fn create_observation(&self, id: &str, species_id: &str, date: &str) -> Value {
        let resp = self
            .post_json("/observations", &observation_json(id, species_id, date))
            .await;
        assert_eq!(resp.status(), 201);
        resp.json().await.unwrap()
    }

    /// Upload `data` as `filename` and return the stored name.
    pub async fn upload(&self, filename: &str, mime: &str, data: Vec<u8>) -> reqwest::Response {
        let part = reqwest::multipart::Part::bytes(data)
            .file_name(filename.to_string())
            .mime_str(mime)
            .unwrap();
        let form = reqwest::multipart::Form::new().part("file", part);
        self.client
            .post(self.url("/upload-image"))
            .header("x-edit-key", EDIT_KEY)
            .multipart(form)
            .send()
            .await
            .unwrap()
    }
}

pub fn species_json(id: &str) -> Value {
    json!({
        "id": id,
        "commonName": format!("Common {id}"),
        "scientificName": format!("Avis {id}"),
        "family": "Turdidae",
        "conservationStatus": "LC",
        "images": [],
        "recordings": []
    })
}

pub fn observation_json(id: &str, species_id: &str, date: &str) -> Value {
    json!({
        "id": id,
        "speciesId": species_id,
        "date": date,
        "location": {"latitude": 52.52, "longitude": 13.405},
        "observer": "Kim",
        "title": format!("Observation {id}")
    })
}

/// Encode a solid `width` x `height` PNG.
pub fn png_bytes(width: u32, height: u32) -> Vec<u8> {
    let img = image::RgbImage::from_pixel(width, height, image::Rgb([40, 120, 200]));
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgb8(img)
        .write_to(&mut std::io::Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

//! Integration tests for Medicart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p medicart-integration-tests
//! ```
//!
//! The storefront router is driven in-process with
//! `tower::ServiceExt::oneshot`: sessions live in `tower_sessions::MemoryStore`,
//! the readiness probe hits an in-memory `SQLite` pool, and the catalog is the
//! one shipped in `crates/storefront/content`.
//!
//! # Test Categories
//!
//! - `catalog_page` - Catalog rendering, health checks, headers
//! - `cart_flow` - Add, confirm, remove, reset and persistence across loads
//! - `favourites` - Saving and applying the favorite order
//! - `checkout` - Buy now and the payment gates

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::missing_panics_doc)]

use std::path::{Path, PathBuf};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Request, StatusCode, header},
};
use medicart_storefront::config::{CatalogLocation, SentryConfig, StorefrontConfig};
use medicart_storefront::state::AppState;
use medicart_storefront::{app, db};
use secrecy::SecretString;
use tower::ServiceExt;
use tower_sessions::MemoryStore;

/// Largest response body read by the helpers.
const BODY_LIMIT: usize = 1024 * 1024;

fn storefront_dir() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join("../storefront")
}

/// The catalog shipped with the storefront.
#[must_use]
pub fn shipped_catalog() -> CatalogLocation {
    CatalogLocation::File(storefront_dir().join("content/catalog.json"))
}

/// Write `json` to a catalog file in the temp directory.
///
/// `name` keeps files of concurrently running tests apart.
#[must_use]
pub fn temp_catalog(name: &str, json: &str) -> CatalogLocation {
    let path = std::env::temp_dir().join(format!("medicart-{name}-{}.json", std::process::id()));
    std::fs::write(&path, json).unwrap();
    CatalogLocation::File(path)
}

/// Configuration for an in-process storefront.
#[must_use]
pub fn test_config(catalog: CatalogLocation) -> StorefrontConfig {
    StorefrontConfig {
        database_url: SecretString::from("sqlite::memory:"),
        host: "127.0.0.1".parse().unwrap(),
        port: 3000,
        base_url: "http://localhost:3000".parse().unwrap(),
        catalog,
        static_dir: storefront_dir().join("static"),
        delivery_days: 2,
        sentry: SentryConfig::default(),
    }
}

/// A rendered response.
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub location: Option<String>,
    pub content_type: Option<String>,
    pub body: String,
}

impl TestResponse {
    /// The displayed order total.
    #[must_use]
    pub fn total(&self) -> Option<&str> {
        let marker = r#"id="total-price" colspan="2">"#;
        let start = self.body.find(marker)? + marker.len();
        let rest = self.body.get(start..)?;
        rest.split('<').next()
    }

    /// Number of rows in the order table.
    #[must_use]
    pub fn order_rows(&self) -> usize {
        self.body.matches(r#"action="/cart/remove""#).count()
    }

    /// Number of inline field annotations.
    #[must_use]
    pub fn field_errors(&self) -> usize {
        self.body.matches(r#"class="error-message""#).count()
    }

    /// Number of fields rendered with the error border.
    #[must_use]
    pub fn flagged_fields(&self) -> usize {
        self.body.matches(r#"class="invalid""#).count()
    }
}

/// One visitor talking to a storefront, carrying the session cookie.
pub struct TestContext {
    app: Router,
    sessions: MemoryStore,
    cookie: Option<String>,
}

impl TestContext {
    /// A storefront serving the shipped catalog.
    pub async fn new() -> Self {
        Self::with_catalog(shipped_catalog()).await
    }

    /// A storefront serving the catalog at `location`.
    pub async fn with_catalog(location: CatalogLocation) -> Self {
        Self::build(location, MemoryStore::default()).await
    }

    /// This visitor, with its session, on a storefront serving `location`.
    pub async fn same_visitor_on(&self, location: CatalogLocation) -> Self {
        let mut ctx = Self::build(location, self.sessions.clone()).await;
        ctx.cookie.clone_from(&self.cookie);
        ctx
    }

    /// A second visitor on the same storefront, with no cookie.
    #[must_use]
    pub fn new_visitor(&self) -> Self {
        Self {
            app: self.app.clone(),
            sessions: self.sessions.clone(),
            cookie: None,
        }
    }

    async fn build(location: CatalogLocation, sessions: MemoryStore) -> Self {
        let config = test_config(location);
        let pool = db::create_pool(&config.database_url)
            .await
            .expect("in-memory SQLite pool");
        let state = AppState::new(config, pool);

        Self {
            app: app(state, sessions.clone()),
            sessions,
            cookie: None,
        }
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        let request = self.request("GET", path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    /// POST an urlencoded form.
    pub async fn post(&mut self, path: &str, form: &[(&str, &str)]) -> TestResponse {
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(form)
            .finish();
        let request = self
            .request("POST", path)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap();
        self.send(request).await
    }

    /// POST a form and follow the redirect with a GET.
    pub async fn post_and_follow(&mut self, path: &str, form: &[(&str, &str)]) -> TestResponse {
        let response = self.post(path, form).await;
        assert_eq!(
            response.status,
            StatusCode::SEE_OTHER,
            "expected redirect from {path}, got body: {}",
            response.body
        );
        let location = response.location.expect("redirect location");
        self.get(&location).await
    }

    /// Ask to add a product, then answer the prompt.
    pub async fn add(&mut self, product_id: &str, quantity: &str, decision: &str) -> TestResponse {
        let prompt = self
            .post(
                "/cart/add",
                &[("product_id", product_id), ("quantity", quantity)],
            )
            .await;
        assert_eq!(prompt.status, StatusCode::OK, "prompt: {}", prompt.body);

        self.post_and_follow(
            "/cart/add/confirm",
            &[
                ("product_id", product_id),
                ("quantity", quantity),
                ("decision", decision),
            ],
        )
        .await
    }

    fn request(&self, method: &str, path: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(path);
        match &self.cookie {
            Some(cookie) => builder.header(header::COOKIE, cookie),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> TestResponse {
        let response = self.app.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response.headers().get(header::SET_COOKIE) {
            let pair = set_cookie.to_str().unwrap().split(';').next().unwrap();
            self.cookie = Some(pair.to_string());
        }

        let header_string = |name: header::HeaderName| {
            response
                .headers()
                .get(name)
                .map(|v| v.to_str().unwrap().to_string())
        };
        let status = response.status();
        let location = header_string(header::LOCATION);
        let content_type = header_string(header::CONTENT_TYPE);
        let bytes = to_bytes(response.into_body(), BODY_LIMIT).await.unwrap();

        TestResponse {
            status,
            location,
            content_type,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }
}

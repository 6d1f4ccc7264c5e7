#![allow(dead_code)]

use std::net::SocketAddr;
use std::time::Duration;

use reqwest::header::HeaderMap;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use uuid::Uuid;

use worktrack::config::{Config, TenancyConfig};

/// How a test request names its tenant.
#[derive(Clone, Copy)]
pub enum Tenant<'a> {
    None,
    SlugHeader(&'a str),
    IdHeader(&'a str),
    SlugParam(&'a str),
    IdParam(&'a str),
}

impl Tenant<'_> {
    fn apply_headers(self, req: RequestBuilder) -> RequestBuilder {
        match self {
            Tenant::SlugHeader(slug) => req.header("X-Tenant-Slug", slug),
            Tenant::IdHeader(id) => req.header("X-Tenant-Id", id),
            _ => req,
        }
    }

    fn query_pair(self) -> Option<(&'static str, String)> {
        match self {
            Tenant::SlugParam(slug) => Some(("tenant_slug", slug.to_string())),
            Tenant::IdParam(id) => Some(("tenant_id", id.to_string())),
            _ => None,
        }
    }
}

/// A running test server instance with a dedicated test database.
pub struct TestApp {
    pub addr: SocketAddr,
    pub pool: PgPool,
    pub client: Client,
    pub db_name: String,
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestApp {
    pub fn url(&self, path: &str) -> String {
        format!("http://{}{}", self.addr, path)
    }

    fn tenant_url(&self, path: &str, tenant: Tenant<'_>) -> String {
        let url = self.url(path);
        match tenant.query_pair() {
            Some((key, value)) => {
                let sep = if path.contains('?') { '&' } else { '?' };
                let encoded: String = form_urlencoded::byte_serialize(value.as_bytes()).collect();
                format!("{url}{sep}{key}={encoded}")
            }
            None => url,
        }
    }

    async fn send(&self, req: RequestBuilder, tenant: Tenant<'_>) -> Reply {
        let resp = tenant.apply_headers(req).send().await.expect("request failed");
        let status = resp.status();
        let headers = resp.headers().clone();
        let body: Value = resp.json().await.unwrap_or(json!(null));
        Reply {
            status,
            headers,
            body,
        }
    }

    pub async fn get(&self, path: &str, tenant: Tenant<'_>) -> Reply {
        self.send(self.client.get(self.tenant_url(path, tenant)), tenant).await
    }

    pub async fn post(&self, path: &str, tenant: Tenant<'_>, body: &Value) -> Reply {
        self.send(self.client.post(self.tenant_url(path, tenant)).json(body), tenant)
            .await
    }

    pub async fn put(&self, path: &str, tenant: Tenant<'_>, body: &Value) -> Reply {
        self.send(self.client.put(self.tenant_url(path, tenant)).json(body), tenant)
            .await
    }

    /// Create an organization, return the organization JSON.
    pub async fn create_organization(&self, name: &str, slug: Option<&str>) -> Value {
        let mut body = json!({ "name": name, "contact_email": "owner@example.com" });
        if let Some(slug) = slug {
            body["slug"] = json!(slug);
        }
        let reply = self.post("/api/organizations", Tenant::None, &body).await;
        assert_eq!(reply.status, StatusCode::OK, "create organization failed: {}", reply.body);
        reply.body["organization"].clone()
    }

    pub async fn deactivate_organization(&self, id: &str) {
        let reply = self
            .put(
                &format!("/api/organizations/{id}"),
                Tenant::None,
                &json!({ "is_active": false }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "deactivate failed: {}", reply.body);
    }

    /// Create a project inside the tenant named by `slug`, return the project JSON.
    pub async fn create_project(&self, slug: &str, name: &str) -> Value {
        let reply = self
            .post(
                "/api/projects",
                Tenant::SlugHeader(slug),
                &json!({ "name": name, "description": "test project" }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "create project failed: {}", reply.body);
        reply.body["project"].clone()
    }

    /// Create a task under a project, return the task JSON.
    pub async fn create_task(&self, slug: &str, project_id: &str, title: &str, status: &str) -> Value {
        let reply = self
            .post(
                &format!("/api/projects/{project_id}/tasks"),
                Tenant::SlugHeader(slug),
                &json!({ "title": title, "status": status, "assignee_email": "dev@example.com" }),
            )
            .await;
        assert_eq!(reply.status, StatusCode::OK, "create task failed: {}", reply.body);
        reply.body["task"].clone()
    }
}

/// Spawn a test app with a fresh temporary database.
/// Returns `None` when `DATABASE_URL` is not configured.
pub async fn spawn_app() -> Option<TestApp> {
    let _ = dotenvy::dotenv();

    let Ok(base_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set, skipping database-backed test");
        return None;
    };

    // Create a unique test database
    let db_name = format!("worktrack_test_{}", Uuid::now_v7().to_string().replace('-', ""));

    // Connect to default postgres DB to create test DB
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect to postgres for test DB creation");

    sqlx::query(&format!("CREATE DATABASE \"{db_name}\""))
        .execute(&admin_pool)
        .await
        .expect("Failed to create test database");

    admin_pool.close().await;

    // Connect to test DB and run migrations
    let test_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/{db_name}"))
        .unwrap_or_else(|| base_url.clone());

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&test_url)
        .await
        .expect("Failed to connect to test database");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations on test database");

    let config = test_config(test_url);
    let app = worktrack::build_app(pool.clone(), config);

    // Bind to random port
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind to random port");
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.expect("Server failed");
    });

    let client = Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .unwrap();

    Some(TestApp {
        addr,
        pool,
        client,
        db_name,
    })
}

pub fn test_config(database_url: String) -> Config {
    Config {
        database_url,
        host: "127.0.0.1".parse().unwrap(),
        port: 0, // unused, we bind to random port
        max_body_size: 1_048_576,
        log_level: "warn".to_string(),
        db_max_connections: 5,
        db_acquire_timeout_secs: 5,
        tenancy: TenancyConfig::default(),
    }
}

/// Drop the test database after tests complete.
pub async fn cleanup(app: TestApp) {
    let db_name = app.db_name.clone();
    app.pool.close().await;

    let base_url = std::env::var("DATABASE_URL")
        .expect("DATABASE_URL must be set for tests");
    let admin_url = base_url
        .rsplit_once('/')
        .map(|(base, _)| format!("{base}/postgres"))
        .unwrap_or_else(|| base_url.clone());

    let admin_pool = PgPoolOptions::new()
        .max_connections(2)
        .connect(&admin_url)
        .await
        .expect("Failed to connect for cleanup");

    let _ = sqlx::query(&format!("DROP DATABASE IF EXISTS \"{db_name}\" WITH (FORCE)"))
        .execute(&admin_pool)
        .await;

    admin_pool.close().await;
}

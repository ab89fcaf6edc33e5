//! Test helper module for subscription-service integration tests.
//!
//! Provides common setup utilities for PostgreSQL-based tests.

#![allow(dead_code)]

use secrecy::Secret;
use serde_json::{json, Value};
use service_core::config::Config as CoreConfig;
use sqlx::postgres::PgPoolOptions;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use subscription_service::config::{DatabaseConfig, SubscriptionConfig};
use subscription_service::services::Database;
use subscription_service::startup::Application;

pub const TEST_USER_ID: &str = "60601fee-2bf1-4721-ae6f-7636e79a0cba";
pub const OTHER_USER_ID: &str = "22222222-2222-2222-2222-222222222222";

// Counter for unique schema names
static SCHEMA_COUNTER: AtomicU32 = AtomicU32::new(0);

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Database settings for testing from `TEST_DB_*` or local defaults.
pub fn test_database_config(schema: Option<String>) -> DatabaseConfig {
    DatabaseConfig {
        host: env_or("TEST_DB_HOST", "localhost"),
        port: env_or("TEST_DB_PORT", "5432").parse().unwrap_or(5432),
        user: env_or("TEST_DB_USER", "postgres"),
        password: Secret::new(env_or("TEST_DB_PASSWORD", "postgres")),
        name: env_or("TEST_DB_NAME", "subscriptions_test"),
        schema,
        max_connections: 5,
        min_connections: 1,
    }
}

/// Generate a unique schema name for test isolation.
fn unique_schema_name() -> String {
    let counter = SCHEMA_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("test_subscription_{}_{}", std::process::id(), counter)
}

/// Test application wrapper for integration tests.
pub struct TestApp {
    pub address: String,
    pub port: u16,
    pub db: Database,
    pub client: reqwest::Client,
    schema_name: String,
}

/// Create a fresh schema for one test and return its name.
pub async fn create_test_schema() -> String {
    let schema_name = unique_schema_name();

    let pool = PgPoolOptions::new()
        .max_connections(2)
        .connect_with(test_database_config(None).connect_options())
        .await
        .expect("Failed to connect to test database");

    sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema_name))
        .execute(&pool)
        .await
        .ok();
    sqlx::query(&format!("CREATE SCHEMA {}", schema_name))
        .execute(&pool)
        .await
        .expect("Failed to create test schema");

    pool.close().await;
    schema_name
}

/// Drop a schema created by `create_test_schema`.
pub async fn drop_test_schema(schema_name: &str) {
    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect_with(test_database_config(None).connect_options())
        .await
        .ok();

    if let Some(pool) = pool {
        let _ = sqlx::query(&format!("DROP SCHEMA IF EXISTS {} CASCADE", schema_name))
            .execute(&pool)
            .await;
        pool.close().await;
    }
}

/// Service configuration bound to an ephemeral port and the given schema.
pub fn test_config(schema_name: &str) -> SubscriptionConfig {
    SubscriptionConfig {
        common: CoreConfig {
            env: "test".to_string(),
            server_url: "127.0.0.1:0".to_string(),
        },
        service_name: "subscription-service-test".to_string(),
        log_level: "warn".to_string(),
        otlp_endpoint: None,
        shutdown_grace: Duration::from_secs(1),
        database: test_database_config(Some(schema_name.to_string())),
    }
}

impl TestApp {
    /// Spawn a new test application on a random port.
    pub async fn spawn() -> Self {
        let schema_name = create_test_schema().await;
        let config = test_config(&schema_name);

        let app = Application::build(config)
            .await
            .expect("Failed to build test application");

        let port = app.port();
        let db = app.db().clone();
        let address = format!("http://127.0.0.1:{}", port);

        tokio::spawn(async move {
            app.run_until_stopped().await.ok();
        });

        // Wait for HTTP server to be ready by polling health endpoint
        let client = reqwest::Client::new();
        let health_url = format!("{}/health", address);
        for _ in 0..50 {
            if client.get(&health_url).send().await.is_ok() {
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }

        TestApp {
            address,
            port,
            db,
            client,
            schema_name,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.address, path)
    }

    pub async fn post_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .post(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn put_json(&self, path: &str, body: &Value) -> reqwest::Response {
        self.client
            .put(self.url(path))
            .json(body)
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn get(&self, path: &str) -> reqwest::Response {
        self.client
            .get(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    pub async fn delete(&self, path: &str) -> reqwest::Response {
        self.client
            .delete(self.url(path))
            .send()
            .await
            .expect("Failed to execute request")
    }

    /// Create a subscription over HTTP and return its id.
    pub async fn create_subscription(
        &self,
        service_name: &str,
        monthly_price: i32,
        user_id: &str,
        start_date: &str,
        end_date: Option<&str>,
    ) -> i64 {
        let response = self
            .post_json(
                "/subscription",
                &json!({
                    "service_name": service_name,
                    "monthly_price": monthly_price,
                    "user_id": user_id,
                    "start_date": start_date,
                    "end_date": end_date,
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 201, "create should succeed");
        let body: Value = response.json().await.expect("Failed to parse JSON");
        body["id"].as_i64().expect("id should be an integer")
    }

    /// Request an invoice and return the `sum` field.
    pub async fn invoice_sum(
        &self,
        service_name: &str,
        user_id: &str,
        from_date: &str,
        to_date: Option<&str>,
    ) -> i64 {
        let response = self
            .post_json(
                "/subscription/invoice",
                &json!({
                    "service_name": service_name,
                    "user_id": user_id,
                    "from_date": from_date,
                    "to_date": to_date,
                }),
            )
            .await;
        assert_eq!(response.status().as_u16(), 200, "invoice should succeed");
        let body: Value = response.json().await.expect("Failed to parse JSON");
        body["sum"].as_i64().expect("sum should be an integer")
    }

    /// Cleanup test resources (schema).
    pub async fn cleanup(&self) {
        drop_test_schema(&self.schema_name).await;
    }
}

//! Database service for subscription-service.

use crate::models::{
    BillingRange, CreateSubscription, Subscription, SubscriptionRow, UpdateSubscription,
};
use crate::services::metrics::DB_QUERY_DURATION;
use service_core::error::AppError;
use sqlx::postgres::{PgConnectOptions, PgPool, PgPoolOptions};
use std::time::Duration;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Database connection pool wrapper.
#[derive(Clone)]
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Create a new database connection pool.
    #[instrument(skip(options), fields(service = "subscription-service"))]
    pub async fn new(
        options: PgConnectOptions,
        max_connections: u32,
        min_connections: u32,
    ) -> Result<Self, AppError> {
        info!(
            max_connections = max_connections,
            min_connections = min_connections,
            "Connecting to PostgreSQL"
        );

        let pool = PgPoolOptions::new()
            .max_connections(max_connections)
            .min_connections(min_connections)
            .acquire_timeout(Duration::from_secs(30))
            .idle_timeout(Duration::from_secs(600))
            .connect_with(options)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to connect: {}", e)))?;

        info!("PostgreSQL connection pool established");

        Ok(Self { pool })
    }

    /// Get a reference to the connection pool.
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Close every pooled connection, waiting for checked-out ones to return.
    pub async fn close(&self) {
        self.pool.close().await;
        info!("PostgreSQL connection pool closed");
    }

    /// Check database health.
    #[instrument(skip(self))]
    pub async fn health_check(&self) -> Result<(), AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["health_check"])
            .start_timer();

        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Health check failed: {}", e)))?;

        timer.observe_duration();
        Ok(())
    }

    /// Run database migrations.
    #[instrument(skip(self))]
    pub async fn run_migrations(&self) -> Result<(), AppError> {
        info!("Running database migrations");
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Migration failed: {}", e)))?;
        info!("Database migrations completed");
        Ok(())
    }

    // =========================================================================
    // Subscription Operations
    // =========================================================================

    /// Create a new subscription. The id comes from `subscription_seq`.
    #[instrument(skip(self, input), fields(service_name = %input.service_name, user_id = %input.user_id))]
    pub async fn create_subscription(
        &self,
        input: &CreateSubscription,
    ) -> Result<Subscription, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["create_subscription"])
            .start_timer();

        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            INSERT INTO subscription (id, service_name, monthly_price, user_id, start_date, end_date)
            VALUES (nextval('subscription_seq'), $1, $2, $3, $4, $5)
            RETURNING id, service_name, monthly_price, user_id, start_date, end_date
            "#,
        )
        .bind(&input.service_name)
        .bind(input.monthly_price)
        .bind(input.user_id)
        .bind(input.start_date.first_day())
        .bind(input.end_date.map(|d| d.first_day()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to create subscription"))?;

        timer.observe_duration();
        info!(subscription_id = row.id, "Subscription created");

        Ok(row.into())
    }

    /// Get a subscription by ID.
    #[instrument(skip(self), fields(subscription_id = id))]
    pub async fn get_subscription(&self, id: i64) -> Result<Option<Subscription>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["get_subscription"])
            .start_timer();

        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, service_name, monthly_price, user_id, start_date, end_date
            FROM subscription
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| AppError::DatabaseError(anyhow::anyhow!("Failed to get subscription: {}", e)))?;

        timer.observe_duration();

        Ok(row.map(Subscription::from))
    }

    /// List every subscription in id order.
    #[instrument(skip(self))]
    pub async fn list_subscriptions(&self) -> Result<Vec<Subscription>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["list_subscriptions"])
            .start_timer();

        let rows = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, service_name, monthly_price, user_id, start_date, end_date
            FROM subscription
            ORDER BY id
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!("Failed to list subscriptions: {}", e))
        })?;

        timer.observe_duration();

        Ok(rows.into_iter().map(Subscription::from).collect())
    }

    /// Apply a patch in one statement. `None` fields keep their stored value.
    ///
    /// Returns `None` when no row has this id.
    #[instrument(skip(self, input), fields(subscription_id = id))]
    pub async fn update_subscription(
        &self,
        id: i64,
        input: &UpdateSubscription,
    ) -> Result<Option<Subscription>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["update_subscription"])
            .start_timer();

        let row = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            UPDATE subscription
            SET service_name = COALESCE($2, service_name),
                monthly_price = COALESCE($3, monthly_price),
                user_id = COALESCE($4, user_id),
                start_date = COALESCE($5, start_date),
                end_date = COALESCE($6, end_date)
            WHERE id = $1
            RETURNING id, service_name, monthly_price, user_id, start_date, end_date
            "#,
        )
        .bind(id)
        .bind(&input.service_name)
        .bind(input.monthly_price)
        .bind(input.user_id)
        .bind(input.start_date.map(|d| d.first_day()))
        .bind(input.end_date.map(|d| d.first_day()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| map_write_error(e, "Failed to update subscription"))?;

        timer.observe_duration();

        if row.is_some() {
            info!(subscription_id = id, "Subscription updated");
        }

        Ok(row.map(Subscription::from))
    }

    /// Delete a subscription. `false` means no row had this id.
    #[instrument(skip(self), fields(subscription_id = id))]
    pub async fn delete_subscription(&self, id: i64) -> Result<bool, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["delete_subscription"])
            .start_timer();

        let result = sqlx::query("DELETE FROM subscription WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                AppError::DatabaseError(anyhow::anyhow!("Failed to delete subscription: {}", e))
            })?;

        timer.observe_duration();

        let deleted = result.rows_affected() == 1;
        if deleted {
            info!(subscription_id = id, "Subscription deleted");
        } else {
            warn!(subscription_id = id, "No subscription deleted");
        }

        Ok(deleted)
    }

    /// Subscriptions of `user_id` to `service_name` whose active interval
    /// intersects `range`. Open-ended rows always reach the upper bound.
    #[instrument(skip(self, range), fields(service_name = %service_name, user_id = %user_id))]
    pub async fn find_billable_subscriptions(
        &self,
        service_name: &str,
        user_id: Uuid,
        range: &BillingRange,
    ) -> Result<Vec<Subscription>, AppError> {
        let timer = DB_QUERY_DURATION
            .with_label_values(&["find_billable_subscriptions"])
            .start_timer();

        let rows = sqlx::query_as::<_, SubscriptionRow>(
            r#"
            SELECT id, service_name, monthly_price, user_id, start_date, end_date
            FROM subscription
            WHERE service_name = $1
              AND user_id = $2
              AND start_date <= $4
              AND (end_date IS NULL OR end_date >= $3)
            ORDER BY id
            "#,
        )
        .bind(service_name)
        .bind(user_id)
        .bind(range.from.first_day())
        .bind(range.to.first_day())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| {
            AppError::DatabaseError(anyhow::anyhow!(
                "Failed to fetch billable subscriptions: {}",
                e
            ))
        })?;

        timer.observe_duration();

        Ok(rows.into_iter().map(Subscription::from).collect())
    }
}

/// Map CHECK-constraint violations to field errors; anything else is a
/// storage failure.
fn map_write_error(err: sqlx::Error, context: &str) -> AppError {
    if let Some(db_err) = err.as_database_error() {
        match db_err.constraint() {
            Some("subscription_dates_ordered") => {
                return AppError::invalid_field(
                    "end_date",
                    "end_date must not be earlier than start_date",
                );
            }
            Some("subscription_monthly_price_check") => {
                return AppError::invalid_field("monthly_price", "must be non-negative");
            }
            _ => {}
        }
    }
    AppError::DatabaseError(anyhow::anyhow!("{}: {}", context, err))
}

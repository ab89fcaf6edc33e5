//! Subscription model.

use super::MonthYear;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;

/// Subscription of one user to one service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: i64,
    pub service_name: String,
    pub monthly_price: i32,
    pub user_id: Uuid,
    pub start_date: MonthYear,
    /// `None` while the subscription is still running.
    pub end_date: Option<MonthYear>,
}

/// Row shape of the `subscription` table; dates are stored on day 1.
#[derive(Debug, Clone, FromRow)]
pub struct SubscriptionRow {
    pub id: i64,
    pub service_name: String,
    pub monthly_price: i32,
    pub user_id: Uuid,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
}

impl From<SubscriptionRow> for Subscription {
    fn from(row: SubscriptionRow) -> Self {
        Self {
            id: row.id,
            service_name: row.service_name,
            monthly_price: row.monthly_price,
            user_id: row.user_id,
            start_date: row.start_date.into(),
            end_date: row.end_date.map(MonthYear::from),
        }
    }
}

/// Input for creating a subscription. The id is always allocated by the store.
#[derive(Debug, Clone)]
pub struct CreateSubscription {
    pub service_name: String,
    pub monthly_price: i32,
    pub user_id: Uuid,
    pub start_date: MonthYear,
    pub end_date: Option<MonthYear>,
}

/// Partial update. `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UpdateSubscription {
    pub service_name: Option<String>,
    pub monthly_price: Option<i32>,
    pub user_id: Option<Uuid>,
    pub start_date: Option<MonthYear>,
    pub end_date: Option<MonthYear>,
}

impl UpdateSubscription {
    /// Build a patch where blank strings, zero prices and the nil UUID count
    /// as "not supplied".
    pub fn from_supplied(
        service_name: Option<String>,
        monthly_price: Option<i32>,
        user_id: Option<Uuid>,
        start_date: Option<MonthYear>,
        end_date: Option<MonthYear>,
    ) -> Self {
        Self {
            service_name: service_name
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty()),
            monthly_price: monthly_price.filter(|p| *p != 0),
            user_id: user_id.filter(|id| !id.is_nil()),
            start_date,
            end_date,
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }
}

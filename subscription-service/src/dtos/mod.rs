//! Request and response bodies for the HTTP API.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use service_core::error::AppError;
use uuid::Uuid;
use validator::Validate;

use crate::models::{
    BillingRange, CreateSubscription, Invoice, InvoiceQuery, MonthYear, Subscription,
    UpdateSubscription,
};
use crate::utils::{
    validate_month_year, validate_not_blank, validate_price, validate_uuid, WireFields,
};

/// Parse a month field that already passed `validate_month_year`.
fn month(field: &str, raw: Option<&str>) -> Result<Option<MonthYear>, AppError> {
    raw.map(|s| {
        s.parse::<MonthYear>()
            .map_err(|e| AppError::invalid_field(field, e.to_string()))
    })
    .transpose()
}

/// Parse a UUID field that already passed `validate_uuid`.
fn uuid(field: &str, raw: Option<&str>) -> Result<Option<Uuid>, AppError> {
    raw.map(|s| {
        Uuid::parse_str(s).map_err(|_| AppError::invalid_field(field, "must be a valid UUID"))
    })
    .transpose()
}

/// Read a price field that already passed `validate_price`.
fn price(field: &str, raw: Option<&Value>) -> Result<Option<i32>, AppError> {
    raw.map(|v| {
        v.as_i64()
            .and_then(|n| i32::try_from(n).ok())
            .filter(|n| *n >= 0)
            .ok_or_else(|| AppError::invalid_field(field, "must be a non-negative integer"))
    })
    .transpose()
}

fn required<T>(field: &str, value: Option<T>) -> Result<T, AppError> {
    value.ok_or_else(|| AppError::invalid_field(field, "field is required"))
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateSubscriptionRequest {
    #[validate(required, custom(function = "validate_not_blank"))]
    pub service_name: Option<String>,

    #[validate(required, custom(function = "validate_price"))]
    pub monthly_price: Option<Value>,

    #[validate(required, custom(function = "validate_uuid"))]
    pub user_id: Option<String>,

    #[validate(required, custom(function = "validate_month_year"))]
    pub start_date: Option<String>,

    #[validate(custom(function = "validate_month_year"))]
    pub end_date: Option<String>,
}

impl WireFields for CreateSubscriptionRequest {
    const WIRE_FIELDS: &'static [(&'static str, &'static str)] = &[
        ("service_name", "service_name"),
        ("monthly_price", "monthly_price"),
        ("user_id", "user_id"),
        ("start_date", "start_date"),
        ("end_date", "end_date"),
    ];
}

impl CreateSubscriptionRequest {
    /// Convert a validated request, rejecting an end month before the start.
    pub fn into_input(self) -> Result<CreateSubscription, AppError> {
        let start_date = required("start_date", month("start_date", self.start_date.as_deref())?)?;
        let end_date = month("end_date", self.end_date.as_deref())?;

        if end_date.is_some_and(|end| end < start_date) {
            return Err(AppError::invalid_field(
                "end_date",
                "end_date must not be earlier than start_date",
            ));
        }

        Ok(CreateSubscription {
            service_name: required("service_name", self.service_name)?.trim().to_string(),
            monthly_price: required(
                "monthly_price",
                price("monthly_price", self.monthly_price.as_ref())?,
            )?,
            user_id: required("user_id", uuid("user_id", self.user_id.as_deref())?)?,
            start_date,
            end_date,
        })
    }
}

/// Patch body. Omitted, blank or zero fields leave the stored value alone.
#[derive(Debug, Deserialize, Validate)]
pub struct UpdateSubscriptionRequest {
    #[validate(required, range(min = 1, message = "must be a positive id"))]
    pub id: Option<i64>,

    pub service_name: Option<String>,

    #[validate(custom(function = "validate_price"))]
    pub monthly_price: Option<Value>,

    #[validate(custom(function = "validate_uuid"))]
    pub user_id: Option<String>,

    #[validate(custom(function = "validate_month_year"))]
    pub start_date: Option<String>,

    #[validate(custom(function = "validate_month_year"))]
    pub end_date: Option<String>,
}

impl WireFields for UpdateSubscriptionRequest {
    const WIRE_FIELDS: &'static [(&'static str, &'static str)] = &[
        ("id", "id"),
        ("service_name", "service_name"),
        ("monthly_price", "monthly_price"),
        ("user_id", "user_id"),
        ("start_date", "start_date"),
        ("end_date", "end_date"),
    ];
}

impl UpdateSubscriptionRequest {
    pub fn into_patch(self) -> Result<(i64, UpdateSubscription), AppError> {
        let id = required("id", self.id)?;
        let patch = UpdateSubscription::from_supplied(
            self.service_name,
            price("monthly_price", self.monthly_price.as_ref())?,
            uuid("user_id", self.user_id.as_deref())?,
            month("start_date", self.start_date.as_deref())?,
            month("end_date", self.end_date.as_deref())?,
        );
        Ok((id, patch))
    }
}

#[derive(Debug, Deserialize, Validate)]
pub struct InvoiceRequest {
    #[validate(required, custom(function = "validate_not_blank"))]
    pub service_name: Option<String>,

    #[validate(required, custom(function = "validate_uuid"))]
    pub user_id: Option<String>,

    #[serde(rename = "from_date")]
    #[validate(required, custom(function = "validate_month_year"))]
    pub from: Option<String>,

    /// Defaults to the current month.
    #[serde(rename = "to_date")]
    #[validate(custom(function = "validate_month_year"))]
    pub to: Option<String>,
}

impl WireFields for InvoiceRequest {
    const WIRE_FIELDS: &'static [(&'static str, &'static str)] = &[
        ("service_name", "service_name"),
        ("user_id", "user_id"),
        ("from", "from_date"),
        ("to", "to_date"),
    ];
}

impl InvoiceRequest {
    pub fn into_query(self, current: MonthYear) -> Result<InvoiceQuery, AppError> {
        let from = required("from_date", month("from_date", self.from.as_deref())?)?;
        let to = month("to_date", self.to.as_deref())?;

        Ok(InvoiceQuery {
            service_name: required("service_name", self.service_name)?.trim().to_string(),
            user_id: required("user_id", uuid("user_id", self.user_id.as_deref())?)?,
            range: BillingRange::resolve(from, to, current)?,
        })
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreatedResponse {
    pub id: i64,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdatedResponse {
    pub message: String,
    pub subscription: Subscription,
}

pub type InvoiceResponse = Invoice;

use axum::{
    async_trait,
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use serde_json::Value;
use service_core::error::{AppError, FieldErrors};
use std::borrow::Cow;
use uuid::Uuid;
use validator::{Validate, ValidationError, ValidationErrors};

use crate::models::MonthYear;

/// Static mapping from struct field to JSON field name for a request type.
pub trait WireFields {
    const WIRE_FIELDS: &'static [(&'static str, &'static str)];

    fn wire_name(field: &str) -> String {
        Self::WIRE_FIELDS
            .iter()
            .find(|(name, wire)| *name == field || *wire == field)
            .map(|(_, wire)| (*wire).to_string())
            .unwrap_or_else(|| field.to_string())
    }
}

/// Flatten validator output into `{wire_name: reason}`, first failure per field.
pub fn field_errors<T: WireFields>(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .filter_map(|(field, errs)| {
            errs.first()
                .map(|err| (T::wire_name(&field.to_string()), reason(err)))
        })
        .collect()
}

fn reason(err: &ValidationError) -> String {
    if err.code == "required" {
        return "field is required".to_string();
    }
    match &err.message {
        Some(message) => message.to_string(),
        None => format!("failed validation: {}", err.code),
    }
}

/// `MM-YYYY` check for string fields.
pub fn validate_month_year(value: &str) -> Result<(), ValidationError> {
    value.parse::<MonthYear>().map(|_| ()).map_err(|e| {
        let mut err = ValidationError::new("month_year");
        err.message = Some(Cow::from(e.to_string()));
        err
    })
}

pub fn validate_uuid(value: &str) -> Result<(), ValidationError> {
    Uuid::parse_str(value).map(|_| ()).map_err(|_| {
        let mut err = ValidationError::new("uuid");
        err.message = Some(Cow::from("must be a valid UUID"));
        err
    })
}

/// Integer in `0..=i32::MAX`; anything else (strings, fractions, negatives)
/// is rejected here instead of failing JSON decoding.
pub fn validate_price(value: &Value) -> Result<(), ValidationError> {
    match value.as_i64().and_then(|n| i32::try_from(n).ok()) {
        Some(n) if n >= 0 => Ok(()),
        _ => {
            let mut err = ValidationError::new("price");
            err.message = Some(Cow::from("must be a non-negative integer"));
            Err(err)
        }
    }
}

pub fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        let mut err = ValidationError::new("not_blank");
        err.message = Some(Cow::from("must not be blank"));
        return Err(err);
    }
    Ok(())
}

/// JSON body extractor that runs `validator` rules and reports failures as
/// 400 with a field map.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate + WireFields + 'static,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await.map_err(|e| {
            AppError::BadRequest(anyhow::anyhow!("Json parse error: {}", e.body_text()))
        })?;

        value
            .validate()
            .map_err(|e| AppError::ValidationError(field_errors::<T>(&e)))?;

        Ok(ValidatedJson(value))
    }
}

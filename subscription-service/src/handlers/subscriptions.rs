//! Subscription CRUD handlers.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use service_core::error::AppError;

use crate::{
    dtos::{
        CreateSubscriptionRequest, CreatedResponse, MessageResponse, UpdateSubscriptionRequest,
        UpdatedResponse,
    },
    models::Subscription,
    services::record_subscription_operation,
    startup::AppState,
    utils::ValidatedJson,
};

fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>().map_err(|e| {
        tracing::warn!(id = %raw, error = %e, "Could not parse id");
        AppError::BadRequest(anyhow::anyhow!("Could not parse id"))
    })
}

fn not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("Subscription not found"))
}

/// Track the outcome of a store call without altering it.
fn observe<T>(operation: &str, result: Result<T, AppError>) -> Result<T, AppError> {
    let outcome = match &result {
        Ok(_) => "success",
        Err(AppError::NotFound(_)) => "not_found",
        Err(AppError::ValidationError(_)) | Err(AppError::BadRequest(_)) => "invalid",
        Err(_) => "error",
    };
    record_subscription_operation(operation, outcome);
    result
}

/// `GET /subscription/:id`
pub async fn get_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<Subscription>, AppError> {
    let id = parse_id(&id)?;

    let result = state
        .db
        .get_subscription(id)
        .await
        .and_then(|found| found.ok_or_else(not_found));

    observe("get", result).map(Json)
}

/// `GET /subscription/all`
pub async fn list_subscriptions(
    State(state): State<AppState>,
) -> Result<Json<Vec<Subscription>>, AppError> {
    let result = state.db.list_subscriptions().await;
    observe("list", result).map(Json)
}

/// `POST /subscription`
pub async fn create_subscription(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<CreateSubscriptionRequest>,
) -> Result<(StatusCode, Json<CreatedResponse>), AppError> {
    let input = payload.into_input()?;

    tracing::info!(
        service_name = %input.service_name,
        user_id = %input.user_id,
        monthly_price = input.monthly_price,
        "Creating subscription"
    );

    let subscription = observe("create", state.db.create_subscription(&input).await)?;

    Ok((
        StatusCode::CREATED,
        Json(CreatedResponse {
            id: subscription.id,
            message: "New subscription was created".to_string(),
        }),
    ))
}

/// `PUT /subscription`, patch semantics keyed by the body's `id`.
pub async fn update_subscription(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<UpdateSubscriptionRequest>,
) -> Result<Json<UpdatedResponse>, AppError> {
    let (id, patch) = payload.into_patch()?;

    // An empty patch writes nothing but must still report unknown ids.
    let stored = if patch.is_empty() {
        state.db.get_subscription(id).await
    } else {
        state.db.update_subscription(id, &patch).await
    };
    let result = stored.and_then(|found| found.ok_or_else(not_found));

    let subscription = observe("update", result)?;

    Ok(Json(UpdatedResponse {
        message: "The subscription was successfully updated".to_string(),
        subscription,
    }))
}

/// `DELETE /subscription/:id`
pub async fn delete_subscription(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let id = parse_id(&id)?;

    let result = state
        .db
        .delete_subscription(id)
        .await
        .and_then(|deleted| if deleted { Ok(()) } else { Err(not_found()) });

    observe("delete", result)?;

    Ok(Json(MessageResponse {
        message: "The subscription was successfully deleted".to_string(),
    }))
}

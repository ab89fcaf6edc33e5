//! Invoice computation handler.

use axum::{extract::State, Json};
use service_core::error::AppError;

use crate::{
    dtos::{InvoiceRequest, InvoiceResponse},
    models::{invoice_total, MonthYear},
    services::{record_invoice_amount, record_subscription_operation},
    startup::AppState,
    utils::ValidatedJson,
};

/// `POST /subscription/invoice`
///
/// The store selects candidate rows; the amount is computed here on month
/// indices. Any store failure fails the whole request.
pub async fn subscriptions_invoice(
    State(state): State<AppState>,
    ValidatedJson(payload): ValidatedJson<InvoiceRequest>,
) -> Result<Json<InvoiceResponse>, AppError> {
    let query = payload.into_query(MonthYear::current())?;

    let candidates = state
        .db
        .find_billable_subscriptions(&query.service_name, query.user_id, &query.range)
        .await
        .inspect_err(|_| record_subscription_operation("invoice", "error"))?;

    let invoice = invoice_total(&candidates, &query);

    tracing::info!(
        service_name = %query.service_name,
        user_id = %query.user_id,
        from_date = %invoice.from_date,
        to_date = %invoice.to_date,
        subscriptions = invoice.subscriptions,
        sum = invoice.sum,
        "Invoice computed"
    );

    record_subscription_operation("invoice", "success");
    record_invoice_amount(invoice.sum);

    Ok(Json(invoice))
}

//! Services module for subscription-service.

pub mod database;
pub mod metrics;

pub use database::Database;
pub use metrics::{
    get_metrics, init_metrics, record_invoice_amount, record_subscription_operation,
};

//! HTTP handlers for subscription-service.

pub mod health;
pub mod invoice;
pub mod subscriptions;

pub use health::{health_check, metrics_handler, readiness_check};
pub use invoice::subscriptions_invoice;
pub use subscriptions::{
    create_subscription, delete_subscription, get_subscription, list_subscriptions,
    update_subscription,
};

//! Domain models for subscription-service.

mod invoice;
mod month_year;
mod subscription;

pub use invoice::{invoice_total, months_billed, BillingRange, Invoice, InvoiceQuery};
pub use month_year::{MonthYear, MonthYearError};
pub use subscription::{CreateSubscription, Subscription, SubscriptionRow, UpdateSubscription};

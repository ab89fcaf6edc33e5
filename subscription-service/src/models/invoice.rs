//! Invoice calculation over subscription month intervals.
//!
//! All arithmetic is done on integer month indices (`year * 12 + month`).
//! A subscription contributes `overlap_end - overlap_start` months, where the
//! overlap is the intersection of its active interval and the billing range.
//! For a subscription running 03-2024..05-2024 queried over the whole of 2024
//! that is two months.

use super::{MonthYear, Subscription};
use serde::{Deserialize, Serialize};
use service_core::error::AppError;
use uuid::Uuid;

/// Inclusive month range an invoice is computed over.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BillingRange {
    pub from: MonthYear,
    pub to: MonthYear,
}

impl BillingRange {
    /// Resolve an optional upper bound against the current month.
    ///
    /// A range whose end precedes its start is rejected on `to_date`.
    pub fn resolve(
        from: MonthYear,
        to: Option<MonthYear>,
        current: MonthYear,
    ) -> Result<Self, AppError> {
        let to = to.unwrap_or(current);
        if to < from {
            return Err(AppError::invalid_field(
                "to_date",
                "to_date must not be earlier than from_date",
            ));
        }
        Ok(Self { from, to })
    }

    /// Whether `[start, end]` (open when `end` is `None`) touches this range.
    pub fn intersects(&self, start: MonthYear, end: Option<MonthYear>) -> bool {
        start <= self.to && end.is_none_or(|end| end >= self.from)
    }
}

/// Filter plus range identifying which subscriptions to bill.
#[derive(Debug, Clone)]
pub struct InvoiceQuery {
    pub service_name: String,
    pub user_id: Uuid,
    pub range: BillingRange,
}

impl InvoiceQuery {
    pub fn matches(&self, subscription: &Subscription) -> bool {
        subscription.service_name == self.service_name
            && subscription.user_id == self.user_id
            && self
                .range
                .intersects(subscription.start_date, subscription.end_date)
    }
}

/// Computed invoice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Invoice {
    pub sum: i64,
    pub from_date: MonthYear,
    pub to_date: MonthYear,
    /// Number of subscriptions that matched; logged, not returned.
    #[serde(skip)]
    pub subscriptions: usize,
}

/// Months of `subscription` billed inside `range`, never negative.
pub fn months_billed(subscription: &Subscription, range: &BillingRange) -> i64 {
    if !range.intersects(subscription.start_date, subscription.end_date) {
        return 0;
    }

    let overlap_start = subscription.start_date.max(range.from);
    let overlap_end = subscription.end_date.map_or(range.to, |end| end.min(range.to));

    (overlap_end.month_index() - overlap_start.month_index()).max(0)
}

/// Sum of `months * monthly_price` over every subscription matching `query`.
pub fn invoice_total<'a, I>(subscriptions: I, query: &InvoiceQuery) -> Invoice
where
    I: IntoIterator<Item = &'a Subscription>,
{
    let (sum, count) = subscriptions
        .into_iter()
        .filter(|s| query.matches(s))
        .fold((0_i64, 0_usize), |(sum, count), s| {
            let months = months_billed(s, &query.range);
            let price = i64::from(s.monthly_price.max(0));
            (sum.saturating_add(months.saturating_mul(price)), count + 1)
        });

    Invoice {
        sum,
        from_date: query.range.from,
        to_date: query.range.to,
        subscriptions: count,
    }
}

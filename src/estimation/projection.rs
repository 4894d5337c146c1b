//! Reorder-date projection from a current level and a consumption rate.

use crate::estimation::policy::Policy;
use crate::state::{EstimationResult, ReorderStatus};
use time::{Date, Duration};

/// Projections further out than this are reported without a calendar date.
const MAX_PROJECTION_DAYS: i64 = 1_000_000;

/// Projects when the tank reaches `policy.min_level` and when to order.
///
/// Callers must pass a `current_level` within 0..=100 and a non-negative,
/// non-NaN `rate`; a NaN rate is treated as no measurable consumption.
pub fn project_reorder(
    current_level: f64,
    rate: f64,
    policy: &Policy,
    today: Date,
) -> EstimationResult {
    let level_after_refill = policy.level_after_refill(current_level);
    let delivery_days = i64::from(policy.delivery_days);
    let consumption_rate_per_day = if rate.is_nan() { 0.0 } else { rate.max(0.0) };

    if current_level <= policy.min_level {
        return EstimationResult {
            consumption_rate_per_day,
            days_until_min_level: 0.0,
            days_until_order: Some(0),
            order_date: Some(today),
            delivery_date: add_days(today, delivery_days),
            depletion_date: Some(today),
            level_after_refill,
            status: ReorderStatus::Critical,
        };
    }

    if consumption_rate_per_day <= 0.0 {
        return EstimationResult {
            consumption_rate_per_day,
            days_until_min_level: f64::INFINITY,
            days_until_order: None,
            order_date: None,
            delivery_date: None,
            depletion_date: None,
            level_after_refill,
            status: ReorderStatus::Normal,
        };
    }

    let days_until_min_level = (current_level - policy.min_level) / consumption_rate_per_day;
    // Saturating cast; never schedule an order in the past.
    let days_until_order = ((days_until_min_level - delivery_days as f64).floor() as i64).max(0);
    let order_date = add_days(today, days_until_order);
    let delivery_date = order_date.and_then(|date| add_days(date, delivery_days));
    let depletion_date = add_days(today, days_until_min_level.ceil() as i64);

    EstimationResult {
        consumption_rate_per_day,
        days_until_min_level,
        days_until_order: Some(days_until_order),
        order_date,
        delivery_date,
        depletion_date,
        level_after_refill,
        status: classify(days_until_order, policy),
    }
}

fn classify(days_until_order: i64, policy: &Policy) -> ReorderStatus {
    if days_until_order <= 0 {
        ReorderStatus::Critical
    } else if days_until_order <= policy.warning_threshold_days() {
        ReorderStatus::Warning
    } else {
        ReorderStatus::Normal
    }
}

fn add_days(date: Date, days: i64) -> Option<Date> {
    if !(0..=MAX_PROJECTION_DAYS).contains(&days) {
        return None;
    }
    date.checked_add(Duration::days(days))
}

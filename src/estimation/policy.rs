//! Reorder policy: floor, ceiling, refill size, lead time and warning rule.

use serde::Deserialize;
use thiserror::Error;

pub const DEFAULT_MIN_LEVEL: f64 = 30.0;
pub const DEFAULT_MAX_LEVEL: f64 = 90.0;
pub const DEFAULT_ORDER_VOLUME_PERCENT: f64 = 45.0;
pub const DEFAULT_DELIVERY_DAYS: u32 = 2;
pub const DEFAULT_WARNING_DAYS: u32 = 2;

/// How the order volume is applied to the current level on refill.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RefillMode {
    /// `current + order_volume_percent`
    #[default]
    AddPercent,
    /// `current + current * order_volume_percent / 100`
    PercentOfCurrent,
}

/// When a pending order is flagged as Warning rather than Normal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WarningRule {
    /// Warn once the order is due within this many days.
    FixedDays(u32),
    /// Warn once the order is due within the delivery lead time.
    DeliveryDays,
}

impl Default for WarningRule {
    fn default() -> Self {
        Self::FixedDays(DEFAULT_WARNING_DAYS)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Policy {
    pub min_level: f64,
    pub max_level: f64,
    pub order_volume_percent: f64,
    pub refill_mode: RefillMode,
    pub delivery_days: u32,
    pub warning: WarningRule,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum PolicyError {
    #[error("{field} must be a finite value within 0..=100, got {value}")]
    LevelOutOfRange { field: &'static str, value: f64 },
    #[error("min_level ({min}) must be below max_level ({max})")]
    InvertedLevels { min: f64, max: f64 },
    #[error("order_volume_percent must be finite and non-negative, got {0}")]
    InvalidOrderVolume(f64),
}

impl Default for Policy {
    fn default() -> Self {
        Self {
            min_level: DEFAULT_MIN_LEVEL,
            max_level: DEFAULT_MAX_LEVEL,
            order_volume_percent: DEFAULT_ORDER_VOLUME_PERCENT,
            refill_mode: RefillMode::default(),
            delivery_days: DEFAULT_DELIVERY_DAYS,
            warning: WarningRule::default(),
        }
    }
}

impl Policy {
    pub fn validate(&self) -> Result<(), PolicyError> {
        check_level("min_level", self.min_level)?;
        check_level("max_level", self.max_level)?;
        if self.min_level >= self.max_level {
            return Err(PolicyError::InvertedLevels {
                min: self.min_level,
                max: self.max_level,
            });
        }
        if !self.order_volume_percent.is_finite() || self.order_volume_percent < 0.0 {
            return Err(PolicyError::InvalidOrderVolume(self.order_volume_percent));
        }
        Ok(())
    }

    /// Days-until-order at or below which the status is Warning.
    pub fn warning_threshold_days(&self) -> i64 {
        match self.warning {
            WarningRule::FixedDays(days) => i64::from(days),
            WarningRule::DeliveryDays => i64::from(self.delivery_days),
        }
    }

    /// Projected level right after a delivery, capped at `max_level`.
    pub fn level_after_refill(&self, current_level: f64) -> f64 {
        let refilled = match self.refill_mode {
            RefillMode::AddPercent => current_level + self.order_volume_percent,
            RefillMode::PercentOfCurrent => {
                current_level + current_level * self.order_volume_percent / 100.0
            }
        };
        refilled.min(self.max_level)
    }
}

fn check_level(field: &'static str, value: f64) -> Result<(), PolicyError> {
    if value.is_finite() && (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(PolicyError::LevelOutOfRange { field, value })
    }
}

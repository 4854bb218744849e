//! Query granularity selection
//!
//! Long time windows are queried at a coarser granularity so that responses
//! stay small. The boundaries are inclusive upper bounds and come from the
//! `intervals:` section of the configuration.

use crate::error::{MetricsError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

const HOUR_MILLIS: i64 = 60 * 60 * 1000;

/// Upstream interval unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IntervalType {
    Minutes,
    Hours,
    Days,
}

impl IntervalType {
    pub fn as_str(&self) -> &'static str {
        match self {
            IntervalType::Minutes => "MINUTES",
            IntervalType::Hours => "HOURS",
            IntervalType::Days => "DAYS",
        }
    }
}

impl fmt::Display for IntervalType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Granularity sent upstream as `intervalQuantifier` / `intervalType`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    /// Only set for minute buckets; hourly and daily buckets use the upstream default
    pub quantifier: Option<u32>,
    pub interval_type: IntervalType,
}

impl Interval {
    pub fn minutes(quantifier: u32) -> Self {
        Self {
            quantifier: Some(quantifier),
            interval_type: IntervalType::Minutes,
        }
    }

    pub fn of(interval_type: IntervalType) -> Self {
        Self {
            quantifier: None,
            interval_type,
        }
    }
}

/// Span boundaries for each granularity bucket, in hours
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct IntervalPolicy {
    /// Spans up to this many hours use 5-minute buckets
    pub five_minute_max_hours: u32,
    /// Spans up to this many hours use 15-minute buckets
    pub fifteen_minute_max_hours: u32,
    /// Spans up to this many hours use hourly buckets; anything longer is daily
    pub hourly_max_hours: u32,
}

impl Default for IntervalPolicy {
    fn default() -> Self {
        Self {
            five_minute_max_hours: 6,
            fifteen_minute_max_hours: 24,
            hourly_max_hours: 7 * 24,
        }
    }
}

impl IntervalPolicy {
    /// Validate that buckets are non-empty and strictly increasing
    pub fn validate(&self) -> Result<()> {
        if self.five_minute_max_hours == 0 {
            return Err(MetricsError::config(
                "intervals.five_minute_max_hours must be greater than 0",
            ));
        }
        if self.fifteen_minute_max_hours <= self.five_minute_max_hours
            || self.hourly_max_hours <= self.fifteen_minute_max_hours
        {
            return Err(MetricsError::config(format!(
                "Interval boundaries must be strictly increasing, got {}h / {}h / {}h",
                self.five_minute_max_hours, self.fifteen_minute_max_hours, self.hourly_max_hours
            )));
        }
        Ok(())
    }

    /// Map a span in milliseconds to a query granularity
    pub fn select(&self, span_millis: i64) -> Interval {
        let hours = |h: u32| i64::from(h) * HOUR_MILLIS;

        if span_millis <= hours(self.five_minute_max_hours) {
            Interval::minutes(5)
        } else if span_millis <= hours(self.fifteen_minute_max_hours) {
            Interval::minutes(15)
        } else if span_millis <= hours(self.hourly_max_hours) {
            Interval::of(IntervalType::Hours)
        } else {
            Interval::of(IntervalType::Days)
        }
    }

    /// Granularity for an explicit window, `None` unless both ends are given
    pub fn select_window(&self, begin: Option<i64>, end: Option<i64>) -> Option<Interval> {
        match (begin, end) {
            (Some(begin), Some(end)) => Some(self.select(end.saturating_sub(begin))),
            _ => None,
        }
    }
}

/// Select a granularity using the default boundaries
pub fn select_interval(span_millis: i64) -> Interval {
    IntervalPolicy::default().select(span_millis)
}

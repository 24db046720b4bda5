use std::{collections::BTreeMap, fmt};

use chrono::NaiveDate;
use serde::Serialize;

use crate::domain::DrinkKind;

/// Aggregated statistics for a snapshot at a reference instant.
///
/// Every number in the report is finite.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsReport {
    /// Alcohol units in the current Sunday to Saturday week.
    pub weekly_units: f64,
    /// Alcohol units in the week before.
    pub prev_weekly_units: f64,
    /// Change against the previous week, in percent.
    ///
    /// `None` when the previous week had no alcohol units.
    pub weekly_trend_percent: Option<f64>,
    /// Alcohol units today.
    pub daily_units: f64,
    /// Alcohol units in the current calendar month.
    pub monthly_units: f64,
    /// Weekly units divided by the days elapsed this week, today included.
    pub daily_average: f64,
    /// The heaviest day of the current week, if any units were logged.
    pub peak_day: Option<PeakDay>,
    /// One point per day for the last seven days, oldest first.
    pub trailing_7_days: Vec<DailyPoint>,
    /// Alcohol units per kind in the current month.
    pub type_distribution: BTreeMap<DrinkKind, f64>,
    /// The kind with the most units this month, if any.
    pub most_consumed_kind: Option<DrinkKind>,
    /// The weekly goal the report was computed against.
    pub weekly_goal: f64,
    /// Whether this week's units exceed the goal.
    pub is_over_limit: bool,
    /// Progress towards the goal, clamped to 0..=100.
    pub progress_percentage: f64,
    /// Illustrative money saved by choosing non-alcoholic drinks.
    pub savings_estimate: f64,
}

impl StatsReport {
    /// Units on the peak day, or zero.
    #[must_use]
    pub fn peak_units(&self) -> f64 {
        self.peak_day.as_ref().map_or(0.0, |peak| peak.units)
    }

    /// Units remaining before the weekly goal is reached, never negative.
    #[must_use]
    pub fn remaining_units(&self) -> f64 {
        (self.weekly_goal - self.weekly_units).max(0.0)
    }
}

/// The day with the most alcohol units.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PeakDay {
    /// The local calendar date.
    pub date: NaiveDate,
    /// Units on that date.
    pub units: f64,
}

impl fmt::Display for PeakDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({:.1} units)", self.date.format("%a %Y-%m-%d"), self.units)
    }
}

/// A single bar in the daily chart.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyPoint {
    /// Short weekday label.
    pub label: String,
    /// The local calendar date.
    pub date: NaiveDate,
    /// Alcohol units on that date.
    pub units: f64,
}

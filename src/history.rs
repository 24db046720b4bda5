//! Browsing the consumption log.

use chrono::NaiveDate;

use crate::domain::{ConsumptionEvent, DrinkKind};

/// Filters applied when browsing history.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    /// Only events of this kind.
    pub kind: Option<DrinkKind>,
    /// Case-insensitive substring matched against the kind's name and label.
    pub search: Option<String>,
    /// Keep at most this many events (the newest).
    pub limit: Option<usize>,
}

/// Events logged on a single date, newest first.
#[derive(Debug, Clone, PartialEq)]
pub struct DayGroup<'a> {
    /// The local calendar date.
    pub date: NaiveDate,
    /// Events on that date.
    pub events: Vec<&'a ConsumptionEvent>,
}

impl DayGroup<'_> {
    /// Total units logged on this date, alcoholic or not.
    #[must_use]
    pub fn total_units(&self) -> f64 {
        self.events.iter().map(|event| event.counted_units()).sum()
    }
}

impl HistoryQuery {
    /// Whether `event` passes the filters.
    #[must_use]
    pub fn matches(&self, event: &ConsumptionEvent) -> bool {
        let kind_matches = self.kind.is_none_or(|kind| kind == event.kind());
        let search_matches = self.search.as_deref().is_none_or(|term| {
            let term = term.trim().to_lowercase();
            event.kind().as_str().contains(&term)
                || event.kind().label().to_lowercase().contains(&term)
        });
        kind_matches && search_matches
    }

    /// Matching events, newest first.
    #[must_use]
    pub fn select<'a>(&self, events: &'a [ConsumptionEvent]) -> Vec<&'a ConsumptionEvent> {
        let mut selected: Vec<_> = events.iter().filter(|event| self.matches(event)).collect();
        // stable, so events sharing an instant keep insertion order
        selected.sort_by(|a, b| b.occurred_at().cmp(&a.occurred_at()));
        if let Some(limit) = self.limit {
            selected.truncate(limit);
        }
        selected
    }

    /// Matching events grouped by date, newest date first.
    #[must_use]
    pub fn grouped<'a>(&self, events: &'a [ConsumptionEvent]) -> Vec<DayGroup<'a>> {
        let mut groups: Vec<DayGroup<'a>> = Vec::new();
        for event in self.select(events) {
            match groups.last_mut() {
                Some(group) if group.date == event.date_key() => group.events.push(event),
                _ => groups.push(DayGroup {
                    date: event.date_key(),
                    events: vec![event],
                }),
            }
        }
        groups
    }
}

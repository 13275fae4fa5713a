//! Organizer dashboard aggregates.

use crate::catalog::Catalog;
use crate::money::Money;
use crate::session::{AccessError, Route, Session, require_session};

/// Synthetic weekly sales, Monday first, in rupees
const WEEKLY_SALES: [(&str, u64); 7] = [
    ("Mon", 40_000),
    ("Tue", 30_000),
    ("Wed", 20_000),
    ("Thu", 27_800),
    ("Fri", 18_900),
    ("Sat", 23_900),
    ("Sun", 34_900),
];

/// Sold versus capacity for one event
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapacityRow {
    /// Event id
    pub event_id: String,
    /// Event title
    pub title: String,
    /// Seats sold
    pub sold: u32,
    /// Seats in total
    pub capacity: u32,
    /// Sold share, whole percent
    pub percent: u32,
}

/// One day of the sales chart
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DailySales {
    /// Short day name
    pub day: &'static str,
    /// Sales that day
    pub amount: Money,
}

/// Everything the organizer dashboard shows
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DashboardSummary {
    /// Σ sold × base price
    pub gross_revenue: Money,
    /// Σ sold
    pub attendees: u64,
    /// Events in the catalog
    pub active_events: usize,
    /// One row per event, catalog order
    pub capacity: Vec<CapacityRow>,
    /// Monday to Sunday
    pub weekly_sales: Vec<DailySales>,
}

impl DashboardSummary {
    /// Aggregate the catalog for a signed-in organizer
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::AuthenticationRequired`] without a session.
    pub fn build(catalog: &Catalog, session: Option<&Session>) -> Result<Self, AccessError> {
        let session = require_session(&Route::Admin, session)?;
        let events = catalog.events();

        let gross_revenue = events
            .iter()
            .fold(Money::ZERO, |sum, event| sum.saturating_add(event.revenue()));
        let attendees = events.iter().map(|event| u64::from(event.sold)).sum();
        let capacity = events
            .iter()
            .map(|event| CapacityRow {
                event_id: event.id.clone(),
                title: event.title.clone(),
                sold: event.sold,
                capacity: event.capacity,
                percent: event.sold_percent(),
            })
            .collect();
        let weekly_sales = WEEKLY_SALES
            .iter()
            .map(|&(day, rupees)| DailySales {
                day,
                amount: Money::from_rupees(rupees),
            })
            .collect();

        tracing::debug!(user = %session.user.name, events = events.len(), "Dashboard built");

        Ok(Self {
            gross_revenue,
            attendees,
            active_events: events.len(),
            capacity,
            weekly_sales,
        })
    }
}

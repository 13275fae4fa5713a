//! Catalog provider: the event list and the ticket tiers.
//!
//! A [`Catalog`] is immutable once built. Every constructor validates it:
//! unique ids, positive prices and multipliers, `sold <= capacity` and at
//! least one tier. Capacity and sold counters are display-only; nothing in the
//! storefront ever changes them.

use crate::config::Config;
use crate::money::{self, Money, Multiplier};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use thiserror::Error;

/// Category value that matches every event
pub const ALL_CATEGORIES: &str = "All";

/// Catalog errors
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read
    #[error("Failed to read catalog {path}: {source}")]
    Io {
        /// File that failed
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// The catalog JSON is malformed
    #[error("Failed to parse catalog: {0}")]
    Parse(#[from] serde_json::Error),

    /// Two events share an id
    #[error("Duplicate event id: {0}")]
    DuplicateEventId(String),

    /// Two tiers share an id
    #[error("Duplicate tier id: {0}")]
    DuplicateTierId(String),

    /// An event has a zero price
    #[error("Event {0} must have a positive price")]
    NonPositivePrice(String),

    /// A tier has a zero multiplier
    #[error("Tier {0} must have a positive multiplier")]
    NonPositiveMultiplier(String),

    /// An event sold more than it holds
    #[error("Event {event_id} sold {sold} of {capacity}")]
    SoldExceedsCapacity {
        /// Offending event
        event_id: String,
        /// Sold counter
        sold: u32,
        /// Capacity
        capacity: u32,
    },

    /// The tier list is empty
    #[error("Catalog must define at least one ticket tier")]
    NoTiers,
}

/// An event in the catalog
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// Unique id
    pub id: String,
    /// Title
    pub title: String,
    /// Display date (`DEC 12`)
    pub date: String,
    /// Display time (`20:00`)
    pub time: String,
    /// Venue
    pub location: String,
    /// Base price of a single ticket
    #[serde(with = "money::rupees")]
    pub price: Money,
    /// Category used for filtering
    pub category: String,
    /// Cover image
    #[serde(default)]
    pub image_url: String,
    /// Static description, also the hype text fallback
    #[serde(default)]
    pub description: String,
    /// Organizer name
    #[serde(default)]
    pub organizer: String,
    /// Seats available in total
    pub capacity: u32,
    /// Seats already sold
    pub sold: u32,
    /// Free-form tags
    #[serde(default)]
    pub tags: Vec<String>,
}

impl Event {
    /// Seats still available
    #[must_use]
    pub const fn remaining(&self) -> u32 {
        self.capacity.saturating_sub(self.sold)
    }

    /// Sold share of capacity in whole percent, rounded half-up
    #[must_use]
    pub fn sold_percent(&self) -> u32 {
        if self.capacity == 0 {
            return 0;
        }
        let sold = u64::from(self.sold) * 200 + u64::from(self.capacity);
        let percent = sold / (u64::from(self.capacity) * 2);
        u32::try_from(percent).unwrap_or(u32::MAX)
    }

    /// Gross revenue of the tickets already sold, at base price
    #[must_use]
    pub fn revenue(&self) -> Money {
        self.price
            .checked_multiply(u64::from(self.sold))
            .unwrap_or(Money::from_paise(u64::MAX))
    }

    fn matches(&self, needle: &str) -> bool {
        self.title.to_lowercase().contains(needle)
            || self.description.to_lowercase().contains(needle)
    }
}

/// A ticket tier: a named multiplier over the event's base price
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TicketTier {
    /// Unique id
    pub id: String,
    /// Display name
    pub name: String,
    /// Price multiplier
    pub multiplier: Multiplier,
    /// Perks, in display order
    #[serde(default)]
    pub benefits: Vec<String>,
}

#[derive(Deserialize)]
struct CatalogFile {
    events: Vec<Event>,
    tiers: Vec<TicketTier>,
}

/// Validated, read-only catalog
#[derive(Clone, Debug)]
pub struct Catalog {
    events: Vec<Event>,
    tiers: Arc<[TicketTier]>,
}

impl Catalog {
    /// Build a catalog from events and tiers
    ///
    /// # Errors
    ///
    /// Returns the first validation failure found.
    pub fn new(events: Vec<Event>, tiers: Vec<TicketTier>) -> Result<Self, CatalogError> {
        if tiers.is_empty() {
            return Err(CatalogError::NoTiers);
        }

        let mut tier_ids = HashSet::new();
        for tier in &tiers {
            if !tier_ids.insert(tier.id.as_str()) {
                return Err(CatalogError::DuplicateTierId(tier.id.clone()));
            }
            if !tier.multiplier.is_positive() {
                return Err(CatalogError::NonPositiveMultiplier(tier.id.clone()));
            }
        }

        let mut event_ids = HashSet::new();
        for event in &events {
            if !event_ids.insert(event.id.as_str()) {
                return Err(CatalogError::DuplicateEventId(event.id.clone()));
            }
            if event.price.is_zero() {
                return Err(CatalogError::NonPositivePrice(event.id.clone()));
            }
            if event.sold > event.capacity {
                return Err(CatalogError::SoldExceedsCapacity {
                    event_id: event.id.clone(),
                    sold: event.sold,
                    capacity: event.capacity,
                });
            }
        }

        Ok(Self {
            events,
            tiers: tiers.into(),
        })
    }

    /// Parse a catalog from JSON (`{"events": [...], "tiers": [...]}`)
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Parse`] for malformed JSON, or a validation error.
    pub fn from_json_str(json: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = serde_json::from_str(json)?;
        Self::new(file.events, file.tiers)
    }

    /// Load a catalog JSON file
    ///
    /// # Errors
    ///
    /// Returns [`CatalogError::Io`] if the file cannot be read, otherwise as
    /// [`Catalog::from_json_str`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let catalog = Self::from_json_str(&json)?;
        tracing::info!(
            path = %path.display(),
            events = catalog.events.len(),
            tiers = catalog.tiers.len(),
            "Catalog loaded"
        );
        Ok(catalog)
    }

    /// The configured catalog file, or the built-in one
    ///
    /// # Errors
    ///
    /// See [`Catalog::load`].
    pub fn from_config(config: &Config) -> Result<Self, CatalogError> {
        match &config.catalog_path {
            Some(path) => Self::load(path),
            None => Ok(Self::reference()),
        }
    }

    /// Built-in catalog: four events and the three standard tiers
    #[must_use]
    pub fn reference() -> Self {
        Self {
            events: reference::events(),
            tiers: reference::tiers().into(),
        }
    }

    /// Events in catalog order
    #[must_use]
    pub fn events(&self) -> &[Event] {
        &self.events
    }

    /// Tiers in catalog order; never empty
    #[must_use]
    pub fn tiers(&self) -> &[TicketTier] {
        &self.tiers
    }

    /// Shared handle on the tier list, for purchase flows
    #[must_use]
    pub fn shared_tiers(&self) -> Arc<[TicketTier]> {
        Arc::clone(&self.tiers)
    }

    /// Look an event up by id
    #[must_use]
    pub fn event(&self, id: &str) -> Option<&Event> {
        self.events.iter().find(|event| event.id == id)
    }

    /// `"All"` followed by each distinct category, in catalog order
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut categories = vec![ALL_CATEGORIES];
        for event in &self.events {
            if !categories.contains(&event.category.as_str()) {
                categories.push(&event.category);
            }
        }
        categories
    }

    /// Filter by free text and category
    ///
    /// The query, taken verbatim, matches case-insensitively anywhere in the
    /// title or the description; an empty query matches everything. Category `"All"`
    /// matches every event, any other value must equal the event's category.
    #[must_use]
    pub fn search(&self, query: &str, category: &str) -> Vec<&Event> {
        let needle = query.to_lowercase();
        self.events
            .iter()
            .filter(|event| category == ALL_CATEGORIES || event.category == category)
            .filter(|event| needle.is_empty() || event.matches(&needle))
            .collect()
    }
}

/// Built-in mock data
mod reference {
    use super::{Event, TicketTier};
    use crate::money::{Money, Multiplier};

    #[allow(clippy::too_many_arguments)]
    fn event(
        id: &str,
        title: &str,
        (date, time): (&str, &str),
        location: &str,
        price: u64,
        category: &str,
        description: &str,
        organizer: &str,
        (capacity, sold): (u32, u32),
        tags: &[&str],
    ) -> Event {
        Event {
            id: id.to_string(),
            title: title.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            location: location.to_string(),
            price: Money::from_rupees(price),
            category: category.to_string(),
            image_url: format!("https://picsum.photos/800/600?random={id}"),
            description: description.to_string(),
            organizer: organizer.to_string(),
            capacity,
            sold,
            tags: tags.iter().map(|tag| (*tag).to_string()).collect(),
        }
    }

    pub(super) fn events() -> Vec<Event> {
        vec![
            event(
                "1",
                "Neon Symphony 2025",
                ("DEC 12", "20:00"),
                "Cyber Dome, Mumbai",
                4500,
                "Music",
                "An orchestral experience fused with synthetic waves.",
                "BuildnBit Ent",
                (5000, 3420),
                &["Live", "Orchestra", "Electronic"],
            ),
            event(
                "2",
                "Future Tech Summit",
                ("JAN 15", "09:00"),
                "Convention Centre, Bangalore",
                12_000,
                "Conference",
                "Where humanity meets the singularity.",
                "TechWorld",
                (2000, 1950),
                &["Tech", "AI", "Networking"],
            ),
            event(
                "3",
                "Floating Art Gala",
                ("FEB 28", "19:30"),
                "Sky Deck, Delhi",
                2500,
                "Exhibition",
                "Immersive digital art installations in the clouds.",
                "Artsy",
                (500, 120),
                &["Art", "Digital", "Gala"],
            ),
            event(
                "4",
                "Retro Wave Night",
                ("MAR 10", "22:00"),
                "The Social, Pune",
                999,
                "Party",
                "80s nostalgia meets modern beat drops.",
                "NightLife Inc",
                (800, 600),
                &["Party", "Retro", "Dance"],
            ),
        ]
    }

    fn tier(id: &str, name: &str, hundredths: u32, benefits: &[&str]) -> TicketTier {
        TicketTier {
            id: id.to_string(),
            name: name.to_string(),
            multiplier: Multiplier::from_hundredths(hundredths),
            benefits: benefits.iter().map(|b| (*b).to_string()).collect(),
        }
    }

    pub(super) fn tiers() -> Vec<TicketTier> {
        vec![
            tier("gen", "General Access", 100, &["Entry to event", "Digital Souvenir"]),
            tier(
                "vip",
                "VIP Experience",
                250,
                &["Skip the line", "VIP Lounge", "Free Drinks", "NFT Badge"],
            ),
            tier(
                "backstage",
                "Backstage Pass",
                500,
                &["All VIP perks", "Meet & Greet", "Afterparty Access"],
            ),
        ]
    }
}

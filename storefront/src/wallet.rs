//! Ticket wallet: the signed-in user's tickets.
//!
//! Tickets are numbered `TX-{9822 + n}-{event id}` in the order they were
//! added. Confirmed purchases land here; the catalog's sold counters are
//! never touched.

use crate::catalog::{Catalog, Event};
use crate::purchase::Receipt;
use crate::session::{AccessError, Route, Session, require_session};

const FIRST_TICKET_NUMBER: usize = 9822;

/// Where a ticket sits in the wallet tabs
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TicketStatus {
    /// Entry is open now
    Active,
    /// Not yet started
    Upcoming,
    /// Already attended
    Past,
}

/// One ticket in the wallet
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WalletTicket {
    /// `TX-9822-1` style id
    pub ticket_id: String,
    /// Event id
    pub event_id: String,
    /// Event title
    pub event_title: String,
    /// Display date
    pub date: String,
    /// Display time
    pub time: String,
    /// Venue
    pub location: String,
    /// Seat or access label
    pub seat: String,
    /// Tab placement
    pub status: TicketStatus,
    /// Purchase receipt, when bought through the storefront
    pub receipt: Option<Receipt>,
}

/// The signed-in user's tickets
#[derive(Clone, Debug, Default)]
pub struct Wallet {
    tickets: Vec<WalletTicket>,
}

impl Wallet {
    /// An empty wallet
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// One ticket per catalog event, the first of them active
    #[must_use]
    pub fn demo(catalog: &Catalog) -> Self {
        let mut wallet = Self::new();
        for event in catalog.events() {
            wallet.push(event, None);
        }
        wallet
    }

    /// Add the ticket of a confirmed purchase
    ///
    /// Returns `None` if the receipt's event is not in `catalog`.
    pub fn record(&mut self, catalog: &Catalog, receipt: Receipt) -> Option<&WalletTicket> {
        let event = catalog.event(&receipt.event_id)?;
        tracing::info!(order_id = %receipt.order_id, event_id = %event.id, "Ticket added to wallet");
        Some(self.push(event, Some(receipt)))
    }

    /// Move a ticket to the history tab
    ///
    /// Returns `false` if no ticket has this id.
    pub fn archive(&mut self, ticket_id: &str) -> bool {
        match self.tickets.iter_mut().find(|ticket| ticket.ticket_id == ticket_id) {
            Some(ticket) => {
                ticket.status = TicketStatus::Past;
                true
            },
            None => false,
        }
    }

    /// Active and upcoming tickets
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::AuthenticationRequired`] without a session.
    pub fn upcoming(&self, session: Option<&Session>) -> Result<Vec<&WalletTicket>, AccessError> {
        require_session(&Route::MyTickets, session)?;
        Ok(self
            .tickets
            .iter()
            .filter(|ticket| ticket.status != TicketStatus::Past)
            .collect())
    }

    /// Past tickets
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::AuthenticationRequired`] without a session.
    pub fn history(&self, session: Option<&Session>) -> Result<Vec<&WalletTicket>, AccessError> {
        require_session(&Route::MyTickets, session)?;
        Ok(self
            .tickets
            .iter()
            .filter(|ticket| ticket.status == TicketStatus::Past)
            .collect())
    }

    /// Number of tickets in both tabs
    #[must_use]
    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    /// Whether the wallet holds no tickets
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    fn push(&mut self, event: &Event, receipt: Option<Receipt>) -> &WalletTicket {
        let index = self.tickets.len();
        let seat = match &receipt {
            Some(receipt) => receipt.tier_name.clone(),
            None if index % 2 == 0 => "VIP Lounge, Row A".to_string(),
            None => "General Access".to_string(),
        };
        let status = if index == 0 {
            TicketStatus::Active
        } else {
            TicketStatus::Upcoming
        };

        self.tickets.push(WalletTicket {
            ticket_id: format!("TX-{}-{}", FIRST_TICKET_NUMBER + index, event.id),
            event_id: event.id.clone(),
            event_title: event.title.clone(),
            date: event.date.clone(),
            time: event.time.clone(),
            location: event.location.clone(),
            seat,
            status,
            receipt,
        });
        &self.tickets[index]
    }
}

//! Event detail page host.
//!
//! An [`EventPage`] owns the purchase flow for one event and a hype slot that
//! shows a placeholder until the hype request settles. Closing the page (or
//! dropping it) tears the flow down and aborts the hype request.

use crate::catalog::{Catalog, Event};
use crate::hype::{HypeText, HypeTextProvider};
use crate::purchase::{FlowError, PurchaseEnvironment, PurchaseFlow};
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

/// Placeholder shown while the hype request is running
pub const LOADING_DESCRIPTION: &str = "Loading description...";

/// State of the description slot
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HypeSlot {
    /// Request still running
    Loading,
    /// Request settled
    Ready(HypeText),
}

impl HypeSlot {
    /// Text to render
    #[must_use]
    pub fn text(&self) -> &str {
        match self {
            Self::Loading => LOADING_DESCRIPTION,
            Self::Ready(hype) => &hype.text,
        }
    }
}

/// One open event page
pub struct EventPage {
    event: Event,
    flow: PurchaseFlow,
    hype: watch::Receiver<HypeSlot>,
    hype_task: JoinHandle<()>,
}

impl EventPage {
    /// Open the page for `event_id` and start the hype request
    ///
    /// Must be called from within a tokio runtime.
    ///
    /// # Errors
    ///
    /// - [`FlowError::UnknownEvent`] if the catalog has no such event
    /// - [`FlowError::NoTiers`] if the catalog offers no tiers
    pub fn open(
        catalog: &Catalog,
        event_id: &str,
        environment: PurchaseEnvironment,
        hype: Arc<dyn HypeTextProvider>,
    ) -> Result<Self, FlowError> {
        let event = catalog
            .event(event_id)
            .cloned()
            .ok_or_else(|| FlowError::UnknownEvent(event_id.to_string()))?;
        let flow = PurchaseFlow::new(event.clone(), catalog.shared_tiers(), environment)?;

        let (slot, receiver) = watch::channel(HypeSlot::Loading);
        let request = hype.generate(event.title.clone(), event.description.clone());
        let hype_task = tokio::spawn(async move {
            let text = request.await;
            // The page may already be gone
            let _ = slot.send(HypeSlot::Ready(text));
        });

        tracing::debug!(event_id = %event.id, "Event page opened");

        Ok(Self {
            event,
            flow,
            hype: receiver,
            hype_task,
        })
    }

    /// Event shown on this page
    #[must_use]
    pub const fn event(&self) -> &Event {
        &self.event
    }

    /// The page's purchase flow
    #[must_use]
    pub const fn flow(&self) -> &PurchaseFlow {
        &self.flow
    }

    /// Current description slot
    #[must_use]
    pub fn hype(&self) -> HypeSlot {
        self.hype.borrow().clone()
    }

    /// Wait until the hype request settles
    ///
    /// Returns `None` if the request was aborted before it settled.
    pub async fn hype_settled(&mut self) -> Option<HypeText> {
        let slot = self
            .hype
            .wait_for(|slot| matches!(slot, HypeSlot::Ready(_)))
            .await
            .ok()?;
        match &*slot {
            HypeSlot::Ready(text) => Some(text.clone()),
            HypeSlot::Loading => None,
        }
    }

    /// Leave the page
    ///
    /// Equivalent to dropping it; kept for call sites that want to say so.
    pub fn close(self) {
        tracing::debug!(event_id = %self.event.id, "Event page closed");
    }
}

impl Drop for EventPage {
    fn drop(&mut self) {
        self.hype_task.abort();
        self.flow.teardown();
    }
}

impl std::fmt::Debug for EventPage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventPage")
            .field("event_id", &self.event.id)
            .field("hype", &*self.hype.borrow())
            .finish_non_exhaustive()
    }
}

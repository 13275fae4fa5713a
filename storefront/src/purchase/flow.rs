//! [`PurchaseFlow`]: the handle a view holds on its purchase store.
//!
//! Each flow owns one [`Store`]. Dropping the flow tears the store down, so a
//! payment still in flight can never confirm into a view that is gone.

use crate::catalog::{Event, TicketTier};
use crate::money::Money;
use crate::purchase::reducer::{PurchaseAction, PurchaseEnvironment, PurchaseReducer, PurchaseState};
use crate::purchase::types::{PurchaseStage, PurchaseView};
use horizon_runtime::{EffectHandle, Lifecycle, Store, StoreError};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::broadcast;

/// Store type behind a purchase flow
pub type PurchaseStore = Store<PurchaseState, PurchaseAction, PurchaseEnvironment, PurchaseReducer>;

/// Purchase flow errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum FlowError {
    /// The catalog offers no tiers
    #[error("No ticket tiers available")]
    NoTiers,

    /// No event with this id
    #[error("Unknown event: {0}")]
    UnknownEvent(String),

    /// The underlying store rejected the action
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// One purchase flow, scoped to one event view
pub struct PurchaseFlow {
    store: PurchaseStore,
    event_id: String,
}

impl PurchaseFlow {
    /// Open a flow for `event` with a fresh selection
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::NoTiers`] if `tiers` is empty.
    pub fn new(
        event: Event,
        tiers: Arc<[TicketTier]>,
        environment: PurchaseEnvironment,
    ) -> Result<Self, FlowError> {
        let event_id = event.id.clone();
        let state = PurchaseState::new(event, tiers).ok_or(FlowError::NoTiers)?;
        tracing::debug!(%event_id, "Purchase flow opened");
        Ok(Self {
            store: Store::new(state, PurchaseReducer::new(), environment),
            event_id,
        })
    }

    /// Event this flow sells tickets for
    #[must_use]
    pub fn event_id(&self) -> &str {
        &self.event_id
    }

    /// Choose a tier; ignored outside `Selecting`
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Store`] after teardown.
    pub async fn select_tier(&self, tier_id: &str) -> Result<(), FlowError> {
        self.dispatch(PurchaseAction::SelectTier {
            tier_id: tier_id.to_string(),
        })
        .await
    }

    /// Set the ticket count, clamped to `[1, 10]`; ignored outside `Selecting`
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Store`] after teardown.
    pub async fn set_quantity(&self, requested: i64) -> Result<(), FlowError> {
        self.dispatch(PurchaseAction::SetQuantity { requested }).await
    }

    /// One more ticket
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Store`] after teardown.
    pub async fn increment_quantity(&self) -> Result<(), FlowError> {
        self.dispatch(PurchaseAction::IncrementQuantity).await
    }

    /// One less ticket
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Store`] after teardown.
    pub async fn decrement_quantity(&self) -> Result<(), FlowError> {
        self.dispatch(PurchaseAction::DecrementQuantity).await
    }

    /// Pay for the current selection
    ///
    /// The flow is `Processing` when this returns. Await the handle to wait
    /// for the payment outcome. A submit outside `Selecting` is a no-op and
    /// returns an already-completed handle.
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Store`] after teardown.
    pub async fn submit(&self) -> Result<EffectHandle, FlowError> {
        Ok(self.store.send(PurchaseAction::Submit).await?)
    }

    /// Start a new payment attempt; only from `Failed`
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Store`] after teardown.
    pub async fn retry(&self) -> Result<EffectHandle, FlowError> {
        Ok(self.store.send(PurchaseAction::Retry).await?)
    }

    /// Leave `Failed` keeping the selection
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Store`] after teardown.
    pub async fn return_to_selection(&self) -> Result<(), FlowError> {
        self.dispatch(PurchaseAction::ReturnToSelection).await
    }

    /// Back to `{Selecting, first tier, 1}` from any stage
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Store`] after teardown.
    pub async fn reset(&self) -> Result<(), FlowError> {
        self.dispatch(PurchaseAction::Reset).await
    }

    /// Submit and wait for the payment outcome
    ///
    /// Waits for the outcome of the attempt this submit started (or of the
    /// attempt already in flight); outcomes of earlier attempts are skipped.
    /// If the flow is not processing once the submit has been applied, the
    /// current view is returned as is.
    ///
    /// # Errors
    ///
    /// - [`FlowError::Store`] with [`StoreError::Timeout`] if the attempt did
    ///   not settle within `timeout`
    /// - [`FlowError::Store`] after teardown
    pub async fn submit_and_wait(&self, timeout: Duration) -> Result<PurchaseView, FlowError> {
        let mut outcomes = self.store.subscribe_actions();
        self.store.send(PurchaseAction::Submit).await?;

        let (stage, attempt) = self.store.state(|state| (state.stage, state.attempt)).await;
        if stage != PurchaseStage::Processing {
            return Ok(self.view().await);
        }

        tokio::time::timeout(timeout, async {
            loop {
                match outcomes.recv().await {
                    Ok(action) if action.outcome_attempt() == Some(attempt) => return Ok(()),
                    Ok(_) => {},
                    Err(broadcast::error::RecvError::Lagged(skipped)) => {
                        tracing::warn!(skipped, "Outcome observer lagged");
                        let settled = self
                            .store
                            .state(|state| {
                                state.attempt != attempt || state.stage != PurchaseStage::Processing
                            })
                            .await;
                        if settled {
                            return Ok(());
                        }
                    },
                    Err(broadcast::error::RecvError::Closed) => {
                        return Err(StoreError::ChannelClosed);
                    },
                }
            }
        })
        .await
        .map_err(|_| StoreError::Timeout)??;

        Ok(self.view().await)
    }

    /// Render snapshot with derived pricing
    pub async fn view(&self) -> PurchaseView {
        self.store.state(PurchaseState::view).await
    }

    /// Current stage
    pub async fn stage(&self) -> PurchaseStage {
        self.store.state(|state| state.stage).await
    }

    /// Current total
    pub async fn total(&self) -> Money {
        self.store.state(PurchaseState::total).await
    }

    /// Payment outcomes as the reducer receives them
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<PurchaseAction> {
        self.store.subscribe_actions()
    }

    /// Let an in-flight payment finish, then stop accepting actions
    ///
    /// # Errors
    ///
    /// Returns [`FlowError::Store`] if the payment is still running after `timeout`.
    pub async fn close(&self, timeout: Duration) -> Result<(), FlowError> {
        Ok(self.store.shutdown(timeout).await?)
    }

    /// Stop immediately, discarding any in-flight payment outcome
    ///
    /// Returns the number of effects that were aborted.
    pub fn teardown(&self) -> usize {
        let aborted = self.store.teardown();
        if aborted > 0 {
            tracing::debug!(event_id = %self.event_id, aborted, "Purchase flow torn down mid-payment");
        }
        aborted
    }

    /// Whether [`teardown`](Self::teardown) has run
    #[must_use]
    pub fn is_torn_down(&self) -> bool {
        self.store.lifecycle() == Lifecycle::TornDown
    }

    async fn dispatch(&self, action: PurchaseAction) -> Result<(), FlowError> {
        self.store.send(action).await?;
        Ok(())
    }
}

impl Drop for PurchaseFlow {
    fn drop(&mut self) {
        self.teardown();
    }
}

impl std::fmt::Debug for PurchaseFlow {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PurchaseFlow")
            .field("event_id", &self.event_id)
            .field("lifecycle", &self.store.lifecycle())
            .finish_non_exhaustive()
    }
}

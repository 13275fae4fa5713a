//! Purchase flow reducer.
//!
//! One [`PurchaseState`] per event view. Selection changes are only accepted
//! while `Selecting`; every other stage ignores them. `Submit` enters
//! `Processing` synchronously and starts a payment effect tagged with the
//! current attempt number. An outcome whose attempt does not match the state's
//! current attempt, or that arrives outside `Processing`, is discarded.

use crate::catalog::{Event, TicketTier};
use crate::money::{self, Money};
use crate::purchase::payment::{
    PaymentError, PaymentProcessor, PaymentRequest, SimulatedPaymentProcessor,
};
use crate::purchase::types::{PurchaseStage, PurchaseView, Quantity, Receipt};
use horizon_core::{SmallVec, async_effect, effect::Effect, environment::Clock, reducer::Reducer, smallvec};
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

// ============================================================================
// State
// ============================================================================

/// State of one purchase flow
#[derive(Clone, Debug)]
pub struct PurchaseState {
    event: Event,
    tiers: Arc<[TicketTier]>,
    /// Current stage
    pub stage: PurchaseStage,
    /// Index into the tier list
    pub tier_index: usize,
    /// Selected ticket count
    pub quantity: Quantity,
    /// Number of payment attempts started so far; never reset
    pub attempt: u32,
    /// Order id of the current submission
    pub order_id: Option<Uuid>,
    /// Receipt once confirmed
    pub receipt: Option<Receipt>,
    /// Reason of the last failed attempt
    pub last_error: Option<String>,
}

impl PurchaseState {
    /// Fresh selection for `event`: first tier, one ticket
    ///
    /// Returns `None` if `tiers` is empty.
    #[must_use]
    pub fn new(event: Event, tiers: Arc<[TicketTier]>) -> Option<Self> {
        if tiers.is_empty() {
            return None;
        }
        Some(Self {
            event,
            tiers,
            stage: PurchaseStage::Selecting,
            tier_index: 0,
            quantity: Quantity::default(),
            attempt: 0,
            order_id: None,
            receipt: None,
            last_error: None,
        })
    }

    /// Event being purchased
    #[must_use]
    pub const fn event(&self) -> &Event {
        &self.event
    }

    /// Tiers on offer
    #[must_use]
    pub fn tiers(&self) -> &[TicketTier] {
        &self.tiers
    }

    /// Selected tier
    #[must_use]
    pub fn tier(&self) -> &TicketTier {
        // tier_index only ever holds a position found in `tiers`, which is non-empty
        &self.tiers[self.tier_index.min(self.tiers.len() - 1)]
    }

    /// Price of one ticket at the selected tier
    #[must_use]
    pub fn unit_price(&self) -> Money {
        money::unit_price(self.event.price, self.tier().multiplier)
    }

    /// `base × multiplier × quantity`, derived on every call
    #[must_use]
    pub fn total(&self) -> Money {
        money::total(self.event.price, self.tier().multiplier, self.quantity.get())
    }

    /// Snapshot for rendering
    #[must_use]
    pub fn view(&self) -> PurchaseView {
        let tier = self.tier();
        PurchaseView {
            stage: self.stage,
            tier_id: tier.id.clone(),
            tier_name: tier.name.clone(),
            quantity: self.quantity,
            unit_price: self.unit_price(),
            total: self.total(),
            receipt: self.receipt.clone(),
            last_error: self.last_error.clone(),
        }
    }

    fn payment_request(&self, order_id: Uuid) -> PaymentRequest {
        PaymentRequest {
            order_id,
            attempt: self.attempt,
            event_id: self.event.id.clone(),
            tier_id: self.tier().id.clone(),
            quantity: self.quantity,
            amount: self.total(),
        }
    }

    fn reset_selection(&mut self) {
        self.stage = PurchaseStage::Selecting;
        self.tier_index = 0;
        self.quantity = Quantity::default();
        self.order_id = None;
        self.receipt = None;
        self.last_error = None;
    }
}

// ============================================================================
// Actions
// ============================================================================

/// Actions of the purchase flow
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PurchaseAction {
    // Inputs
    /// Choose a tier by id; unknown ids are ignored
    SelectTier {
        /// Tier id
        tier_id: String,
    },
    /// Set the ticket count; clamped to `[1, 10]`
    SetQuantity {
        /// Requested count, any value
        requested: i64,
    },
    /// One more ticket
    IncrementQuantity,
    /// One less ticket
    DecrementQuantity,
    /// Pay for the current selection
    Submit,
    /// Start a new attempt after a failure
    Retry,
    /// Leave `Failed` and edit the selection again
    ReturnToSelection,
    /// Back to a fresh selection from any stage
    Reset,

    // Outcomes (fed back by the payment effect)
    /// The processor confirmed attempt `attempt`
    PaymentSucceeded {
        /// Attempt this outcome belongs to
        attempt: u32,
        /// Processor transaction id
        transaction_id: String,
    },
    /// Attempt `attempt` was declined or timed out
    PaymentFailed {
        /// Attempt this outcome belongs to
        attempt: u32,
        /// Human-readable reason
        reason: String,
    },
}

impl PurchaseAction {
    /// Attempt a payment outcome belongs to; `None` for every other action
    #[must_use]
    pub const fn outcome_attempt(&self) -> Option<u32> {
        match self {
            Self::PaymentSucceeded { attempt, .. } | Self::PaymentFailed { attempt, .. } => {
                Some(*attempt)
            },
            _ => None,
        }
    }
}

// ============================================================================
// Environment
// ============================================================================

/// Environment dependencies for the purchase flow
#[derive(Clone)]
pub struct PurchaseEnvironment {
    /// Clock for receipt timestamps
    pub clock: Arc<dyn Clock>,
    /// Payment processor
    pub processor: Arc<dyn PaymentProcessor>,
    /// Bound on one payment attempt
    pub payment_timeout: Duration,
}

impl PurchaseEnvironment {
    /// Creates a new `PurchaseEnvironment`
    #[must_use]
    pub fn new(
        clock: Arc<dyn Clock>,
        processor: Arc<dyn PaymentProcessor>,
        payment_timeout: Duration,
    ) -> Self {
        Self {
            clock,
            processor,
            payment_timeout,
        }
    }

    /// Simulated processor with the configured delay and timeout
    #[must_use]
    pub fn simulated(clock: Arc<dyn Clock>, config: &crate::config::PurchaseConfig) -> Self {
        Self::new(
            clock,
            SimulatedPaymentProcessor::shared(config.payment_delay),
            config.payment_timeout,
        )
    }
}

impl std::fmt::Debug for PurchaseEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PurchaseEnvironment")
            .field("payment_timeout", &self.payment_timeout)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Reducer for the purchase flow
#[derive(Clone, Debug, Default)]
pub struct PurchaseReducer;

impl PurchaseReducer {
    /// Creates a new `PurchaseReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    /// Bump the attempt counter and describe the charge
    fn start_attempt(
        state: &mut PurchaseState,
        env: &PurchaseEnvironment,
    ) -> Effect<PurchaseAction> {
        let order_id = *state.order_id.get_or_insert_with(Uuid::new_v4);
        state.attempt += 1;
        state.stage = PurchaseStage::Processing;
        state.last_error = None;

        let request = state.payment_request(order_id);
        let attempt = request.attempt;
        let processor = Arc::clone(&env.processor);
        let timeout = env.payment_timeout;

        tracing::debug!(%order_id, attempt, amount = request.amount.paise(), "Payment attempt started");

        async_effect! {
            let outcome = match tokio::time::timeout(timeout, processor.process(request)).await {
                Ok(result) => result,
                Err(_) => Err(PaymentError::Timeout(timeout)),
            };
            Some(match outcome {
                Ok(confirmation) => PurchaseAction::PaymentSucceeded {
                    attempt,
                    transaction_id: confirmation.transaction_id,
                },
                Err(error) => PurchaseAction::PaymentFailed {
                    attempt,
                    reason: error.to_string(),
                },
            })
        }
    }

    fn is_current(state: &PurchaseState, attempt: u32) -> bool {
        let current = state.stage == PurchaseStage::Processing && state.attempt == attempt;
        if !current {
            tracing::debug!(
                attempt,
                current_attempt = state.attempt,
                stage = ?state.stage,
                "Stale payment outcome discarded"
            );
        }
        current
    }
}

impl Reducer for PurchaseReducer {
    type State = PurchaseState;
    type Action = PurchaseAction;
    type Environment = PurchaseEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            // ========== Selection (Selecting only) ==========
            PurchaseAction::SelectTier { tier_id } => {
                if state.stage.is_editable() {
                    match state.tiers.iter().position(|tier| tier.id == tier_id) {
                        Some(index) => state.tier_index = index,
                        None => tracing::warn!(%tier_id, "Unknown tier ignored"),
                    }
                }
                SmallVec::new()
            },

            PurchaseAction::SetQuantity { requested } => {
                if state.stage.is_editable() {
                    state.quantity = Quantity::clamped(requested);
                }
                SmallVec::new()
            },

            PurchaseAction::IncrementQuantity => {
                if state.stage.is_editable() {
                    state.quantity = state.quantity.incremented();
                }
                SmallVec::new()
            },

            PurchaseAction::DecrementQuantity => {
                if state.stage.is_editable() {
                    state.quantity = state.quantity.decremented();
                }
                SmallVec::new()
            },

            // ========== Payment ==========
            PurchaseAction::Submit => {
                if state.stage != PurchaseStage::Selecting {
                    return SmallVec::new();
                }
                state.order_id = None;
                smallvec![Self::start_attempt(state, env)]
            },

            PurchaseAction::Retry => {
                if state.stage != PurchaseStage::Failed {
                    return SmallVec::new();
                }
                smallvec![Self::start_attempt(state, env)]
            },

            PurchaseAction::PaymentSucceeded {
                attempt,
                transaction_id,
            } => {
                if !Self::is_current(state, attempt) {
                    return SmallVec::new();
                }
                let tier = state.tier();
                let receipt = Receipt {
                    order_id: state.order_id.unwrap_or_else(Uuid::new_v4),
                    event_id: state.event.id.clone(),
                    event_title: state.event.title.clone(),
                    tier_id: tier.id.clone(),
                    tier_name: tier.name.clone(),
                    quantity: state.quantity,
                    unit_price: state.unit_price(),
                    total: state.total(),
                    transaction_id,
                    confirmed_at: env.clock.now(),
                };
                tracing::info!(
                    order_id = %receipt.order_id,
                    event_id = %receipt.event_id,
                    total = %receipt.total,
                    "Purchase confirmed"
                );
                state.receipt = Some(receipt);
                state.stage = PurchaseStage::Confirmed;
                SmallVec::new()
            },

            PurchaseAction::PaymentFailed { attempt, reason } => {
                if !Self::is_current(state, attempt) {
                    return SmallVec::new();
                }
                tracing::warn!(attempt, %reason, "Purchase failed");
                state.last_error = Some(reason);
                state.stage = PurchaseStage::Failed;
                SmallVec::new()
            },

            // ========== Leaving ==========
            PurchaseAction::ReturnToSelection => {
                if state.stage == PurchaseStage::Failed {
                    state.stage = PurchaseStage::Selecting;
                    state.order_id = None;
                    state.last_error = None;
                }
                SmallVec::new()
            },

            PurchaseAction::Reset => {
                state.reset_selection();
                SmallVec::new()
            },
        }
    }
}

//! Payment processing seam.
//!
//! The purchase flow only sees a [`PaymentProcessor`] that resolves to a
//! confirmation or an error. The storefront ships a simulated processor that
//! confirms after a fixed delay; a real gateway can replace it without touching
//! the state machine.

use crate::money::Money;
use crate::purchase::types::Quantity;
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use uuid::Uuid;

/// Payment processor result
pub type PaymentResult<T> = Result<T, PaymentError>;

/// Boxed future returned by [`PaymentProcessor::process`]
pub type PaymentFuture = Pin<Box<dyn Future<Output = PaymentResult<PaymentConfirmation>> + Send>>;

/// Payment errors
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PaymentError {
    /// The processor refused the charge
    #[error("Payment declined: {reason}")]
    Declined {
        /// Decline reason
        reason: String,
    },

    /// No answer within the configured bound
    #[error("Payment timed out after {0:?}")]
    Timeout(Duration),

    /// The processor could not be reached
    #[error("Payment processor unavailable: {message}")]
    Unavailable {
        /// Error message
        message: String,
    },
}

/// One charge attempt
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentRequest {
    /// Order being paid
    pub order_id: Uuid,
    /// Attempt number within the flow
    pub attempt: u32,
    /// Event id
    pub event_id: String,
    /// Tier id
    pub tier_id: String,
    /// Ticket count
    pub quantity: Quantity,
    /// Amount to charge
    pub amount: Money,
}

/// Successful charge
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    /// Processor transaction id
    pub transaction_id: String,
}

/// Payment processor trait
pub trait PaymentProcessor: Send + Sync {
    /// Charge `request.amount`
    ///
    /// # Errors
    ///
    /// Returns error if the charge fails
    fn process(&self, request: PaymentRequest) -> PaymentFuture;
}

/// Simulated processor: waits, then always confirms
#[derive(Clone, Debug)]
pub struct SimulatedPaymentProcessor {
    delay: Duration,
}

impl SimulatedPaymentProcessor {
    /// Confirm every charge after `delay`
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared(delay: Duration) -> Arc<dyn PaymentProcessor> {
        Arc::new(Self::new(delay))
    }
}

impl Default for SimulatedPaymentProcessor {
    fn default() -> Self {
        Self::new(Duration::from_millis(2000))
    }
}

impl PaymentProcessor for SimulatedPaymentProcessor {
    fn process(&self, request: PaymentRequest) -> PaymentFuture {
        let delay = self.delay;
        Box::pin(async move {
            tokio::time::sleep(delay).await;

            let transaction_id = format!("sim_txn_{}", Uuid::new_v4().simple());
            tracing::info!(
                order_id = %request.order_id,
                attempt = request.attempt,
                amount = request.amount.paise(),
                transaction_id = %transaction_id,
                "Simulated payment confirmed"
            );

            Ok(PaymentConfirmation { transaction_id })
        })
    }
}

//! Ticket purchase flow: selection, pricing and the payment state machine.

pub mod flow;
pub mod payment;
pub mod reducer;
pub mod types;

pub use flow::{FlowError, PurchaseFlow, PurchaseStore};
pub use payment::{
    PaymentConfirmation, PaymentError, PaymentFuture, PaymentProcessor, PaymentRequest,
    SimulatedPaymentProcessor,
};
pub use reducer::{PurchaseAction, PurchaseEnvironment, PurchaseReducer, PurchaseState};
pub use types::{PurchaseStage, PurchaseView, Quantity, Receipt};

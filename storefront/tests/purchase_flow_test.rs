//! Purchase flow driven through its store, on paused tokio time.

#![allow(clippy::unwrap_used)]

use horizon_runtime::StoreError;
use horizon_storefront::purchase::{
    PaymentConfirmation, PaymentError, PaymentFuture, PaymentProcessor, PaymentRequest,
};
use horizon_storefront::{
    Catalog, FlowError, Money, PurchaseAction, PurchaseEnvironment, PurchaseFlow, PurchaseStage,
    SimulatedPaymentProcessor,
};
use horizon_testing::test_clock;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::time::Duration;

const PAYMENT_DELAY: Duration = Duration::from_millis(2000);

fn env_with(processor: Arc<dyn PaymentProcessor>, timeout: Duration) -> PurchaseEnvironment {
    PurchaseEnvironment::new(Arc::new(test_clock()), processor, timeout)
}

fn simulated_env() -> PurchaseEnvironment {
    env_with(SimulatedPaymentProcessor::shared(PAYMENT_DELAY), Duration::from_secs(10))
}

fn open_flow(event_id: &str, env: PurchaseEnvironment) -> PurchaseFlow {
    let catalog = Catalog::reference();
    PurchaseFlow::new(catalog.event(event_id).unwrap().clone(), catalog.shared_tiers(), env).unwrap()
}

fn outcomes(rx: &mut tokio::sync::broadcast::Receiver<PurchaseAction>) -> Vec<PurchaseAction> {
    let mut seen = Vec::new();
    while let Ok(action) = rx.try_recv() {
        seen.push(action);
    }
    seen
}

/// Declines every charge
struct DecliningProcessor;

impl PaymentProcessor for DecliningProcessor {
    fn process(&self, _request: PaymentRequest) -> PaymentFuture {
        Box::pin(async {
            tokio::time::sleep(Duration::from_millis(100)).await;
            Err(PaymentError::Declined {
                reason: "insufficient funds".to_string(),
            })
        })
    }
}

/// Never answers
struct StalledProcessor;

impl PaymentProcessor for StalledProcessor {
    fn process(&self, _request: PaymentRequest) -> PaymentFuture {
        Box::pin(std::future::pending::<Result<PaymentConfirmation, PaymentError>>())
    }
}

/// Fails the first attempt, confirms the rest
#[derive(Default)]
struct FlakyProcessor {
    calls: AtomicU32,
}

impl PaymentProcessor for FlakyProcessor {
    fn process(&self, request: PaymentRequest) -> PaymentFuture {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        Box::pin(async move {
            tokio::time::sleep(Duration::from_millis(100)).await;
            if call == 0 {
                Err(PaymentError::Unavailable {
                    message: "gateway restarting".to_string(),
                })
            } else {
                Ok(PaymentConfirmation {
                    transaction_id: format!("txn_{}_{}", request.order_id.simple(), request.attempt),
                })
            }
        })
    }
}

/// Records whether a charge ever ran to completion
struct WitnessProcessor {
    completed: Arc<AtomicBool>,
}

impl PaymentProcessor for WitnessProcessor {
    fn process(&self, _request: PaymentRequest) -> PaymentFuture {
        let completed = Arc::clone(&self.completed);
        Box::pin(async move {
            tokio::time::sleep(PAYMENT_DELAY).await;
            completed.store(true, Ordering::SeqCst);
            Ok(PaymentConfirmation {
                transaction_id: "witness".to_string(),
            })
        })
    }
}

#[tokio::test(start_paused = true)]
async fn vip_pair_for_neon_symphony_confirms_at_22500() {
    let flow = open_flow("1", simulated_env());

    flow.select_tier("vip").await.unwrap();
    flow.set_quantity(2).await.unwrap();
    assert_eq!(flow.total().await, Money::from_rupees(22_500));

    let view = flow.submit_and_wait(Duration::from_secs(5)).await.unwrap();

    assert_eq!(view.stage, PurchaseStage::Confirmed);
    let receipt = view.receipt.unwrap();
    assert_eq!(receipt.event_title, "Neon Symphony 2025");
    assert_eq!(receipt.tier_name, "VIP Experience");
    assert_eq!(receipt.total.to_string(), "₹22,500");
    assert!(receipt.transaction_id.starts_with("sim_txn_"));
}

#[tokio::test(start_paused = true)]
async fn submit_is_processing_until_the_delay_elapses() {
    let flow = open_flow("1", simulated_env());
    let start = tokio::time::Instant::now();

    let mut handle = flow.submit().await.unwrap();
    assert_eq!(flow.stage().await, PurchaseStage::Processing);

    tokio::time::sleep(PAYMENT_DELAY - Duration::from_millis(1)).await;
    assert_eq!(flow.stage().await, PurchaseStage::Processing);

    handle.wait().await;
    assert_eq!(flow.stage().await, PurchaseStage::Confirmed);
    assert!(start.elapsed() >= PAYMENT_DELAY);
}

#[tokio::test(start_paused = true)]
async fn double_submit_confirms_exactly_once() {
    let flow = open_flow("2", simulated_env());
    let mut rx = flow.subscribe();

    let mut first = flow.submit().await.unwrap();
    let mut second = flow.submit().await.unwrap();
    assert_eq!(second.pending(), 0);

    second.wait().await;
    first.wait().await;

    let confirmations = outcomes(&mut rx)
        .into_iter()
        .filter(|action| matches!(action, PurchaseAction::PaymentSucceeded { .. }))
        .count();
    assert_eq!(confirmations, 1);
    assert_eq!(flow.stage().await, PurchaseStage::Confirmed);
}

#[tokio::test(start_paused = true)]
async fn selection_is_ignored_while_processing_and_after_confirmation() {
    let flow = open_flow("3", simulated_env());
    flow.set_quantity(3).await.unwrap();

    let mut handle = flow.submit().await.unwrap();
    flow.select_tier("backstage").await.unwrap();
    flow.set_quantity(9).await.unwrap();
    handle.wait().await;
    flow.increment_quantity().await.unwrap();

    let view = flow.view().await;
    assert_eq!(view.stage, PurchaseStage::Confirmed);
    assert_eq!(view.tier_id, "gen");
    assert_eq!(view.quantity.get(), 3);
    assert_eq!(view.receipt.unwrap().total, Money::from_rupees(7500));
}

#[tokio::test(start_paused = true)]
async fn teardown_before_the_delay_suppresses_confirmation() {
    let flow = open_flow("1", simulated_env());
    let mut rx = flow.subscribe();

    flow.submit().await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;

    assert_eq!(flow.teardown(), 1);
    assert!(flow.is_torn_down());

    tokio::time::sleep(PAYMENT_DELAY * 2).await;

    let view = flow.view().await;
    assert_eq!(view.stage, PurchaseStage::Processing);
    assert!(view.receipt.is_none());
    assert!(outcomes(&mut rx).is_empty());

    assert_eq!(
        flow.select_tier("vip").await,
        Err(FlowError::Store(StoreError::TornDown))
    );
    assert_eq!(flow.teardown(), 0);
}

#[tokio::test(start_paused = true)]
async fn dropping_the_flow_aborts_the_payment() {
    let completed = Arc::new(AtomicBool::new(false));
    let processor = Arc::new(WitnessProcessor {
        completed: Arc::clone(&completed),
    });
    let flow = open_flow("1", env_with(processor, Duration::from_secs(10)));

    flow.submit().await.unwrap();
    tokio::time::sleep(Duration::from_millis(100)).await;
    drop(flow);

    tokio::time::sleep(PAYMENT_DELAY * 2).await;
    assert!(!completed.load(Ordering::SeqCst));
}

#[tokio::test(start_paused = true)]
async fn reset_while_processing_discards_the_outcome() {
    let flow = open_flow("4", simulated_env());
    flow.select_tier("vip").await.unwrap();

    let mut handle = flow.submit().await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    flow.reset().await.unwrap();

    handle.wait().await;

    let view = flow.view().await;
    assert_eq!(view.stage, PurchaseStage::Selecting);
    assert_eq!(view.tier_id, "gen");
    assert_eq!(view.quantity.get(), 1);
    assert!(view.receipt.is_none());
}

#[tokio::test(start_paused = true)]
async fn submit_and_wait_ignores_the_outcome_of_a_reset_attempt() {
    let flow = open_flow("1", simulated_env());
    let mut rx = flow.subscribe();

    flow.submit().await.unwrap();
    tokio::time::sleep(Duration::from_millis(500)).await;
    flow.reset().await.unwrap();

    let start = tokio::time::Instant::now();
    let view = flow.submit_and_wait(Duration::from_secs(10)).await.unwrap();

    assert_eq!(view.stage, PurchaseStage::Confirmed);
    assert!(view.receipt.is_some());
    assert!(start.elapsed() >= PAYMENT_DELAY);

    let attempts: Vec<_> = outcomes(&mut rx)
        .iter()
        .filter_map(PurchaseAction::outcome_attempt)
        .collect();
    assert_eq!(attempts, vec![1, 2]);
}

#[tokio::test(start_paused = true)]
async fn submit_and_wait_outside_selecting_returns_the_current_view() {
    let flow = open_flow("2", simulated_env());
    flow.submit_and_wait(Duration::from_secs(5)).await.unwrap();

    let view = flow.submit_and_wait(Duration::from_millis(100)).await.unwrap();
    assert_eq!(view.stage, PurchaseStage::Confirmed);
}

#[tokio::test(start_paused = true)]
async fn reset_after_confirmation_starts_over() {
    let flow = open_flow("4", simulated_env());
    flow.select_tier("backstage").await.unwrap();
    flow.set_quantity(4).await.unwrap();
    flow.submit_and_wait(Duration::from_secs(5)).await.unwrap();

    flow.reset().await.unwrap();

    let view = flow.view().await;
    assert_eq!(view.stage, PurchaseStage::Selecting);
    assert_eq!(view.tier_id, "gen");
    assert_eq!(view.total, Money::from_rupees(999));
}

#[tokio::test(start_paused = true)]
async fn declined_payment_fails_and_can_return_to_selection() {
    let flow = open_flow("1", env_with(Arc::new(DecliningProcessor), Duration::from_secs(10)));
    flow.set_quantity(2).await.unwrap();

    let view = flow.submit_and_wait(Duration::from_secs(5)).await.unwrap();
    assert_eq!(view.stage, PurchaseStage::Failed);
    assert_eq!(view.last_error.as_deref(), Some("Payment declined: insufficient funds"));

    flow.return_to_selection().await.unwrap();
    let view = flow.view().await;
    assert_eq!(view.stage, PurchaseStage::Selecting);
    assert_eq!(view.quantity.get(), 2);
    assert!(view.last_error.is_none());
}

#[tokio::test(start_paused = true)]
async fn stalled_payment_times_out_into_failed() {
    let timeout = Duration::from_millis(500);
    let flow = open_flow("1", env_with(Arc::new(StalledProcessor), timeout));

    let view = flow.submit_and_wait(Duration::from_secs(5)).await.unwrap();

    assert_eq!(view.stage, PurchaseStage::Failed);
    assert_eq!(view.last_error.as_deref(), Some("Payment timed out after 500ms"));
}

#[tokio::test(start_paused = true)]
async fn retry_after_failure_confirms_the_same_order() {
    let flow = open_flow("2", env_with(Arc::new(FlakyProcessor::default()), Duration::from_secs(10)));

    let failed = flow.submit_and_wait(Duration::from_secs(5)).await.unwrap();
    assert_eq!(failed.stage, PurchaseStage::Failed);

    let mut handle = flow.retry().await.unwrap();
    assert_eq!(flow.stage().await, PurchaseStage::Processing);
    handle.wait().await;

    let view = flow.view().await;
    assert_eq!(view.stage, PurchaseStage::Confirmed);
    let receipt = view.receipt.unwrap();
    assert!(receipt.transaction_id.ends_with("_2"));
    assert!(receipt.transaction_id.contains(&receipt.order_id.simple().to_string()));
}

#[tokio::test(start_paused = true)]
async fn independent_flows_do_not_interfere() {
    let first = open_flow("1", simulated_env());
    let second = open_flow("1", simulated_env());

    first.select_tier("vip").await.unwrap();
    let mut handle = first.submit().await.unwrap();
    second.set_quantity(5).await.unwrap();
    drop(second);

    handle.wait().await;
    assert_eq!(first.stage().await, PurchaseStage::Confirmed);
}

#[tokio::test(start_paused = true)]
async fn graceful_close_lets_the_payment_land() {
    let flow = open_flow("3", simulated_env());
    flow.submit().await.unwrap();

    flow.close(Duration::from_secs(5)).await.unwrap();

    assert_eq!(flow.stage().await, PurchaseStage::Confirmed);
    assert_eq!(
        flow.set_quantity(2).await,
        Err(FlowError::Store(StoreError::ShutdownInProgress))
    );
}

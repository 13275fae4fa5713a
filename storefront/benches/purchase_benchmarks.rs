//! Purchase flow benchmarks
//!
//! - Pricing: `base × multiplier × quantity` in paise
//! - Reducer: selection actions applied in place
//! - Store: selection actions through the runtime, and a full purchase with an
//!   instant payment processor
//!
//! Run with: `cargo bench -p horizon-storefront`

#![allow(missing_docs)] // Benchmarks don't need extensive docs
#![allow(clippy::expect_used)] // Benchmarks can use expect for setup

use criterion::{Criterion, Throughput, black_box, criterion_group, criterion_main};
use horizon_core::environment::SystemClock;
use horizon_core::reducer::Reducer;
use horizon_storefront::money::total;
use horizon_storefront::purchase::{
    PaymentConfirmation, PaymentFuture, PaymentProcessor, PaymentRequest, PurchaseReducer,
    PurchaseState,
};
use horizon_storefront::{Catalog, PurchaseAction, PurchaseEnvironment, PurchaseFlow};
use std::sync::Arc;
use std::time::Duration;

/// Confirms every charge immediately
struct InstantProcessor;

impl PaymentProcessor for InstantProcessor {
    fn process(&self, request: PaymentRequest) -> PaymentFuture {
        Box::pin(async move {
            Ok(PaymentConfirmation {
                transaction_id: format!("bench_{}", request.attempt),
            })
        })
    }
}

fn environment() -> PurchaseEnvironment {
    PurchaseEnvironment::new(
        Arc::new(SystemClock),
        Arc::new(InstantProcessor),
        Duration::from_secs(1),
    )
}

fn bench_pricing(c: &mut Criterion) {
    let catalog = Catalog::reference();
    let mut group = c.benchmark_group("pricing");
    group.throughput(Throughput::Elements(1));

    group.bench_function("total_all_tiers", |b| {
        b.iter(|| {
            for event in catalog.events() {
                for tier in catalog.tiers() {
                    black_box(total(black_box(event.price), tier.multiplier, black_box(10)));
                }
            }
        });
    });

    group.finish();
}

fn bench_reducer(c: &mut Criterion) {
    let catalog = Catalog::reference();
    let event = catalog.events()[0].clone();
    let reducer = PurchaseReducer::new();
    let env = environment();

    let mut group = c.benchmark_group("reducer");
    group.throughput(Throughput::Elements(3));

    group.bench_function("selection", |b| {
        let mut state =
            PurchaseState::new(event.clone(), catalog.shared_tiers()).expect("tiers exist");
        b.iter(|| {
            let _ = reducer.reduce(
                &mut state,
                black_box(PurchaseAction::SelectTier {
                    tier_id: "vip".to_string(),
                }),
                &env,
            );
            let _ = reducer.reduce(
                &mut state,
                black_box(PurchaseAction::IncrementQuantity),
                &env,
            );
            let _ = reducer.reduce(
                &mut state,
                black_box(PurchaseAction::SetQuantity { requested: 2 }),
                &env,
            );
        });
    });

    group.finish();
}

fn bench_store(c: &mut Criterion) {
    let runtime = tokio::runtime::Runtime::new().expect("Failed to create runtime");
    let catalog = Catalog::reference();
    let event = catalog.events()[0].clone();

    let mut group = c.benchmark_group("store");

    group.bench_function("set_quantity", |b| {
        let flow = runtime.block_on(async {
            PurchaseFlow::new(event.clone(), catalog.shared_tiers(), environment())
                .expect("tiers exist")
        });
        b.to_async(&runtime).iter(|| async {
            flow.set_quantity(black_box(4)).await.expect("store running");
        });
    });

    group.bench_function("purchase_to_confirmation", |b| {
        b.to_async(&runtime).iter(|| async {
            let flow = PurchaseFlow::new(event.clone(), catalog.shared_tiers(), environment())
                .expect("tiers exist");
            flow.select_tier("vip").await.expect("store running");
            let view = flow
                .submit_and_wait(Duration::from_secs(1))
                .await
                .expect("payment confirms");
            black_box(view);
        });
    });

    group.finish();
}

criterion_group!(benches, bench_pricing, bench_reducer, bench_store);
criterion_main!(benches);

// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Criterion benchmarks for method dispatch through the bridge host.

use std::sync::Arc;

use criterion::{Criterion, black_box, criterion_group, criterion_main};

use superwall_bridge::{BridgeHost, InMemorySdk, MethodCall, RecordingMessenger};
use superwall_core::{BridgeConfig, SubscriptionStatus};

// ---------------------------------------------------------------------------
// Benchmarks
// ---------------------------------------------------------------------------

fn make_host() -> BridgeHost {
    BridgeHost::new(
        Arc::new(InMemorySdk::new()),
        Arc::new(RecordingMessenger::new()),
        BridgeConfig::default(),
    )
}

/// Facade getter: registry lookup plus one SDK read.
fn bench_facade_getter(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let host = make_host();
    let call = MethodCall::bare("getUserId");

    c.bench_function("dispatch getUserId", |b| {
        b.iter(|| {
            let call = black_box(call.clone());
            black_box(rt.block_on(host.invoke(host.superwall_bridge_id(), call)));
        });
    });
}

/// Status round trip: mint (or reuse) a status id, then describe it.
fn bench_status_round_trip(c: &mut Criterion) {
    let rt = tokio::runtime::Builder::new_current_thread().build().unwrap();
    let host = make_host();
    let describe = MethodCall::bare("getDescription");

    c.bench_function("status id + getDescription", |b| {
        b.iter(|| {
            let id = host
                .registry()
                .status_bridge_id(black_box(SubscriptionStatus::Active));
            black_box(rt.block_on(host.invoke(&id, describe.clone())));
        });
    });
}

criterion_group!(benches, bench_facade_getter, bench_status_round_trip);
criterion_main!(benches);

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Marshalling Benchmark
//!
//! Measures body encode/decode for a typical property-change signal
//! (`sa{sv}as`) in both slot modes, and the full post/dispatch loop through
//! the registry.

#![allow(clippy::uninlined_format_args)]

use busbridge::{
    BridgeConfig, CallDescriptor, DispatchRegistry, Endianness, MemoryTransport, NativeValue,
    PayloadKind, SignalDescriptor, UserInfo, Value,
};
use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

fn properties_changed() -> CallDescriptor {
    CallDescriptor::new("org.demo.Properties", "PropertiesChanged")
        .and_then(|m| m.with_input("s", Some("interface")))
        .and_then(|m| m.with_input("a{sv}", Some("changed")))
        .and_then(|m| m.with_input("as", Some("invalidated")))
        .expect("descriptor")
}

fn changed_properties(n: u32) -> Value {
    Value::dict((0..n).map(|i| {
        (
            Value::from(format!("Property{}", i)),
            Value::variant(Value::UInt32(i)).expect("variant"),
        )
    }))
}

fn bench_marshal(c: &mut Criterion) {
    let method = properties_changed();
    let call = method
        .new_call(false)
        .with_argument(NativeValue::Str("org.demo.Player".into()))
        .with_argument(NativeValue::Boxed(changed_properties(16)))
        .with_argument(NativeValue::Boxed(Value::from(vec!["Title", "Artist"])));

    c.bench_function("marshal_properties_changed", |b| {
        b.iter(|| {
            let frame = method
                .to_method_call(black_box(&call), Endianness::Little)
                .expect("marshal");
            black_box(frame.body.len())
        });
    });

    let frame = method
        .to_method_call(&call, Endianness::Little)
        .expect("marshal");
    for boxed in [false, true] {
        let name = if boxed {
            "unmarshal_properties_changed_boxed"
        } else {
            "unmarshal_properties_changed_unboxed"
        };
        c.bench_function(name, |b| {
            b.iter(|| {
                let mut received = method.new_call(boxed);
                method
                    .unmarshal(black_box(&frame), &mut received, PayloadKind::Call)
                    .expect("unmarshal");
                black_box(received.arguments.len())
            });
        });
    }
}

fn bench_dispatch(c: &mut Criterion) {
    let transport = Arc::new(MemoryTransport::new(":1.1"));
    let registry = DispatchRegistry::new(BridgeConfig::default(), transport.clone());
    registry.register_signal(
        SignalDescriptor::new("org.demo.Clock", "Tick")
            .and_then(|s| s.with_argument("u", Some("seconds")))
            .expect("signal"),
    );
    let observers: Vec<Arc<AtomicU64>> = (0..8).map(|_| Arc::new(AtomicU64::new(0))).collect();
    for observer in &observers {
        registry
            .add_signal_observer(
                observer,
                |count, _| {
                    count.fetch_add(1, Ordering::Relaxed);
                },
                "Tick",
                "org.demo.Clock",
                None,
                Vec::new(),
            )
            .expect("observer");
    }

    let mut info = UserInfo::new();
    info.insert("arg0".into(), Value::UInt32(1));
    registry
        .post_signal("Tick", "org.demo.Clock", None, Some(&info))
        .expect("post");
    let frame = transport.drain().pop().expect("frame");

    c.bench_function("dispatch_tick_8_observers", |b| {
        b.iter(|| black_box(registry.dispatch(black_box(&frame)).expect("dispatch")));
    });
}

criterion_group!(benches, bench_marshal, bench_dispatch);
criterion_main!(benches);

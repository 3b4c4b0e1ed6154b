// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::cast_possible_truncation)] // Test parameters
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure

//! Randomized marshalling tests.
//!
//! Builds random descriptors and conforming values from a fixed seed, then
//! checks that every call survives marshal/unmarshal in both slot modes and
//! both byte orders.

use busbridge::{
    Argument, CallDescriptor, Direction, Endianness, NativeValue, ObjectPath, PayloadKind,
    TypeDescriptor, Value, Variant,
};
use std::sync::Arc;

const SEED: u64 = 0x6275_7362_7269_6467;
const MAX_NESTING: usize = 4;

fn random_basic(rng: &mut fastrand::Rng) -> TypeDescriptor {
    match rng.usize(0..12) {
        0 => TypeDescriptor::Byte,
        1 => TypeDescriptor::Boolean,
        2 => TypeDescriptor::Int16,
        3 => TypeDescriptor::UInt16,
        4 => TypeDescriptor::Int32,
        5 => TypeDescriptor::UInt32,
        6 => TypeDescriptor::Int64,
        7 => TypeDescriptor::UInt64,
        8 => TypeDescriptor::Double,
        9 => TypeDescriptor::String,
        10 => TypeDescriptor::ObjectPath,
        _ => TypeDescriptor::Signature,
    }
}

fn random_type(rng: &mut fastrand::Rng, depth: usize) -> TypeDescriptor {
    if depth >= MAX_NESTING {
        return random_basic(rng);
    }
    match rng.usize(0..10) {
        0 => TypeDescriptor::array(random_type(rng, depth + 1)),
        1 => TypeDescriptor::dict(random_basic(rng), random_type(rng, depth + 1)),
        2 => TypeDescriptor::structure(
            (0..rng.usize(1..4))
                .map(|_| random_type(rng, depth + 1))
                .collect(),
        ),
        3 => TypeDescriptor::Variant,
        _ => random_basic(rng),
    }
}

fn random_string(rng: &mut fastrand::Rng) -> String {
    let words = ["", "a", "hello", "naïve", "org.demo", "ünïcødé ✓", "x y z"];
    words[rng.usize(0..words.len())].to_string()
}

fn random_path(rng: &mut fastrand::Rng) -> ObjectPath {
    let paths = ["/", "/org", "/org/demo/Clock", "/a/b_1/C2"];
    ObjectPath::new(paths[rng.usize(0..paths.len())]).expect("path")
}

fn random_value(rng: &mut fastrand::Rng, ty: &TypeDescriptor, depth: usize) -> Value {
    match ty {
        TypeDescriptor::Byte => Value::Byte(rng.u8(..)),
        TypeDescriptor::Boolean => Value::Boolean(rng.bool()),
        TypeDescriptor::Int16 => Value::Int16(rng.i16(..)),
        TypeDescriptor::UInt16 => Value::UInt16(rng.u16(..)),
        TypeDescriptor::Int32 => Value::Int32(rng.i32(..)),
        TypeDescriptor::UInt32 => Value::UInt32(rng.u32(..)),
        TypeDescriptor::Int64 => Value::Int64(rng.i64(..)),
        TypeDescriptor::UInt64 => Value::UInt64(rng.u64(..)),
        TypeDescriptor::Double => Value::Double((rng.f64() - 0.5) * 1e9),
        TypeDescriptor::String => Value::String(random_string(rng)),
        TypeDescriptor::ObjectPath => Value::ObjectPath(random_path(rng)),
        TypeDescriptor::Signature => Value::Signature(random_type(rng, 0).signature()),
        TypeDescriptor::Array(elem) => Value::Array(
            (0..rng.usize(0..4))
                .map(|_| random_value(rng, elem, depth + 1))
                .collect(),
        ),
        TypeDescriptor::Struct(fields) => Value::Struct(
            fields
                .iter()
                .map(|f| random_value(rng, f, depth + 1))
                .collect(),
        ),
        TypeDescriptor::DictEntry(k, v) => Value::DictEntry(
            Box::new(random_value(rng, k, depth + 1)),
            Box::new(random_value(rng, v, depth + 1)),
        ),
        TypeDescriptor::Variant => {
            let inner = random_type(rng, depth + 1);
            let value = random_value(rng, &inner, depth + 1);
            Value::Variant(Box::new(Variant::with_type(inner, value).expect("variant")))
        }
    }
}

fn random_method(rng: &mut fastrand::Rng) -> (CallDescriptor, Vec<Value>) {
    let mut method = CallDescriptor::new("org.demo.Random", "Call").expect("descriptor");
    let mut values = Vec::new();
    for i in 0..rng.usize(0..5) {
        let ty = random_type(rng, 0);
        values.push(random_value(rng, &ty, 0));
        let arg = Argument::new(Arc::new(ty), Some(format!("a{}", i)), Direction::In)
            .expect("argument");
        method.add_argument(arg);
    }
    (method, values)
}

fn roundtrip(method: &CallDescriptor, values: &[Value], endianness: Endianness) {
    // Send boxed, receive in both modes.
    let mut call = method.new_call(true);
    for value in values {
        call = call.with_argument(value.clone());
    }
    let frame = method
        .to_method_call(&call, endianness)
        .unwrap_or_else(|e| panic!("marshal {}: {}", method, e));
    assert_eq!(frame.signature, method.signature(PayloadKind::Call));

    let mut boxed = method.new_call(true);
    method
        .unmarshal(&frame, &mut boxed, PayloadKind::Call)
        .unwrap_or_else(|e| panic!("unmarshal boxed {}: {}", method, e));
    assert_eq!(boxed.arguments, call.arguments, "{}", method);

    let mut unboxed = method.new_call(false);
    method
        .unmarshal(&frame, &mut unboxed, PayloadKind::Call)
        .unwrap_or_else(|e| panic!("unmarshal unboxed {}: {}", method, e));
    for ((slot, arg), expected) in unboxed.arguments.iter().zip(method.inputs()).zip(values) {
        assert_eq!(slot.native_type(), arg.native_type(false));
        assert_eq!(
            &slot.clone().into_value(arg.type_descriptor()).expect("widen"),
            expected
        );
    }

    // Re-marshal the unboxed call: same bytes.
    let again = method
        .to_method_call(&unboxed, endianness)
        .expect("re-marshal");
    assert_eq!(again.body, frame.body, "{}", method);
}

#[test]
fn random_calls_roundtrip() {
    let mut rng = fastrand::Rng::with_seed(SEED);
    for _ in 0..300 {
        let (method, values) = random_method(&mut rng);
        roundtrip(&method, &values, Endianness::Little);
        roundtrip(&method, &values, Endianness::Big);
    }
}

#[test]
fn every_basic_type_roundtrips_unboxed() {
    let method = CallDescriptor::new("org.demo.All", "Basics")
        .and_then(|m| m.with_input("ybnqiuxtdsog", None))
        .map_err(|e| e.to_string());
    // a multi-type signature is not a single argument
    assert!(method.is_err());

    let mut method = CallDescriptor::new("org.demo.All", "Basics").expect("descriptor");
    for code in ["y", "b", "n", "q", "i", "u", "x", "t", "d", "s", "o", "g"] {
        method.add_argument(Argument::parse(code, None, Direction::In).expect(code));
    }
    let call = method
        .new_call(false)
        .with_argument(NativeValue::Byte(255))
        .with_argument(NativeValue::Boolean(true))
        .with_argument(NativeValue::Int16(i16::MIN))
        .with_argument(NativeValue::UInt16(u16::MAX))
        .with_argument(NativeValue::Int32(i32::MIN))
        .with_argument(NativeValue::UInt32(u32::MAX))
        .with_argument(NativeValue::Int64(i64::MIN))
        .with_argument(NativeValue::UInt64(u64::MAX))
        .with_argument(NativeValue::Double(-0.25))
        .with_argument(NativeValue::Str("text".into()))
        .with_argument(NativeValue::Str("/org/demo".into()))
        .with_argument(NativeValue::Str("a{sv}".into()));
    let frame = method
        .to_method_call(&call, Endianness::Little)
        .expect("marshal");
    assert_eq!(frame.signature, "ybnqiuxtdsog");

    let mut received = method.new_call(false);
    method
        .unmarshal(&frame, &mut received, PayloadKind::Call)
        .expect("unmarshal");
    assert_eq!(received.arguments, call.arguments);
}

#[test]
fn nested_property_dictionary() {
    let method = CallDescriptor::new("org.demo.Props", "Changed")
        .and_then(|m| m.with_input("s", Some("interface")))
        .and_then(|m| m.with_input("a{sv}", Some("changed")))
        .and_then(|m| m.with_input("as", Some("invalidated")))
        .expect("descriptor");

    let nested = Value::dict(vec![(
        Value::from("inner"),
        Value::variant(Value::from(vec![1u32, 2, 3])).expect("variant"),
    )]);
    let changed = Value::dict(vec![
        (Value::from("Volume"), Value::variant(Value::Double(0.5)).expect("variant")),
        (
            Value::from("Meta"),
            Value::Variant(Box::new(
                Variant::with_type(
                    TypeDescriptor::dict(TypeDescriptor::String, TypeDescriptor::Variant),
                    nested,
                )
                .expect("variant"),
            )),
        ),
    ]);
    let call = method
        .new_call(false)
        .with_argument(NativeValue::Str("org.demo.Player".into()))
        .with_argument(NativeValue::Boxed(changed.clone()))
        .with_argument(NativeValue::Boxed(Value::from(vec!["Title"])));

    let frame = method
        .to_method_call(&call, Endianness::Big)
        .expect("marshal");
    let mut received = method.new_call(false);
    method
        .unmarshal(&frame, &mut received, PayloadKind::Call)
        .expect("unmarshal");

    let got = received.arguments[1].as_value().expect("boxed dict");
    assert_eq!(got, &changed);
    let volume = got
        .dict_get(&Value::from("Volume"))
        .and_then(Value::as_variant)
        .map(Variant::value);
    assert_eq!(volume, Some(&Value::Double(0.5)));
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

#![allow(clippy::uninlined_format_args)] // Test/bench code readability over pedantic
#![allow(clippy::unreadable_literal)] // Large test constants
#![allow(clippy::float_cmp)] // Test assertions with constants
#![allow(clippy::missing_panics_doc)] // Tests/examples panic on failure

//! Golden body vectors.
//!
//! Every vector is checked in both directions: encoding must produce exactly
//! the bytes, and decoding the bytes must yield the value back.

use busbridge::types::codec::{decode_value, encode_value};
use busbridge::wire::{WireReader, WireWriter};
use busbridge::{
    CallDescriptor, Endianness, Error, NativeValue, ObjectPath, PayloadKind, TypeDescriptor, Value,
    WireMessage,
};

fn encode(signature: &str, value: &Value, endianness: Endianness) -> Vec<u8> {
    let ty = TypeDescriptor::parse_single(signature).expect("signature");
    let mut writer = WireWriter::new(endianness);
    encode_value(&mut writer, &ty, value).expect("encode");
    writer.into_bytes()
}

fn decode(signature: &str, bytes: &[u8], endianness: Endianness) -> busbridge::Result<Value> {
    let ty = TypeDescriptor::parse_single(signature).expect("signature");
    let mut reader = WireReader::new(bytes, endianness);
    let value = decode_value(&mut reader, &ty)?;
    reader.finish()?;
    Ok(value)
}

fn check_golden(signature: &str, value: Value, endianness: Endianness, expected: &[u8]) {
    let bytes = encode(signature, &value, endianness);
    assert_eq!(bytes, expected, "encoding of '{}' ({:?})", signature, endianness);
    let decoded = decode(signature, expected, endianness)
        .unwrap_or_else(|e| panic!("decoding '{}': {}", signature, e));
    assert_eq!(decoded, value, "decoding of '{}'", signature);
}

fn assert_malformed(signature: &str, bytes: &[u8]) {
    match decode(signature, bytes, Endianness::Little) {
        Err(Error::MalformedWireData { .. }) => {}
        other => panic!("'{}' {:?}: expected malformed, got {:?}", signature, bytes, other),
    }
}

// ============================================================================
// Basic types
// ============================================================================

#[test]
fn golden_fixed_width() {
    let le = Endianness::Little;
    check_golden("y", Value::Byte(0xab), le, &[0xab]);
    check_golden("b", Value::Boolean(true), le, &[1, 0, 0, 0]);
    check_golden("n", Value::Int16(-2), le, &[0xfe, 0xff]);
    check_golden("q", Value::UInt16(0x1234), le, &[0x34, 0x12]);
    check_golden("i", Value::Int32(-1), le, &[0xff, 0xff, 0xff, 0xff]);
    check_golden("u", Value::UInt32(0x01020304), le, &[4, 3, 2, 1]);
    check_golden("x", Value::Int64(1), le, &[1, 0, 0, 0, 0, 0, 0, 0]);
    check_golden("t", Value::UInt64(u64::MAX), le, &[0xff; 8]);
    check_golden(
        "d",
        Value::Double(1.0),
        le,
        &[0, 0, 0, 0, 0, 0, 0xf0, 0x3f],
    );
}

#[test]
fn golden_big_endian() {
    let be = Endianness::Big;
    check_golden("u", Value::UInt32(0x01020304), be, &[1, 2, 3, 4]);
    check_golden("q", Value::UInt16(0x1234), be, &[0x12, 0x34]);
    check_golden("s", Value::from("hi"), be, &[0, 0, 0, 2, b'h', b'i', 0]);
    check_golden(
        "d",
        Value::Double(1.0),
        be,
        &[0x3f, 0xf0, 0, 0, 0, 0, 0, 0],
    );
}

#[test]
fn golden_string_like() {
    let le = Endianness::Little;
    check_golden("s", Value::from("hi"), le, &[2, 0, 0, 0, b'h', b'i', 0]);
    check_golden("s", Value::from(""), le, &[0, 0, 0, 0, 0]);
    check_golden(
        "o",
        Value::ObjectPath(ObjectPath::new("/a").expect("path")),
        le,
        &[2, 0, 0, 0, b'/', b'a', 0],
    );
    check_golden(
        "g",
        Value::Signature("ai".into()),
        le,
        &[2, b'a', b'i', 0],
    );
}

// ============================================================================
// Containers
// ============================================================================

#[test]
fn golden_arrays() {
    let le = Endianness::Little;
    check_golden(
        "ay",
        Value::from(vec![1u8, 2, 3]),
        le,
        &[3, 0, 0, 0, 1, 2, 3],
    );
    // Empty array of 8-aligned elements still pads to the first element.
    check_golden("at", Value::Array(vec![]), le, &[0, 0, 0, 0, 0, 0, 0, 0]);
    // Length counts element bytes only, not the leading padding.
    check_golden(
        "ax",
        Value::from(vec![5i64]),
        le,
        &[8, 0, 0, 0, 0, 0, 0, 0, 5, 0, 0, 0, 0, 0, 0, 0],
    );
}

#[test]
fn golden_struct_padding() {
    check_golden(
        "(yx)",
        Value::Struct(vec![Value::Byte(1), Value::Int64(-1)]),
        Endianness::Little,
        &[1, 0, 0, 0, 0, 0, 0, 0, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff],
    );
}

#[test]
fn golden_variant_and_dict() {
    let le = Endianness::Little;
    check_golden(
        "v",
        Value::variant(Value::UInt32(42)).expect("variant"),
        le,
        &[1, b'u', 0, 0, 42, 0, 0, 0],
    );

    let dict = Value::dict(vec![(
        Value::from("k"),
        Value::variant(Value::Byte(5)).expect("variant"),
    )]);
    check_golden(
        "a{sv}",
        dict,
        le,
        &[10, 0, 0, 0, 0, 0, 0, 0, 1, 0, 0, 0, b'k', 0, 1, b'y', 0, 5],
    );
}

// ============================================================================
// Descriptor-level frames
// ============================================================================

#[test]
fn golden_method_call_body() {
    let method = CallDescriptor::new("org.demo.Names", "Lookup")
        .and_then(|m| m.with_input("s", Some("name")))
        .and_then(|m| m.with_input("u", Some("flags")))
        .expect("descriptor");
    let call = method
        .new_call(false)
        .with_argument(NativeValue::Str("hi".into()))
        .with_argument(NativeValue::UInt32(7));

    let frame = method
        .to_method_call(&call, Endianness::Little)
        .expect("marshal");
    assert_eq!(frame.signature, "su");
    assert_eq!(frame.body, vec![2, 0, 0, 0, b'h', b'i', 0, 0, 7, 0, 0, 0]);

    let frame = method
        .to_method_call(&call, Endianness::Big)
        .expect("marshal");
    assert_eq!(frame.body, vec![0, 0, 0, 2, b'h', b'i', 0, 0, 0, 0, 0, 7]);
}

#[test]
fn boxed_and_unboxed_modes_share_bytes() {
    let method = CallDescriptor::new("org.demo.Names", "Lookup")
        .and_then(|m| m.with_input("s", None))
        .and_then(|m| m.with_input("u", None))
        .expect("descriptor");
    let unboxed = method
        .new_call(false)
        .with_argument(NativeValue::Str("hi".into()))
        .with_argument(NativeValue::UInt32(7));
    let boxed = method
        .new_call(true)
        .with_argument(Value::from("hi"))
        .with_argument(Value::UInt32(7));

    let a = method.to_method_call(&unboxed, Endianness::Little).expect("unboxed");
    let b = method.to_method_call(&boxed, Endianness::Little).expect("boxed");
    assert_eq!(a.body, b.body);
}

// ============================================================================
// Malformed input
// ============================================================================

#[test]
fn rejects_malformed_bodies() {
    // boolean outside {0, 1}
    assert_malformed("b", &[2, 0, 0, 0]);
    // string without terminator
    assert_malformed("s", &[2, 0, 0, 0, b'h', b'i', b'x']);
    // interior NUL
    assert_malformed("s", &[3, 0, 0, 0, b'h', 0, b'i', 0]);
    // invalid UTF-8
    assert_malformed("s", &[1, 0, 0, 0, 0xff, 0]);
    // length past the end of the body
    assert_malformed("s", &[9, 0, 0, 0, b'h', 0]);
    // non-zero padding
    assert_malformed("(yx)", &[1, 1, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0, 0]);
    // invalid object path
    assert_malformed("o", &[2, 0, 0, 0, b'a', b'/', 0]);
    // variant signature with two types
    assert_malformed("v", &[2, b'y', b'y', 0, 1, 2]);
    // array elements overrun the declared length
    assert_malformed("ai", &[6, 0, 0, 0, 1, 0, 0, 0, 2, 0]);
    // array length over the limit
    assert_malformed("ay", &[0, 0, 0, 0x10, 0]);
    // trailing garbage after the last value
    assert_malformed("u", &[1, 0, 0, 0, 9]);
}

#[test]
fn malformed_frame_leaves_call_untouched() {
    let method = CallDescriptor::new("org.demo.Names", "Lookup")
        .and_then(|m| m.with_input("b", None))
        .expect("descriptor");
    let mut frame = WireMessage::method_call("org.demo.Names", "Lookup");
    frame.signature = "b".into();
    frame.body = vec![7, 0, 0, 0];

    let mut call = method.new_call(false);
    let err = method
        .unmarshal(&frame, &mut call, PayloadKind::Call)
        .unwrap_err();
    assert!(err.is_wire_error());
    assert!(call.arguments.is_empty());
}

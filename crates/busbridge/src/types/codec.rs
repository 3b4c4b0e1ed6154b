// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Byte-exact D-Bus encoding of boxed values.
//!
//! Every value is written against an explicit [`TypeDescriptor`]; the value's
//! own shape is only checked, never trusted to pick the encoding.

use super::value::check_variant_type;
use super::{parse_signature, ObjectPath, TypeDescriptor, Value, Variant};
use crate::config::{MAX_ARRAY_LEN, MAX_SIGNATURE_LEN, MAX_TOTAL_DEPTH};
use crate::error::{Error, Result};
use crate::wire::{names, WireReader, WireWriter};

/// Encode one value of type `ty` at the writer's current offset.
pub fn encode_value(writer: &mut WireWriter, ty: &TypeDescriptor, value: &Value) -> Result<()> {
    encode_at_depth(writer, ty, value, 0)
}

/// Decode one value of type `ty` at the reader's current offset.
pub fn decode_value(reader: &mut WireReader<'_>, ty: &TypeDescriptor) -> Result<Value> {
    let start = reader.offset();
    let decoded = decode_at_depth(reader, ty, 0);
    if let Err(e) = &decoded {
        log::trace!("[codec] '{}' at offset {} rejected: {}", ty, start, e);
    }
    decoded
}

fn mismatch(ty: &TypeDescriptor, value: &Value) -> Error {
    Error::TypeMismatch(format!("expected '{}', found {} value", ty, value.kind_name()))
}

fn encode_at_depth(
    writer: &mut WireWriter,
    ty: &TypeDescriptor,
    value: &Value,
    depth: usize,
) -> Result<()> {
    if depth > MAX_TOTAL_DEPTH {
        return Err(Error::EncodingOverflow(format!(
            "container nesting deeper than {}",
            MAX_TOTAL_DEPTH
        )));
    }

    match (ty, value) {
        (TypeDescriptor::Byte, Value::Byte(v)) => writer.write_u8(*v),
        (TypeDescriptor::Boolean, Value::Boolean(v)) => {
            writer.align(4);
            writer.write_u32(u32::from(*v));
        }
        (TypeDescriptor::Int16, Value::Int16(v)) => {
            writer.align(2);
            writer.write_i16(*v);
        }
        (TypeDescriptor::UInt16, Value::UInt16(v)) => {
            writer.align(2);
            writer.write_u16(*v);
        }
        (TypeDescriptor::Int32, Value::Int32(v)) => {
            writer.align(4);
            writer.write_i32(*v);
        }
        (TypeDescriptor::UInt32, Value::UInt32(v)) => {
            writer.align(4);
            writer.write_u32(*v);
        }
        (TypeDescriptor::Int64, Value::Int64(v)) => {
            writer.align(8);
            writer.write_i64(*v);
        }
        (TypeDescriptor::UInt64, Value::UInt64(v)) => {
            writer.align(8);
            writer.write_u64(*v);
        }
        (TypeDescriptor::Double, Value::Double(v)) => {
            writer.align(8);
            writer.write_f64(*v);
        }
        (TypeDescriptor::String, Value::String(s)) => write_string(writer, s)?,
        (TypeDescriptor::ObjectPath, Value::ObjectPath(p)) => write_string(writer, p.as_str())?,
        (TypeDescriptor::Signature, Value::Signature(s)) => {
            parse_signature(s)?;
            write_signature(writer, s)?;
        }
        (TypeDescriptor::Array(elem), Value::Array(items)) => {
            writer.align(4);
            let length_at = writer.offset();
            writer.write_u32(0);
            // Padding to the first element is written even for empty arrays
            // and is not counted in the length.
            writer.align(elem.wire_alignment());
            let start = writer.offset();
            for item in items {
                encode_at_depth(writer, elem, item, depth + 1)?;
            }
            let length = writer.offset() - start;
            if length > MAX_ARRAY_LEN {
                return Err(Error::EncodingOverflow(format!(
                    "array of {} bytes exceeds the {} byte limit",
                    length, MAX_ARRAY_LEN
                )));
            }
            writer.patch_u32(length_at, length as u32);
        }
        (TypeDescriptor::Struct(fields), Value::Struct(values)) => {
            if fields.len() != values.len() {
                return Err(Error::TypeMismatch(format!(
                    "struct '{}' has {} fields, value has {}",
                    ty,
                    fields.len(),
                    values.len()
                )));
            }
            writer.align(8);
            for (field, v) in fields.iter().zip(values) {
                encode_at_depth(writer, field, v, depth + 1)?;
            }
        }
        (TypeDescriptor::DictEntry(kt, vt), Value::DictEntry(k, v)) => {
            writer.align(8);
            encode_at_depth(writer, kt, k, depth + 1)?;
            encode_at_depth(writer, vt, v, depth + 1)?;
        }
        (TypeDescriptor::Variant, Value::Variant(variant)) => {
            let inner = variant.type_descriptor();
            check_variant_type(inner)?;
            write_signature(writer, &inner.signature())?;
            encode_at_depth(writer, inner, variant.value(), depth + 1)?;
        }
        (ty, value) => return Err(mismatch(ty, value)),
    }
    Ok(())
}

fn write_string(writer: &mut WireWriter, s: &str) -> Result<()> {
    if s.as_bytes().contains(&0) {
        return Err(Error::TypeMismatch(
            "string contains an interior NUL byte".into(),
        ));
    }
    let length = u32::try_from(s.len()).map_err(|_| {
        Error::EncodingOverflow(format!("string of {} bytes does not fit a u32 length", s.len()))
    })?;
    writer.align(4);
    writer.write_u32(length);
    writer.write_bytes(s.as_bytes());
    writer.write_u8(0);
    Ok(())
}

fn write_signature(writer: &mut WireWriter, signature: &str) -> Result<()> {
    if signature.len() > MAX_SIGNATURE_LEN {
        return Err(Error::EncodingOverflow(format!(
            "signature of {} bytes exceeds {}",
            signature.len(),
            MAX_SIGNATURE_LEN
        )));
    }
    writer.write_u8(signature.len() as u8);
    writer.write_bytes(signature.as_bytes());
    writer.write_u8(0);
    Ok(())
}

fn decode_at_depth(reader: &mut WireReader<'_>, ty: &TypeDescriptor, depth: usize) -> Result<Value> {
    if depth > MAX_TOTAL_DEPTH {
        return Err(Error::malformed(
            reader.offset(),
            format!("container nesting deeper than {}", MAX_TOTAL_DEPTH),
        ));
    }

    let value = match ty {
        TypeDescriptor::Byte => Value::Byte(reader.read_u8()?),
        TypeDescriptor::Boolean => {
            reader.align(4)?;
            let at = reader.offset();
            match reader.read_u32()? {
                0 => Value::Boolean(false),
                1 => Value::Boolean(true),
                other => {
                    return Err(Error::malformed(
                        at,
                        format!("boolean value {} is neither 0 nor 1", other),
                    ))
                }
            }
        }
        TypeDescriptor::Int16 => {
            reader.align(2)?;
            Value::Int16(reader.read_i16()?)
        }
        TypeDescriptor::UInt16 => {
            reader.align(2)?;
            Value::UInt16(reader.read_u16()?)
        }
        TypeDescriptor::Int32 => {
            reader.align(4)?;
            Value::Int32(reader.read_i32()?)
        }
        TypeDescriptor::UInt32 => {
            reader.align(4)?;
            Value::UInt32(reader.read_u32()?)
        }
        TypeDescriptor::Int64 => {
            reader.align(8)?;
            Value::Int64(reader.read_i64()?)
        }
        TypeDescriptor::UInt64 => {
            reader.align(8)?;
            Value::UInt64(reader.read_u64()?)
        }
        TypeDescriptor::Double => {
            reader.align(8)?;
            Value::Double(reader.read_f64()?)
        }
        TypeDescriptor::String => Value::String(read_string(reader)?),
        TypeDescriptor::ObjectPath => {
            let at = reader.offset();
            let path = read_string(reader)?;
            if let Err(e) = names::validate_object_path(&path) {
                return Err(Error::malformed(at, e.to_string()));
            }
            Value::ObjectPath(ObjectPath::new(path)?)
        }
        TypeDescriptor::Signature => {
            let at = reader.offset();
            let signature = read_signature(reader)?;
            if let Err(e) = parse_signature(&signature) {
                return Err(Error::malformed(at, e.to_string()));
            }
            Value::Signature(signature)
        }
        TypeDescriptor::Array(elem) => {
            reader.align(4)?;
            let at = reader.offset();
            let length = reader.read_u32()? as usize;
            if length > MAX_ARRAY_LEN {
                return Err(Error::malformed(
                    at,
                    format!("array length {} exceeds {}", length, MAX_ARRAY_LEN),
                ));
            }
            reader.align(elem.wire_alignment())?;
            if length > reader.remaining() {
                return Err(Error::malformed(
                    at,
                    format!("array length {} runs past the end of the body", length),
                ));
            }
            let end = reader.offset() + length;
            let mut items = Vec::new();
            while reader.offset() < end {
                items.push(decode_at_depth(reader, elem, depth + 1)?);
            }
            if reader.offset() != end {
                return Err(Error::malformed(
                    reader.offset(),
                    format!("array elements overrun the declared length {}", length),
                ));
            }
            Value::Array(items)
        }
        TypeDescriptor::Struct(fields) => {
            reader.align(8)?;
            let mut values = Vec::with_capacity(fields.len());
            for field in fields {
                values.push(decode_at_depth(reader, field, depth + 1)?);
            }
            Value::Struct(values)
        }
        TypeDescriptor::DictEntry(kt, vt) => {
            reader.align(8)?;
            let key = decode_at_depth(reader, kt, depth + 1)?;
            let value = decode_at_depth(reader, vt, depth + 1)?;
            Value::DictEntry(Box::new(key), Box::new(value))
        }
        TypeDescriptor::Variant => {
            let at = reader.offset();
            let signature = read_signature(reader)?;
            let inner = TypeDescriptor::parse_single(&signature)
                .map_err(|e| Error::malformed(at, e.to_string()))?;
            let value = decode_at_depth(reader, &inner, depth + 1)?;
            Value::Variant(Box::new(Variant::from_parts(inner, value)))
        }
    };
    Ok(value)
}

fn read_string(reader: &mut WireReader<'_>) -> Result<String> {
    reader.align(4)?;
    let at = reader.offset();
    let length = reader.read_u32()? as usize;
    let bytes = reader.read_bytes(length)?;
    let nul_at = reader.offset();
    if reader.read_u8()? != 0 {
        return Err(Error::malformed(nul_at, "string is not NUL-terminated"));
    }
    if bytes.contains(&0) {
        return Err(Error::malformed(at, "string contains an interior NUL byte"));
    }
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| Error::malformed(at, format!("invalid UTF-8: {}", e)))
}

fn read_signature(reader: &mut WireReader<'_>) -> Result<String> {
    let at = reader.offset();
    let length = reader.read_u8()? as usize;
    let bytes = reader.read_bytes(length)?;
    let nul_at = reader.offset();
    if reader.read_u8()? != 0 {
        return Err(Error::malformed(nul_at, "signature is not NUL-terminated"));
    }
    if !bytes.is_ascii() {
        return Err(Error::malformed(at, "signature contains non-ASCII bytes"));
    }
    std::str::from_utf8(bytes)
        .map(str::to_owned)
        .map_err(|e| Error::malformed(at, e.to_string()))
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Boxed and native value representations.
//!
//! [`Value`] is the uniform carrier used for variants, containers and
//! reflection. [`NativeValue`] is one slot of a native call: primitives travel
//! as Rust primitives, containers are always boxed.

use super::TypeDescriptor;
use crate::error::{Error, Result};
use crate::wire::names;
use std::fmt;

/// A validated object path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ObjectPath(String);

impl ObjectPath {
    pub fn new(path: impl Into<String>) -> Result<Self> {
        let path = path.into();
        names::validate_object_path(&path)?;
        Ok(Self(path))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for ObjectPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// A variant: a value together with its concrete type.
#[derive(Debug, Clone, PartialEq)]
pub struct Variant {
    ty: TypeDescriptor,
    value: Value,
}

impl Variant {
    /// Wrap a value whose type can be inferred.
    pub fn new(value: Value) -> Result<Self> {
        let ty = value.infer_type()?;
        check_variant_type(&ty)?;
        Ok(Self { ty, value })
    }

    /// Wrap a value with an explicit type (needed for empty arrays).
    pub fn with_type(ty: TypeDescriptor, value: Value) -> Result<Self> {
        check_variant_type(&ty)?;
        if !value.conforms_to(&ty) {
            return Err(Error::TypeMismatch(format!(
                "variant value does not conform to '{}'",
                ty
            )));
        }
        Ok(Self { ty, value })
    }

    pub(crate) fn from_parts(ty: TypeDescriptor, value: Value) -> Self {
        Self { ty, value }
    }

    pub fn type_descriptor(&self) -> &TypeDescriptor {
        &self.ty
    }

    pub fn value(&self) -> &Value {
        &self.value
    }

    pub fn into_value(self) -> Value {
        self.value
    }
}

/// A variant may only carry one complete, valid type: no bare dict entry, no
/// empty struct.
pub(crate) fn check_variant_type(ty: &TypeDescriptor) -> Result<()> {
    ty.validate()
        .map_err(|e| Error::TypeMismatch(format!("'{}' cannot be held by a variant: {}", ty, e)))
}

/// A boxed value of any D-Bus type.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Byte(u8),
    Boolean(bool),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    String(String),
    ObjectPath(ObjectPath),
    Signature(String),
    Array(Vec<Value>),
    Struct(Vec<Value>),
    DictEntry(Box<Value>, Box<Value>),
    Variant(Box<Variant>),
}

impl Value {
    /// Wrap a value into a variant, inferring its type.
    pub fn variant(value: Value) -> Result<Self> {
        Ok(Value::Variant(Box::new(Variant::new(value)?)))
    }

    /// Build a dictionary (`a{..}`) from key/value pairs.
    pub fn dict(entries: impl IntoIterator<Item = (Value, Value)>) -> Self {
        Value::Array(
            entries
                .into_iter()
                .map(|(k, v)| Value::DictEntry(Box::new(k), Box::new(v)))
                .collect(),
        )
    }

    /// Short name of the value's shape, for error messages.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Byte(_) => "byte",
            Value::Boolean(_) => "boolean",
            Value::Int16(_) => "int16",
            Value::UInt16(_) => "uint16",
            Value::Int32(_) => "int32",
            Value::UInt32(_) => "uint32",
            Value::Int64(_) => "int64",
            Value::UInt64(_) => "uint64",
            Value::Double(_) => "double",
            Value::String(_) => "string",
            Value::ObjectPath(_) => "object path",
            Value::Signature(_) => "signature",
            Value::Array(_) => "array",
            Value::Struct(_) => "struct",
            Value::DictEntry(..) => "dict entry",
            Value::Variant(_) => "variant",
        }
    }

    /// Infer the complete type of this value.
    ///
    /// Fails for empty arrays, whose element type cannot be recovered.
    pub fn infer_type(&self) -> Result<TypeDescriptor> {
        Ok(match self {
            Value::Byte(_) => TypeDescriptor::Byte,
            Value::Boolean(_) => TypeDescriptor::Boolean,
            Value::Int16(_) => TypeDescriptor::Int16,
            Value::UInt16(_) => TypeDescriptor::UInt16,
            Value::Int32(_) => TypeDescriptor::Int32,
            Value::UInt32(_) => TypeDescriptor::UInt32,
            Value::Int64(_) => TypeDescriptor::Int64,
            Value::UInt64(_) => TypeDescriptor::UInt64,
            Value::Double(_) => TypeDescriptor::Double,
            Value::String(_) => TypeDescriptor::String,
            Value::ObjectPath(_) => TypeDescriptor::ObjectPath,
            Value::Signature(_) => TypeDescriptor::Signature,
            Value::Variant(_) => TypeDescriptor::Variant,
            Value::Array(items) => {
                let first = items.first().ok_or_else(|| {
                    Error::TypeMismatch("cannot infer the element type of an empty array".into())
                })?;
                let element = first.infer_type()?;
                if let Some(bad) = items.iter().find(|item| !item.conforms_to(&element)) {
                    return Err(Error::TypeMismatch(format!(
                        "heterogeneous array: {} among '{}' elements",
                        bad.kind_name(),
                        element
                    )));
                }
                TypeDescriptor::array(element)
            }
            Value::Struct(fields) => TypeDescriptor::Struct(
                fields
                    .iter()
                    .map(Value::infer_type)
                    .collect::<Result<Vec<_>>>()?,
            ),
            Value::DictEntry(key, value) => {
                TypeDescriptor::DictEntry(Box::new(key.infer_type()?), Box::new(value.infer_type()?))
            }
        })
    }

    /// Shallow-to-deep shape check against a type descriptor.
    pub fn conforms_to(&self, ty: &TypeDescriptor) -> bool {
        match (self, ty) {
            (Value::Byte(_), TypeDescriptor::Byte)
            | (Value::Boolean(_), TypeDescriptor::Boolean)
            | (Value::Int16(_), TypeDescriptor::Int16)
            | (Value::UInt16(_), TypeDescriptor::UInt16)
            | (Value::Int32(_), TypeDescriptor::Int32)
            | (Value::UInt32(_), TypeDescriptor::UInt32)
            | (Value::Int64(_), TypeDescriptor::Int64)
            | (Value::UInt64(_), TypeDescriptor::UInt64)
            | (Value::Double(_), TypeDescriptor::Double)
            | (Value::String(_), TypeDescriptor::String)
            | (Value::ObjectPath(_), TypeDescriptor::ObjectPath)
            | (Value::Signature(_), TypeDescriptor::Signature)
            | (Value::Variant(_), TypeDescriptor::Variant) => true,
            (Value::Array(items), TypeDescriptor::Array(elem)) => {
                items.iter().all(|item| item.conforms_to(elem))
            }
            (Value::Struct(fields), TypeDescriptor::Struct(types)) => {
                fields.len() == types.len()
                    && fields.iter().zip(types).all(|(f, t)| f.conforms_to(t))
            }
            (Value::DictEntry(k, v), TypeDescriptor::DictEntry(kt, vt)) => {
                k.conforms_to(kt) && v.conforms_to(vt)
            }
            _ => false,
        }
    }

    /// String content of `s`, `o` and `g` values.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) | Value::Signature(s) => Some(s),
            Value::ObjectPath(p) => Some(p.as_str()),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Boolean(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_u32(&self) -> Option<u32> {
        match self {
            Value::UInt32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Value::Int32(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Int64(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Double(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&[Value]> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_struct(&self) -> Option<&[Value]> {
        match self {
            Value::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    pub fn as_variant(&self) -> Option<&Variant> {
        match self {
            Value::Variant(v) => Some(v),
            _ => None,
        }
    }

    /// Look up a dictionary entry by key.
    pub fn dict_get(&self, key: &Value) -> Option<&Value> {
        self.as_array()?.iter().find_map(|entry| match entry {
            Value::DictEntry(k, v) if k.as_ref() == key => Some(v.as_ref()),
            _ => None,
        })
    }
}

// Conversion traits
impl From<u8> for Value {
    fn from(v: u8) -> Self {
        Self::Byte(v)
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Boolean(v)
    }
}

impl From<i16> for Value {
    fn from(v: i16) -> Self {
        Self::Int16(v)
    }
}

impl From<u16> for Value {
    fn from(v: u16) -> Self {
        Self::UInt16(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int32(v)
    }
}

impl From<u32> for Value {
    fn from(v: u32) -> Self {
        Self::UInt32(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int64(v)
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Self::UInt64(v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Double(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<ObjectPath> for Value {
    fn from(v: ObjectPath) -> Self {
        Self::ObjectPath(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::Array(v.into_iter().map(Into::into).collect())
    }
}

/// Native slot type of one argument in a native call signature.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NativeType {
    Byte,
    Boolean,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Double,
    /// Native string (`s`, `o` and `g` when unboxed).
    Str,
    /// Uniform [`Value`] carrier.
    Boxed,
}

impl NativeType {
    /// Slot type for a wire type. Containers and variants are boxed in both modes.
    pub fn for_type(ty: &TypeDescriptor, boxed: bool) -> Self {
        if boxed {
            return NativeType::Boxed;
        }
        match ty {
            TypeDescriptor::Byte => NativeType::Byte,
            TypeDescriptor::Boolean => NativeType::Boolean,
            TypeDescriptor::Int16 => NativeType::Int16,
            TypeDescriptor::UInt16 => NativeType::UInt16,
            TypeDescriptor::Int32 => NativeType::Int32,
            TypeDescriptor::UInt32 => NativeType::UInt32,
            TypeDescriptor::Int64 => NativeType::Int64,
            TypeDescriptor::UInt64 => NativeType::UInt64,
            TypeDescriptor::Double => NativeType::Double,
            TypeDescriptor::String | TypeDescriptor::ObjectPath | TypeDescriptor::Signature => {
                NativeType::Str
            }
            TypeDescriptor::Array(_)
            | TypeDescriptor::Struct(_)
            | TypeDescriptor::DictEntry(..)
            | TypeDescriptor::Variant => NativeType::Boxed,
        }
    }

    /// Rust spelling used in generated declarations.
    pub fn rust_name(self) -> &'static str {
        match self {
            NativeType::Byte => "u8",
            NativeType::Boolean => "bool",
            NativeType::Int16 => "i16",
            NativeType::UInt16 => "u16",
            NativeType::Int32 => "i32",
            NativeType::UInt32 => "u32",
            NativeType::Int64 => "i64",
            NativeType::UInt64 => "u64",
            NativeType::Double => "f64",
            NativeType::Str => "String",
            NativeType::Boxed => "Value",
        }
    }
}

impl fmt::Display for NativeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.rust_name())
    }
}

/// One argument slot of a native call.
#[derive(Debug, Clone, PartialEq)]
pub enum NativeValue {
    Byte(u8),
    Boolean(bool),
    Int16(i16),
    UInt16(u16),
    Int32(i32),
    UInt32(u32),
    Int64(i64),
    UInt64(u64),
    Double(f64),
    Str(String),
    Boxed(Value),
}

impl NativeValue {
    pub fn native_type(&self) -> NativeType {
        match self {
            NativeValue::Byte(_) => NativeType::Byte,
            NativeValue::Boolean(_) => NativeType::Boolean,
            NativeValue::Int16(_) => NativeType::Int16,
            NativeValue::UInt16(_) => NativeType::UInt16,
            NativeValue::Int32(_) => NativeType::Int32,
            NativeValue::UInt32(_) => NativeType::UInt32,
            NativeValue::Int64(_) => NativeType::Int64,
            NativeValue::UInt64(_) => NativeType::UInt64,
            NativeValue::Double(_) => NativeType::Double,
            NativeValue::Str(_) => NativeType::Str,
            NativeValue::Boxed(_) => NativeType::Boxed,
        }
    }

    pub fn is_boxed(&self) -> bool {
        matches!(self, NativeValue::Boxed(_))
    }

    /// Narrow a decoded value to the native slot type for `ty`.
    pub fn unbox(value: Value, ty: &TypeDescriptor) -> Result<Self> {
        Ok(match (value, ty) {
            (Value::Byte(v), TypeDescriptor::Byte) => NativeValue::Byte(v),
            (Value::Boolean(v), TypeDescriptor::Boolean) => NativeValue::Boolean(v),
            (Value::Int16(v), TypeDescriptor::Int16) => NativeValue::Int16(v),
            (Value::UInt16(v), TypeDescriptor::UInt16) => NativeValue::UInt16(v),
            (Value::Int32(v), TypeDescriptor::Int32) => NativeValue::Int32(v),
            (Value::UInt32(v), TypeDescriptor::UInt32) => NativeValue::UInt32(v),
            (Value::Int64(v), TypeDescriptor::Int64) => NativeValue::Int64(v),
            (Value::UInt64(v), TypeDescriptor::UInt64) => NativeValue::UInt64(v),
            (Value::Double(v), TypeDescriptor::Double) => NativeValue::Double(v),
            (Value::String(s), TypeDescriptor::String)
            | (Value::Signature(s), TypeDescriptor::Signature) => NativeValue::Str(s),
            (Value::ObjectPath(p), TypeDescriptor::ObjectPath) => NativeValue::Str(p.into_string()),
            (value, ty) if ty.is_container() && value.conforms_to(ty) => NativeValue::Boxed(value),
            (value, ty) => {
                return Err(Error::TypeMismatch(format!(
                    "{} value for '{}' slot",
                    value.kind_name(),
                    ty
                )))
            }
        })
    }

    /// Widen a native slot back into a boxed value of type `ty`.
    pub fn into_value(self, ty: &TypeDescriptor) -> Result<Value> {
        let value = match (self, ty) {
            (NativeValue::Byte(v), TypeDescriptor::Byte) => Value::Byte(v),
            (NativeValue::Boolean(v), TypeDescriptor::Boolean) => Value::Boolean(v),
            (NativeValue::Int16(v), TypeDescriptor::Int16) => Value::Int16(v),
            (NativeValue::UInt16(v), TypeDescriptor::UInt16) => Value::UInt16(v),
            (NativeValue::Int32(v), TypeDescriptor::Int32) => Value::Int32(v),
            (NativeValue::UInt32(v), TypeDescriptor::UInt32) => Value::UInt32(v),
            (NativeValue::Int64(v), TypeDescriptor::Int64) => Value::Int64(v),
            (NativeValue::UInt64(v), TypeDescriptor::UInt64) => Value::UInt64(v),
            (NativeValue::Double(v), TypeDescriptor::Double) => Value::Double(v),
            (NativeValue::Str(s), TypeDescriptor::String) => Value::String(s),
            (NativeValue::Str(s), TypeDescriptor::Signature) => Value::Signature(s),
            (NativeValue::Str(s), TypeDescriptor::ObjectPath) => Value::ObjectPath(ObjectPath::new(s)?),
            (NativeValue::Boxed(v), ty) if v.conforms_to(ty) => v,
            (other, ty) => {
                return Err(Error::TypeMismatch(format!(
                    "native {} value for '{}' slot",
                    other.native_type(),
                    ty
                )))
            }
        };
        Ok(value)
    }

    /// Boxed view for callers that do not care about the slot mode.
    pub fn as_value(&self) -> Option<&Value> {
        match self {
            NativeValue::Boxed(v) => Some(v),
            _ => None,
        }
    }

    /// String content in either mode.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            NativeValue::Str(s) => Some(s),
            NativeValue::Boxed(v) => v.as_str(),
            _ => None,
        }
    }

    /// u32 content in either mode.
    pub fn as_u32(&self) -> Option<u32> {
        match self {
            NativeValue::UInt32(v) => Some(*v),
            NativeValue::Boxed(v) => v.as_u32(),
            _ => None,
        }
    }

    /// i32 content in either mode.
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            NativeValue::Int32(v) => Some(*v),
            NativeValue::Boxed(v) => v.as_i32(),
            _ => None,
        }
    }

    /// bool content in either mode.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            NativeValue::Boolean(v) => Some(*v),
            NativeValue::Boxed(v) => v.as_bool(),
            _ => None,
        }
    }
}

impl From<Value> for NativeValue {
    fn from(v: Value) -> Self {
        NativeValue::Boxed(v)
    }
}

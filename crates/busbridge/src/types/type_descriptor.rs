// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors for D-Bus wire types.

use crate::config::{MAX_ARRAY_DEPTH, MAX_SIGNATURE_LEN, MAX_STRUCT_DEPTH};
use crate::error::{Error, Result};
use std::fmt;
use std::str::FromStr;

/// Classification of a type descriptor node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Tag {
    Byte,
    Boolean,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Double,
    String,
    ObjectPath,
    Signature,
    Array,
    Struct,
    DictEntry,
    Variant,
}

impl Tag {
    /// Signature code of the tag (opening character for containers).
    pub fn code(self) -> char {
        match self {
            Tag::Byte => 'y',
            Tag::Boolean => 'b',
            Tag::Int16 => 'n',
            Tag::UInt16 => 'q',
            Tag::Int32 => 'i',
            Tag::UInt32 => 'u',
            Tag::Int64 => 'x',
            Tag::UInt64 => 't',
            Tag::Double => 'd',
            Tag::String => 's',
            Tag::ObjectPath => 'o',
            Tag::Signature => 'g',
            Tag::Array => 'a',
            Tag::Struct => '(',
            Tag::DictEntry => '{',
            Tag::Variant => 'v',
        }
    }
}

/// A complete D-Bus type.
///
/// `DictEntry` only appears as the element of an `Array`, and `Variant` has no
/// static sub-type: its concrete type travels with each value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Byte,
    Boolean,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Int64,
    UInt64,
    Double,
    String,
    ObjectPath,
    Signature,
    Array(Box<TypeDescriptor>),
    Struct(Vec<TypeDescriptor>),
    DictEntry(Box<TypeDescriptor>, Box<TypeDescriptor>),
    Variant,
}

impl TypeDescriptor {
    /// `a<element>`
    pub fn array(element: TypeDescriptor) -> Self {
        TypeDescriptor::Array(Box::new(element))
    }

    /// `a{<key><value>}`
    pub fn dict(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        TypeDescriptor::array(TypeDescriptor::DictEntry(Box::new(key), Box::new(value)))
    }

    /// `(<fields>)`
    pub fn structure(fields: Vec<TypeDescriptor>) -> Self {
        TypeDescriptor::Struct(fields)
    }

    /// Parse a signature holding exactly one complete type.
    pub fn parse_single(signature: &str) -> Result<Self> {
        let mut types = parse_signature(signature)?;
        if types.len() != 1 {
            return Err(Error::InvalidSignature(format!(
                "'{}' holds {} complete types, expected one",
                signature,
                types.len()
            )));
        }
        Ok(types.remove(0))
    }

    pub fn classify(&self) -> Tag {
        match self {
            TypeDescriptor::Byte => Tag::Byte,
            TypeDescriptor::Boolean => Tag::Boolean,
            TypeDescriptor::Int16 => Tag::Int16,
            TypeDescriptor::UInt16 => Tag::UInt16,
            TypeDescriptor::Int32 => Tag::Int32,
            TypeDescriptor::UInt32 => Tag::UInt32,
            TypeDescriptor::Int64 => Tag::Int64,
            TypeDescriptor::UInt64 => Tag::UInt64,
            TypeDescriptor::Double => Tag::Double,
            TypeDescriptor::String => Tag::String,
            TypeDescriptor::ObjectPath => Tag::ObjectPath,
            TypeDescriptor::Signature => Tag::Signature,
            TypeDescriptor::Array(_) => Tag::Array,
            TypeDescriptor::Struct(_) => Tag::Struct,
            TypeDescriptor::DictEntry(..) => Tag::DictEntry,
            TypeDescriptor::Variant => Tag::Variant,
        }
    }

    /// Arrays, structs, dict entries and variants.
    pub fn is_container(&self) -> bool {
        matches!(
            self.classify(),
            Tag::Array | Tag::Struct | Tag::DictEntry | Tag::Variant
        )
    }

    /// Fixed-size numeric types and the three string-like types.
    pub fn is_basic(&self) -> bool {
        !self.is_container()
    }

    /// `s`, `o` or `g`: the types argument filters can compare against.
    pub fn is_string_like(&self) -> bool {
        matches!(
            self,
            TypeDescriptor::String | TypeDescriptor::ObjectPath | TypeDescriptor::Signature
        )
    }

    /// Array of dict entries.
    pub fn is_dict(&self) -> bool {
        matches!(self, TypeDescriptor::Array(elem) if matches!(**elem, TypeDescriptor::DictEntry(..)))
    }

    /// Element type of an array.
    pub fn element_type(&self) -> Result<&TypeDescriptor> {
        match self {
            TypeDescriptor::Array(elem) => Ok(elem),
            other => Err(Error::TypeMismatch(format!(
                "element_type() on non-array type '{}'",
                other
            ))),
        }
    }

    /// Field types of a struct.
    pub fn field_types(&self) -> Result<&[TypeDescriptor]> {
        match self {
            TypeDescriptor::Struct(fields) => Ok(fields),
            other => Err(Error::TypeMismatch(format!(
                "field_types() on non-struct type '{}'",
                other
            ))),
        }
    }

    /// Key and value types of a dict entry.
    pub fn dict_entry_types(&self) -> Result<(&TypeDescriptor, &TypeDescriptor)> {
        match self {
            TypeDescriptor::DictEntry(key, value) => Ok((key, value)),
            other => Err(Error::TypeMismatch(format!(
                "dict_entry_types() on non-dict-entry type '{}'",
                other
            ))),
        }
    }

    /// Alignment of the first byte of a value of this type.
    pub fn wire_alignment(&self) -> usize {
        match self {
            TypeDescriptor::Byte | TypeDescriptor::Signature | TypeDescriptor::Variant => 1,
            TypeDescriptor::Int16 | TypeDescriptor::UInt16 => 2,
            TypeDescriptor::Boolean
            | TypeDescriptor::Int32
            | TypeDescriptor::UInt32
            | TypeDescriptor::String
            | TypeDescriptor::ObjectPath
            | TypeDescriptor::Array(_) => 4,
            TypeDescriptor::Int64
            | TypeDescriptor::UInt64
            | TypeDescriptor::Double
            | TypeDescriptor::Struct(_)
            | TypeDescriptor::DictEntry(..) => 8,
        }
    }

    /// Encoded size of fixed-size types (None for strings and containers).
    pub fn fixed_size(&self) -> Option<usize> {
        match self {
            TypeDescriptor::Byte => Some(1),
            TypeDescriptor::Int16 | TypeDescriptor::UInt16 => Some(2),
            TypeDescriptor::Boolean | TypeDescriptor::Int32 | TypeDescriptor::UInt32 => Some(4),
            TypeDescriptor::Int64 | TypeDescriptor::UInt64 | TypeDescriptor::Double => Some(8),
            _ => None,
        }
    }

    /// Minimum encoded size, starting from an aligned offset.
    pub fn wire_size_hint(&self) -> usize {
        if let Some(size) = self.fixed_size() {
            return size;
        }
        match self {
            TypeDescriptor::String | TypeDescriptor::ObjectPath => 5, // length + NUL
            TypeDescriptor::Signature => 2,                          // length + NUL
            TypeDescriptor::Array(_) => 4,                           // just the length
            TypeDescriptor::Variant => 4,                            // "y" signature + one byte
            TypeDescriptor::Struct(fields) => aligned_size(fields.iter()),
            TypeDescriptor::DictEntry(key, value) => {
                aligned_size([key.as_ref(), value.as_ref()].into_iter())
            }
            _ => 0,
        }
    }

    /// Signature string of this single complete type.
    pub fn signature(&self) -> String {
        self.to_string()
    }

    /// Check the structural invariants the parser enforces.
    pub fn validate(&self) -> Result<()> {
        let signature = self.signature();
        if signature.len() > MAX_SIGNATURE_LEN {
            return Err(Error::InvalidSignature(format!(
                "signature longer than {} bytes",
                MAX_SIGNATURE_LEN
            )));
        }
        parse_signature(&signature).map(|_| ())
    }
}

fn aligned_size<'a>(fields: impl Iterator<Item = &'a TypeDescriptor>) -> usize {
    let mut size = 0;
    for field in fields {
        let align = field.wire_alignment();
        size = (size + align - 1) & !(align - 1);
        size += field.wire_size_hint();
    }
    size
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeDescriptor::Array(elem) => write!(f, "a{}", elem),
            TypeDescriptor::Struct(fields) => {
                write!(f, "(")?;
                for field in fields {
                    write!(f, "{}", field)?;
                }
                write!(f, ")")
            }
            TypeDescriptor::DictEntry(key, value) => write!(f, "{{{}{}}}", key, value),
            other => write!(f, "{}", other.classify().code()),
        }
    }
}

impl FromStr for TypeDescriptor {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        TypeDescriptor::parse_single(s)
    }
}

/// Render a sequence of types as one signature string.
pub fn signature_of<'a>(types: impl IntoIterator<Item = &'a TypeDescriptor>) -> String {
    types.into_iter().map(TypeDescriptor::signature).collect()
}

/// Parse a signature string into its complete types.
pub fn parse_signature(signature: &str) -> Result<Vec<TypeDescriptor>> {
    if signature.len() > MAX_SIGNATURE_LEN {
        return Err(Error::InvalidSignature(format!(
            "signature longer than {} bytes",
            MAX_SIGNATURE_LEN
        )));
    }
    let mut parser = Parser {
        signature,
        bytes: signature.as_bytes(),
        pos: 0,
    };
    let mut types = Vec::new();
    while parser.pos < parser.bytes.len() {
        types.push(parser.complete_type(0, 0, false)?);
    }
    Ok(types)
}

struct Parser<'a> {
    signature: &'a str,
    bytes: &'a [u8],
    pos: usize,
}

impl Parser<'_> {
    fn error(&self, reason: &str) -> Error {
        Error::InvalidSignature(format!(
            "'{}' at position {}: {}",
            self.signature, self.pos, reason
        ))
    }

    fn next(&mut self) -> Result<u8> {
        let byte = *self
            .bytes
            .get(self.pos)
            .ok_or_else(|| self.error("unexpected end of signature"))?;
        self.pos += 1;
        Ok(byte)
    }

    fn complete_type(
        &mut self,
        array_depth: usize,
        struct_depth: usize,
        in_array: bool,
    ) -> Result<TypeDescriptor> {
        let code = self.next()?;
        let ty = match code {
            b'y' => TypeDescriptor::Byte,
            b'b' => TypeDescriptor::Boolean,
            b'n' => TypeDescriptor::Int16,
            b'q' => TypeDescriptor::UInt16,
            b'i' => TypeDescriptor::Int32,
            b'u' => TypeDescriptor::UInt32,
            b'x' => TypeDescriptor::Int64,
            b't' => TypeDescriptor::UInt64,
            b'd' => TypeDescriptor::Double,
            b's' => TypeDescriptor::String,
            b'o' => TypeDescriptor::ObjectPath,
            b'g' => TypeDescriptor::Signature,
            b'v' => TypeDescriptor::Variant,
            b'a' => {
                if array_depth >= MAX_ARRAY_DEPTH {
                    return Err(self.error("array nesting too deep"));
                }
                TypeDescriptor::array(self.complete_type(array_depth + 1, struct_depth, true)?)
            }
            b'(' => {
                if struct_depth >= MAX_STRUCT_DEPTH {
                    return Err(self.error("struct nesting too deep"));
                }
                let mut fields = Vec::new();
                loop {
                    match self.bytes.get(self.pos) {
                        Some(b')') => {
                            self.pos += 1;
                            break;
                        }
                        Some(_) => {
                            fields.push(self.complete_type(array_depth, struct_depth + 1, false)?)
                        }
                        None => return Err(self.error("unterminated struct")),
                    }
                }
                if fields.is_empty() {
                    return Err(self.error("empty struct"));
                }
                TypeDescriptor::Struct(fields)
            }
            b'{' => {
                if !in_array {
                    return Err(self.error("dict entry outside of an array"));
                }
                if struct_depth >= MAX_STRUCT_DEPTH {
                    return Err(self.error("struct nesting too deep"));
                }
                let key = self.complete_type(array_depth, struct_depth + 1, false)?;
                if !key.is_basic() {
                    return Err(self.error("dict entry key must be a basic type"));
                }
                let value = self.complete_type(array_depth, struct_depth + 1, false)?;
                if self.next()? != b'}' {
                    return Err(self.error("dict entry must hold exactly two types"));
                }
                TypeDescriptor::DictEntry(Box::new(key), Box::new(value))
            }
            b'h' => return Err(self.error("unix fd passing is not supported")),
            _ => return Err(self.error("unknown type code")),
        };
        Ok(ty)
    }
}

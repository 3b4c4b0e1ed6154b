// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Typed, named argument of a remote member.

use crate::error::{Error, Result};
use crate::types::{codec, NativeType, NativeValue, TypeCache, TypeDescriptor};
use crate::wire::{WireReader, WireWriter};
use std::sync::Arc;

/// Direction of an argument as declared by introspection data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Direction {
    #[default]
    In,
    Out,
}

/// One argument of a call or signal: a complete type plus documentation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Argument {
    ty: Arc<TypeDescriptor>,
    name: Option<String>,
    direction: Direction,
}

impl Argument {
    /// Create an argument from an already shared descriptor.
    pub fn new(ty: Arc<TypeDescriptor>, name: Option<String>, direction: Direction) -> Result<Self> {
        ty.validate()?;
        Ok(Self {
            ty,
            name,
            direction,
        })
    }

    /// Create an argument from a single-type signature.
    pub fn parse(signature: &str, name: Option<&str>, direction: Direction) -> Result<Self> {
        let ty = TypeDescriptor::parse_single(signature)?;
        Ok(Self {
            ty: Arc::new(ty),
            name: name.map(str::to_owned),
            direction,
        })
    }

    /// Same as [`Argument::parse`], sharing the descriptor through `cache`.
    pub fn parse_cached(
        cache: &TypeCache,
        signature: &str,
        name: Option<&str>,
        direction: Direction,
    ) -> Result<Self> {
        Ok(Self {
            ty: cache.intern(signature)?,
            name: name.map(str::to_owned),
            direction,
        })
    }

    pub fn type_descriptor(&self) -> &TypeDescriptor {
        &self.ty
    }

    pub fn shared_type(&self) -> &Arc<TypeDescriptor> {
        &self.ty
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn signature(&self) -> String {
        self.ty.signature()
    }

    pub(crate) fn with_direction(mut self, direction: Direction) -> Self {
        self.direction = direction;
        self
    }

    /// Native slot type of this argument.
    pub fn native_type(&self, boxed: bool) -> NativeType {
        NativeType::for_type(&self.ty, boxed)
    }

    /// Read exactly one value, returned boxed or in the narrowest native form.
    pub fn read_value(&self, reader: &mut WireReader<'_>, boxed: bool) -> Result<NativeValue> {
        let value = codec::decode_value(reader, &self.ty)?;
        if boxed {
            Ok(NativeValue::Boxed(value))
        } else {
            NativeValue::unbox(value, &self.ty)
        }
    }

    /// Write exactly one value.
    ///
    /// With `boxed` set the slot must carry a [`NativeValue::Boxed`]; otherwise
    /// it must carry the native type derived from the descriptor.
    pub fn write_value(
        &self,
        writer: &mut WireWriter,
        value: &NativeValue,
        boxed: bool,
    ) -> Result<()> {
        let expected = self.native_type(boxed);
        if value.native_type() != expected {
            return Err(Error::TypeMismatch(format!(
                "argument '{}' of type '{}' expects a {} slot, found {}",
                self.name.as_deref().unwrap_or("_"),
                self.ty,
                expected,
                value.native_type()
            )));
        }
        let value = value.clone().into_value(&self.ty)?;
        codec::encode_value(writer, &self.ty, &value)
    }
}

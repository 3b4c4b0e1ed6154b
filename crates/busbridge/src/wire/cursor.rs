// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Read/write cursors for D-Bus message bodies.
//!
//! Offsets are relative to the start of the body. A body always starts on an
//! 8-byte boundary inside a frame, so body-relative alignment equals
//! frame-relative alignment.

use super::Endianness;
use crate::error::{Error, Result};

/// Generate endian-aware read methods for primitive types.
///
/// Each generated method:
/// 1. Checks buffer bounds (returns `MalformedWireData` if truncated)
/// 2. Reads N bytes from buffer
/// 3. Converts bytes according to the cursor's byte order
/// 4. Advances offset
macro_rules! impl_read {
    ($name:ident, $type:ty, $size:expr) => {
        pub fn $name(&mut self) -> Result<$type> {
            let mut bytes = [0u8; $size];
            bytes.copy_from_slice(self.read_bytes($size)?);
            Ok(match self.endianness {
                Endianness::Little => <$type>::from_le_bytes(bytes),
                Endianness::Big => <$type>::from_be_bytes(bytes),
            })
        }
    };
}

/// Generate endian-aware write methods for primitive types.
macro_rules! impl_write {
    ($name:ident, $type:ty) => {
        pub fn $name(&mut self, value: $type) {
            match self.endianness {
                Endianness::Little => self.buffer.extend_from_slice(&value.to_le_bytes()),
                Endianness::Big => self.buffer.extend_from_slice(&value.to_be_bytes()),
            }
        }
    };
}

/// Immutable cursor for reading a body (bounds-checked, zero-copy).
pub struct WireReader<'a> {
    buffer: &'a [u8],
    offset: usize,
    endianness: Endianness,
}

impl<'a> WireReader<'a> {
    pub fn new(buffer: &'a [u8], endianness: Endianness) -> Self {
        Self {
            buffer,
            offset: 0,
            endianness,
        }
    }

    pub fn offset(&self) -> usize {
        self.offset
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.offset)
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    pub fn is_eof(&self) -> bool {
        self.offset >= self.buffer.len()
    }

    /// Skip padding up to `alignment`. Padding bytes must be zero.
    pub fn align(&mut self, alignment: usize) -> Result<()> {
        if alignment <= 1 {
            return Ok(());
        }
        let mask = alignment - 1;
        let target = (self.offset + mask) & !mask;
        if target > self.buffer.len() {
            return Err(Error::malformed(self.offset, "unexpected end of buffer"));
        }
        if self.buffer[self.offset..target].iter().any(|b| *b != 0) {
            return Err(Error::malformed(self.offset, "non-zero alignment padding"));
        }
        self.offset = target;
        Ok(())
    }

    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8]> {
        let end = self
            .offset
            .checked_add(len)
            .filter(|end| *end <= self.buffer.len())
            .ok_or_else(|| Error::malformed(self.offset, "unexpected end of buffer"))?;
        let slice = &self.buffer[self.offset..end];
        self.offset = end;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.read_bytes(1)?[0])
    }

    impl_read!(read_u16, u16, 2);
    impl_read!(read_i16, i16, 2);
    impl_read!(read_u32, u32, 4);
    impl_read!(read_i32, i32, 4);
    impl_read!(read_u64, u64, 8);
    impl_read!(read_i64, i64, 8);

    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_bits(self.read_u64()?))
    }

    /// Check that nothing but zero padding (less than 8 bytes) follows.
    pub fn finish(&self) -> Result<()> {
        let rest = &self.buffer[self.offset.min(self.buffer.len())..];
        if rest.len() >= 8 || rest.iter().any(|b| *b != 0) {
            return Err(Error::malformed(
                self.offset,
                format!("{} trailing bytes after last value", rest.len()),
            ));
        }
        Ok(())
    }
}

/// Growable cursor for writing a body.
#[derive(Debug, Default)]
pub struct WireWriter {
    buffer: Vec<u8>,
    endianness: Endianness,
}

impl WireWriter {
    pub fn new(endianness: Endianness) -> Self {
        Self {
            buffer: Vec::new(),
            endianness,
        }
    }

    pub fn with_capacity(endianness: Endianness, capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            endianness,
        }
    }

    pub fn offset(&self) -> usize {
        self.buffer.len()
    }

    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    /// Pad with zero bytes up to `alignment`.
    pub fn align(&mut self, alignment: usize) {
        if alignment <= 1 {
            return;
        }
        let padding = (alignment - (self.buffer.len() % alignment)) % alignment;
        self.buffer.extend(std::iter::repeat_n(0, padding));
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    impl_write!(write_u16, u16);
    impl_write!(write_i16, i16);
    impl_write!(write_u32, u32);
    impl_write!(write_i32, i32);
    impl_write!(write_u64, u64);
    impl_write!(write_i64, i64);

    pub fn write_f64(&mut self, value: f64) {
        self.write_u64(value.to_bits());
    }

    pub fn write_bytes(&mut self, data: &[u8]) {
        self.buffer.extend_from_slice(data);
    }

    /// Overwrite a previously written u32 (array length back-patching).
    pub fn patch_u32(&mut self, at: usize, value: u32) {
        let bytes = match self.endianness {
            Endianness::Little => value.to_le_bytes(),
            Endianness::Big => value.to_be_bytes(),
        };
        self.buffer[at..at + 4].copy_from_slice(&bytes);
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type system of the marshalling engine.
//!
//! - [`TypeDescriptor`]: one complete wire type, parsed from a signature string
//! - [`Value`]: the boxed carrier for any wire value
//! - [`NativeValue`]: one native call slot (primitive or boxed)
//! - [`codec`]: byte-exact encoding of values against descriptors
//! - [`TypeCache`]: shared descriptor trees for repeated signatures

pub mod codec;
mod cache;
mod type_descriptor;
mod value;

pub use cache::{LookupStats, TypeCache};
pub use type_descriptor::{parse_signature, signature_of, Tag, TypeDescriptor};
pub use value::{NativeType, NativeValue, ObjectPath, Value, Variant};

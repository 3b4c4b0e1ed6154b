// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Call and signal descriptors, and the native call they marshal.

mod argument;
mod descriptor;
mod native;
mod signal;

pub use argument::{Argument, Direction};
pub use descriptor::{CallDescriptor, ANNOTATION_DEPRECATED, ANNOTATION_NO_REPLY};
pub use native::{NativeCall, NativeSignature, PayloadKind};
pub use signal::SignalDescriptor;

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! # busbridge - typed D-Bus marshalling and signal dispatch
//!
//! Converts between D-Bus wire bodies and native call slots, driven by
//! descriptors of remote methods and signals, and routes incoming signals to
//! registered observers.
//!
//! ## Quick Start
//!
//! ```rust
//! use busbridge::{BridgeConfig, DispatchRegistry, MemoryTransport, SignalDescriptor, UserInfo, Value};
//! use std::sync::atomic::{AtomicU32, Ordering};
//! use std::sync::Arc;
//!
//! # fn main() -> busbridge::Result<()> {
//! let transport = Arc::new(MemoryTransport::new(":1.42"));
//! let registry = DispatchRegistry::new(BridgeConfig::default(), transport.clone());
//!
//! let tick = SignalDescriptor::new("org.demo.Clock", "Tick")?.with_argument("u", Some("seconds"))?;
//! registry.register_signal(tick);
//!
//! let last = Arc::new(AtomicU32::new(0));
//! registry.add_signal_observer(
//!     &last,
//!     |last, n| last.store(n.argument(0).and_then(|a| a.as_u32()).unwrap_or(0), Ordering::Relaxed),
//!     "Tick",
//!     "org.demo.Clock",
//!     None,
//!     Vec::new(),
//! )?;
//!
//! let mut info = UserInfo::new();
//! info.insert("arg0".into(), Value::UInt32(42));
//! registry.post_signal("Tick", "org.demo.Clock", None, Some(&info))?;
//!
//! // Loop the posted frame back, as a bus daemon would.
//! for frame in transport.drain() {
//!     registry.dispatch(&frame)?;
//! }
//! assert_eq!(last.load(Ordering::Relaxed), 42);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------------+
//! |                        Dispatch Registry                            |
//! |   notification names | (sender, iface, member) tables | observers   |
//! +---------------------------------------------------------------------+
//! |                     Call / Signal Descriptors                       |
//! |   Argument lists | native signatures | marshal / unmarshal          |
//! +---------------------------------------------------------------------+
//! |                           Type System                               |
//! |   TypeDescriptor | Value / NativeValue | codec | TypeCache          |
//! +---------------------------------------------------------------------+
//! |                          Wire Layer                                 |
//! |   WireReader / WireWriter | names | WireMessage envelope           |
//! +---------------------------------------------------------------------+
//! ```
//!
//! ## Key Types
//!
//! | Type | Description |
//! |------|-------------|
//! | [`TypeDescriptor`] | One complete D-Bus type, parsed from a signature |
//! | [`Argument`] | Typed, named argument that reads and writes one value |
//! | [`CallDescriptor`] | Remote method: inputs, outputs, flags, marshalling |
//! | [`SignalDescriptor`] | Broadcast member with inputs only |
//! | [`DispatchRegistry`] | Routes incoming signals to observers, posts outgoing ones |

/// Marshalling and dispatch errors.
pub mod error;
/// Wire limits and runtime configuration.
pub mod config;
/// Wire cursors, names and frame envelopes.
pub mod wire;
/// Type descriptors, values and the body codec.
pub mod types;
/// Call and signal descriptors.
pub mod call;
/// Observer registry and transport interface.
pub mod dispatch;

pub use call::{Argument, CallDescriptor, Direction, NativeCall, NativeSignature, PayloadKind, SignalDescriptor};
pub use config::{BridgeConfig, BusType, ConfigError};
pub use dispatch::{
    ArgFilter, DispatchRegistry, MatchRule, MemoryTransport, MetricsSnapshot, Notification,
    Transport, UserInfo,
};
pub use error::{Error, Result};
pub use types::{NativeType, NativeValue, ObjectPath, TypeCache, TypeDescriptor, Value, Variant};
pub use wire::{Endianness, MessageKind, WireMessage};

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Signal descriptors: broadcast members with inputs only and no reply.

use super::{Argument, CallDescriptor, Direction, NativeCall, NativeSignature, PayloadKind};
use crate::config::CANONICAL_NAME_PREFIX;
use crate::error::Result;
use crate::types::TypeCache;
use crate::wire::WireMessage;
use std::fmt;

/// Typed description of one signal, keyed by `(interface, member)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SignalDescriptor {
    call: CallDescriptor,
}

impl SignalDescriptor {
    pub fn new(interface: impl Into<String>, member: impl Into<String>) -> Result<Self> {
        let mut call = CallDescriptor::new(interface, member)?;
        call.set_oneway(true);
        Ok(Self { call })
    }

    /// Build a descriptor from the signature of a frame seen on the wire.
    pub fn from_signature(
        interface: &str,
        member: &str,
        signature: &str,
        cache: &TypeCache,
    ) -> Result<Self> {
        let mut signal = Self::new(interface, member)?;
        for ty in cache.intern_all(signature)? {
            signal.add_argument(Argument::new(ty, None, Direction::In)?);
        }
        Ok(signal)
    }

    /// Append an argument. Signals only carry inputs, whatever the declared direction.
    pub fn add_argument(&mut self, argument: Argument) {
        self.call.add_argument(argument.with_direction(Direction::In));
    }

    /// Builder-style argument parsed from a single-type signature.
    pub fn with_argument(mut self, signature: &str, name: Option<&str>) -> Result<Self> {
        self.add_argument(Argument::parse(signature, name, Direction::In)?);
        Ok(self)
    }

    pub fn interface(&self) -> &str {
        self.call.interface()
    }

    pub fn member(&self) -> &str {
        self.call.member()
    }

    pub fn arguments(&self) -> &[Argument] {
        self.call.inputs()
    }

    pub fn is_deprecated(&self) -> bool {
        self.call.is_deprecated()
    }

    /// Apply an introspection annotation; `NoReply` is implied and ignored.
    pub fn apply_annotation(&mut self, name: &str, value: &str) -> bool {
        let known = self.call.apply_annotation(name, value);
        self.call.set_oneway(true);
        known
    }

    /// Wire signature of the payload.
    pub fn signature(&self) -> String {
        self.call.signature(PayloadKind::Call)
    }

    pub fn native_signature(&self, boxed: bool) -> NativeSignature {
        self.call.native_signature(boxed)
    }

    pub fn new_call(&self, boxed: bool) -> NativeCall {
        self.call.new_call(boxed)
    }

    pub fn unmarshal(&self, message: &WireMessage, call: &mut NativeCall) -> Result<()> {
        self.call.unmarshal(message, call, PayloadKind::Call)
    }

    pub fn marshal(&self, call: &NativeCall, message: &mut WireMessage) -> Result<()> {
        self.call.marshal(call, message, PayloadKind::Call)
    }

    /// Notification name bound automatically on registration.
    pub fn canonical_notification_name(&self) -> String {
        format!(
            "{}{}.{}",
            CANONICAL_NAME_PREFIX,
            self.interface(),
            self.member()
        )
    }

    /// The underlying call descriptor (no outputs, always oneway).
    pub fn as_call(&self) -> &CallDescriptor {
        &self.call
    }
}

impl fmt::Display for SignalDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}({})", self.interface(), self.member(), self.signature())
    }
}

// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Wire frame envelope exchanged with the transport collaborator.

use super::{Endianness, WireReader};

/// Kind of a wire frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    MethodCall,
    MethodReturn,
    Error,
    Signal,
}

/// One protocol message: addressing envelope plus a marshalled body.
///
/// Header encoding belongs to the transport; this type only carries the fields
/// the marshalling engine and the dispatch registry consult.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WireMessage {
    pub kind: MessageKind,
    /// Set when the sender does not expect a reply (oneway calls, all signals).
    pub no_reply_expected: bool,
    /// Unique or well-known name of the emitting connection.
    pub sender: Option<String>,
    pub destination: Option<String>,
    pub path: Option<String>,
    pub interface: String,
    pub member: String,
    /// Signature string of the body.
    pub signature: String,
    pub endianness: Endianness,
    pub body: Vec<u8>,
}

impl WireMessage {
    /// Create an empty frame of the given kind.
    pub fn new(kind: MessageKind, interface: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            kind,
            no_reply_expected: false,
            sender: None,
            destination: None,
            path: None,
            interface: interface.into(),
            member: member.into(),
            signature: String::new(),
            endianness: Endianness::Little,
            body: Vec::new(),
        }
    }

    /// Create an empty signal frame.
    pub fn signal(interface: impl Into<String>, member: impl Into<String>) -> Self {
        let mut msg = Self::new(MessageKind::Signal, interface, member);
        msg.no_reply_expected = true;
        msg
    }

    /// Create an empty method call frame.
    pub fn method_call(interface: impl Into<String>, member: impl Into<String>) -> Self {
        Self::new(MessageKind::MethodCall, interface, member)
    }

    /// Create an empty reply addressed back to the caller of `call`.
    pub fn method_return(call: &WireMessage) -> Self {
        let mut msg = Self::new(MessageKind::MethodReturn, &call.interface, &call.member);
        msg.destination = call.sender.clone();
        msg.endianness = call.endianness;
        msg
    }

    pub fn with_sender(mut self, sender: impl Into<String>) -> Self {
        self.sender = Some(sender.into());
        self
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = Some(path.into());
        self
    }

    pub fn with_endianness(mut self, endianness: Endianness) -> Self {
        self.endianness = endianness;
        self
    }

    /// Cursor over the body in the frame's byte order.
    pub fn body_reader(&self) -> WireReader<'_> {
        WireReader::new(&self.body, self.endianness)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signal_frame_defaults() {
        let msg = WireMessage::signal("org.demo.Clock", "Tick")
            .with_sender(":1.7")
            .with_path("/org/demo/Clock");
        assert_eq!(msg.kind, MessageKind::Signal);
        assert!(msg.no_reply_expected);
        assert_eq!(msg.sender.as_deref(), Some(":1.7"));
        assert_eq!(msg.path.as_deref(), Some("/org/demo/Clock"));
        assert!(msg.body.is_empty());
    }

    #[test]
    fn test_method_return_addresses_caller() {
        let call = WireMessage::method_call("org.demo.Clock", "Now")
            .with_sender(":1.9")
            .with_endianness(Endianness::Big);
        let reply = WireMessage::method_return(&call);
        assert_eq!(reply.kind, MessageKind::MethodReturn);
        assert_eq!(reply.destination.as_deref(), Some(":1.9"));
        assert_eq!(reply.endianness, Endianness::Big);
    }
}

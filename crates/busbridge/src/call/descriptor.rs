// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Call descriptors: the typed shape of one remote member.
//!
//! A [`CallDescriptor`] owns the ordered input and output [`Argument`]s of a
//! method and drives whole-payload marshalling in both directions:
//!
//! ```text
//! NativeCall.arguments ──marshal(Call)──► WireMessage (method call / signal)
//! NativeCall.results   ◄─unmarshal(Reply)─ WireMessage (method return)
//! ```
//!
//! Descriptors are built once (by introspection or by hand), then published
//! behind an `Arc` and never mutated again.

use super::{Argument, Direction, NativeCall, NativeSignature, PayloadKind};
use crate::config::MAX_MESSAGE_LEN;
use crate::error::{Error, Result};
use crate::types::{parse_signature, signature_of, NativeType};
use crate::wire::{names, Endianness, MessageKind, WireMessage, WireWriter};
use std::fmt;

/// Annotation marking a method whose caller never waits for a reply.
pub const ANNOTATION_NO_REPLY: &str = "org.freedesktop.DBus.Method.NoReply";

/// Annotation marking a deprecated member.
pub const ANNOTATION_DEPRECATED: &str = "org.freedesktop.DBus.Deprecated";

/// Typed description of one remote method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CallDescriptor {
    interface: String,
    member: String,
    inputs: Vec<Argument>,
    outputs: Vec<Argument>,
    oneway: bool,
    deprecated: bool,
}

impl CallDescriptor {
    /// Create a descriptor without arguments.
    pub fn new(interface: impl Into<String>, member: impl Into<String>) -> Result<Self> {
        let interface = interface.into();
        let member = member.into();
        names::validate_interface_name(&interface)?;
        names::validate_member_name(&member)?;
        Ok(Self {
            interface,
            member,
            inputs: Vec::new(),
            outputs: Vec::new(),
            oneway: false,
            deprecated: false,
        })
    }

    /// Append an argument to the list selected by its direction.
    pub fn add_argument(&mut self, argument: Argument) {
        match argument.direction() {
            Direction::In => self.inputs.push(argument),
            Direction::Out => self.outputs.push(argument),
        }
    }

    /// Builder-style [`CallDescriptor::add_argument`].
    pub fn with_argument(mut self, argument: Argument) -> Self {
        self.add_argument(argument);
        self
    }

    /// Append an input argument parsed from a single-type signature.
    pub fn with_input(self, signature: &str, name: Option<&str>) -> Result<Self> {
        Ok(self.with_argument(Argument::parse(signature, name, Direction::In)?))
    }

    /// Append an output argument parsed from a single-type signature.
    pub fn with_output(self, signature: &str, name: Option<&str>) -> Result<Self> {
        Ok(self.with_argument(Argument::parse(signature, name, Direction::Out)?))
    }

    pub fn set_oneway(&mut self, oneway: bool) {
        self.oneway = oneway;
    }

    pub fn set_deprecated(&mut self, deprecated: bool) {
        self.deprecated = deprecated;
    }

    /// Apply an introspection annotation. Returns `false` for unknown names.
    pub fn apply_annotation(&mut self, name: &str, value: &str) -> bool {
        let enabled = value.eq_ignore_ascii_case("true");
        match name {
            ANNOTATION_NO_REPLY => self.oneway = enabled,
            ANNOTATION_DEPRECATED => self.deprecated = enabled,
            _ => return false,
        }
        true
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    pub fn inputs(&self) -> &[Argument] {
        &self.inputs
    }

    pub fn outputs(&self) -> &[Argument] {
        &self.outputs
    }

    pub fn is_oneway(&self) -> bool {
        self.oneway
    }

    pub fn is_deprecated(&self) -> bool {
        self.deprecated
    }

    /// Arguments carried by one half of the call.
    pub fn arguments(&self, kind: PayloadKind) -> &[Argument] {
        match kind {
            PayloadKind::Call => &self.inputs,
            PayloadKind::Reply => &self.outputs,
        }
    }

    /// Argument lookup: `index >= 0` addresses inputs, `-1` the first output,
    /// `-2` the second, and so on.
    pub fn argument_at(&self, index: isize) -> Option<&Argument> {
        if index >= 0 {
            self.inputs.get(index.unsigned_abs())
        } else {
            self.outputs.get(index.unsigned_abs() - 1)
        }
    }

    /// Wire signature of one half of the call.
    pub fn signature(&self, kind: PayloadKind) -> String {
        signature_of(self.arguments(kind).iter().map(Argument::type_descriptor))
    }

    /// Native call signature, every slot boxed or each slot as narrow as possible.
    pub fn native_signature(&self, boxed: bool) -> NativeSignature {
        NativeSignature::new(
            self.inputs.iter().map(|a| a.native_type(boxed)).collect(),
            self.outputs.iter().map(|a| a.native_type(boxed)).collect(),
        )
    }

    /// Structural comparison against a candidate native signature.
    pub fn matches(&self, candidate: &NativeSignature, boxed: bool) -> bool {
        *candidate == self.native_signature(boxed)
    }

    /// True if the candidate matches in either mode.
    pub fn is_valid_for(&self, candidate: &NativeSignature) -> bool {
        self.matches(candidate, true) || self.matches(candidate, false)
    }

    /// [`CallDescriptor::is_valid_for`] reported as a `TypeMismatch`.
    pub fn validate_signature(&self, candidate: &NativeSignature) -> Result<()> {
        if self.is_valid_for(candidate) {
            return Ok(());
        }
        Err(Error::TypeMismatch(format!(
            "{} expects {} or {}, found {}",
            self,
            self.native_signature(false),
            self.native_signature(true),
            candidate
        )))
    }

    /// Empty native call typed for this descriptor.
    pub fn new_call(&self, boxed: bool) -> NativeCall {
        NativeCall::new(self.native_signature(boxed))
    }

    /// Decode one half of the call from `message` into `call`.
    ///
    /// Each slot is decoded in the mode `call.signature` asks for. On error
    /// `call` is left untouched.
    pub fn unmarshal(
        &self,
        message: &WireMessage,
        call: &mut NativeCall,
        kind: PayloadKind,
    ) -> Result<()> {
        let arguments = self.arguments(kind);
        let found = parse_signature(&message.signature)
            .map_err(|e| Error::malformed(0, format!("frame signature: {}", e)))?;
        if found.len() != arguments.len() {
            return Err(Error::ArgumentCountMismatch {
                expected: arguments.len(),
                found: found.len(),
            });
        }
        if let Some((index, (arg, ty))) = arguments
            .iter()
            .zip(&found)
            .enumerate()
            .find(|(_, (arg, ty))| arg.type_descriptor() != *ty)
        {
            return Err(Error::TypeMismatch(format!(
                "{} argument {} is '{}', frame carries '{}'",
                self,
                index,
                arg.type_descriptor(),
                ty
            )));
        }

        let modes = slot_modes(arguments, call.signature.slots(kind))?;
        let mut reader = message.body_reader();
        let mut values = Vec::with_capacity(arguments.len());
        for (arg, boxed) in arguments.iter().zip(modes) {
            values.push(arg.read_value(&mut reader, boxed)?);
        }
        reader.finish()?;

        *call.values_mut(kind) = values;
        Ok(())
    }

    /// Encode one half of `call` into `message`, replacing its signature and body.
    ///
    /// Each slot is encoded in the mode its value carries.
    pub fn marshal(
        &self,
        call: &NativeCall,
        message: &mut WireMessage,
        kind: PayloadKind,
    ) -> Result<()> {
        let arguments = self.arguments(kind);
        let values = call.values(kind);
        if values.len() != arguments.len() {
            return Err(Error::ArgumentCountMismatch {
                expected: arguments.len(),
                found: values.len(),
            });
        }

        let mut writer = WireWriter::new(message.endianness);
        for (arg, value) in arguments.iter().zip(values) {
            arg.write_value(&mut writer, value, value.is_boxed())?;
        }
        if writer.offset() > MAX_MESSAGE_LEN {
            return Err(Error::EncodingOverflow(format!(
                "body of {} bytes exceeds the {} byte message limit",
                writer.offset(),
                MAX_MESSAGE_LEN
            )));
        }

        message.signature = self.signature(kind);
        message.body = writer.into_bytes();
        if kind == PayloadKind::Call && self.oneway {
            message.no_reply_expected = true;
        }
        Ok(())
    }

    /// Build a complete method call frame from the inputs of `call`.
    pub fn to_method_call(&self, call: &NativeCall, endianness: Endianness) -> Result<WireMessage> {
        let mut message = WireMessage::new(MessageKind::MethodCall, &self.interface, &self.member)
            .with_endianness(endianness);
        self.marshal(call, &mut message, PayloadKind::Call)?;
        Ok(message)
    }

    /// Call-target name: the member in snake_case.
    pub fn selector_string(&self) -> String {
        to_snake_case(&self.member)
    }

    /// Human-readable Rust declaration of the member.
    pub fn declaration_string(&self) -> String {
        let mut decl = String::new();
        if self.deprecated {
            decl.push_str("#[deprecated] ");
        }
        decl.push_str("fn ");
        decl.push_str(&self.selector_string());
        decl.push_str("(&self");
        for (i, arg) in self.inputs.iter().enumerate() {
            let name = arg
                .name()
                .map(|n| escape_keyword(to_snake_case(n)))
                .unwrap_or_else(|| format!("arg{}", i));
            decl.push_str(&format!(", {}: {}", name, arg.native_type(false)));
        }
        decl.push(')');
        match self.outputs.as_slice() {
            [] => {}
            [single] => decl.push_str(&format!(" -> {}", single.native_type(false))),
            many => {
                let types: Vec<String> = many
                    .iter()
                    .map(|a| a.native_type(false).to_string())
                    .collect();
                decl.push_str(&format!(" -> ({})", types.join(", ")));
            }
        }
        decl.push(';');
        decl
    }
}

impl fmt::Display for CallDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}({}) -> ({})",
            self.interface,
            self.member,
            self.signature(PayloadKind::Call),
            self.signature(PayloadKind::Reply)
        )
    }
}

/// Per-slot decode mode (`true` = boxed) requested by a native signature.
fn slot_modes(arguments: &[Argument], slots: &[NativeType]) -> Result<Vec<bool>> {
    if slots.len() != arguments.len() {
        return Err(Error::TypeMismatch(format!(
            "native call has {} slots, descriptor declares {} arguments",
            slots.len(),
            arguments.len()
        )));
    }
    arguments
        .iter()
        .zip(slots)
        .map(|(arg, slot)| {
            if *slot == NativeType::Boxed {
                Ok(true)
            } else if *slot == arg.native_type(false) {
                Ok(false)
            } else {
                Err(Error::TypeMismatch(format!(
                    "native slot {} cannot hold '{}'",
                    slot,
                    arg.type_descriptor()
                )))
            }
        })
        .collect()
}

fn to_snake_case(name: &str) -> String {
    let chars: Vec<char> = name.chars().collect();
    let mut out = String::with_capacity(name.len() + 4);
    for (i, c) in chars.iter().enumerate() {
        if c.is_ascii_uppercase() {
            let prev = i.checked_sub(1).map(|p| chars[p]);
            let next = chars.get(i + 1);
            let boundary = match prev {
                Some(p) if p.is_ascii_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_ascii_uppercase() => next.is_some_and(|n| n.is_ascii_lowercase()),
                _ => false,
            };
            if boundary && !out.ends_with('_') {
                out.push('_');
            }
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(*c);
        }
    }
    out
}

fn escape_keyword(name: String) -> String {
    const KEYWORDS: &[&str] = &[
        "as", "async", "await", "break", "const", "continue", "dyn", "else", "enum", "extern",
        "false", "fn", "for", "if", "impl", "in", "let", "loop", "match", "mod", "move", "mut",
        "pub", "ref", "return", "static", "struct", "trait", "true", "type", "unsafe", "use",
        "where", "while",
    ];
    if KEYWORDS.contains(&name.as_str()) {
        format!("r#{}", name)
    } else {
        name
    }
}

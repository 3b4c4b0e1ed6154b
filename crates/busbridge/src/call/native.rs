// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Native call representation: typed slot lists for inputs and outputs.

use crate::types::{NativeType, NativeValue};
use std::fmt;

/// Which half of a call a wire payload carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PayloadKind {
    /// Inputs, carried by a method call or a signal.
    Call,
    /// Outputs, carried by a method return.
    Reply,
}

/// Ordered native slot types of a call: inputs followed by outputs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct NativeSignature {
    pub inputs: Vec<NativeType>,
    pub outputs: Vec<NativeType>,
}

impl NativeSignature {
    pub fn new(inputs: Vec<NativeType>, outputs: Vec<NativeType>) -> Self {
        Self { inputs, outputs }
    }

    /// Slot types for one half of the call.
    pub fn slots(&self, kind: PayloadKind) -> &[NativeType] {
        match kind {
            PayloadKind::Call => &self.inputs,
            PayloadKind::Reply => &self.outputs,
        }
    }

    /// True when every slot is boxed.
    pub fn is_boxed(&self) -> bool {
        self.inputs
            .iter()
            .chain(&self.outputs)
            .all(|t| *t == NativeType::Boxed)
    }
}

impl fmt::Display for NativeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "(")?;
        for (i, t) in self.inputs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", t)?;
        }
        write!(f, ") -> (")?;
        for (i, t) in self.outputs.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", t)?;
        }
        write!(f, ")")
    }
}

/// A native call under construction or delivery.
///
/// `arguments` holds the inputs, `results` the outputs; each half is filled by
/// unmarshalling the matching [`PayloadKind`].
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NativeCall {
    pub signature: NativeSignature,
    pub arguments: Vec<NativeValue>,
    pub results: Vec<NativeValue>,
}

impl NativeCall {
    pub fn new(signature: NativeSignature) -> Self {
        Self {
            signature,
            arguments: Vec::new(),
            results: Vec::new(),
        }
    }

    /// Builder-style input push.
    pub fn with_argument(mut self, value: impl Into<NativeValue>) -> Self {
        self.arguments.push(value.into());
        self
    }

    /// Builder-style output push.
    pub fn with_result(mut self, value: impl Into<NativeValue>) -> Self {
        self.results.push(value.into());
        self
    }

    pub fn values(&self, kind: PayloadKind) -> &[NativeValue] {
        match kind {
            PayloadKind::Call => &self.arguments,
            PayloadKind::Reply => &self.results,
        }
    }

    pub(crate) fn values_mut(&mut self, kind: PayloadKind) -> &mut Vec<NativeValue> {
        match kind {
            PayloadKind::Call => &mut self.arguments,
            PayloadKind::Reply => &mut self.results,
        }
    }

    pub fn argument(&self, index: usize) -> Option<&NativeValue> {
        self.arguments.get(index)
    }
}

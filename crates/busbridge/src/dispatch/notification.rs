// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Notifications: the observer-facing view of a signal.

use crate::call::SignalDescriptor;
use crate::error::{Error, Result};
use crate::types::{NativeValue, TypeDescriptor, Value};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Signal arguments keyed `arg0`, `arg1`, ...
pub type UserInfo = BTreeMap<String, Value>;

/// One signal occurrence, as posted locally or delivered to an observer.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    name: String,
    interface: String,
    member: String,
    sender: Option<String>,
    object: Option<String>,
    arguments: Vec<NativeValue>,
    signal: Option<Arc<SignalDescriptor>>,
}

impl Notification {
    /// A notification to be resolved by name when posted.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            interface: String::new(),
            member: String::new(),
            sender: None,
            object: None,
            arguments: Vec::new(),
            signal: None,
        }
    }

    /// A notification for a decoded signal frame.
    pub(crate) fn delivered(
        name: String,
        signal: Arc<SignalDescriptor>,
        sender: Option<String>,
        object: Option<String>,
        arguments: Vec<NativeValue>,
    ) -> Self {
        Self {
            name,
            interface: signal.interface().to_string(),
            member: signal.member().to_string(),
            sender,
            object,
            arguments,
            signal: Some(signal),
        }
    }

    /// Object path the signal is emitted from.
    pub fn with_object(mut self, object: impl Into<String>) -> Self {
        self.object = Some(object.into());
        self
    }

    pub fn with_arguments(mut self, arguments: Vec<NativeValue>) -> Self {
        self.arguments = arguments;
        self
    }

    /// Replace the arguments with the `argN` entries of `info`.
    pub fn with_user_info(mut self, info: &UserInfo) -> Result<Self> {
        self.arguments = arguments_from_user_info(info)?
            .into_iter()
            .map(NativeValue::Boxed)
            .collect();
        Ok(self)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn interface(&self) -> &str {
        &self.interface
    }

    pub fn member(&self) -> &str {
        &self.member
    }

    /// Bus name of the emitting connection (delivered notifications only).
    pub fn sender(&self) -> Option<&str> {
        self.sender.as_deref()
    }

    pub fn object(&self) -> Option<&str> {
        self.object.as_deref()
    }

    pub fn arguments(&self) -> &[NativeValue] {
        &self.arguments
    }

    pub fn argument(&self, index: usize) -> Option<&NativeValue> {
        self.arguments.get(index)
    }

    pub fn signal(&self) -> Option<&Arc<SignalDescriptor>> {
        self.signal.as_ref()
    }

    /// Arguments as boxed values keyed `argN`.
    pub fn user_info(&self) -> UserInfo {
        self.arguments
            .iter()
            .enumerate()
            .map(|(i, arg)| {
                let ty = self
                    .signal
                    .as_ref()
                    .and_then(|s| s.arguments().get(i))
                    .map(|a| a.type_descriptor());
                (format!("arg{}", i), boxed(arg, ty))
            })
            .collect()
    }
}

/// Box a native slot, using the declared type to tell `s`, `o` and `g` apart.
fn boxed(value: &NativeValue, ty: Option<&TypeDescriptor>) -> Value {
    if let Some(Ok(v)) = ty.map(|ty| value.clone().into_value(ty)) {
        return v;
    }
    match value {
        NativeValue::Byte(v) => Value::Byte(*v),
        NativeValue::Boolean(v) => Value::Boolean(*v),
        NativeValue::Int16(v) => Value::Int16(*v),
        NativeValue::UInt16(v) => Value::UInt16(*v),
        NativeValue::Int32(v) => Value::Int32(*v),
        NativeValue::UInt32(v) => Value::UInt32(*v),
        NativeValue::Int64(v) => Value::Int64(*v),
        NativeValue::UInt64(v) => Value::UInt64(*v),
        NativeValue::Double(v) => Value::Double(*v),
        NativeValue::Str(s) => Value::String(s.clone()),
        NativeValue::Boxed(v) => v.clone(),
    }
}

/// Ordered argument values from `argN` keys.
///
/// Keys not of the form `argN` are ignored; the indices present must be
/// contiguous from zero.
pub fn arguments_from_user_info(info: &UserInfo) -> Result<Vec<Value>> {
    let mut indexed: Vec<(usize, &Value)> = info
        .iter()
        .filter_map(|(key, value)| {
            let index = key.strip_prefix("arg")?.parse::<usize>().ok()?;
            Some((index, value))
        })
        .collect();
    indexed.sort_by_key(|(index, _)| *index);
    for (expected, (index, _)) in indexed.iter().enumerate() {
        if *index != expected {
            return Err(Error::TypeMismatch(format!(
                "user info skips arg{}",
                expected
            )));
        }
    }
    Ok(indexed.into_iter().map(|(_, v)| v.clone()).collect())
}

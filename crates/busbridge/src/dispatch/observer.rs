// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Observer registrations and delivery targets.

use super::{MatchRule, Notification};
use crate::types::NativeValue;
use std::sync::{Arc, Weak};

/// Exact string match on one decoded signal argument.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArgFilter {
    pub index: usize,
    pub value: String,
}

impl ArgFilter {
    pub fn new(index: usize, value: impl Into<String>) -> Self {
        Self {
            index,
            value: value.into(),
        }
    }

    /// True if argument `index` is string-like and equal to `value`.
    pub fn matches(&self, arguments: &[NativeValue]) -> bool {
        arguments
            .get(self.index)
            .and_then(NativeValue::as_str)
            .is_some_and(|s| s == self.value)
    }
}

/// Identity of an observer: the address of its shared allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObserverId(usize);

impl ObserverId {
    pub fn of<O: ?Sized>(observer: &Arc<O>) -> Self {
        Self(Arc::as_ptr(observer) as *const () as usize)
    }
}

/// Outcome of one delivery attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    Delivered,
    /// The observer has been dropped; the registration can be pruned.
    Stale,
}

/// Something a registration can deliver notifications to.
///
/// # Panics
/// If `deliver` panics, the registry catches it (unless panic isolation is
/// disabled) and continues with the next registration.
pub trait DeliveryTarget: Send + Sync {
    fn deliver(&self, notification: &Notification) -> Delivery;
}

/// Callback bound to a non-owning observer reference.
pub struct WeakObserver<O, F> {
    observer: Weak<O>,
    callback: F,
}

impl<O, F> WeakObserver<O, F>
where
    O: Send + Sync,
    F: Fn(&O, &Notification) + Send + Sync,
{
    pub fn new(observer: &Arc<O>, callback: F) -> Self {
        Self {
            observer: Arc::downgrade(observer),
            callback,
        }
    }
}

impl<O, F> DeliveryTarget for WeakObserver<O, F>
where
    O: Send + Sync,
    F: Fn(&O, &Notification) + Send + Sync,
{
    fn deliver(&self, notification: &Notification) -> Delivery {
        match self.observer.upgrade() {
            Some(observer) => {
                (self.callback)(&observer, notification);
                Delivery::Delivered
            }
            None => Delivery::Stale,
        }
    }
}

/// One observer's interest in one signal.
#[derive(Clone)]
pub(crate) struct Registration {
    /// Registration order, used to merge buckets for delivery.
    pub seq: u64,
    pub observer: ObserverId,
    /// Name handed to the callback in [`Notification::name`].
    pub notification_name: String,
    pub sender: Option<String>,
    pub filters: Vec<ArgFilter>,
    pub target: Arc<dyn DeliveryTarget>,
}

impl Registration {
    pub fn accepts(&self, arguments: &[NativeValue]) -> bool {
        self.filters.iter().all(|f| f.matches(arguments))
    }

    pub fn match_rule(&self, interface: &str, member: &str) -> MatchRule {
        MatchRule::signal(interface, member)
            .with_sender(self.sender.clone())
            .with_args(self.filters.clone())
    }
}

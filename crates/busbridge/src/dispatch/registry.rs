// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Signal dispatch registry.
//!
//! Maps `(sender, interface, member)` to observer registrations, and
//! notification names to signal identities. One mutex guards all tables; it is
//! held for table manipulation and for taking a snapshot of the matching
//! registrations, never while unmarshalling or invoking callbacks, so a
//! callback may re-enter the registry.
//!
//! ```text
//! transport read loop ──► dispatch(frame)
//!                          ├─ lock: snapshot sender bucket + any-sender bucket
//!                          ├─ unlock, unmarshal once
//!                          ├─ filters → deliver (panic isolated)
//!                          └─ lock: prune registrations of dropped observers
//! ```

use super::notification::arguments_from_user_info;
use super::observer::{Delivery, DeliveryTarget, ObserverId, Registration, WeakObserver};
use super::{ArgFilter, MatchRule, Notification, Transport, UserInfo};
use crate::call::{NativeCall, SignalDescriptor};
use crate::config::{BridgeConfig, ConfigError, MAX_MATCH_ARGS};
use crate::error::{Error, Result};
use crate::types::{NativeValue, TypeCache, TypeDescriptor};
use crate::wire::{names, MessageKind, WireMessage};
use arc_swap::ArcSwap;
use parking_lot::Mutex;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// `(interface, member)`
type SignalKey = (String, String);

// ============================================================================
// Metrics
// ============================================================================

/// Dispatch counters, updated without taking the registry lock.
#[derive(Debug, Default)]
pub struct DispatchMetrics {
    pub frames_dispatched: AtomicU64,
    /// Signal frames no registration was interested in.
    pub frames_unmatched: AtomicU64,
    pub deliveries: AtomicU64,
    pub malformed_frames: AtomicU64,
    pub observer_panics: AtomicU64,
    pub stale_pruned: AtomicU64,
    pub frames_posted: AtomicU64,
    /// Registrations whose filters turned out not to fit the signal once its
    /// descriptor was published.
    pub unmatchable_filters: AtomicU64,
}

/// Point-in-time copy of [`DispatchMetrics`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub frames_dispatched: u64,
    pub frames_unmatched: u64,
    pub deliveries: u64,
    pub malformed_frames: u64,
    pub observer_panics: u64,
    pub stale_pruned: u64,
    pub frames_posted: u64,
    pub unmatchable_filters: u64,
}

impl DispatchMetrics {
    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            frames_dispatched: self.frames_dispatched.load(Ordering::Relaxed),
            frames_unmatched: self.frames_unmatched.load(Ordering::Relaxed),
            deliveries: self.deliveries.load(Ordering::Relaxed),
            malformed_frames: self.malformed_frames.load(Ordering::Relaxed),
            observer_panics: self.observer_panics.load(Ordering::Relaxed),
            stale_pruned: self.stale_pruned.load(Ordering::Relaxed),
            frames_posted: self.frames_posted.load(Ordering::Relaxed),
            unmatchable_filters: self.unmatchable_filters.load(Ordering::Relaxed),
        }
    }
}

// ============================================================================
// Registry
// ============================================================================

#[derive(Default)]
struct RegistryState {
    /// sender (None = any) -> signal -> registrations in registration order
    dispatch_tables: HashMap<Option<String>, HashMap<SignalKey, Vec<Registration>>>,
    /// notification name -> signal
    signal_info: HashMap<String, SignalKey>,
    /// published signal descriptors
    signals: HashMap<SignalKey, Arc<SignalDescriptor>>,
    next_seq: u64,
}

impl RegistryState {
    /// Remove every registration accepted by `pred`, returning the match
    /// rules to withdraw.
    fn remove_where(
        &mut self,
        mut pred: impl FnMut(&SignalKey, &Registration) -> bool,
    ) -> Vec<MatchRule> {
        let mut removed = Vec::new();
        for table in self.dispatch_tables.values_mut() {
            for (key, registrations) in table.iter_mut() {
                registrations.retain(|reg| {
                    if pred(key, reg) {
                        removed.push(reg.match_rule(&key.0, &key.1));
                        false
                    } else {
                        true
                    }
                });
            }
            table.retain(|_, registrations| !registrations.is_empty());
        }
        self.dispatch_tables.retain(|_, table| !table.is_empty());
        removed
    }

    fn registration_count(&self) -> usize {
        self.dispatch_tables
            .values()
            .flat_map(HashMap::values)
            .map(Vec::len)
            .sum()
    }
}

/// Routes incoming signal frames to observers and posts local events out.
pub struct DispatchRegistry {
    config: ArcSwap<BridgeConfig>,
    transport: Arc<dyn Transport>,
    state: Mutex<RegistryState>,
    type_cache: TypeCache,
    metrics: DispatchMetrics,
}

impl DispatchRegistry {
    pub fn new(config: BridgeConfig, transport: Arc<dyn Transport>) -> Self {
        log::debug!(
            "[registry] created for {:?} bus (boxed delivery: {})",
            config.bus_type,
            config.deliver_boxed
        );
        Self {
            type_cache: TypeCache::new(config.type_cache_capacity),
            config: ArcSwap::from_pointee(config),
            transport,
            state: Mutex::new(RegistryState::default()),
            metrics: DispatchMetrics::default(),
        }
    }

    /// Current configuration.
    pub fn config(&self) -> Arc<BridgeConfig> {
        self.config.load_full()
    }

    /// Replace the configuration; takes effect for the next frame.
    pub fn set_config(&self, config: BridgeConfig) -> std::result::Result<(), ConfigError> {
        config.validate()?;
        self.config.store(Arc::new(config));
        Ok(())
    }

    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    pub fn type_cache(&self) -> &TypeCache {
        &self.type_cache
    }

    /// Total number of live registrations.
    pub fn observer_count(&self) -> usize {
        self.state.lock().registration_count()
    }

    // ------------------------------------------------------------------------
    // Signals and notification names
    // ------------------------------------------------------------------------

    /// Publish a signal descriptor and bind its canonical notification name.
    ///
    /// The first descriptor registered for an `(interface, member)` wins.
    pub fn register_signal(&self, signal: SignalDescriptor) -> Arc<SignalDescriptor> {
        let key = (signal.interface().to_string(), signal.member().to_string());
        let canonical = signal.canonical_notification_name();
        let mut state = self.state.lock();
        let published = match state.signals.get(&key) {
            Some(existing) => {
                if **existing != signal {
                    log::debug!(
                        "[registry] keeping existing {} over {}",
                        existing,
                        signal
                    );
                }
                Arc::clone(existing)
            }
            None => {
                let signal = Arc::new(signal);
                log::debug!("[registry] register_signal {}", signal);
                state.signals.insert(key.clone(), Arc::clone(&signal));
                self.check_existing_filters(&state, &key, &signal);
                signal
            }
        };
        match state.signal_info.get(&canonical) {
            Some(bound) if *bound != key => log::debug!(
                "[registry] '{}' stays bound to {}.{}",
                canonical,
                bound.0,
                bound.1
            ),
            Some(_) => {}
            None => {
                state.signal_info.insert(canonical, key);
            }
        }
        published
    }

    /// Report registrations made before `signal` was known whose filters can
    /// never match it.
    fn check_existing_filters(
        &self,
        state: &RegistryState,
        key: &SignalKey,
        signal: &SignalDescriptor,
    ) {
        let registrations = state
            .dispatch_tables
            .values()
            .filter_map(|table| table.get(key))
            .flatten();
        for reg in registrations {
            if let Err(e) = validate_filters(Some(signal), key, &reg.filters) {
                log::warn!(
                    "[registry] observer of '{}' (seq {}) will never match: {}",
                    reg.notification_name,
                    reg.seq,
                    e
                );
                self.metrics
                    .unmatchable_filters
                    .fetch_add(1, Ordering::Relaxed);
            }
        }
    }

    /// Published descriptor for a signal, if any.
    pub fn signal(&self, signal: &str, interface: &str) -> Option<Arc<SignalDescriptor>> {
        self.state
            .lock()
            .signals
            .get(&(interface.to_string(), signal.to_string()))
            .cloned()
    }

    /// Bind a notification name to a signal.
    pub fn register_notification_name(
        &self,
        name: &str,
        signal: &str,
        interface: &str,
    ) -> Result<()> {
        names::validate_interface_name(interface)?;
        names::validate_member_name(signal)?;
        let key = (interface.to_string(), signal.to_string());
        let mut state = self.state.lock();
        match state.signal_info.get(name) {
            Some(existing) if *existing == key => Ok(()),
            Some(existing) => Err(Error::NotificationNameConflict {
                name: name.to_string(),
                existing_signal: existing.1.clone(),
                existing_interface: existing.0.clone(),
            }),
            None => {
                log::debug!(
                    "[registry] notification '{}' -> {}.{}",
                    name,
                    interface,
                    signal
                );
                state.signal_info.insert(name.to_string(), key);
                Ok(())
            }
        }
    }

    /// Signal `(member, interface)` bound to a notification name.
    pub fn resolve_notification_name(&self, name: &str) -> Result<(String, String)> {
        self.state
            .lock()
            .signal_info
            .get(name)
            .map(|(interface, member)| (member.clone(), interface.clone()))
            .ok_or_else(|| Error::UnknownNotificationName(name.to_string()))
    }

    // ------------------------------------------------------------------------
    // Registration
    // ------------------------------------------------------------------------

    /// Observe the signal bound to notification `name`.
    pub fn add_observer<O, F>(
        &self,
        observer: &Arc<O>,
        callback: F,
        name: &str,
        sender: Option<&str>,
    ) -> Result<()>
    where
        O: Send + Sync + 'static,
        F: Fn(&O, &Notification) + Send + Sync + 'static,
    {
        let (member, interface) = self.resolve_notification_name(name)?;
        self.register(
            ObserverId::of(observer),
            Arc::new(WeakObserver::new(observer, callback)),
            (interface, member),
            name.to_string(),
            sender,
            Vec::new(),
        )
    }

    /// Observe `interface.signal`, optionally restricted to one sender and to
    /// arguments equal to the given strings.
    pub fn add_signal_observer<O, F>(
        &self,
        observer: &Arc<O>,
        callback: F,
        signal: &str,
        interface: &str,
        sender: Option<&str>,
        filters: Vec<ArgFilter>,
    ) -> Result<()>
    where
        O: Send + Sync + 'static,
        F: Fn(&O, &Notification) + Send + Sync + 'static,
    {
        names::validate_interface_name(interface)?;
        names::validate_member_name(signal)?;
        let key = (interface.to_string(), signal.to_string());
        let name = format!(
            "{}{}.{}",
            crate::config::CANONICAL_NAME_PREFIX,
            interface,
            signal
        );
        self.register(
            ObserverId::of(observer),
            Arc::new(WeakObserver::new(observer, callback)),
            key,
            name,
            sender,
            filters,
        )
    }

    fn register(
        &self,
        observer: ObserverId,
        target: Arc<dyn DeliveryTarget>,
        key: SignalKey,
        notification_name: String,
        sender: Option<&str>,
        filters: Vec<ArgFilter>,
    ) -> Result<()> {
        if let Some(sender) = sender {
            names::validate_bus_name(sender)?;
        }
        let known = self.state.lock().signals.get(&key).cloned();
        validate_filters(known.as_deref(), &key, &filters)?;

        let mut registration = Registration {
            seq: 0,
            observer,
            notification_name,
            sender: sender.map(str::to_owned),
            filters,
            target,
        };
        self.transport
            .add_match(&registration.match_rule(&key.0, &key.1))?;

        let mut state = self.state.lock();
        registration.seq = state.next_seq;
        state.next_seq += 1;
        log::debug!(
            "[registry] add_observer {}.{} sender={} filters={} seq={}",
            key.0,
            key.1,
            registration.sender.as_deref().unwrap_or("*"),
            registration.filters.len(),
            registration.seq
        );
        state
            .dispatch_tables
            .entry(registration.sender.clone())
            .or_default()
            .entry(key)
            .or_default()
            .push(registration);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Removal
    // ------------------------------------------------------------------------

    /// Remove every registration of `observer`. Returns the number removed.
    pub fn remove_observer<O: ?Sized>(&self, observer: &Arc<O>) -> usize {
        let id = ObserverId::of(observer);
        self.remove_where(|_, reg| reg.observer == id)
    }

    /// Remove the registrations of `observer` for the signal bound to `name`.
    ///
    /// A `None` sender removes registrations for any sender.
    pub fn remove_observer_named<O: ?Sized>(
        &self,
        observer: &Arc<O>,
        name: &str,
        sender: Option<&str>,
    ) -> usize {
        let Ok((member, interface)) = self.resolve_notification_name(name) else {
            return 0;
        };
        self.remove_signal_observer(observer, Some(&member), Some(&interface), sender)
    }

    /// Remove the registrations of `observer` matching signal, interface and
    /// sender. `None` matches anything.
    pub fn remove_signal_observer<O: ?Sized>(
        &self,
        observer: &Arc<O>,
        signal: Option<&str>,
        interface: Option<&str>,
        sender: Option<&str>,
    ) -> usize {
        let id = ObserverId::of(observer);
        self.remove_where(|key, reg| {
            reg.observer == id
                && interface.map_or(true, |i| key.0 == i)
                && signal.map_or(true, |s| key.1 == s)
                && sender.map_or(true, |s| reg.sender.as_deref() == Some(s))
        })
    }

    fn remove_where(&self, pred: impl FnMut(&SignalKey, &Registration) -> bool) -> usize {
        let rules = self.state.lock().remove_where(pred);
        self.withdraw(&rules);
        rules.len()
    }

    fn withdraw(&self, rules: &[MatchRule]) {
        for rule in rules {
            if let Err(e) = self.transport.remove_match(rule) {
                log::warn!("[registry] failed to withdraw match rule {}: {}", rule, e);
            }
        }
    }

    // ------------------------------------------------------------------------
    // Posting
    // ------------------------------------------------------------------------

    /// Post a notification built by the caller; its name must be bound.
    pub fn post_notification(&self, notification: &Notification) -> Result<()> {
        let (member, interface) = self.resolve_notification_name(notification.name())?;
        self.post(
            (interface, member),
            notification.object(),
            notification.arguments().to_vec(),
        )
    }

    /// Post the signal bound to `name` with arguments from `user_info`.
    pub fn post_notification_name(
        &self,
        name: &str,
        object: Option<&str>,
        user_info: Option<&UserInfo>,
    ) -> Result<()> {
        let (member, interface) = self.resolve_notification_name(name)?;
        self.post((interface, member), object, boxed_arguments(user_info)?)
    }

    /// Post `interface.signal` with arguments from `user_info`.
    pub fn post_signal(
        &self,
        signal: &str,
        interface: &str,
        object: Option<&str>,
        user_info: Option<&UserInfo>,
    ) -> Result<()> {
        self.post(
            (interface.to_string(), signal.to_string()),
            object,
            boxed_arguments(user_info)?,
        )
    }

    fn post(&self, key: SignalKey, object: Option<&str>, arguments: Vec<NativeValue>) -> Result<()> {
        let known = self.state.lock().signals.get(&key).cloned();
        let signal = match known {
            Some(signal) => signal,
            None => Arc::new(infer_signal(&key, &arguments)?),
        };

        let config = self.config.load();
        let path = object.unwrap_or(&config.default_object_path);
        names::validate_object_path(path)?;

        let call = NativeCall {
            signature: signal.native_signature(true),
            arguments,
            results: Vec::new(),
        };
        let mut frame = WireMessage::signal(&key.0, &key.1)
            .with_path(path)
            .with_endianness(config.endianness);
        signal.marshal(&call, &mut frame)?;
        log::debug!(
            "[registry] post {} path={} ({} body bytes)",
            signal,
            path,
            frame.body.len()
        );
        self.transport.send(frame)?;
        self.metrics.frames_posted.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Dispatch (called by the transport read loop)
    // ------------------------------------------------------------------------

    /// Deliver an incoming frame to every interested observer.
    ///
    /// Returns the number of deliveries. Non-signal frames are ignored. A frame
    /// that fails to unmarshal is reported once and delivered to nobody.
    pub fn dispatch(&self, message: &WireMessage) -> Result<usize> {
        if message.kind != MessageKind::Signal {
            return Ok(0);
        }
        self.metrics.frames_dispatched.fetch_add(1, Ordering::Relaxed);

        let key = (message.interface.clone(), message.member.clone());
        let (mut registrations, known) = {
            let state = self.state.lock();
            let mut registrations: Vec<Registration> = Vec::new();
            if let Some(sender) = &message.sender {
                if let Some(regs) = state
                    .dispatch_tables
                    .get(&Some(sender.clone()))
                    .and_then(|table| table.get(&key))
                {
                    registrations.extend(regs.iter().cloned());
                }
            }
            if let Some(regs) = state
                .dispatch_tables
                .get(&None)
                .and_then(|table| table.get(&key))
            {
                registrations.extend(regs.iter().cloned());
            }
            (registrations, state.signals.get(&key).cloned())
        };
        if registrations.is_empty() {
            self.metrics.frames_unmatched.fetch_add(1, Ordering::Relaxed);
            return Ok(0);
        }
        registrations.sort_by_key(|reg| reg.seq);

        let config = self.config.load_full();
        let (signal, arguments) = match self.decode(message, known, config.deliver_boxed) {
            Ok(decoded) => decoded,
            Err(e) => {
                self.metrics.malformed_frames.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "[registry] dropping {}.{} from {}: {}",
                    key.0,
                    key.1,
                    message.sender.as_deref().unwrap_or("<unknown>"),
                    e
                );
                return Err(e);
            }
        };

        let mut delivered = 0;
        let mut stale = Vec::new();
        for reg in &registrations {
            if !reg.accepts(&arguments) {
                continue;
            }
            let notification = Notification::delivered(
                reg.notification_name.clone(),
                Arc::clone(&signal),
                message.sender.clone(),
                message.path.clone(),
                arguments.clone(),
            );
            match self.deliver(reg, &notification, config.isolate_observer_panics) {
                Some(Delivery::Delivered) => delivered += 1,
                Some(Delivery::Stale) => stale.push(reg.seq),
                None => {}
            }
        }

        if !stale.is_empty() {
            let rules = self
                .state
                .lock()
                .remove_where(|_, reg| stale.contains(&reg.seq));
            log::debug!("[registry] pruned {} stale registrations", rules.len());
            self.metrics
                .stale_pruned
                .fetch_add(rules.len() as u64, Ordering::Relaxed);
            self.withdraw(&rules);
        }

        self.metrics
            .deliveries
            .fetch_add(delivered as u64, Ordering::Relaxed);
        Ok(delivered)
    }

    fn decode(
        &self,
        message: &WireMessage,
        known: Option<Arc<SignalDescriptor>>,
        boxed: bool,
    ) -> Result<(Arc<SignalDescriptor>, Vec<NativeValue>)> {
        let signal = match known {
            Some(signal) => signal,
            None => Arc::new(SignalDescriptor::from_signature(
                &message.interface,
                &message.member,
                &message.signature,
                &self.type_cache,
            )?),
        };
        let mut call = signal.new_call(boxed);
        signal.unmarshal(message, &mut call)?;
        Ok((signal, call.arguments))
    }

    /// `None` when the callback panicked.
    fn deliver(
        &self,
        reg: &Registration,
        notification: &Notification,
        isolate: bool,
    ) -> Option<Delivery> {
        if !isolate {
            return Some(reg.target.deliver(notification));
        }
        let result = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            reg.target.deliver(notification)
        }));
        match result {
            Ok(delivery) => Some(delivery),
            Err(_) => {
                self.metrics.observer_panics.fetch_add(1, Ordering::Relaxed);
                log::warn!(
                    "[registry] observer of '{}' panicked during delivery (seq {})",
                    reg.notification_name,
                    reg.seq
                );
                None
            }
        }
    }
}

fn boxed_arguments(user_info: Option<&UserInfo>) -> Result<Vec<NativeValue>> {
    Ok(match user_info {
        Some(info) => arguments_from_user_info(info)?
            .into_iter()
            .map(NativeValue::Boxed)
            .collect(),
        None => Vec::new(),
    })
}

/// Filters must address string-like arguments of the signal, or stay within
/// the bus match-rule range when the signal is not known yet.
fn validate_filters(
    known: Option<&SignalDescriptor>,
    key: &SignalKey,
    filters: &[ArgFilter],
) -> Result<()> {
    for filter in filters {
        match known {
            Some(signal) => {
                let arg = signal.arguments().get(filter.index).ok_or_else(|| {
                    Error::InvalidFilter(format!(
                        "{}.{} has {} arguments, filter addresses arg{}",
                        key.0,
                        key.1,
                        signal.arguments().len(),
                        filter.index
                    ))
                })?;
                if !arg.type_descriptor().is_string_like() {
                    return Err(Error::InvalidFilter(format!(
                        "arg{} of {}.{} is '{}', filters compare strings",
                        filter.index,
                        key.0,
                        key.1,
                        arg.type_descriptor()
                    )));
                }
            }
            None if filter.index >= MAX_MATCH_ARGS => {
                return Err(Error::InvalidFilter(format!(
                    "arg{} is beyond the match rule limit of {}",
                    filter.index, MAX_MATCH_ARGS
                )));
            }
            None => {}
        }
    }
    Ok(())
}

/// Descriptor for a signal nobody registered, derived from the posted values.
fn infer_signal(key: &SignalKey, arguments: &[NativeValue]) -> Result<SignalDescriptor> {
    let mut signal = SignalDescriptor::new(&key.0, &key.1)?;
    for value in arguments {
        let ty = match value {
            NativeValue::Byte(_) => TypeDescriptor::Byte,
            NativeValue::Boolean(_) => TypeDescriptor::Boolean,
            NativeValue::Int16(_) => TypeDescriptor::Int16,
            NativeValue::UInt16(_) => TypeDescriptor::UInt16,
            NativeValue::Int32(_) => TypeDescriptor::Int32,
            NativeValue::UInt32(_) => TypeDescriptor::UInt32,
            NativeValue::Int64(_) => TypeDescriptor::Int64,
            NativeValue::UInt64(_) => TypeDescriptor::UInt64,
            NativeValue::Double(_) => TypeDescriptor::Double,
            NativeValue::Str(_) => TypeDescriptor::String,
            NativeValue::Boxed(v) => v.infer_type()?,
        };
        signal.add_argument(crate::call::Argument::new(
            Arc::new(ty),
            None,
            crate::call::Direction::In,
        )?);
    }
    Ok(signal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dispatch::MemoryTransport;
    use crate::types::Value;
    use std::sync::atomic::AtomicUsize;

    fn registry() -> (DispatchRegistry, Arc<MemoryTransport>) {
        let transport = Arc::new(MemoryTransport::new(":1.1"));
        let registry = DispatchRegistry::new(BridgeConfig::default(), transport.clone());
        (registry, transport)
    }

    fn tick_signal() -> SignalDescriptor {
        SignalDescriptor::new("org.demo.Clock", "Tick")
            .and_then(|s| s.with_argument("u", Some("seconds")))
            .expect("signal")
    }

    #[test]
    fn test_register_signal_first_wins() {
        let (registry, _) = registry();
        let first = registry.register_signal(tick_signal());
        let other = SignalDescriptor::new("org.demo.Clock", "Tick")
            .and_then(|s| s.with_argument("s", None))
            .expect("signal");
        let second = registry.register_signal(other);
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(
            registry
                .resolve_notification_name("signal:org.demo.Clock.Tick")
                .expect("canonical"),
            ("Tick".to_string(), "org.demo.Clock".to_string())
        );
    }

    #[test]
    fn test_notification_name_binding() {
        let (registry, _) = registry();
        registry
            .register_notification_name("ClockTicked", "Tick", "org.demo.Clock")
            .expect("bind");
        registry
            .register_notification_name("ClockTicked", "Tick", "org.demo.Clock")
            .expect("idempotent");
        let err = registry
            .register_notification_name("ClockTicked", "Tock", "org.demo.Clock")
            .unwrap_err();
        assert!(matches!(err, Error::NotificationNameConflict { .. }));
        assert!(matches!(
            registry.resolve_notification_name("Nope"),
            Err(Error::UnknownNotificationName(_))
        ));
    }

    #[test]
    fn test_add_observer_requires_known_name() {
        let (registry, _) = registry();
        let observer = Arc::new(());
        let err = registry
            .add_observer(&observer, |_, _| {}, "Unbound", None)
            .unwrap_err();
        assert!(matches!(err, Error::UnknownNotificationName(_)));
        assert_eq!(registry.observer_count(), 0);
    }

    #[test]
    fn test_filter_validation() {
        let (registry, _) = registry();
        let observer = Arc::new(());
        registry.register_signal(
            SignalDescriptor::new("org.demo.Bus", "NameOwnerChanged")
                .and_then(|s| s.with_argument("s", None))
                .and_then(|s| s.with_argument("u", None))
                .expect("signal"),
        );
        let add = |filters| {
            registry.add_signal_observer(
                &observer,
                |_, _| {},
                "NameOwnerChanged",
                "org.demo.Bus",
                None,
                filters,
            )
        };
        assert!(add(vec![ArgFilter::new(0, "org.demo")]).is_ok());
        assert!(matches!(
            add(vec![ArgFilter::new(2, "x")]),
            Err(Error::InvalidFilter(_))
        ));
        assert!(matches!(
            add(vec![ArgFilter::new(1, "x")]),
            Err(Error::InvalidFilter(_))
        ));

        // Unknown signal: only the match-rule range is checked.
        assert!(registry
            .add_signal_observer(&observer, |_, _| {}, "Other", "org.demo.Bus", None, vec![
                ArgFilter::new(63, "x")
            ])
            .is_ok());
        assert!(registry
            .add_signal_observer(&observer, |_, _| {}, "Other", "org.demo.Bus", None, vec![
                ArgFilter::new(64, "x")
            ])
            .is_err());
    }

    #[test]
    fn test_late_descriptor_reports_unmatchable_filters() {
        let (registry, _) = registry();
        let observer = Arc::new(());
        for filter in [ArgFilter::new(0, "x"), ArgFilter::new(5, "x")] {
            registry
                .add_signal_observer(&observer, |_, _| {}, "Tick", "org.demo.Clock", None, vec![filter])
                .expect("accepted while unknown");
        }
        assert_eq!(registry.metrics().unmatchable_filters, 0);

        // arg0 is 'u': both filters are now known to be unmatchable.
        registry.register_signal(tick_signal());
        assert_eq!(registry.metrics().unmatchable_filters, 2);

        // Re-registration is a no-op.
        registry.register_signal(tick_signal());
        assert_eq!(registry.metrics().unmatchable_filters, 2);
    }

    #[test]
    fn test_canonical_name_keeps_earlier_binding() {
        let (registry, _) = registry();
        registry
            .register_notification_name("signal:org.demo.Clock.Tick", "Tock", "org.demo.Clock")
            .expect("bind");
        registry.register_signal(tick_signal());
        assert_eq!(
            registry
                .resolve_notification_name("signal:org.demo.Clock.Tick")
                .expect("bound"),
            ("Tock".to_string(), "org.demo.Clock".to_string())
        );
    }

    #[test]
    fn test_registration_installs_and_removal_withdraws_match_rules() {
        let (registry, transport) = registry();
        let observer = Arc::new(());
        registry
            .add_signal_observer(&observer, |_, _| {}, "Tick", "org.demo.Clock", Some(":1.9"), vec![])
            .expect("add");
        assert_eq!(
            transport.match_rules()[0].to_string(),
            "type='signal',sender=':1.9',interface='org.demo.Clock',member='Tick'"
        );
        assert_eq!(registry.remove_observer(&observer), 1);
        assert!(transport.match_rules().is_empty());
    }

    #[test]
    fn test_post_and_dispatch_loopback() {
        let (registry, transport) = registry();
        registry.register_signal(tick_signal());
        let hits = Arc::new(AtomicUsize::new(0));
        registry
            .add_signal_observer(
                &hits,
                |h, n| {
                    assert_eq!(n.argument(0).and_then(NativeValue::as_u32), Some(42));
                    h.fetch_add(1, Ordering::Relaxed);
                },
                "Tick",
                "org.demo.Clock",
                None,
                vec![],
            )
            .expect("add");

        let mut info = UserInfo::new();
        info.insert("arg0".into(), Value::UInt32(42));
        registry
            .post_signal("Tick", "org.demo.Clock", None, Some(&info))
            .expect("post");

        let frames = transport.drain();
        assert_eq!(frames.len(), 1);
        assert_eq!(frames[0].path.as_deref(), Some("/"));
        assert_eq!(registry.dispatch(&frames[0]).expect("dispatch"), 1);
        assert_eq!(hits.load(Ordering::Relaxed), 1);

        let m = registry.metrics();
        assert_eq!(m.frames_posted, 1);
        assert_eq!(m.deliveries, 1);
    }

    #[test]
    fn test_post_unknown_signal_infers_descriptor() {
        let (registry, transport) = registry();
        let mut info = UserInfo::new();
        info.insert("arg0".into(), Value::from("hello"));
        info.insert("arg1".into(), Value::Int64(-1));
        registry
            .post_signal("Said", "org.demo.Chat", Some("/org/demo/Chat"), Some(&info))
            .expect("post");
        assert_eq!(transport.sent()[0].signature, "sx");
    }

    #[test]
    fn test_post_failures() {
        let (registry, transport) = registry();
        assert!(matches!(
            registry.post_notification_name("Unbound", None, None),
            Err(Error::UnknownNotificationName(_))
        ));
        assert!(matches!(
            registry.post_signal("Tick", "org.demo.Clock", Some("bad path"), None),
            Err(Error::InvalidName(_))
        ));

        registry.register_signal(tick_signal());
        let mut info = UserInfo::new();
        info.insert("arg0".into(), Value::from("not a number"));
        assert!(matches!(
            registry.post_signal("Tick", "org.demo.Clock", None, Some(&info)),
            Err(Error::TypeMismatch(_))
        ));

        transport.set_offline(true);
        assert!(matches!(
            registry.post_signal("Other", "org.demo.Clock", None, None),
            Err(Error::Transport(_))
        ));
        assert_eq!(registry.metrics().frames_posted, 0);
    }

    #[test]
    fn test_non_signal_frames_ignored() {
        let (registry, _) = registry();
        let frame = WireMessage::method_call("org.demo.Clock", "Tick");
        assert_eq!(registry.dispatch(&frame).expect("dispatch"), 0);
        assert_eq!(registry.metrics().frames_dispatched, 0);
    }

    #[test]
    fn test_set_config_validates() {
        let (registry, _) = registry();
        let mut config = BridgeConfig::default();
        config.default_object_path = "nope".into();
        assert!(registry.set_config(config).is_err());

        let config = BridgeConfig {
            deliver_boxed: false,
            ..BridgeConfig::default()
        };
        registry.set_config(config).expect("valid");
        assert!(!registry.config().deliver_boxed);
    }
}

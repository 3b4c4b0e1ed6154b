// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Transport collaborator interface.
//!
//! The registry never opens connections itself: it hands outgoing frames and
//! match rules to a [`Transport`], and the transport's read loop calls
//! [`DispatchRegistry::dispatch`](super::DispatchRegistry::dispatch) for every
//! incoming frame.

use super::ArgFilter;
use crate::error::{Error, Result};
use crate::wire::WireMessage;
use parking_lot::Mutex;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};

/// Outgoing side of a bus connection.
///
/// # Thread Safety
/// Implementations must be Send + Sync: the registry calls them from any
/// thread that posts or registers.
pub trait Transport: Send + Sync {
    /// Send one complete frame.
    fn send(&self, message: WireMessage) -> Result<()>;

    /// Ask the bus to route signals matching `rule` to this connection.
    fn add_match(&self, _rule: &MatchRule) -> Result<()> {
        Ok(())
    }

    /// Withdraw a rule previously passed to [`Transport::add_match`].
    fn remove_match(&self, _rule: &MatchRule) -> Result<()> {
        Ok(())
    }
}

/// Bus-side signal match rule for one registration.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MatchRule {
    pub sender: Option<String>,
    pub interface: String,
    pub member: String,
    pub args: Vec<ArgFilter>,
}

impl MatchRule {
    pub fn signal(interface: impl Into<String>, member: impl Into<String>) -> Self {
        Self {
            sender: None,
            interface: interface.into(),
            member: member.into(),
            args: Vec::new(),
        }
    }

    pub fn with_sender(mut self, sender: Option<String>) -> Self {
        self.sender = sender;
        self
    }

    pub fn with_args(mut self, args: Vec<ArgFilter>) -> Self {
        self.args = args;
        self
    }
}

/// Quote a match-rule value: `'` closes the quote, escapes itself, reopens.
fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "'\\''"))
}

impl fmt::Display for MatchRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "type='signal'")?;
        if let Some(sender) = &self.sender {
            write!(f, ",sender={}", quote(sender))?;
        }
        write!(f, ",interface={}", quote(&self.interface))?;
        write!(f, ",member={}", quote(&self.member))?;
        for filter in &self.args {
            write!(f, ",arg{}={}", filter.index, quote(&filter.value))?;
        }
        Ok(())
    }
}

/// In-process transport that records everything it is given.
///
/// Frames without a sender are stamped with the transport's unique name, like
/// a bus daemon would. Useful for loopback delivery and tests.
pub struct MemoryTransport {
    unique_name: String,
    sent: Mutex<Vec<WireMessage>>,
    rules: Mutex<Vec<MatchRule>>,
    offline: AtomicBool,
}

impl MemoryTransport {
    pub fn new(unique_name: impl Into<String>) -> Self {
        Self {
            unique_name: unique_name.into(),
            sent: Mutex::new(Vec::new()),
            rules: Mutex::new(Vec::new()),
            offline: AtomicBool::new(false),
        }
    }

    pub fn unique_name(&self) -> &str {
        &self.unique_name
    }

    /// Make every subsequent call fail with [`Error::Transport`].
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::Relaxed);
    }

    /// Take all frames sent so far.
    pub fn drain(&self) -> Vec<WireMessage> {
        std::mem::take(&mut *self.sent.lock())
    }

    /// Copy of all frames sent so far.
    pub fn sent(&self) -> Vec<WireMessage> {
        self.sent.lock().clone()
    }

    /// Match rules currently installed.
    pub fn match_rules(&self) -> Vec<MatchRule> {
        self.rules.lock().clone()
    }

    fn check_online(&self) -> Result<()> {
        if self.offline.load(Ordering::Relaxed) {
            return Err(Error::Transport(format!(
                "connection {} is offline",
                self.unique_name
            )));
        }
        Ok(())
    }
}

impl Transport for MemoryTransport {
    fn send(&self, mut message: WireMessage) -> Result<()> {
        self.check_online()?;
        if message.sender.is_none() {
            message.sender = Some(self.unique_name.clone());
        }
        self.sent.lock().push(message);
        Ok(())
    }

    fn add_match(&self, rule: &MatchRule) -> Result<()> {
        self.check_online()?;
        self.rules.lock().push(rule.clone());
        Ok(())
    }

    fn remove_match(&self, rule: &MatchRule) -> Result<()> {
        self.check_online()?;
        let mut rules = self.rules.lock();
        if let Some(index) = rules.iter().position(|r| r == rule) {
            rules.remove(index);
        }
        Ok(())
    }
}

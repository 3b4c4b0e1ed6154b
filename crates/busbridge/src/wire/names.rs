// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Validation of bus names, interface names, member names and object paths.

use crate::config::MAX_NAME_LEN;
use crate::error::{Error, Result};

fn is_name_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn invalid(kind: &str, name: &str, reason: &str) -> Error {
    Error::InvalidName(format!("{} '{}': {}", kind, name, reason))
}

/// Validate an object path (`/` or `/element/element...`).
pub fn validate_object_path(path: &str) -> Result<()> {
    if path == "/" {
        return Ok(());
    }
    let rest = path
        .strip_prefix('/')
        .ok_or_else(|| invalid("object path", path, "must start with '/'"))?;
    for element in rest.split('/') {
        if element.is_empty() {
            return Err(invalid("object path", path, "empty path element"));
        }
        if !element.chars().all(is_name_char) {
            return Err(invalid("object path", path, "invalid character"));
        }
    }
    Ok(())
}

/// Validate a dotted name made of at least two elements.
fn validate_dotted(kind: &str, name: &str, allow_dash: bool) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(invalid(kind, name, "length out of range"));
    }
    let mut elements = 0;
    for element in name.split('.') {
        elements += 1;
        let mut chars = element.chars();
        match chars.next() {
            None => return Err(invalid(kind, name, "empty element")),
            Some(c) if c.is_ascii_digit() => {
                return Err(invalid(kind, name, "element starts with a digit"))
            }
            Some(_) => {}
        }
        if !element
            .chars()
            .all(|c| is_name_char(c) || (allow_dash && c == '-'))
        {
            return Err(invalid(kind, name, "invalid character"));
        }
    }
    if elements < 2 {
        return Err(invalid(kind, name, "needs at least two elements"));
    }
    Ok(())
}

/// Validate an interface name (`org.freedesktop.DBus`).
pub fn validate_interface_name(name: &str) -> Result<()> {
    validate_dotted("interface name", name, false)
}

/// Validate a member (method or signal) name.
pub fn validate_member_name(name: &str) -> Result<()> {
    if name.is_empty() || name.len() > MAX_NAME_LEN {
        return Err(invalid("member name", name, "length out of range"));
    }
    if name.starts_with(|c: char| c.is_ascii_digit()) {
        return Err(invalid("member name", name, "starts with a digit"));
    }
    if !name.chars().all(is_name_char) {
        return Err(invalid("member name", name, "invalid character"));
    }
    Ok(())
}

/// Validate a unique (`:1.42`) or well-known (`org.demo.Clock`) bus name.
pub fn validate_bus_name(name: &str) -> Result<()> {
    if let Some(unique) = name.strip_prefix(':') {
        if name.len() > MAX_NAME_LEN {
            return Err(invalid("bus name", name, "length out of range"));
        }
        let elements: Vec<&str> = unique.split('.').collect();
        if elements.len() < 2
            || elements.iter().any(|e| {
                e.is_empty() || !e.chars().all(|c| is_name_char(c) || c == '-')
            })
        {
            return Err(invalid("bus name", name, "malformed unique name"));
        }
        return Ok(());
    }
    validate_dotted("bus name", name, true)
}

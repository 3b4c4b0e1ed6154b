// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! D-Bus wire primitives: byte order, body cursors, names and frame envelopes.

mod cursor;
mod message;
pub mod names;

pub use cursor::{WireReader, WireWriter};
pub use message::{MessageKind, WireMessage};

use serde::{Deserialize, Serialize};

/// Byte order of a frame, as declared by its first header byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Endianness {
    /// `'l'` on the wire.
    #[default]
    Little,
    /// `'B'` on the wire.
    Big,
}

impl Endianness {
    /// Header marker byte.
    pub fn marker(self) -> u8 {
        match self {
            Endianness::Little => b'l',
            Endianness::Big => b'B',
        }
    }

    /// Parse a header marker byte.
    pub fn from_marker(marker: u8) -> Option<Self> {
        match marker {
            b'l' => Some(Endianness::Little),
            b'B' => Some(Endianness::Big),
            _ => None,
        }
    }
}

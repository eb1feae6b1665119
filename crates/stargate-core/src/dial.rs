//! Dialing vocabulary: glyphs, dial modes, chevron order, destinations.
//!
//! # Canon criss-cross order
//!
//! Chevrons do not lock in the order glyphs were entered. The physical lock
//! order alternates between the two sides of the gate and always finishes on
//! the top chevron, which carries the point of origin:
//!
//! ```text
//!  mode 7: 1 8 2 7 3 6 9
//!  mode 8: 1 8 2 7 3 6 4 9
//!  mode 9: 1 8 2 7 3 6 4 5 9
//! ```

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::GateError;

/// Glyph identifier, one of [`GLYPH_COUNT`] positions on the ring.
pub type GlyphId = u8;

/// Physical chevron number on the gate.
pub type ChevronNumber = u8;

/// Number of glyph positions on the ring.
pub const GLYPH_COUNT: u8 = 39;

/// Glyph always encoded on the final chevron.
pub const POINT_OF_ORIGIN: GlyphId = 0;

/// Procedural destinations fire when `hash % 100` falls below this value.
pub const DEFAULT_PROCEDURAL_WINDOW: u64 = 5;

const SEQUENCE_7: [ChevronNumber; 7] = [1, 8, 2, 7, 3, 6, 9];
const SEQUENCE_8: [ChevronNumber; 8] = [1, 8, 2, 7, 3, 6, 4, 9];
const SEQUENCE_9: [ChevronNumber; 9] = [1, 8, 2, 7, 3, 6, 4, 5, 9];

const HASH_SEED: i64 = 5381;

/// Gate lifecycle state. Exactly one is current at any time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GateState {
    /// Waiting for the first glyph.
    Idle,
    /// Address entry, or ring travelling between chevrons.
    Dialing,
    /// A chevron just engaged.
    ChevronLock,
    /// All chevrons engaged, destination lookup in progress.
    Validating,
    /// Outgoing wormhole established.
    ActiveOutbound,
    /// Incoming wormhole. Reserved, never entered by the dialer.
    ActiveIncoming,
    /// Iris check on an incoming wormhole. Reserved.
    IrisCheck,
    /// Wormhole closing, automatic reset pending.
    Shutdown,
    /// Attempt failed or cancelled, automatic reset pending.
    Aborted,
}

impl GateState {
    /// Whether a wormhole is open in either direction.
    pub fn is_active(self) -> bool {
        matches!(self, Self::ActiveOutbound | Self::ActiveIncoming)
    }

    /// Whether the address buffer may be mutated.
    pub fn accepts_glyphs(self) -> bool {
        matches!(self, Self::Idle | Self::Dialing)
    }
}

impl fmt::Display for GateState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Dialing => "dialing",
            Self::ChevronLock => "chevron_lock",
            Self::Validating => "validating",
            Self::ActiveOutbound => "active_outbound",
            Self::ActiveIncoming => "active_incoming",
            Self::IrisCheck => "iris_check",
            Self::Shutdown => "shutdown",
            Self::Aborted => "aborted",
        };
        f.write_str(name)
    }
}

/// Dial mode. The discriminant is the chevron count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DialMode {
    /// Seven chevrons, six address glyphs.
    #[default]
    Local = 7,
    /// Eight chevrons, seven address glyphs.
    Intergalactic = 8,
    /// Nine chevrons, eight address glyphs.
    Destiny = 9,
}

impl DialMode {
    /// All modes, smallest first.
    pub const ALL: [DialMode; 3] = [Self::Local, Self::Intergalactic, Self::Destiny];

    /// Number of chevrons that lock in a full dial.
    pub fn chevron_count(self) -> usize {
        self as usize
    }

    /// Maximum user-supplied glyphs. The last chevron is the point of origin.
    pub fn max_glyphs(self) -> usize {
        self.chevron_count() - 1
    }

    /// Physical chevron lock order for this mode.
    pub fn sequence(self) -> &'static [ChevronNumber] {
        match self {
            Self::Local => &SEQUENCE_7,
            Self::Intergalactic => &SEQUENCE_8,
            Self::Destiny => &SEQUENCE_9,
        }
    }
}

impl TryFrom<u8> for DialMode {
    type Error = GateError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            7 => Ok(Self::Local),
            8 => Ok(Self::Intergalactic),
            9 => Ok(Self::Destiny),
            other => Err(GateError::InvalidMode(other)),
        }
    }
}

/// Resolved dial target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Destination {
    /// Display name, e.g. "Abydos" or "P8X-332".
    pub name: String,
    /// Classification, free-form. Procedural worlds are `"unknown"`.
    #[serde(rename = "type")]
    pub kind: String,
    /// Human readable description.
    pub description: String,
}

impl Destination {
    /// Create a destination record.
    pub fn new(
        name: impl Into<String>,
        kind: impl Into<String>,
        description: impl Into<String>,
    ) -> Self {
        Self { name: name.into(), kind: kind.into(), description: description.into() }
    }
}

/// Deterministic hash of an address.
///
/// djb2 with `hash = ((hash << 5) + hash) + id`, seeded at 5381. The shift
/// operates on the running value truncated to a signed 32-bit integer while
/// the sum stays exact, matching how browser widgets have always numbered
/// procedural worlds. Returns the absolute value.
pub fn hash_address(address: &[GlyphId]) -> u64 {
    let mut hash = HASH_SEED;
    for &glyph in address {
        let shifted = (hash as i32).wrapping_shl(5);
        hash = i64::from(shifted) + hash + i64::from(glyph);
    }
    hash.unsigned_abs()
}

/// Procedural destination for an address hash.
///
/// `None` unless `hash % 100 < window`. Names follow `P{hash % 9}X-{hash % 999}`
/// with the numeric suffix zero-padded to three digits.
pub fn procedural_destination(hash: u64, window: u64) -> Option<Destination> {
    if hash % 100 >= window {
        return None;
    }

    let name = format!("P{}X-{:03}", hash % 9, hash % 999);
    Some(Destination::new(name, "unknown", "Unexplored world"))
}

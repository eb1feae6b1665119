//! Canon addresses and a matching whitelist.

use rand::{Rng, seq::index};
use stargate_app::{StaticWhitelist, WhitelistError};
use stargate_core::{DialMode, GLYPH_COUNT, GlyphId};

/// Abydos, the first address ever dialled.
pub const ABYDOS: [GlyphId; 6] = [27, 7, 15, 32, 12, 30];

/// Chulak.
pub const CHULAK: [GlyphId; 6] = [9, 2, 23, 15, 37, 20];

/// Not listed, and its hash misses the procedural window.
pub const UNLISTED: [GlyphId; 6] = [1, 8, 2, 7, 3, 6];

/// Not listed, but its hash lands in the procedural window (P8X-332).
pub const PROCEDURAL: [GlyphId; 6] = [3, 9, 11, 36, 7, 30];

/// Whitelist document with the canon addresses.
pub const CANON_WHITELIST_JSON: &str = r#"[
  { "address": [27, 7, 15, 32, 12, 30], "name": "Abydos",
    "type": "planet", "description": "Desert world, first gate activation" },
  { "address": [9, 2, 23, 15, 37, 20], "name": "Chulak",
    "type": "planet", "description": "Jaffa homeworld" }
]"#;

/// Whitelist with the canon addresses.
///
/// # Errors
///
/// Never in practice; the document is a constant.
pub fn canon_whitelist() -> Result<StaticWhitelist, WhitelistError> {
    StaticWhitelist::from_json(CANON_WHITELIST_JSON)
}

/// Random complete address for `mode`: distinct glyphs in random order.
pub fn random_address<R: Rng + ?Sized>(rng: &mut R, mode: DialMode) -> Vec<GlyphId> {
    index::sample(rng, usize::from(GLYPH_COUNT), mode.max_glyphs())
        .into_iter()
        .map(|i| i as GlyphId)
        .collect()
}

//! Destination whitelist collaborator.
//!
//! The protocol only knows that validation asks "where does this address
//! go?". [`Whitelist`] is that question; [`StaticWhitelist`] answers it from a
//! fixed table, typically loaded from an `addresses.json` document:
//!
//! ```json
//! [
//!   { "address": [27, 7, 15, 32, 12, 30], "name": "Abydos",
//!     "type": "planet", "description": "Desert world" }
//! ]
//! ```

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use stargate_core::{Destination, DialMode, GLYPH_COUNT, GlyphId};

use crate::WhitelistError;

/// Destination lookup.
///
/// Pure query: no side effects, no ordering guarantees between lookups.
#[async_trait]
pub trait Whitelist: Send + Sync {
    /// Destination for `address`, or `None` if it is not listed.
    async fn lookup(&self, address: &[GlyphId]) -> Option<Destination>;
}

/// One whitelist record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WhitelistEntry {
    /// Address glyphs, without the point of origin.
    pub address: Vec<GlyphId>,
    /// Where it leads.
    #[serde(flatten)]
    pub destination: Destination,
}

impl WhitelistEntry {
    /// Create an entry.
    pub fn new(address: impl Into<Vec<GlyphId>>, destination: Destination) -> Self {
        Self { address: address.into(), destination }
    }
}

/// In-memory whitelist.
#[derive(Debug, Clone, Default)]
pub struct StaticWhitelist {
    entries: HashMap<Vec<GlyphId>, Destination>,
}

impl StaticWhitelist {
    /// Create an empty whitelist.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from entries.
    ///
    /// # Errors
    ///
    /// - `WhitelistError::InvalidAddress` if an address cannot be dialled in
    ///   any mode
    /// - `WhitelistError::DuplicateAddress` if an address appears twice
    pub fn from_entries(
        entries: impl IntoIterator<Item = WhitelistEntry>,
    ) -> Result<Self, WhitelistError> {
        let mut whitelist = Self::new();
        for entry in entries {
            whitelist.insert(entry.address, entry.destination)?;
        }
        Ok(whitelist)
    }

    /// Parse an `addresses.json` document.
    ///
    /// # Errors
    ///
    /// - `WhitelistError::Parse` if the JSON does not match the entry shape
    /// - any error from [`Self::from_entries`]
    pub fn from_json(json: &str) -> Result<Self, WhitelistError> {
        let entries: Vec<WhitelistEntry> = serde_json::from_str(json)?;
        let whitelist = Self::from_entries(entries)?;
        tracing::debug!(entries = whitelist.len(), "whitelist loaded");
        Ok(whitelist)
    }

    /// Add an address.
    ///
    /// # Errors
    ///
    /// Same as [`Self::from_entries`].
    pub fn insert(
        &mut self,
        address: Vec<GlyphId>,
        destination: Destination,
    ) -> Result<(), WhitelistError> {
        validate_address(&address)?;
        if self.entries.contains_key(&address) {
            return Err(WhitelistError::DuplicateAddress(address));
        }
        self.entries.insert(address, destination);
        Ok(())
    }

    /// Listed destination for `address`.
    pub fn get(&self, address: &[GlyphId]) -> Option<&Destination> {
        self.entries.get(address)
    }

    /// Number of listed addresses.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether nothing is listed.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl Whitelist for StaticWhitelist {
    async fn lookup(&self, address: &[GlyphId]) -> Option<Destination> {
        self.get(address).cloned()
    }
}

fn validate_address(address: &[GlyphId]) -> Result<(), WhitelistError> {
    let invalid = |reason| WhitelistError::InvalidAddress { address: address.to_vec(), reason };

    if !DialMode::ALL.iter().any(|mode| mode.max_glyphs() == address.len()) {
        return Err(invalid("length must be 6, 7 or 8"));
    }
    if address.iter().any(|&glyph| glyph >= GLYPH_COUNT) {
        return Err(invalid("glyph off the ring"));
    }
    for (i, glyph) in address.iter().enumerate() {
        if address[..i].contains(glyph) {
            return Err(invalid("repeated glyph"));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOCUMENT: &str = r#"[
        { "address": [27, 7, 15, 32, 12, 30], "name": "Abydos",
          "type": "planet", "description": "Desert world" },
        { "address": [9, 2, 23, 15, 37, 20], "name": "Chulak",
          "type": "planet", "description": "Jaffa homeworld" }
    ]"#;

    #[tokio::test]
    async fn lookup_hits_and_misses() {
        let whitelist = StaticWhitelist::from_json(DOCUMENT).unwrap();
        assert_eq!(whitelist.len(), 2);

        let abydos = whitelist.lookup(&[27, 7, 15, 32, 12, 30]).await.unwrap();
        assert_eq!(abydos.name, "Abydos");
        assert_eq!(abydos.kind, "planet");

        assert!(whitelist.lookup(&[1, 2, 3, 4, 5, 6]).await.is_none());
        // Order matters
        assert!(whitelist.lookup(&[7, 27, 15, 32, 12, 30]).await.is_none());
    }

    #[test]
    fn rejects_malformed_json() {
        let err = StaticWhitelist::from_json(r#"[{ "address": "nope" }]"#).unwrap_err();
        assert!(matches!(err, WhitelistError::Parse(_)));
    }

    #[test]
    fn rejects_undialable_addresses() {
        let dest = Destination::new("X", "planet", "");
        let mut whitelist = StaticWhitelist::new();

        for address in [vec![1, 2, 3], vec![1, 2, 3, 4, 5, 39], vec![1, 2, 3, 4, 5, 1]] {
            let err = whitelist.insert(address, dest.clone()).unwrap_err();
            assert!(matches!(err, WhitelistError::InvalidAddress { .. }), "{err}");
        }
        assert!(whitelist.is_empty());
    }

    #[test]
    fn rejects_duplicates() {
        let dest = Destination::new("X", "planet", "");
        let result = StaticWhitelist::from_entries([
            WhitelistEntry::new([1, 2, 3, 4, 5, 6], dest.clone()),
            WhitelistEntry::new([1, 2, 3, 4, 5, 6], dest),
        ]);
        assert!(matches!(result, Err(WhitelistError::DuplicateAddress(_))));
    }

    #[test]
    fn trait_object_usable() {
        let whitelist: Box<dyn Whitelist> = Box::new(StaticWhitelist::new());
        drop(whitelist);
    }
}

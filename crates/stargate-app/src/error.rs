//! Application layer errors.

use stargate_core::GlyphId;
use thiserror::Error;

/// Errors loading a whitelist.
#[derive(Error, Debug)]
pub enum WhitelistError {
    /// Document is not valid whitelist JSON.
    #[error("malformed whitelist: {0}")]
    Parse(#[from] serde_json::Error),

    /// Address cannot be dialled: wrong length, glyph off the ring, or a
    /// repeated glyph.
    #[error("undialable address {address:?}: {reason}")]
    InvalidAddress {
        /// Offending address.
        address: Vec<GlyphId>,
        /// What is wrong with it.
        reason: &'static str,
    },

    /// Same address listed twice.
    #[error("address {0:?} listed more than once")]
    DuplicateAddress(Vec<GlyphId>),
}

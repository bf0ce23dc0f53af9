//! Bounds applied while decoding variable sized payloads

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// Largest meta payload and longest sysex scan a decode will accept.
///
/// Both bounds exist so that a corrupt length or a missing terminator surfaces as an error
/// instead of an unbounded allocation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct DecodeLimits {
    /// Maximum declared length of a meta event payload
    pub max_meta_payload: usize,
    /// Maximum number of sysex payload bytes scanned while looking for `0xF7`
    pub max_sysex_scan: usize,
}

impl DecodeLimits {
    /// One mebibyte, used for both limits by default
    pub const DEFAULT_BOUND: usize = 1 << 20;

    /// Limits with the same bound for meta payloads and sysex scans
    pub const fn uniform(bound: usize) -> Self {
        Self {
            max_meta_payload: bound,
            max_sysex_scan: bound,
        }
    }
}

impl Default for DecodeLimits {
    fn default() -> Self {
        Self::uniform(Self::DEFAULT_BOUND)
    }
}

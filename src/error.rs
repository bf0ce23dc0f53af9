//! Error type shared by every read and write operation of the codec

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T, E = SmfError> = core::result::Result<T, E>;

/// Every way decoding or encoding a Standard MIDI File can fail.
///
/// Decode errors are never recoverable at the point they occur: the underlying source has
/// already advanced past an unknown number of bytes, so the caller should report and abort
/// rather than retry.
#[derive(Debug, Error)]
pub enum SmfError {
    /// A chunk label did not match the expected magic
    #[error("Expected chunk label {expected:?}, found {found:?}")]
    BadMagic {
        /// The label that should have been present
        expected: [u8; 4],
        /// The label that was read instead
        found: [u8; 4],
    },
    /// The `MThd` chunk declared a body size other than 6
    #[error("Header chunk declares {0} bytes, expected 6")]
    BadChunkSize(u32),
    /// The header format was not 0, 1 or 2
    #[error("Unsupported MIDI format {0}")]
    UnsupportedFormat(u16),
    /// The source ran out before a field was fully read
    #[error("Input ended before the value was fully read")]
    TruncatedInput,
    /// A status byte whose high nibble is not a channel message
    #[error("Unknown event type for status byte {0:#04X}")]
    UnknownEventType(u8),
    /// A meta event declared more payload than the configured limit allows
    #[error("Meta payload of {length} bytes exceeds the {limit} byte limit")]
    PayloadTooLarge {
        /// Declared payload length
        length: u32,
        /// Limit in effect for the decode
        limit: usize,
    },
    /// No 0xF7 terminator was found within the sysex scan limit
    #[error("No end of exclusive (0xF7) found within {scanned} bytes")]
    UnterminatedSysex {
        /// Number of payload bytes scanned before giving up
        scanned: usize,
    },
    /// A sysex payload that cannot be written back as a single framed message
    #[error("Sysex payload must end with exactly one 0xF7 terminator")]
    InvalidSysex,
    /// A variable length quantity longer than four groups, or a value too large to encode in four
    #[error("Variable length quantity does not fit in 4 bytes")]
    VlqOverflow,
    /// A channel message addressed to a channel outside of 0..=15
    #[error("Channel {0} does not fit the low nibble of a status byte")]
    InvalidChannel(u8),
    /// A big endian width outside of 1..=4
    #[error("Cannot handle a {0} byte wide big endian integer")]
    InvalidWidth(usize),
    /// A known meta event type carrying the wrong amount of data
    #[error("Meta event {meta_type:#04X} has an invalid payload length of {length}")]
    InvalidMetaEvent {
        /// The meta type byte
        meta_type: u8,
        /// The payload length that was found
        length: usize,
    },
    /// A track's events ran past the length declared in its header
    #[error("Track declares {declared} bytes but its events span {consumed}")]
    FramingMismatch {
        /// Length from the `MTrk` header
        declared: u32,
        /// Bytes consumed once the last event was read
        consumed: u32,
    },
    /// Encoded events too long for the 32 bit length of an `MTrk` header
    #[error("Track body of {0} bytes does not fit a chunk length")]
    TrackTooLong(usize),
    /// More tracks than the 16 bit track count of an `MThd` header can announce
    #[error("{0} tracks do not fit the header's track count")]
    TooManyTracks(usize),
    /// A failure while decoding the events of a particular track
    #[error("Track {index} at byte offset {offset}: {source}")]
    Track {
        /// Zero based track index
        index: usize,
        /// Absolute byte offset of the event that failed
        offset: usize,
        /// The underlying failure
        #[source]
        source: Box<SmfError>,
    },
    /// Reading a file or writing to a sink failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl SmfError {
    /// Strips any [`SmfError::Track`] context and returns the failure underneath
    pub fn root_cause(&self) -> &SmfError {
        match self {
            Self::Track { source, .. } => source.root_cause(),
            other => other,
        }
    }

    /// True if the source ran out of bytes, with or without track context
    pub fn is_truncated(&self) -> bool {
        matches!(self.root_cause(), Self::TruncatedInput)
    }
}

//! Chunk type constants

/// Creates a chunk type identifier
macro_rules! chunk_type {
    ($const_name:ident, $label:expr_2021) => {
        /// MIDI chunk type
        pub const $const_name: [u8; 4] = *$label;
    };
}

chunk_type!(HEADER_CHUNK, b"MThd");
chunk_type!(TRACK_DATA_CHUNK, b"MTrk");

/// Body size every `MThd` chunk must declare
pub const HEADER_LENGTH: u32 = 6;

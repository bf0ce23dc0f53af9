//! Header Chunk Enum and Struct Definitions

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    chunk::{
        chunk_types::{HEADER_CHUNK, HEADER_LENGTH},
        Chunk,
    },
    error::{Result, SmfError},
    reader::MidiSource,
    writer::{MidiSink, MidiWriteable},
};

/// The `MThd` chunk: file format, number of tracks and the meaning of delta times
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct FileHeader {
    /// The MIDI format
    pub format: Format,
    /// Number of `MTrk` chunks that follow
    pub track_count: u16,
    /// Raw division word, ticks per quarter note when positive, SMPTE timing when negative
    pub division: i16,
}

impl FileHeader {
    /// Size of the whole `MThd` chunk on the wire, label and length included
    pub const ENCODED_LEN: usize = Chunk::ENCODED_LEN + HEADER_LENGTH as usize;

    /// Creates a header from its three fields
    pub const fn new(format: Format, track_count: u16, division: i16) -> Self {
        Self {
            format,
            track_count,
            division,
        }
    }

    /// Interprets the raw division word
    pub fn timing(&self) -> Division {
        self.division.into()
    }

    /// Reads and validates an `MThd` chunk
    pub fn read<S>(source: &mut S) -> Result<Self>
    where
        S: MidiSource + ?Sized,
    {
        let chunk = Chunk::read_expecting(source, HEADER_CHUNK)?;
        if chunk.length() != HEADER_LENGTH {
            return Err(SmfError::BadChunkSize(chunk.length()));
        }

        let format = Format::try_from(source.read_uint(2)? as u16)?;
        let track_count = source.read_uint(2)? as u16;
        let division = source.read_uint(2)? as u16 as i16;

        let header = Self {
            format,
            track_count,
            division,
        };
        tracing::debug!(?format, track_count, division, "read header chunk");

        Ok(header)
    }
}

impl MidiWriteable for FileHeader {
    fn write_midi<W>(&self, sink: &mut W) -> Result<usize>
    where
        W: MidiSink + ?Sized,
    {
        let mut written = Chunk::new(HEADER_CHUNK, HEADER_LENGTH).write_midi(sink)?;
        written += sink.write_uint(u16::from(self.format) as u32, 2)?;
        written += sink.write_uint(self.track_count as u32, 2)?;
        written += sink.write_uint(self.division as u16 as u32, 2)?;

        Ok(written)
    }
}

/// The overall organization of the MIDI file. Only three values are valid, making most of the 16
/// bits irrelevant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Format {
    /// The file contains a single multi-channel track
    Zero,
    /// The file contains one or more simultaneous tracks (or MIDI outputs) of a sequence
    One,
    /// The file contains one or more sequentially independent single-track patterns
    Two,
}

impl TryFrom<u16> for Format {
    type Error = SmfError;
    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Format::Zero),
            1 => Ok(Format::One),
            2 => Ok(Format::Two),
            other => Err(SmfError::UnsupportedFormat(other)),
        }
    }
}

impl From<Format> for u16 {
    fn from(value: Format) -> Self {
        match value {
            Format::Zero => 0,
            Format::One => 1,
            Format::Two => 2,
        }
    }
}

/// The meaning of the delta-times in the MIDI sequence
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Division {
    /// When bit 15 is a 0, bits 14-0 represent ticks per quarter note
    Metrical(u16),
    /// When bit 15 is 1, bits 15-8 hold the negative SMPTE format,
    /// and bits 7-0 represent ticks per frame
    TimeCodeBased(SmpteTicks),
}

/// Division defined by time-code-based time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SmpteTicks {
    /// Negative frames per second, one of -24, -25, -29 or -30 in well formed files
    pub smpte: i8,
    /// Ticks per frame
    pub tpf: u8,
}

impl SmpteTicks {
    /// Frames per second as a positive number
    pub fn frames_per_second(&self) -> u8 {
        self.smpte.unsigned_abs()
    }
}

impl From<i16> for Division {
    fn from(value: i16) -> Self {
        let [high, low] = value.to_be_bytes();

        if value >= 0 {
            Division::Metrical(value as u16)
        } else {
            Division::TimeCodeBased(SmpteTicks {
                smpte: high as i8,
                tpf: low,
            })
        }
    }
}

impl From<Division> for i16 {
    fn from(value: Division) -> Self {
        match value {
            Division::Metrical(ticks) => (ticks & 0x7FFF) as i16,
            Division::TimeCodeBased(SmpteTicks { smpte, tpf }) => {
                i16::from_be_bytes([smpte as u8 | 0x80, tpf])
            }
        }
    }
}

//! Chunk framing: the labelled, length prefixed blocks an SMF file is made of

use crate::{
    error::{Result, SmfError},
    reader::MidiSource,
    writer::{MidiSink, MidiWriteable},
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

pub mod chunk_types;
pub mod header;
pub mod track;

/// Represents a raw MIDI Chunk header.
/// A MIDI Chunk consists of a 4-character ASCII type identifier and a 32-bit unsigned integer
/// specifying the length of its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Chunk {
    /// 4 character ASCII chunk type
    pub chunk_type: [u8; 4],
    /// Length of the data that follows
    length: u32,
}

impl Chunk {
    /// Size of a chunk header on the wire
    pub const ENCODED_LEN: usize = 8;

    /// Creates a chunk header from a label and body length
    pub const fn new(chunk_type: [u8; 4], length: u32) -> Self {
        Self { chunk_type, length }
    }

    /// Gets the declared body length
    pub fn length(&self) -> u32 {
        self.length
    }

    /// Gets the length of the chunk as a usize
    pub fn len(&self) -> usize {
        self.length as usize
    }

    /// Returns if the chunk has no attributed data
    pub fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Reads any chunk header, whatever its label
    pub fn read<S>(source: &mut S) -> Result<Self>
    where
        S: MidiSource + ?Sized,
    {
        let chunk_type = source.read_label()?;
        let length = source.read_uint(4)?;

        Ok(Self { chunk_type, length })
    }

    /// Reads a chunk header whose label must equal `expected`.
    ///
    /// The label is checked before the length is read, so a bad magic leaves the source just
    /// past the label.
    pub fn read_expecting<S>(source: &mut S, expected: [u8; 4]) -> Result<Self>
    where
        S: MidiSource + ?Sized,
    {
        let found = source.read_label()?;
        if found != expected {
            return Err(SmfError::BadMagic { expected, found });
        }

        let length = source.read_uint(4)?;
        Ok(Self {
            chunk_type: found,
            length,
        })
    }
}

impl MidiWriteable for Chunk {
    fn write_midi<W>(&self, sink: &mut W) -> Result<usize>
    where
        W: MidiSink + ?Sized,
    {
        let written = sink.write_label(self.chunk_type)?;
        Ok(written + sink.write_uint(self.length, 4)?)
    }
}

#[cfg(test)]
mod tests {
    use super::{
        chunk_types::{HEADER_CHUNK, TRACK_DATA_CHUNK},
        Chunk,
    };
    use crate::{
        error::SmfError,
        reader::{MidiSource, MidiStream},
        writer::MidiWriteable,
    };

    #[test]
    fn chunk_reads_label_and_length() {
        let mut stream = MidiStream::from_slice(b"test\x00\x00\x00\x0a");
        let chunk = Chunk::read(&mut stream).expect("Read raw chunk");

        assert_eq!(chunk, Chunk::new(*b"test", 10));
        assert_eq!(chunk.len(), 10);
        assert!(!chunk.is_empty());
    }

    #[test]
    fn unexpected_label_is_bad_magic() {
        let mut stream = MidiStream::from_slice(b"RIFF\x00\x00\x00\x06");
        let result = Chunk::read_expecting(&mut stream, HEADER_CHUNK);

        assert!(matches!(
            result,
            Err(SmfError::BadMagic { expected, found }) if expected == HEADER_CHUNK && &found == b"RIFF"
        ));
        assert_eq!(stream.position(), 4);
    }

    #[test]
    fn chunk_saves_as_proper_bytes() {
        let chunk = Chunk::new(TRACK_DATA_CHUNK, 0x0102);
        let bytes = chunk.to_midi_bytes().expect("Encode chunk header");

        assert_eq!(bytes, b"MTrk\x00\x00\x01\x02");
        assert_eq!(bytes.len(), Chunk::ENCODED_LEN);
    }
}

//! MIDI byte sources, allows for in memory byte spans or files to be read
//!
//! Every decoder in this crate pulls bytes through the [`MidiSource`] trait, which knows how to
//! assemble big endian integers, chunk labels and variable length quantities from a stream of
//! single bytes. [`MidiStream`] wraps any byte iterator and keeps count of how far it has read so
//! that failures can be reported with an offset.

use std::{
    convert::Infallible,
    fs::File,
    io::{self, BufReader, Read},
    path::Path,
};

use crate::error::{Result, SmfError};

/// Largest number of 7 bit groups a variable length quantity may span
pub const MAX_VLQ_BYTES: usize = 4;

/// Largest value representable as a variable length quantity, `0x0FFF_FFFF`
pub const MAX_VLQ_VALUE: u32 = (1 << (7 * MAX_VLQ_BYTES)) - 1;

/// Upper bound on what [`MidiSource::read_bytes`] allocates up front
const PREALLOCATION_CAP: usize = 4096;

/// A pull based source of MIDI bytes.
///
/// Implementors only provide single byte access and a position, every multi byte primitive is
/// built on top of those two.
pub trait MidiSource {
    /// Yields the next byte, or `None` once the source is exhausted
    fn next_byte(&mut self) -> Option<u8>;

    /// Number of bytes consumed so far
    fn position(&self) -> usize;

    /// Reads a single byte, failing with [`SmfError::TruncatedInput`] at the end of input
    fn read_byte(&mut self) -> Result<u8> {
        self.next_byte().ok_or(SmfError::TruncatedInput)
    }

    /// Reads exactly `n` bytes
    fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let mut bytes = Vec::with_capacity(n.min(PREALLOCATION_CAP));
        for _ in 0..n {
            bytes.push(self.read_byte()?);
        }

        Ok(bytes)
    }

    /// Reads a 4 character chunk label such as `MThd`
    fn read_label(&mut self) -> Result<[u8; 4]> {
        let mut label = [0; 4];
        for byte in label.iter_mut() {
            *byte = self.read_byte()?;
        }

        Ok(label)
    }

    /// Reads an `n_bytes` wide unsigned integer, most significant byte first
    fn read_uint(&mut self, n_bytes: usize) -> Result<u32> {
        if !(1..=4).contains(&n_bytes) {
            return Err(SmfError::InvalidWidth(n_bytes));
        }

        let mut value = 0u32;
        for _ in 0..n_bytes {
            value = (value << 8) | self.read_byte()? as u32;
        }

        Ok(value)
    }

    /// Reads a variable length quantity, returning the value and how many bytes it spanned
    fn read_vlq(&mut self) -> Result<(u32, usize)> {
        const MASK: u8 = 0x7F;

        let mut value = 0u32;
        for consumed in 1..=MAX_VLQ_BYTES {
            let byte = self.read_byte()?;
            value = (value << 7) | (byte & MASK) as u32;

            if !msb_is_one(byte) {
                return Ok((value, consumed));
            }
        }

        Err(SmfError::VlqOverflow)
    }
}

/// Returns true if the msb of a byte is 1
pub(crate) fn msb_is_one(byte: u8) -> bool {
    byte >> 7 == 1
}

/// A position tracking cursor over any byte iterator
#[derive(Debug, Clone)]
pub struct MidiStream<ITER> {
    /// Underlying bytes
    bytes: ITER,
    /// Bytes yielded so far
    position: usize,
}

impl<ITER> MidiStream<ITER>
where
    ITER: Iterator<Item = u8>,
{
    /// Wraps a byte iterator, starting at position 0
    pub fn new<T>(bytes: T) -> Self
    where
        T: IntoIterator<IntoIter = ITER>,
    {
        Self {
            bytes: bytes.into_iter(),
            position: 0,
        }
    }
}

impl<'a> MidiStream<core::iter::Copied<core::slice::Iter<'a, u8>>> {
    /// Streams a borrowed byte slice
    pub fn from_slice(bytes: &'a [u8]) -> Self {
        Self::new(bytes.iter().copied())
    }
}

impl<ITER> MidiSource for MidiStream<ITER>
where
    ITER: Iterator<Item = u8>,
{
    fn next_byte(&mut self) -> Option<u8> {
        let byte = self.bytes.next()?;
        self.position += 1;
        Some(byte)
    }

    fn position(&self) -> usize {
        self.position
    }
}

impl<SOURCE> MidiSource for &mut SOURCE
where
    SOURCE: MidiSource + ?Sized,
{
    fn next_byte(&mut self) -> Option<u8> {
        (**self).next_byte()
    }

    fn position(&self) -> usize {
        (**self).position()
    }
}

/// Streams bytes from any [`Read`] through a [`BufReader`].
///
/// The first I/O failure ends the stream and is returned by the next read as [`SmfError::Io`],
/// instead of looking like the input simply ran out.
#[derive(Debug)]
pub struct MidiReader<R> {
    /// Buffered bytes of the underlying reader
    bytes: io::Bytes<BufReader<R>>,
    /// Bytes yielded so far
    position: usize,
    /// Failure not yet handed to a caller
    error: Option<io::Error>,
    /// Set once the reader has failed
    failed: bool,
}

impl<R> MidiReader<R>
where
    R: Read,
{
    /// Wraps a reader, starting at position 0
    pub fn new(reader: R) -> Self {
        Self {
            bytes: BufReader::new(reader).bytes(),
            position: 0,
            error: None,
            failed: false,
        }
    }
}

impl<R> MidiSource for MidiReader<R>
where
    R: Read,
{
    fn next_byte(&mut self) -> Option<u8> {
        if self.failed {
            return None;
        }

        match self.bytes.next()? {
            Ok(byte) => {
                self.position += 1;
                Some(byte)
            }
            Err(err) => {
                self.failed = true;
                self.error = Some(err);
                None
            }
        }
    }

    fn position(&self) -> usize {
        self.position
    }

    fn read_byte(&mut self) -> Result<u8> {
        match self.next_byte() {
            Some(byte) => Ok(byte),
            None => Err(self
                .error
                .take()
                .map_or(SmfError::TruncatedInput, SmfError::Io)),
        }
    }
}

/// Trait that allows for different types to be translated to a MIDI parseable format
pub trait MidiReadable {
    /// Error type that may be returned while opening the source
    type Error;
    /// Creates a byte source from the type
    fn get_midi_bytes(self) -> Result<impl MidiSource, Self::Error>;
}

/// Wrapper struct to allow passing `Vec<u8>` to the [`MidiReadable`] trait
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MidiData(pub Vec<u8>);

impl From<Vec<u8>> for MidiData {
    fn from(value: Vec<u8>) -> Self {
        Self(value)
    }
}

impl MidiReadable for MidiData {
    type Error = Infallible;
    fn get_midi_bytes(self) -> Result<impl MidiSource, Self::Error> {
        Ok(MidiStream::new(self.0))
    }
}

impl<PATH> MidiReadable for PATH
where
    PATH: AsRef<Path>,
{
    type Error = SmfError;
    fn get_midi_bytes(self) -> Result<impl MidiSource, Self::Error> {
        let path = self.as_ref();
        let file = File::open(path)?;
        tracing::debug!(path = %path.display(), "opened MIDI file");

        Ok(MidiReader::new(file))
    }
}

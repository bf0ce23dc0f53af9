//! The `MidiWriteable` trait is central to translating data from this crate's representations
//! back into raw MIDI bytes. If [`MidiSource`](crate::reader::MidiSource) is about parsing MIDI
//! bytes *into* Rust types, `MidiWriteable` does the opposite, taking those types and converting
//! them into the canonical MIDI byte format through a [`MidiSink`].

use crate::{
    error::{Result, SmfError},
    reader::MAX_VLQ_VALUE,
};

/// A byte sink that knows the primitive encodings of the SMF format.
///
/// Every method returns the number of bytes written so callers can keep running offsets.
/// Implemented for every [`std::io::Write`], which covers `Vec<u8>` and `File`.
pub trait MidiSink {
    /// Writes raw bytes unchanged
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize>;

    /// Writes a single byte
    fn write_byte(&mut self, byte: u8) -> Result<usize> {
        self.write_bytes(&[byte])
    }

    /// Writes a 4 character chunk label
    fn write_label(&mut self, label: [u8; 4]) -> Result<usize> {
        self.write_bytes(&label)
    }

    /// Writes the low `n_bytes` of `value`, most significant byte first.
    ///
    /// Bits above `n_bytes * 8` are dropped without complaint.
    fn write_uint(&mut self, value: u32, n_bytes: usize) -> Result<usize> {
        if !(1..=4).contains(&n_bytes) {
            return Err(SmfError::InvalidWidth(n_bytes));
        }

        let bytes = value.to_be_bytes();
        self.write_bytes(&bytes[4 - n_bytes..])
    }

    /// Writes `value` as a minimal variable length quantity
    fn write_vlq(&mut self, value: u32) -> Result<usize> {
        let bytes = to_midi_vlq(value)?;
        self.write_bytes(&bytes)
    }
}

impl<W> MidiSink for W
where
    W: std::io::Write + ?Sized,
{
    fn write_bytes(&mut self, bytes: &[u8]) -> Result<usize> {
        self.write_all(bytes)?;
        Ok(bytes.len())
    }
}

/// Goes backwards from a value to its variable length byte representation
pub fn to_midi_vlq(mut value: u32) -> Result<Vec<u8>> {
    if value > MAX_VLQ_VALUE {
        return Err(SmfError::VlqOverflow);
    }

    let mut bytes = Vec::with_capacity(4);
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;

        // Only the least significant group, pushed first, goes without a continuation bit
        if !bytes.is_empty() {
            byte |= 0x80;
        }

        bytes.push(byte);

        if value == 0 {
            break;
        }
    }

    bytes.reverse();
    Ok(bytes)
}

/// A trait for types that can be encoded as MIDI-format bytes.
///
/// Implemented by headers, events, tracks and whole files. This trait makes it straightforward to
/// transform parsed or constructed MIDI data back into a binary stream for writing to a file or
/// an in memory buffer.
pub trait MidiWriteable {
    /// Writes the MIDI encoding of `self`, returning the number of bytes written
    fn write_midi<W>(&self, sink: &mut W) -> Result<usize>
    where
        W: MidiSink + ?Sized;

    /// Converts the data to a MIDI format byte sequence
    fn to_midi_bytes(&self) -> Result<Vec<u8>> {
        let mut bytes = vec![];
        self.write_midi(&mut bytes)?;
        Ok(bytes)
    }
}

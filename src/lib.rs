//! # smf-codec
//!
//! A byte exact codec for the Standard MIDI File format. It reads and writes the `MThd` header
//! chunk, `MTrk` track chunks and the channel, meta and system exclusive events inside them, so
//! that an unmodified file written back out is identical to the one read in.
//!
//! ## Overview
//!
//! MIDI files are structured as a series of chunks. Each chunk contains a 4-character ASCII
//! type identifier and a 32-bit length that specifies how many bytes of data follow. The header
//! chunk describes the file, every track chunk holds a stream of events, and every event is
//! preceded by a variable length delta time.
//!
//! - **Typed failures**: every malformed input surfaces as an [`SmfError`], never a panic.
//! - **Bounded decoding**: meta payloads and sysex scans are capped by [`DecodeLimits`].
//! - **Pull based**: decoders read from any [`MidiSource`], writers push into any [`MidiSink`].
//!
//! ## Example Usage
//!
//! ```rust
//! use smf_codec::{read_event, read_file_header, read_track_header, reader::MidiStream};
//!
//! let bytes = [
//!     0x4D, 0x54, 0x68, 0x64, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0x01, 0x00, 0x60,
//!     0x4D, 0x54, 0x72, 0x6B, 0x00, 0x00, 0x00, 0x08,
//!     0x00, 0x90, 0x3C, 0x40, 0x00, 0xFF, 0x2F, 0x00,
//! ];
//! let mut source = MidiStream::from_slice(&bytes);
//!
//! let header = read_file_header(&mut source)?;
//! for _ in 0..header.track_count {
//!     let track = read_track_header(&mut source)?;
//!     let mut consumed = 0;
//!     while consumed < track.byte_length as usize {
//!         let (event, len) = read_event(&mut source)?;
//!         println!("{event:?}");
//!         consumed += len;
//!     }
//! }
//! # Ok::<(), smf_codec::SmfError>(())
//! ```
//!
//! For whole files, [`Smf::open`] and [`Smf::save`] do the chunk bookkeeping themselves.
//!
//! ## Library Structure
//!
//! - **[`reader`]**: byte sources, big endian and variable length integer decoding.
//! - **[`writer`]**: byte sinks, their encodings, and the [`MidiWriteable`] trait.
//! - **[`chunk`]**: chunk framing, the header chunk and track chunks with their events.
//! - **[`smf`]**: whole file reading and writing.
//!
//! Running status, where a status byte is omitted and the previous one reused, is not decoded: a
//! data byte in status position is reported as [`SmfError::UnknownEventType`].

pub mod chunk;
pub mod error;
pub mod limits;
pub mod reader;
pub mod smf;
pub mod writer;

pub use chunk::{
    header::{Division, FileHeader, Format, SmpteTicks},
    track::{
        event::MidiEvent, meta::MetaEvent, sysex::SysexEvent, Event, MTrkEvent, TrackChunk,
        TrackEvents, TrackHeader,
    },
    Chunk,
};
pub use error::{Result, SmfError};
pub use limits::DecodeLimits;
pub use reader::{MidiReader, MidiSource, MidiStream};
pub use smf::Smf;
pub use writer::{MidiSink, MidiWriteable};

/// Reads an `n_bytes` wide big endian unsigned integer, `n_bytes` being 1 to 4
pub fn read_uint<S>(source: &mut S, n_bytes: usize) -> Result<u32>
where
    S: MidiSource + ?Sized,
{
    source.read_uint(n_bytes)
}

/// Writes the low `n_bytes` of `value` big endian, silently dropping higher bits
pub fn write_uint<W>(sink: &mut W, value: u32, n_bytes: usize) -> Result<usize>
where
    W: MidiSink + ?Sized,
{
    sink.write_uint(value, n_bytes)
}

/// Reads a variable length quantity, returning it with the number of bytes consumed
pub fn read_vlq<S>(source: &mut S) -> Result<(u32, usize)>
where
    S: MidiSource + ?Sized,
{
    source.read_vlq()
}

/// Writes a minimal variable length quantity, returning the number of bytes written
pub fn write_vlq<W>(sink: &mut W, value: u32) -> Result<usize>
where
    W: MidiSink + ?Sized,
{
    sink.write_vlq(value)
}

/// Reads and validates the `MThd` chunk
pub fn read_file_header<S>(source: &mut S) -> Result<FileHeader>
where
    S: MidiSource + ?Sized,
{
    FileHeader::read(source)
}

/// Writes the `MThd` chunk, returning the number of bytes written
pub fn write_file_header<W>(sink: &mut W, header: &FileHeader) -> Result<usize>
where
    W: MidiSink + ?Sized,
{
    header.write_midi(sink)
}

/// Reads an `MTrk` chunk header
pub fn read_track_header<S>(source: &mut S) -> Result<TrackHeader>
where
    S: MidiSource + ?Sized,
{
    TrackHeader::read(source)
}

/// Writes an `MTrk` chunk header, returning the number of bytes written
pub fn write_track_header<W>(sink: &mut W, header: &TrackHeader) -> Result<usize>
where
    W: MidiSink + ?Sized,
{
    header.write_midi(sink)
}

/// Reads one event with the default [`DecodeLimits`], returning it with the bytes it spanned
pub fn read_event<S>(source: &mut S) -> Result<(MTrkEvent, usize)>
where
    S: MidiSource + ?Sized,
{
    MTrkEvent::read(source, &DecodeLimits::default())
}

/// Reads one event under explicit limits
pub fn read_event_with<S>(source: &mut S, limits: &DecodeLimits) -> Result<(MTrkEvent, usize)>
where
    S: MidiSource + ?Sized,
{
    MTrkEvent::read(source, limits)
}

/// Writes one event, delta time first, returning the number of bytes written
pub fn write_event<W>(sink: &mut W, event: &MTrkEvent) -> Result<usize>
where
    W: MidiSink + ?Sized,
{
    event.write_midi(sink)
}

#[cfg(test)]
mod tests {
    use crate::{
        read_event, read_file_header, read_track_header, read_vlq, write_event,
        write_file_header, write_track_header, Event, MidiStream, SmfError,
    };

    #[test]
    fn events_are_read_until_the_track_is_consumed() {
        let bytes = [
            0x4D, 0x54, 0x68, 0x64, 0x00, 0x00, 0x00, 0x06, 0x00, 0x00, 0x00, 0x01, 0x00, 0x60,
            0x4D, 0x54, 0x72, 0x6B, 0x00, 0x00, 0x00, 0x0C, 0x00, 0xB0, 0x07, 0x64, 0x60, 0xE0,
            0x00, 0x40, 0x00, 0xFF, 0x2F, 0x00,
        ];
        let mut source = MidiStream::from_slice(&bytes);
        let mut sink = vec![];

        let header = read_file_header(&mut source).unwrap();
        write_file_header(&mut sink, &header).unwrap();

        let track = read_track_header(&mut source).unwrap();
        write_track_header(&mut sink, &track).unwrap();

        let mut consumed = 0;
        let mut kinds = vec![];
        while consumed < track.byte_length as usize {
            let (event, len) = read_event(&mut source).unwrap();
            consumed += len;
            kinds.push(matches!(event.event, Event::MetaEvent(_)));
            assert_eq!(write_event(&mut sink, &event).unwrap(), len);
        }

        assert_eq!(consumed, 12);
        assert_eq!(kinds, vec![false, false, true]);
        assert_eq!(sink, bytes);
    }

    #[test]
    fn truncated_vlq_reports_truncated_input() {
        let mut source = MidiStream::from_slice(&[0xFF]);
        assert!(matches!(read_vlq(&mut source), Err(SmfError::TruncatedInput)));
    }
}

//! Meta Event Structs and Parsing

use std::borrow::Cow;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, SmfError},
    limits::DecodeLimits,
    reader::MidiSource,
    writer::{to_midi_vlq, MidiSink, MidiWriteable},
};

/// A meta event as it appears on the wire: a type byte and an opaque payload.
///
/// The payload is kept raw so that writing an unmodified event reproduces its bytes exactly. Use
/// [`MetaEvent::message`] for a typed view.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MetaEvent {
    /// Meta type byte, the one following `0xFF`
    pub meta_type: u8,
    /// Exactly as many bytes as the event's length field declares
    pub payload: Vec<u8>,
}

impl MetaEvent {
    /// Status byte introducing every meta event
    pub const STATUS: u8 = 0xFF;

    /// Sequence Number tag
    pub const SEQUENCE_NUMBER: u8 = 0x00;
    /// Text tag
    pub const TEXT: u8 = 0x01;
    /// Copyright tag
    pub const COPYRIGHT: u8 = 0x02;
    /// Sequence or track name tag
    pub const TRACK_NAME: u8 = 0x03;
    /// Instrument name tag
    pub const INSTRUMENT_NAME: u8 = 0x04;
    /// Lyric tag
    pub const LYRIC: u8 = 0x05;
    /// Marker tag
    pub const MARKER: u8 = 0x06;
    /// Cue point tag
    pub const CUE_POINT: u8 = 0x07;
    /// MIDI channel prefix tag
    pub const MIDI_CHANNEL_PREFIX: u8 = 0x20;
    /// End of track tag
    pub const END_OF_TRACK: u8 = 0x2F;
    /// Tempo tag
    pub const TEMPO: u8 = 0x51;
    /// SMPTE offset tag
    pub const SMPTE_OFFSET: u8 = 0x54;
    /// Time signature tag
    pub const TIME_SIGNATURE: u8 = 0x58;
    /// Key signature tag
    pub const KEY_SIGNATURE: u8 = 0x59;
    /// Sequencer specific tag
    pub const SEQUENCER_SPECIFIC: u8 = 0x7F;

    /// Creates a meta event from its raw parts
    pub fn new(meta_type: u8, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            meta_type,
            payload: payload.into(),
        }
    }

    /// The end of track marker, `FF 2F 00`
    pub fn end_of_track() -> Self {
        Self {
            meta_type: Self::END_OF_TRACK,
            payload: Vec::new(),
        }
    }

    /// A tempo change in microseconds per quarter note. Only the low 24 bits are kept
    pub fn tempo(micros_per_quarter: u32) -> Self {
        Self::new(Self::TEMPO, &micros_per_quarter.to_be_bytes()[1..])
    }

    /// A sequence or track name
    pub fn track_name(name: &str) -> Self {
        Self::new(Self::TRACK_NAME, name.as_bytes())
    }

    /// A free text event
    pub fn text(text: &str) -> Self {
        Self::new(Self::TEXT, text.as_bytes())
    }

    /// True for the `FF 2F` end of track marker
    pub fn is_end_of_track(&self) -> bool {
        self.meta_type == Self::END_OF_TRACK
    }

    /// Payload decoded as text for the text family of events (0x01 to 0x07).
    ///
    /// Invalid UTF-8 is replaced rather than rejected since most files predate it.
    pub fn as_text(&self) -> Option<Cow<'_, str>> {
        (Self::TEXT..=Self::CUE_POINT)
            .contains(&self.meta_type)
            .then(|| String::from_utf8_lossy(&self.payload))
    }

    /// Size of the event on the wire, `0xFF` included, delta time excluded
    pub fn encoded_len(&self) -> Result<usize> {
        let length = payload_length(&self.payload)?;
        Ok(2 + to_midi_vlq(length)?.len() + self.payload.len())
    }

    /// Reads a meta event whose `0xFF` status has already been consumed
    pub fn read<S>(source: &mut S, limits: &DecodeLimits) -> Result<Self>
    where
        S: MidiSource + ?Sized,
    {
        let meta_type = source.read_byte()?;
        let (length, _) = source.read_vlq()?;

        if length as usize > limits.max_meta_payload {
            return Err(SmfError::PayloadTooLarge {
                length,
                limit: limits.max_meta_payload,
            });
        }

        let payload = source.read_bytes(length as usize)?;
        Ok(Self { meta_type, payload })
    }

    /// Typed view of the event.
    ///
    /// Known types whose payload has the wrong length fail with
    /// [`SmfError::InvalidMetaEvent`]; unknown types are passed through untouched.
    pub fn message(&self) -> Result<MetaMessage<'_>> {
        let data = self.payload.as_slice();
        let invalid = || SmfError::InvalidMetaEvent {
            meta_type: self.meta_type,
            length: data.len(),
        };

        macro_rules! meta_event {
            ($len:expr_2021, $name:expr_2021, |$bytes:ident| $value:expr_2021) => {{
                let $bytes = <[u8; $len]>::try_from(data).map_err(|_| invalid())?;
                Ok($name($value))
            }};
        }

        match self.meta_type {
            Self::SEQUENCE_NUMBER => {
                meta_event!(2, MetaMessage::SequenceNumber, |bytes| u16::from_be_bytes(
                    bytes
                ))
            }
            Self::TEXT => Ok(MetaMessage::Text(data)),
            Self::COPYRIGHT => Ok(MetaMessage::Copyright(data)),
            Self::TRACK_NAME => Ok(MetaMessage::TrackName(data)),
            Self::INSTRUMENT_NAME => Ok(MetaMessage::InstrumentName(data)),
            Self::LYRIC => Ok(MetaMessage::Lyric(data)),
            Self::MARKER => Ok(MetaMessage::Marker(data)),
            Self::CUE_POINT => Ok(MetaMessage::CuePoint(data)),
            Self::MIDI_CHANNEL_PREFIX => {
                meta_event!(1, MetaMessage::MidiChannelPrefix, |bytes| bytes[0])
            }
            Self::END_OF_TRACK if data.is_empty() => Ok(MetaMessage::EndOfTrack),
            Self::END_OF_TRACK => Err(invalid()),
            Self::TEMPO => meta_event!(3, MetaMessage::Tempo, |bytes| u32::from_be_bytes([
                0, bytes[0], bytes[1], bytes[2]
            ])),
            Self::SMPTE_OFFSET => meta_event!(5, MetaMessage::SmpteOffset, |bytes| SmpteOffset {
                hours: bytes[0],
                minutes: bytes[1],
                seconds: bytes[2],
                frames: bytes[3],
                subframes: bytes[4],
            }),
            Self::TIME_SIGNATURE => {
                meta_event!(4, MetaMessage::TimeSignature, |bytes| TimeSignature {
                    numerator: bytes[0],
                    denominator_power: bytes[1],
                    clocks_per_click: bytes[2],
                    thirty_second_notes_per_quarter: bytes[3],
                })
            }
            Self::KEY_SIGNATURE => {
                meta_event!(2, MetaMessage::KeySignature, |bytes| KeySignature {
                    sharps_flats: bytes[0] as i8,
                    minor: bytes[1] != 0,
                })
            }
            Self::SEQUENCER_SPECIFIC => Ok(MetaMessage::SequencerSpecific(data)),
            other => Ok(MetaMessage::Unknown(other, data)),
        }
    }
}

/// Converts a payload length into the value of its length field
fn payload_length(payload: &[u8]) -> Result<u32> {
    u32::try_from(payload.len()).map_err(|_| SmfError::VlqOverflow)
}

impl MidiWriteable for MetaEvent {
    fn write_midi<W>(&self, sink: &mut W) -> Result<usize>
    where
        W: MidiSink + ?Sized,
    {
        let length = payload_length(&self.payload)?;
        // Encode the length before touching the sink so an oversized payload writes nothing
        let length = to_midi_vlq(length)?;

        let mut written = sink.write_bytes(&[Self::STATUS, self.meta_type])?;
        written += sink.write_bytes(&length)?;
        written += sink.write_bytes(&self.payload)?;

        Ok(written)
    }
}

/// A decoded view over a [`MetaEvent`] payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaMessage<'a> {
    /// Sequence Number, tag 0x00
    SequenceNumber(u16),
    /// Text metadata, tag 0x01
    Text(&'a [u8]),
    /// Copyright, tag 0x02
    Copyright(&'a [u8]),
    /// Track name, tag 0x03
    TrackName(&'a [u8]),
    /// Instrument name, tag 0x04
    InstrumentName(&'a [u8]),
    /// Lyric, tag 0x05
    Lyric(&'a [u8]),
    /// Marker, tag 0x06
    Marker(&'a [u8]),
    /// Cue Point, tag 0x07
    CuePoint(&'a [u8]),
    /// Midi Channel Prefix, tag 0x20
    MidiChannelPrefix(u8),
    /// End of Track Identifier, tag 0x2F
    EndOfTrack,
    /// Tempo in microseconds per quarter note, tag 0x51
    Tempo(u32),
    /// Smpte Offset, tag 0x54
    SmpteOffset(SmpteOffset),
    /// Time signature, tag 0x58
    TimeSignature(TimeSignature),
    /// Key Signature, tag 0x59
    KeySignature(KeySignature),
    /// Sequencer Specific, tag 0x7f
    SequencerSpecific(&'a [u8]),
    /// Any other meta type
    Unknown(u8, &'a [u8]),
}

/// A key signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct KeySignature {
    /// Sharps when positive, flats when negative
    pub sharps_flats: i8,
    /// True if in minor, false if in major
    pub minor: bool,
}

/// An SMPTE Offset
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SmpteOffset {
    /// Hours of offset
    pub hours: u8,
    /// Minutes of offset
    pub minutes: u8,
    /// Seconds of offset
    pub seconds: u8,
    /// Frames of offset
    pub frames: u8,
    /// Subframes of offset
    pub subframes: u8,
}

/// A Time Signature
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TimeSignature {
    /// The time signature's numerator
    pub numerator: u8,
    /// The denominator as a power of two, 2 means quarter notes
    pub denominator_power: u8,
    /// MIDI clocks per metronome click
    pub clocks_per_click: u8,
    /// Thirty second notes per quarter
    pub thirty_second_notes_per_quarter: u8,
}

impl TimeSignature {
    /// The denominator itself, `None` if the power overflows a `u32`
    pub fn denominator(&self) -> Option<u32> {
        1u32.checked_shl(self.denominator_power as u32)
    }
}

//! Channel voice messages, the only events that make sound

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, SmfError},
    reader::MidiSource,
    writer::{MidiSink, MidiWriteable},
};

/// Mask for the 7 significant bits of a data byte
const DATA_MASK: u8 = 0x7F;

/// A MIDI channel message, tagged by the high nibble of its status byte.
///
/// The first field of every variant is the channel, 0 to 15. Writing a message with a larger
/// channel fails with [`SmfError::InvalidChannel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum MidiEvent {
    /// Turn Off event
    /// This message is sent when a note is released
    NoteOff(u8, NoteMeta),
    /// Turn On event
    /// This message is sent when a note is depressed
    NoteOn(u8, NoteMeta),
    /// Polyphonic Key Pressure
    /// This message is most often sent by pressing down a key after it "bottoms out"
    PolyphonicKeyPressure(u8, NoteMeta),
    /// Control change
    /// This message is sent when a controller value changes. Controllers include devices such as
    /// pedals and levers. Certain controller numbers are reserved.
    ControlChange(u8, ControlChange),
    /// Program change.
    /// This message is sent when the patch number changes
    ProgramChange(u8, u8),
    /// Channel Pressure
    /// This message is most often sent by pressing down on a key after it "bottoms out"
    ChannelPressure(u8, u8),
    /// Pitch Wheel Change
    /// This message is sent to indicate a change in the pitch wheel as measured by a fourteen bit
    /// value.
    PitchWheelChange(u8, u16),
}

impl MidiEvent {
    /// High nibble of a Note Off status
    pub const NOTE_OFF: u8 = 0b1000;
    /// High nibble of a Note On status
    pub const NOTE_ON: u8 = 0b1001;
    /// High nibble of a Polyphonic Key Pressure status
    pub const POLYPHONIC_KEY_PRESSURE: u8 = 0b1010;
    /// High nibble of a Control Change status
    pub const CONTROL_CHANGE: u8 = 0b1011;
    /// High nibble of a Program Change status
    pub const PROGRAM_CHANGE: u8 = 0b1100;
    /// High nibble of a Channel Pressure status
    pub const CHANNEL_PRESSURE: u8 = 0b1101;
    /// High nibble of a Pitch Wheel Change status
    pub const PITCH_WHEEL_CHANGE: u8 = 0b1110;

    /// The channel this message addresses
    pub fn channel(&self) -> u8 {
        match *self {
            Self::NoteOff(channel, _)
            | Self::NoteOn(channel, _)
            | Self::PolyphonicKeyPressure(channel, _)
            | Self::ControlChange(channel, _)
            | Self::ProgramChange(channel, _)
            | Self::ChannelPressure(channel, _)
            | Self::PitchWheelChange(channel, _) => channel,
        }
    }

    /// The high nibble identifying the message kind
    pub fn kind(&self) -> u8 {
        match self {
            Self::NoteOff(..) => Self::NOTE_OFF,
            Self::NoteOn(..) => Self::NOTE_ON,
            Self::PolyphonicKeyPressure(..) => Self::POLYPHONIC_KEY_PRESSURE,
            Self::ControlChange(..) => Self::CONTROL_CHANGE,
            Self::ProgramChange(..) => Self::PROGRAM_CHANGE,
            Self::ChannelPressure(..) => Self::CHANNEL_PRESSURE,
            Self::PitchWheelChange(..) => Self::PITCH_WHEEL_CHANGE,
        }
    }

    /// The full status byte, kind in the high nibble and channel in the low one
    pub fn status_byte(&self) -> Result<u8> {
        match self.channel() {
            channel @ 0..=0x0F => Ok((self.kind() << 4) | channel),
            channel => Err(SmfError::InvalidChannel(channel)),
        }
    }

    /// Number of data bytes following a status with the given high nibble, if it is a channel
    /// message at all
    pub fn data_len(kind: u8) -> Option<usize> {
        match kind {
            Self::PROGRAM_CHANGE | Self::CHANNEL_PRESSURE => Some(1),
            Self::NOTE_OFF
            | Self::NOTE_ON
            | Self::POLYPHONIC_KEY_PRESSURE
            | Self::CONTROL_CHANGE
            | Self::PITCH_WHEEL_CHANGE => Some(2),
            _ => None,
        }
    }

    /// Size of the message on the wire, status byte included
    pub fn encoded_len(&self) -> usize {
        1 + Self::data_len(self.kind()).unwrap_or_default()
    }

    /// Reads the data bytes of a message whose status byte has already been consumed
    pub fn read<S>(status: u8, source: &mut S) -> Result<Self>
    where
        S: MidiSource + ?Sized,
    {
        let channel = status & 0x0F;

        match status >> 4 {
            Self::NOTE_OFF => Ok(Self::NoteOff(channel, NoteMeta::read(source)?)),
            Self::NOTE_ON => Ok(Self::NoteOn(channel, NoteMeta::read(source)?)),
            Self::POLYPHONIC_KEY_PRESSURE => Ok(Self::PolyphonicKeyPressure(
                channel,
                NoteMeta::read(source)?,
            )),
            Self::CONTROL_CHANGE => Ok(Self::ControlChange(
                channel,
                ControlChange {
                    controller_number: source.read_byte()?,
                    new_value: source.read_byte()?,
                },
            )),
            Self::PROGRAM_CHANGE => Ok(Self::ProgramChange(channel, source.read_byte()?)),
            Self::CHANNEL_PRESSURE => Ok(Self::ChannelPressure(channel, source.read_byte()?)),
            Self::PITCH_WHEEL_CHANGE => {
                // Least significant 7 bits arrive first
                let low = source.read_byte()? & DATA_MASK;
                let high = source.read_byte()? & DATA_MASK;

                Ok(Self::PitchWheelChange(
                    channel,
                    ((high as u16) << 7) | low as u16,
                ))
            }
            _ => Err(SmfError::UnknownEventType(status)),
        }
    }
}

impl MidiWriteable for MidiEvent {
    fn write_midi<W>(&self, sink: &mut W) -> Result<usize>
    where
        W: MidiSink + ?Sized,
    {
        let written = sink.write_byte(self.status_byte()?)?;

        let data_written = match *self {
            Self::NoteOff(_, note)
            | Self::NoteOn(_, note)
            | Self::PolyphonicKeyPressure(_, note) => {
                sink.write_bytes(&[note.key, note.velocity])?
            }
            Self::ControlChange(_, change) => {
                sink.write_bytes(&[change.controller_number, change.new_value])?
            }
            Self::ProgramChange(_, value) | Self::ChannelPressure(_, value) => {
                sink.write_byte(value)?
            }
            Self::PitchWheelChange(_, value) => {
                let low = (value & DATA_MASK as u16) as u8;
                let high = ((value >> 7) & DATA_MASK as u16) as u8;
                sink.write_bytes(&[low, high])?
            }
        };

        Ok(written + data_written)
    }
}

/// Metadata for a note's relative info, its key and velocity
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct NoteMeta {
    /// Note key
    pub key: u8,
    /// Note velocity, or pressure for polyphonic key pressure
    pub velocity: u8,
}

impl NoteMeta {
    /// Reads the key then the velocity byte
    fn read<S>(source: &mut S) -> Result<Self>
    where
        S: MidiSource + ?Sized,
    {
        Ok(Self {
            key: source.read_byte()?,
            velocity: source.read_byte()?,
        })
    }
}

/// Metadata for changing a controller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ControlChange {
    /// Controller number
    pub controller_number: u8,
    /// New value
    pub new_value: u8,
}

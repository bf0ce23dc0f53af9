//! Track chunk data enums and structs

use event::MidiEvent;
use meta::MetaEvent;
use sysex::SysexEvent;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    chunk::{chunk_types::TRACK_DATA_CHUNK, Chunk},
    error::{Result, SmfError},
    limits::DecodeLimits,
    reader::MidiSource,
    writer::{to_midi_vlq, MidiSink, MidiWriteable},
};

pub mod event;
pub mod meta;
pub mod sysex;

/// The `MTrk` chunk header, announcing how many bytes of events follow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackHeader {
    /// Exact number of bytes in the event stream that follows
    pub byte_length: u32,
}

impl TrackHeader {
    /// Size of a track header on the wire
    pub const ENCODED_LEN: usize = Chunk::ENCODED_LEN;

    /// Creates a header for an event stream of `byte_length` bytes
    pub const fn new(byte_length: u32) -> Self {
        Self { byte_length }
    }

    /// Reads an `MTrk` label and the length that follows.
    ///
    /// The length is not checked against what is left in the source, a short stream shows up as
    /// [`SmfError::TruncatedInput`] once its events are read.
    pub fn read<S>(source: &mut S) -> Result<Self>
    where
        S: MidiSource + ?Sized,
    {
        let chunk = Chunk::read_expecting(source, TRACK_DATA_CHUNK)?;
        tracing::debug!(byte_length = chunk.length(), "read track chunk");

        Ok(Self {
            byte_length: chunk.length(),
        })
    }
}

impl MidiWriteable for TrackHeader {
    fn write_midi<W>(&self, sink: &mut W) -> Result<usize>
    where
        W: MidiSink + ?Sized,
    {
        Chunk::new(TRACK_DATA_CHUNK, self.byte_length).write_midi(sink)
    }
}

/// A MIDI Event with a DeltaTime and an attached Event
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MTrkEvent {
    /// How many ticks to wait after the previous event before this one occurs. Free to adjust,
    /// the event itself is unaffected.
    pub delta_time: u32,
    /// The event that occurs after the delta time is waited for
    pub event: Event,
}

impl MTrkEvent {
    /// Pairs an event with its delta time
    pub fn new(delta_time: u32, event: impl Into<Event>) -> Self {
        Self {
            delta_time,
            event: event.into(),
        }
    }

    /// Reads one event, returning it with the number of bytes it spanned
    pub fn read<S>(source: &mut S, limits: &DecodeLimits) -> Result<(Self, usize)>
    where
        S: MidiSource + ?Sized,
    {
        let (delta_time, delta_len) = source.read_vlq()?;
        let (event, event_len) = Event::read(source, limits)?;
        let consumed = delta_len + event_len;

        tracing::trace!(delta_time, kind = event.kind_name(), consumed, "read event");

        Ok((Self { delta_time, event }, consumed))
    }

    /// Size of the event on the wire, delta time included
    pub fn encoded_len(&self) -> Result<usize> {
        Ok(to_midi_vlq(self.delta_time)?.len() + self.event.encoded_len()?)
    }
}

impl MidiWriteable for MTrkEvent {
    fn write_midi<W>(&self, sink: &mut W) -> Result<usize>
    where
        W: MidiSink + ?Sized,
    {
        // Surface encoding errors before the delta time reaches the sink
        self.event.encoded_len()?;

        let written = sink.write_vlq(self.delta_time)?;
        Ok(written + self.event.write_midi(sink)?)
    }
}

/// Any event that may occur
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub enum Event {
    /// A midi channel event
    MidiEvent(MidiEvent),
    /// A system exclusive event
    SysexEvent(SysexEvent),
    /// Specifies non-MIDI information useful to this format or to sequencers
    MetaEvent(MetaEvent),
}

impl Event {
    /// Reads the status byte and dispatches on it, returning the event and the bytes it spanned
    pub fn read<S>(source: &mut S, limits: &DecodeLimits) -> Result<(Self, usize)>
    where
        S: MidiSource + ?Sized,
    {
        let start = source.position();
        let status = source.read_byte()?;

        let event = match status {
            MetaEvent::STATUS => Event::MetaEvent(MetaEvent::read(source, limits)?),
            status if SysexEvent::is_sysex_status(status) => {
                Event::SysexEvent(SysexEvent::read(status, source, limits)?)
            }
            status => Event::MidiEvent(MidiEvent::read(status, source)?),
        };

        Ok((event, source.position() - start))
    }

    /// Size of the event on the wire, delta time excluded.
    ///
    /// Fails for events that cannot be written back faithfully.
    pub fn encoded_len(&self) -> Result<usize> {
        match self {
            Self::MidiEvent(event) => {
                event.status_byte()?;
                Ok(event.encoded_len())
            }
            Self::SysexEvent(event) => {
                event.validate()?;
                Ok(event.encoded_len())
            }
            Self::MetaEvent(event) => event.encoded_len(),
        }
    }

    /// True for the `FF 2F` end of track meta event
    pub fn is_end_of_track(&self) -> bool {
        matches!(self, Self::MetaEvent(meta) if meta.is_end_of_track())
    }

    /// Short name of the variant, used in diagnostics
    fn kind_name(&self) -> &'static str {
        match self {
            Self::MidiEvent(_) => "midi",
            Self::SysexEvent(_) => "sysex",
            Self::MetaEvent(_) => "meta",
        }
    }
}

impl From<MidiEvent> for Event {
    fn from(value: MidiEvent) -> Self {
        Self::MidiEvent(value)
    }
}

impl From<SysexEvent> for Event {
    fn from(value: SysexEvent) -> Self {
        Self::SysexEvent(value)
    }
}

impl From<MetaEvent> for Event {
    fn from(value: MetaEvent) -> Self {
        Self::MetaEvent(value)
    }
}

impl MidiWriteable for Event {
    fn write_midi<W>(&self, sink: &mut W) -> Result<usize>
    where
        W: MidiSink + ?Sized,
    {
        match self {
            Self::MidiEvent(event) => event.write_midi(sink),
            Self::SysexEvent(event) => event.write_midi(sink),
            Self::MetaEvent(event) => event.write_midi(sink),
        }
    }
}

/// Reads the events of one track, stopping once the declared length is consumed.
///
/// Each item is an event paired with the bytes it spanned. After the first error the iterator is
/// exhausted, the source is left wherever the failure happened.
#[derive(Debug)]
pub struct TrackEvents<'a, S>
where
    S: MidiSource + ?Sized,
{
    /// Where the events are read from
    source: &'a mut S,
    /// Limits forwarded to every event decode
    limits: DecodeLimits,
    /// Length from the track header
    declared: u32,
    /// Bytes consumed so far
    consumed: u32,
    /// Source position at the start of the most recent event
    event_offset: usize,
    /// Set once an error has been yielded
    failed: bool,
}

impl<'a, S> TrackEvents<'a, S>
where
    S: MidiSource + ?Sized,
{
    /// Starts reading the body of a track whose header was just read
    pub fn new(source: &'a mut S, header: TrackHeader, limits: DecodeLimits) -> Self {
        let event_offset = source.position();

        Self {
            source,
            limits,
            declared: header.byte_length,
            consumed: 0,
            event_offset,
            failed: false,
        }
    }

    /// Bytes of the track body consumed so far
    pub fn consumed(&self) -> u32 {
        self.consumed
    }

    /// Absolute source offset where the latest event started
    pub fn event_offset(&self) -> usize {
        self.event_offset
    }

    /// Reads the next event, enforcing that it stays within the declared length
    fn next_event(&mut self) -> Result<(MTrkEvent, usize)> {
        self.event_offset = self.source.position();

        let (event, len) = MTrkEvent::read(&mut *self.source, &self.limits)?;
        let consumed = u32::try_from(len)
            .ok()
            .and_then(|len| self.consumed.checked_add(len))
            .unwrap_or(u32::MAX);

        if consumed > self.declared {
            return Err(SmfError::FramingMismatch {
                declared: self.declared,
                consumed,
            });
        }

        self.consumed = consumed;
        Ok((event, len))
    }
}

impl<S> Iterator for TrackEvents<'_, S>
where
    S: MidiSource + ?Sized,
{
    type Item = Result<(MTrkEvent, usize)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.failed || self.consumed >= self.declared {
            return None;
        }

        let next = self.next_event();
        self.failed = next.is_err();
        Some(next)
    }
}

/// A track chunk, containing one or more MTrk events
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TrackChunk {
    /// All associated track events to this chunk
    pub mtrk_events: Vec<MTrkEvent>,
}

impl TrackChunk {
    /// Creates a track from its events
    pub fn new(mtrk_events: Vec<MTrkEvent>) -> Self {
        Self { mtrk_events }
    }

    /// Reads the whole body of a track whose header was just read
    pub fn read<S>(source: &mut S, header: TrackHeader, limits: &DecodeLimits) -> Result<Self>
    where
        S: MidiSource + ?Sized,
    {
        Self::read_events(source, header, limits).map_err(|(_, err)| err)
    }

    /// Like [`TrackChunk::read`], but failures carry the offset of the event that caused them
    pub(crate) fn read_events<S>(
        source: &mut S,
        header: TrackHeader,
        limits: &DecodeLimits,
    ) -> Result<Self, (usize, SmfError)>
    where
        S: MidiSource + ?Sized,
    {
        let mut events = TrackEvents::new(source, header, *limits);
        let mut mtrk_events = vec![];

        while let Some(next) = events.next() {
            match next {
                Ok((event, _)) => mtrk_events.push(event),
                Err(err) => return Err((events.event_offset(), err)),
            }
        }

        Ok(Self { mtrk_events })
    }

    /// Encodes every event, the body of the chunk without its header
    pub fn encode_events(&self) -> Result<Vec<u8>> {
        let mut bytes = vec![];
        for mtrk_event in &self.mtrk_events {
            mtrk_event.write_midi(&mut bytes)?;
        }

        Ok(bytes)
    }

    /// The header this track would be written with
    pub fn header(&self) -> Result<TrackHeader> {
        let mut byte_length = 0usize;
        for mtrk_event in &self.mtrk_events {
            byte_length += mtrk_event.encoded_len()?;
        }

        u32::try_from(byte_length)
            .map(TrackHeader::new)
            .map_err(|_| SmfError::TrackTooLong(byte_length))
    }

    /// True if the last event is an end of track marker
    pub fn is_terminated(&self) -> bool {
        self.mtrk_events
            .last()
            .is_some_and(|mtrk_event| mtrk_event.event.is_end_of_track())
    }
}

impl MidiWriteable for TrackChunk {
    fn write_midi<W>(&self, sink: &mut W) -> Result<usize>
    where
        W: MidiSink + ?Sized,
    {
        let body = self.encode_events()?;
        let byte_length =
            u32::try_from(body.len()).map_err(|_| SmfError::TrackTooLong(body.len()))?;
        tracing::debug!(byte_length, events = self.mtrk_events.len(), "writing track");

        let written = TrackHeader::new(byte_length).write_midi(sink)?;
        Ok(written + sink.write_bytes(&body)?)
    }
}

//! Property-Based Tests for the SMF codec
//!
//! These tests verify the encoding laws hold across a wide range of inputs using proptest:
//! round trips, minimal variable length quantities and exact track framing.

use proptest::collection::vec;
use proptest::prelude::*;

use smf_codec::{
    chunk::track::event::{ControlChange, NoteMeta},
    reader::{MidiSource, MidiStream, MAX_VLQ_VALUE},
    writer::{to_midi_vlq, MidiSink},
    DecodeLimits, Event, FileHeader, Format, MTrkEvent, MetaEvent, MidiEvent, MidiWriteable,
    SmfError, SysexEvent, TrackChunk, TrackEvents, TrackHeader,
};

fn note() -> impl Strategy<Value = NoteMeta> {
    (0u8..128, 0u8..128).prop_map(|(key, velocity)| NoteMeta { key, velocity })
}

fn midi_event() -> impl Strategy<Value = MidiEvent> {
    let channel = 0u8..16;

    prop_oneof![
        (channel.clone(), note()).prop_map(|(c, n)| MidiEvent::NoteOff(c, n)),
        (channel.clone(), note()).prop_map(|(c, n)| MidiEvent::NoteOn(c, n)),
        (channel.clone(), note()).prop_map(|(c, n)| MidiEvent::PolyphonicKeyPressure(c, n)),
        (channel.clone(), 0u8..128, 0u8..128).prop_map(|(c, controller_number, new_value)| {
            MidiEvent::ControlChange(
                c,
                ControlChange {
                    controller_number,
                    new_value,
                },
            )
        }),
        (channel.clone(), 0u8..128).prop_map(|(c, p)| MidiEvent::ProgramChange(c, p)),
        (channel.clone(), 0u8..128).prop_map(|(c, p)| MidiEvent::ChannelPressure(c, p)),
        (channel, 0u16..0x4000).prop_map(|(c, v)| MidiEvent::PitchWheelChange(c, v)),
    ]
}

fn meta_event() -> impl Strategy<Value = MetaEvent> {
    (any::<u8>(), vec(any::<u8>(), 0..300)).prop_map(|(meta_type, payload)| {
        MetaEvent::new(meta_type, payload)
    })
}

fn sysex_event() -> impl Strategy<Value = SysexEvent> {
    (
        prop_oneof![Just(SysexEvent::START), Just(SysexEvent::END_OF_EXCLUSIVE)],
        any::<u8>(),
        vec(0u8..0xF7, 0..64),
    )
        .prop_map(|(status, id, data)| SysexEvent {
            status,
            ..SysexEvent::new(id, &data)
        })
}

fn event() -> impl Strategy<Value = Event> {
    prop_oneof![
        midi_event().prop_map(Event::from),
        meta_event().prop_map(Event::from),
        sysex_event().prop_map(Event::from),
    ]
}

fn mtrk_event() -> impl Strategy<Value = MTrkEvent> {
    (0..=MAX_VLQ_VALUE, event()).prop_map(|(delta_time, event)| MTrkEvent::new(delta_time, event))
}

/// Number of 7 bit groups `value` needs, at least one
fn groups_needed(value: u32) -> usize {
    let bits = 32 - value.leading_zeros() as usize;
    bits.div_ceil(7).max(1)
}

proptest! {
    #[test]
    fn vlq_round_trips_minimally(value in 0..=MAX_VLQ_VALUE) {
        let bytes = to_midi_vlq(value).unwrap();
        prop_assert_eq!(bytes.len(), groups_needed(value));

        let (last, rest) = bytes.split_last().unwrap();
        prop_assert!(rest.iter().all(|byte| byte & 0x80 != 0));
        prop_assert_eq!(last & 0x80, 0);

        let mut stream = MidiStream::from_slice(&bytes);
        prop_assert_eq!(stream.read_vlq().unwrap(), (value, bytes.len()));
    }

    #[test]
    fn vlq_above_four_groups_is_refused(value in (MAX_VLQ_VALUE + 1)..=u32::MAX) {
        prop_assert!(matches!(to_midi_vlq(value), Err(SmfError::VlqOverflow)));
    }

    #[test]
    fn big_endian_round_trips(n_bytes in 1usize..=4, raw in any::<u32>()) {
        let value = if n_bytes == 4 { raw } else { raw & ((1 << (8 * n_bytes)) - 1) };

        let mut sink = vec![];
        prop_assert_eq!(sink.write_uint(value, n_bytes).unwrap(), n_bytes);

        let mut stream = MidiStream::from_slice(&sink);
        prop_assert_eq!(stream.read_uint(n_bytes).unwrap(), value);
    }

    #[test]
    fn file_header_round_trips(format in 0u16..3, track_count in any::<u16>(), division in any::<i16>()) {
        let header = FileHeader::new(Format::try_from(format).unwrap(), track_count, division);
        let bytes = header.to_midi_bytes().unwrap();

        prop_assert_eq!(bytes.len(), FileHeader::ENCODED_LEN);
        prop_assert_eq!(FileHeader::read(&mut MidiStream::from_slice(&bytes)).unwrap(), header);
    }

    #[test]
    fn track_header_round_trips(byte_length in any::<u32>()) {
        let header = TrackHeader::new(byte_length);
        let bytes = header.to_midi_bytes().unwrap();

        prop_assert_eq!(TrackHeader::read(&mut MidiStream::from_slice(&bytes)).unwrap(), header);
    }

    #[test]
    fn events_round_trip(event in mtrk_event()) {
        let bytes = event.to_midi_bytes().unwrap();
        prop_assert_eq!(bytes.len(), event.encoded_len().unwrap());

        let mut stream = MidiStream::from_slice(&bytes);
        let (decoded, consumed) = MTrkEvent::read(&mut stream, &DecodeLimits::default()).unwrap();

        prop_assert_eq!(decoded, event);
        prop_assert_eq!(consumed, bytes.len());
    }

    #[test]
    fn every_strict_prefix_of_an_event_is_truncated(event in mtrk_event(), cut in any::<prop::sample::Index>()) {
        let bytes = event.to_midi_bytes().unwrap();
        let prefix = &bytes[..cut.index(bytes.len())];

        let result = MTrkEvent::read(&mut MidiStream::from_slice(prefix), &DecodeLimits::default());
        prop_assert!(matches!(result, Err(SmfError::TruncatedInput)));
    }

    #[test]
    fn track_framing_sums_to_declared_length(events in vec(mtrk_event(), 0..24)) {
        let track = TrackChunk::new(events);
        let bytes = track.to_midi_bytes().unwrap();

        let mut stream = MidiStream::from_slice(&bytes);
        let header = TrackHeader::read(&mut stream).unwrap();
        prop_assert_eq!(header, track.header().unwrap());

        let mut total = 0;
        let mut decoded = vec![];
        for next in TrackEvents::new(&mut stream, header, DecodeLimits::default()) {
            let (event, consumed) = next.unwrap();
            total += consumed;
            decoded.push(event);
        }

        prop_assert_eq!(total, header.byte_length as usize);
        prop_assert_eq!(stream.position(), bytes.len());
        prop_assert_eq!(decoded, track.mtrk_events);
    }
}

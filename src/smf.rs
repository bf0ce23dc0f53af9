//! Whole files: a header chunk followed by its track chunks

use std::{
    fs::File,
    io::{BufWriter, Write},
    path::Path,
};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    chunk::{
        header::FileHeader,
        track::{TrackChunk, TrackHeader},
    },
    error::{Result, SmfError},
    limits::DecodeLimits,
    reader::{MidiReadable, MidiSource, MidiStream},
    writer::{MidiSink, MidiWriteable},
};

/// A fully decoded Standard MIDI File
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct Smf {
    /// The `MThd` chunk. Its track count is rewritten from `tracks` on save
    pub header: FileHeader,
    /// Every `MTrk` chunk, in file order
    pub tracks: Vec<TrackChunk>,
}

impl Smf {
    /// Creates a file from a header and its tracks
    pub fn new(header: FileHeader, tracks: Vec<TrackChunk>) -> Self {
        Self { header, tracks }
    }

    /// Reads a header and exactly as many tracks as it announces, with default limits
    pub fn read<S>(source: &mut S) -> Result<Self>
    where
        S: MidiSource + ?Sized,
    {
        Self::read_with(source, &DecodeLimits::default())
    }

    /// Reads a whole file with explicit decode limits.
    ///
    /// A failure inside a track is wrapped in [`SmfError::Track`] with the track index and the
    /// offset of the event being decoded, or of the `MTrk` header if that is what failed. Bytes
    /// after the last announced track are left unread.
    pub fn read_with<S>(source: &mut S, limits: &DecodeLimits) -> Result<Self>
    where
        S: MidiSource + ?Sized,
    {
        let header = FileHeader::read(source)?;
        let mut tracks = Vec::with_capacity(header.track_count as usize);

        for index in 0..header.track_count as usize {
            let chunk_offset = source.position();
            let track = TrackHeader::read(source)
                .map_err(|err| (chunk_offset, err))
                .and_then(|track_header| TrackChunk::read_events(source, track_header, limits))
                .map_err(|(offset, err)| Self::track_error(index, offset, err))?;

            tracks.push(track);
        }

        Ok(Self { header, tracks })
    }

    /// Attaches the track index and byte offset to a failure inside a track chunk
    fn track_error(index: usize, offset: usize, err: SmfError) -> SmfError {
        tracing::warn!(index, offset, %err, "failed to decode track");

        SmfError::Track {
            index,
            offset,
            source: Box::new(err),
        }
    }

    /// Decodes a file held in memory
    pub fn parse(bytes: &[u8]) -> Result<Self> {
        Self::read(&mut MidiStream::from_slice(bytes))
    }

    /// Reads and decodes the file at `path`
    pub fn open<P>(path: P) -> Result<Self>
    where
        P: AsRef<Path>,
    {
        let mut source = path.get_midi_bytes()?;
        Self::read(&mut source)
    }

    /// Encodes the file to `path`, returning the number of bytes written
    pub fn save<P>(&self, path: P) -> Result<usize>
    where
        P: AsRef<Path>,
    {
        let mut writer = BufWriter::new(File::create(path)?);
        let written = self.write_midi(&mut writer)?;
        writer.flush()?;

        Ok(written)
    }
}

impl MidiWriteable for Smf {
    fn write_midi<W>(&self, sink: &mut W) -> Result<usize>
    where
        W: MidiSink + ?Sized,
    {
        let track_count =
            u16::try_from(self.tracks.len()).map_err(|_| SmfError::TooManyTracks(self.tracks.len()))?;
        let header = FileHeader {
            track_count,
            ..self.header
        };

        let mut written = header.write_midi(sink)?;
        for track in &self.tracks {
            written += track.write_midi(sink)?;
        }

        Ok(written)
    }
}

#[cfg(test)]
mod tests {
    use super::Smf;
    use crate::{
        chunk::{
            header::{FileHeader, Format},
            track::{event::MidiEvent, meta::MetaEvent, MTrkEvent, TrackChunk},
        },
        error::SmfError,
        writer::MidiWriteable,
    };

    fn two_track_file() -> Vec<u8> {
        let mut bytes = vec![
            0x4D, 0x54, 0x68, 0x64, 0x00, 0x00, 0x00, 0x06, 0x00, 0x01, 0x00, 0x02, 0x00, 0x60,
        ];
        bytes.extend_from_slice(b"MTrk\x00\x00\x00\x0B");
        bytes.extend_from_slice(&[0x00, 0xFF, 0x51, 0x03, 0x07, 0xA1, 0x20, 0x00, 0xFF, 0x2F, 0x00]);
        bytes.extend_from_slice(b"MTrk\x00\x00\x00\x07");
        bytes.extend_from_slice(&[0x00, 0xC1, 0x18, 0x00, 0xFF, 0x2F, 0x00]);
        bytes
    }

    #[test]
    fn whole_file_round_trips_byte_for_byte() {
        let bytes = two_track_file();
        let smf = Smf::parse(&bytes).expect("Parse two track file");

        assert_eq!(smf.header, FileHeader::new(Format::One, 2, 96));
        assert_eq!(smf.tracks.len(), 2);
        assert_eq!(
            smf.tracks[1].mtrk_events[0],
            MTrkEvent::new(0, MidiEvent::ProgramChange(1, 0x18))
        );
        assert_eq!(smf.to_midi_bytes().unwrap(), bytes);
    }

    #[test]
    fn errors_inside_tracks_carry_index_and_offset() {
        let mut bytes = two_track_file();
        // Replace the program change status with a system common byte
        bytes[14 + 8 + 11 + 8 + 1] = 0xF3;

        let err = Smf::parse(&bytes).unwrap_err();
        assert!(matches!(
            err,
            SmfError::Track { index: 1, offset: 41, ref source } if matches!(**source, SmfError::UnknownEventType(0xF3))
        ));
    }

    #[test]
    fn missing_track_is_truncated() {
        let bytes = two_track_file();
        let err = Smf::parse(&bytes[..14 + 8 + 11]).unwrap_err();

        assert!(err.is_truncated());
        assert!(matches!(err, SmfError::Track { index: 1, offset: 33, .. }));
    }

    #[test]
    fn bad_track_label_names_the_chunk() {
        let mut bytes = two_track_file();
        bytes[33..37].copy_from_slice(b"XXXX");

        let err = Smf::parse(&bytes).unwrap_err();
        assert!(matches!(
            err,
            SmfError::Track { index: 1, offset: 33, ref source }
                if matches!(**source, SmfError::BadMagic { found, .. } if &found == b"XXXX")
        ));
    }

    #[test]
    fn track_header_cut_short_names_the_chunk() {
        let bytes = two_track_file();
        let err = Smf::parse(&bytes[..14 + 8 + 11 + 6]).unwrap_err();

        assert!(err.is_truncated());
        assert!(matches!(err, SmfError::Track { index: 1, offset: 33, .. }));
    }

    #[test]
    fn written_track_count_follows_tracks() {
        let track = TrackChunk::new(vec![MTrkEvent::new(0, MetaEvent::end_of_track())]);
        let smf = Smf::new(FileHeader::new(Format::Zero, 7, 480), vec![track]);

        let bytes = smf.to_midi_bytes().unwrap();
        assert_eq!(&bytes[10..12], &[0x00, 0x01]);
        assert_eq!(Smf::parse(&bytes).unwrap().header.track_count, 1);
    }

    #[test]
    fn files_save_and_open() {
        let path = std::env::temp_dir().join(format!("smf-codec-{}.mid", std::process::id()));
        let smf = Smf::parse(&two_track_file()).unwrap();

        let written = smf.save(&path).expect("Save to temp dir");
        let reopened = Smf::open(&path).expect("Open saved file");
        let _ = std::fs::remove_file(&path);

        assert_eq!(written, two_track_file().len());
        assert_eq!(reopened, smf);
    }
}

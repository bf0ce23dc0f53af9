//! System Exclusive Messages

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{
    error::{Result, SmfError},
    limits::DecodeLimits,
    reader::MidiSource,
    writer::{MidiSink, MidiWriteable},
};

/// A midi system exclusive event message.
///
/// Layout on the wire is the status byte, one identifier byte, then payload bytes up to and
/// including the `0xF7` end of exclusive.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct SysexEvent {
    /// Either [`SysexEvent::START`] or [`SysexEvent::END_OF_EXCLUSIVE`]
    pub status: u8,
    /// The byte immediately following the status
    pub id: u8,
    /// Data payload, terminator included as its last byte
    pub payload: Vec<u8>,
}

impl SysexEvent {
    /// Status byte opening a system exclusive message
    pub const START: u8 = 0xF0;
    /// End of exclusive, also used as an escape status
    pub const END_OF_EXCLUSIVE: u8 = 0xF7;

    /// Builds an `F0` message from an identifier and its data, appending the terminator
    pub fn new(id: u8, data: &[u8]) -> Self {
        let mut payload = Vec::with_capacity(data.len() + 1);
        payload.extend_from_slice(data);
        payload.push(Self::END_OF_EXCLUSIVE);

        Self {
            status: Self::START,
            id,
            payload,
        }
    }

    /// True for the two status bytes that introduce a sysex event
    pub fn is_sysex_status(status: u8) -> bool {
        status == Self::START || status == Self::END_OF_EXCLUSIVE
    }

    /// Payload without its trailing terminator
    pub fn data(&self) -> &[u8] {
        self.payload
            .strip_suffix(&[Self::END_OF_EXCLUSIVE])
            .unwrap_or(&self.payload)
    }

    /// Size of the event on the wire, status included, delta time excluded
    pub fn encoded_len(&self) -> usize {
        2 + self.payload.len()
    }

    /// Reads the identifier and payload of a message whose status byte was already consumed.
    ///
    /// Scanning stops after the first `0xF7`. If `limits.max_sysex_scan` payload bytes go by
    /// without one the message is [`SmfError::UnterminatedSysex`].
    pub fn read<S>(status: u8, source: &mut S, limits: &DecodeLimits) -> Result<Self>
    where
        S: MidiSource + ?Sized,
    {
        let id = source.read_byte()?;
        let mut payload = vec![];

        while payload.len() < limits.max_sysex_scan {
            let byte = source.read_byte()?;
            payload.push(byte);

            if byte == Self::END_OF_EXCLUSIVE {
                return Ok(Self {
                    status,
                    id,
                    payload,
                });
            }
        }

        Err(SmfError::UnterminatedSysex {
            scanned: payload.len(),
        })
    }

    /// Checks the message can be read back exactly as it is written
    pub(crate) fn validate(&self) -> Result<()> {
        let terminator = self
            .payload
            .iter()
            .position(|&byte| byte == Self::END_OF_EXCLUSIVE);

        match terminator {
            Some(index) if Self::is_sysex_status(self.status) && index + 1 == self.payload.len() => {
                Ok(())
            }
            _ => Err(SmfError::InvalidSysex),
        }
    }
}

impl MidiWriteable for SysexEvent {
    fn write_midi<W>(&self, sink: &mut W) -> Result<usize>
    where
        W: MidiSink + ?Sized,
    {
        self.validate()?;

        let written = sink.write_bytes(&[self.status, self.id])?;
        Ok(written + sink.write_bytes(&self.payload)?)
    }
}

#[cfg(test)]
mod tests {
    use super::SysexEvent;
    use crate::{
        error::SmfError,
        limits::DecodeLimits,
        reader::{MidiSource, MidiStream},
        writer::MidiWriteable,
    };

    fn parse(bytes: &[u8], limits: &DecodeLimits) -> Result<SysexEvent, SmfError> {
        let mut stream = MidiStream::from_slice(bytes);
        let status = stream.read_byte()?;
        SysexEvent::read(status, &mut stream, limits)
    }

    #[test]
    fn sys_ex_message_valid_parse() {
        let sysex = parse(&[0xF0, 0x01, 0xFF, 0x00, 0x21, 0xF7], &DecodeLimits::default())
            .expect("Parse sysex message from bytes");

        assert_eq!(sysex, SysexEvent::new(0x01, &[0xFF, 0x00, 0x21]));
        assert_eq!(sysex.data(), &[0xFF, 0x00, 0x21]);
        assert_eq!(sysex.encoded_len(), 6);
    }

    #[test]
    fn scanning_stops_at_first_terminator() {
        let mut stream = MidiStream::from_slice(&[0x43, 0x10, 0xF7, 0x00, 0xFF]);
        let sysex = SysexEvent::read(0xF7, &mut stream, &DecodeLimits::default()).unwrap();

        assert_eq!(sysex.status, 0xF7);
        assert_eq!(sysex.payload, vec![0x10, 0xF7]);
        assert_eq!(stream.position(), 3);
    }

    #[test]
    fn sys_ex_message_without_end_is_truncated() {
        let sysex = parse(&[0xF0, 0x01, 0xFF, 0x00, 0x21], &DecodeLimits::default());
        assert!(matches!(sysex, Err(SmfError::TruncatedInput)));
    }

    #[test]
    fn scan_limit_reports_unterminated_sysex() {
        let limits = DecodeLimits {
            max_sysex_scan: 3,
            ..DecodeLimits::default()
        };

        let sysex = parse(&[0xF0, 0x01, 0x10, 0x11, 0x12, 0x13, 0xF7], &limits);
        assert!(matches!(sysex, Err(SmfError::UnterminatedSysex { scanned: 3 })));

        let sysex = parse(&[0xF0, 0x01, 0x10, 0x11, 0xF7], &limits);
        assert!(sysex.is_ok());
    }

    #[test]
    fn sysex_saves_as_proper_bytes() {
        let sysex = SysexEvent::new(0x7E, &[0x7F, 0x09, 0x01]);

        assert_eq!(
            sysex.to_midi_bytes().unwrap(),
            vec![0xF0, 0x7E, 0x7F, 0x09, 0x01, 0xF7]
        );
    }

    #[test]
    fn unframed_payloads_are_not_written() {
        let missing_end = SysexEvent {
            status: 0xF0,
            id: 0x01,
            payload: vec![0x01],
        };
        let early_end = SysexEvent {
            status: 0xF0,
            id: 0x01,
            payload: vec![0xF7, 0x01, 0xF7],
        };
        let bad_status = SysexEvent {
            status: 0xF1,
            ..SysexEvent::new(0x01, &[])
        };

        for sysex in [missing_end, early_end, bad_status] {
            let mut sink = vec![];
            assert!(matches!(sysex.write_midi(&mut sink), Err(SmfError::InvalidSysex)));
            assert!(sink.is_empty());
        }
    }
}

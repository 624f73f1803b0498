//! MIDI 1.0 byte-stream decoding.
//!
//! One packet is 1-64 bytes. Every message restates its status byte; running
//! status is deliberately unsupported, so an unrecognized status byte ends
//! decoding of the packet (there is no way to resynchronize).

use tracing::debug;

use crate::connections::ConnectionMap;
use crate::event::{EndpointId, Event};
use crate::monitor::Monitor;
use crate::receiver::{Receiver, ACCEPT_ALL, ACCEPT_NONE};
use crate::words::{high_nibble, low_nibble, word14};

/// Largest legal packet. Longer (or empty) buffers are suspect and dropped.
pub const MAX_PACKET_BYTES: usize = 64;

/// Sentinel payload for SysEx: the rest of the largest legal packet. A SysEx
/// status byte consumes whatever follows it without decoding anything.
const SYSEX_PAYLOAD: usize = MAX_PACKET_BYTES - 1;

/// Classified MIDI 1.0 status byte. Channel-voice kinds are keyed by the high
/// nibble (the low nibble carries the channel); system kinds by the full byte.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Midi1Status {
    NoteOff,
    NoteOn,
    PolyPressure,
    ControlChange,
    ProgramChange,
    ChannelPressure,
    PitchBend,
    SystemExclusive,
    TimeCodeQuarterFrame,
    SongPositionPointer,
    SongSelect,
    TuneRequest,
    TimingClock,
    Start,
    Continue,
    Stop,
    ActiveSensing,
    SystemReset,
}

impl Midi1Status {
    pub fn classify(byte: u8) -> Option<Self> {
        if byte >= 0xF0 {
            match byte {
                0xF0 => Some(Self::SystemExclusive),
                0xF1 => Some(Self::TimeCodeQuarterFrame),
                0xF2 => Some(Self::SongPositionPointer),
                0xF3 => Some(Self::SongSelect),
                0xF6 => Some(Self::TuneRequest),
                0xF8 => Some(Self::TimingClock),
                0xFA => Some(Self::Start),
                0xFB => Some(Self::Continue),
                0xFC => Some(Self::Stop),
                0xFE => Some(Self::ActiveSensing),
                0xFF => Some(Self::SystemReset),
                _ => None,
            }
        } else {
            match high_nibble(byte) {
                0x8 => Some(Self::NoteOff),
                0x9 => Some(Self::NoteOn),
                0xA => Some(Self::PolyPressure),
                0xB => Some(Self::ControlChange),
                0xC => Some(Self::ProgramChange),
                0xD => Some(Self::ChannelPressure),
                0xE => Some(Self::PitchBend),
                _ => None,
            }
        }
    }

    /// Trailing payload bytes the command requires.
    pub fn payload_len(self) -> usize {
        match self {
            Self::NoteOff
            | Self::NoteOn
            | Self::PolyPressure
            | Self::ControlChange
            | Self::PitchBend
            | Self::SongPositionPointer => 2,
            Self::ProgramChange
            | Self::ChannelPressure
            | Self::TimeCodeQuarterFrame
            | Self::SongSelect => 1,
            Self::SystemExclusive => SYSEX_PAYLOAD,
            Self::TuneRequest
            | Self::TimingClock
            | Self::Start
            | Self::Continue
            | Self::Stop
            | Self::ActiveSensing
            | Self::SystemReset => 0,
        }
    }

    pub fn has_channel(self) -> bool {
        matches!(
            self,
            Self::NoteOff
                | Self::NoteOn
                | Self::PolyPressure
                | Self::ControlChange
                | Self::ProgramChange
                | Self::ChannelPressure
                | Self::PitchBend
        )
    }
}

/// Decode one MIDI 1.0 packet from `source`.
///
/// Channel telemetry is recorded and `did_see` fires for every channel-voice
/// message, before filtering, whether or not a receiver is present. With no
/// receiver the channel filter behaves as [`ACCEPT_NONE`]: bookkeeping only,
/// nothing emitted. Nothing here is fatal; malformed input is logged and
/// dropped.
pub fn parse(
    source: EndpointId,
    bytes: &[u8],
    mut receiver: Option<&mut dyn Receiver>,
    mut monitor: Option<&mut dyn Monitor>,
    connections: &ConnectionMap,
) {
    if bytes.is_empty() || bytes.len() > MAX_PACKET_BYTES {
        debug!(source, len = bytes.len(), "suspect packet size, dropping");
        return;
    }

    let mut index = 0;
    while index < bytes.len() {
        let status_byte = bytes[index];
        index += 1;

        let Some(status) = Midi1Status::classify(status_byte) else {
            // No running status means no resync point.
            debug!(source, status = status_byte, "unknown status byte, abandoning packet");
            return;
        };

        if status == Midi1Status::SystemExclusive {
            // Content is never decoded; the rest of the packet is SysEx payload.
            debug!(source, "skipping SysEx");
            return;
        }

        let needed = status.payload_len();

        let mut accepted = true;
        if status.has_channel() {
            let channel = low_nibble(status_byte);
            connections.observe(source, None, Some(channel));
            if let Some(m) = monitor.as_mut() {
                m.did_see(source, -1, channel as i32);
            }
            let filter = receiver
                .as_ref()
                .map(|r| r.channel())
                .unwrap_or(ACCEPT_NONE);
            accepted = filter == ACCEPT_ALL || filter == channel as i32;
        }

        if index + needed > bytes.len() {
            // Truncated trailing message.
            debug!(source, status = ?status, "packet too short for payload, dropping tail");
            return;
        }

        if accepted {
            if let Some(r) = receiver.as_mut() {
                if let Some(event) = build_event(source, status, status_byte, &bytes[index..]) {
                    r.receive(event);
                }
            }
        }

        index += needed;
    }
}

fn build_event(source: EndpointId, status: Midi1Status, status_byte: u8, payload: &[u8]) -> Option<Event> {
    let channel = low_nibble(status_byte);
    let event = match status {
        Midi1Status::NoteOff => Event::NoteOff {
            source,
            channel,
            note: payload[0],
            velocity: payload[1],
        },
        Midi1Status::NoteOn => Event::NoteOn {
            source,
            channel,
            note: payload[0],
            velocity: payload[1],
        },
        Midi1Status::PolyPressure => Event::PolyPressure {
            source,
            channel,
            note: payload[0],
            pressure: payload[1],
        },
        Midi1Status::ControlChange => Event::ControlChange {
            source,
            channel,
            controller: payload[0],
            value: payload[1],
        },
        Midi1Status::ProgramChange => Event::ProgramChange {
            source,
            channel,
            program: payload[0],
        },
        Midi1Status::ChannelPressure => Event::ChannelPressure {
            source,
            channel,
            pressure: payload[0],
        },
        Midi1Status::PitchBend => Event::PitchBend {
            source,
            channel,
            value: word14(payload[1], payload[0]),
        },
        Midi1Status::TimeCodeQuarterFrame => Event::TimeCodeQuarterFrame {
            source,
            value: payload[0],
        },
        Midi1Status::SongPositionPointer => Event::SongPositionPointer {
            source,
            value: word14(payload[1], payload[0]),
        },
        Midi1Status::SongSelect => Event::SongSelect {
            source,
            value: payload[0],
        },
        Midi1Status::TuneRequest => Event::TuneRequest { source },
        Midi1Status::TimingClock => Event::TimingClock { source },
        Midi1Status::Start => Event::Start { source },
        Midi1Status::Continue => Event::Continue { source },
        Midi1Status::Stop => Event::Stop { source },
        Midi1Status::ActiveSensing => Event::ActiveSensing { source },
        Midi1Status::SystemReset => Event::SystemReset { source },
        Midi1Status::SystemExclusive => return None,
    };
    Some(event)
}

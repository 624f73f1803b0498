//! Normalized event vocabulary shared by both decoders.

use serde::{Deserialize, Serialize};

/// Stable identifier of a source endpoint, assigned by the transport layer.
pub type EndpointId = i32;

/// One decoded MIDI message.
///
/// The v1-shaped variants come from MIDI 1.0 byte streams and from the
/// MIDI-1-in-UMP channel-voice class; they carry 7-bit payloads. The `..2`
/// and per-note variants come only from the MIDI 2.0 channel-voice class and
/// carry the high-resolution payloads, plus the UMP group. The two families
/// stay distinct: a v2 note-on with velocity 0 is still a note-on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    // MIDI 1.0 channel voice
    NoteOff {
        source: EndpointId,
        channel: u8,
        note: u8,
        velocity: u8,
    },
    NoteOn {
        source: EndpointId,
        channel: u8,
        note: u8,
        velocity: u8,
    },
    PolyPressure {
        source: EndpointId,
        channel: u8,
        note: u8,
        pressure: u8,
    },
    ControlChange {
        source: EndpointId,
        channel: u8,
        controller: u8,
        value: u8,
    },
    ProgramChange {
        source: EndpointId,
        channel: u8,
        program: u8,
    },
    ChannelPressure {
        source: EndpointId,
        channel: u8,
        pressure: u8,
    },
    /// 14-bit value, `msb << 7 | lsb`, center 8192.
    PitchBend {
        source: EndpointId,
        channel: u8,
        value: u16,
    },

    // MIDI 2.0 channel voice
    NoteOff2 {
        source: EndpointId,
        group: u8,
        channel: u8,
        note: u8,
        velocity: u16,
        attribute_type: u8,
        attribute_data: u16,
    },
    NoteOn2 {
        source: EndpointId,
        group: u8,
        channel: u8,
        note: u8,
        velocity: u16,
        attribute_type: u8,
        attribute_data: u16,
    },
    PolyPressure2 {
        source: EndpointId,
        group: u8,
        channel: u8,
        note: u8,
        pressure: u32,
    },
    ControlChange2 {
        source: EndpointId,
        group: u8,
        channel: u8,
        controller: u8,
        value: u32,
    },
    ChannelPressure2 {
        source: EndpointId,
        group: u8,
        channel: u8,
        pressure: u32,
    },
    /// Program change whose bank-valid bit was set. Without that bit the
    /// decoder emits the plain [`Event::ProgramChange`] instead.
    ProgramChange2 {
        source: EndpointId,
        group: u8,
        channel: u8,
        program: u8,
        bank: u16,
    },
    /// 32-bit channel-wide pitch bend, center 0x8000_0000.
    PitchBend2 {
        source: EndpointId,
        group: u8,
        channel: u8,
        value: u32,
    },
    PerNotePitchBend {
        source: EndpointId,
        group: u8,
        channel: u8,
        note: u8,
        value: u32,
    },
    RegisteredPerNoteController {
        source: EndpointId,
        group: u8,
        channel: u8,
        note: u8,
        controller: u8,
        value: u32,
    },
    AssignablePerNoteController {
        source: EndpointId,
        group: u8,
        channel: u8,
        note: u8,
        controller: u8,
        value: u32,
    },
    RegisteredController {
        source: EndpointId,
        group: u8,
        channel: u8,
        controller: u16,
        value: u32,
    },
    AssignableController {
        source: EndpointId,
        group: u8,
        channel: u8,
        controller: u16,
        value: u32,
    },
    RelativeRegisteredController {
        source: EndpointId,
        group: u8,
        channel: u8,
        controller: u16,
        value: i32,
    },
    RelativeAssignableController {
        source: EndpointId,
        group: u8,
        channel: u8,
        controller: u16,
        value: i32,
    },
    PerNoteManagement {
        source: EndpointId,
        group: u8,
        channel: u8,
        note: u8,
        detach: bool,
        reset: bool,
    },

    // System common / real-time
    TimeCodeQuarterFrame { source: EndpointId, value: u8 },
    SongPositionPointer { source: EndpointId, value: u16 },
    SongSelect { source: EndpointId, value: u8 },
    TuneRequest { source: EndpointId },
    TimingClock { source: EndpointId },
    Start { source: EndpointId },
    Continue { source: EndpointId },
    Stop { source: EndpointId },
    ActiveSensing { source: EndpointId },
    SystemReset { source: EndpointId },
}

impl Event {
    /// Unique id of the endpoint that sent the message.
    pub fn source(&self) -> EndpointId {
        match *self {
            Event::NoteOff { source, .. }
            | Event::NoteOn { source, .. }
            | Event::PolyPressure { source, .. }
            | Event::ControlChange { source, .. }
            | Event::ProgramChange { source, .. }
            | Event::ChannelPressure { source, .. }
            | Event::PitchBend { source, .. }
            | Event::NoteOff2 { source, .. }
            | Event::NoteOn2 { source, .. }
            | Event::PolyPressure2 { source, .. }
            | Event::ControlChange2 { source, .. }
            | Event::ChannelPressure2 { source, .. }
            | Event::ProgramChange2 { source, .. }
            | Event::PitchBend2 { source, .. }
            | Event::PerNotePitchBend { source, .. }
            | Event::RegisteredPerNoteController { source, .. }
            | Event::AssignablePerNoteController { source, .. }
            | Event::RegisteredController { source, .. }
            | Event::AssignableController { source, .. }
            | Event::RelativeRegisteredController { source, .. }
            | Event::RelativeAssignableController { source, .. }
            | Event::PerNoteManagement { source, .. }
            | Event::TimeCodeQuarterFrame { source, .. }
            | Event::SongPositionPointer { source, .. }
            | Event::SongSelect { source, .. }
            | Event::TuneRequest { source }
            | Event::TimingClock { source }
            | Event::Start { source }
            | Event::Continue { source }
            | Event::Stop { source }
            | Event::ActiveSensing { source }
            | Event::SystemReset { source } => source,
        }
    }

    /// MIDI channel (0-15) for channel-voice events, `None` for system events.
    pub fn channel(&self) -> Option<u8> {
        match *self {
            Event::NoteOff { channel, .. }
            | Event::NoteOn { channel, .. }
            | Event::PolyPressure { channel, .. }
            | Event::ControlChange { channel, .. }
            | Event::ProgramChange { channel, .. }
            | Event::ChannelPressure { channel, .. }
            | Event::PitchBend { channel, .. }
            | Event::NoteOff2 { channel, .. }
            | Event::NoteOn2 { channel, .. }
            | Event::PolyPressure2 { channel, .. }
            | Event::ControlChange2 { channel, .. }
            | Event::ChannelPressure2 { channel, .. }
            | Event::ProgramChange2 { channel, .. }
            | Event::PitchBend2 { channel, .. }
            | Event::PerNotePitchBend { channel, .. }
            | Event::RegisteredPerNoteController { channel, .. }
            | Event::AssignablePerNoteController { channel, .. }
            | Event::RegisteredController { channel, .. }
            | Event::AssignableController { channel, .. }
            | Event::RelativeRegisteredController { channel, .. }
            | Event::RelativeAssignableController { channel, .. }
            | Event::PerNoteManagement { channel, .. } => Some(channel),
            _ => None,
        }
    }

    /// UMP group (0-15). Only the MIDI 2.0 channel-voice variants carry one.
    pub fn group(&self) -> Option<u8> {
        match *self {
            Event::NoteOff2 { group, .. }
            | Event::NoteOn2 { group, .. }
            | Event::PolyPressure2 { group, .. }
            | Event::ControlChange2 { group, .. }
            | Event::ChannelPressure2 { group, .. }
            | Event::ProgramChange2 { group, .. }
            | Event::PitchBend2 { group, .. }
            | Event::PerNotePitchBend { group, .. }
            | Event::RegisteredPerNoteController { group, .. }
            | Event::AssignablePerNoteController { group, .. }
            | Event::RegisteredController { group, .. }
            | Event::AssignableController { group, .. }
            | Event::RelativeRegisteredController { group, .. }
            | Event::RelativeAssignableController { group, .. }
            | Event::PerNoteManagement { group, .. } => Some(group),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accessors() {
        let event = Event::NoteOn {
            source: 7,
            channel: 3,
            note: 60,
            velocity: 100,
        };
        assert_eq!(event.source(), 7);
        assert_eq!(event.channel(), Some(3));
        assert_eq!(event.group(), None);

        let event = Event::ControlChange2 {
            source: 9,
            group: 2,
            channel: 5,
            controller: 74,
            value: 0xFFFF_FFFF,
        };
        assert_eq!(event.source(), 9);
        assert_eq!(event.channel(), Some(5));
        assert_eq!(event.group(), Some(2));

        let event = Event::TimingClock { source: 1 };
        assert_eq!(event.channel(), None);
        assert_eq!(event.group(), None);
    }
}

//! MIDI 2.0 Universal MIDI Packet (UMP) decoding.
//!
//! Each message starts with a 32-bit word whose top nibble names one of six
//! classes with a fixed word count. The cursor always advances by that count,
//! so a filtered or unrecognized message never breaks alignment. An unknown
//! class nibble is different: its word count cannot be inferred, so the rest
//! of the buffer is abandoned.

use tracing::debug;

use crate::connections::ConnectionMap;
use crate::event::{EndpointId, Event};
use crate::monitor::Monitor;
use crate::receiver::{Receiver, ACCEPT_ALL, ACCEPT_NONE};
use crate::words::{b0, b1, b2, b3, high_nibble, low_nibble, s0, s1, word14};

/// UMP message-type class, bits 31-28 of word 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MessageType {
    Utility,
    System,
    Midi1ChannelVoice,
    Data64,
    Midi2ChannelVoice,
    Data128,
}

impl MessageType {
    pub fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            0x0 => Some(Self::Utility),
            0x1 => Some(Self::System),
            0x2 => Some(Self::Midi1ChannelVoice),
            0x3 => Some(Self::Data64),
            0x4 => Some(Self::Midi2ChannelVoice),
            0x5 => Some(Self::Data128),
            _ => None,
        }
    }

    /// Fixed message size in 32-bit words.
    pub fn word_count(self) -> usize {
        match self {
            Self::Utility | Self::System | Self::Midi1ChannelVoice => 1,
            Self::Data64 | Self::Midi2ChannelVoice => 2,
            Self::Data128 => 4,
        }
    }
}

/// MIDI 2.0 channel-voice opcode, bits 23-20 of word 0. Opcode 0x7 is
/// unassigned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ChannelVoiceOp {
    RegisteredPerNoteController,
    AssignablePerNoteController,
    RegisteredController,
    AssignableController,
    RelativeRegisteredController,
    RelativeAssignableController,
    PerNotePitchBend,
    NoteOff,
    NoteOn,
    PolyPressure,
    ControlChange,
    ProgramChange,
    ChannelPressure,
    PitchBend,
    PerNoteManagement,
}

impl ChannelVoiceOp {
    pub fn from_nibble(nibble: u8) -> Option<Self> {
        match nibble {
            0x0 => Some(Self::RegisteredPerNoteController),
            0x1 => Some(Self::AssignablePerNoteController),
            0x2 => Some(Self::RegisteredController),
            0x3 => Some(Self::AssignableController),
            0x4 => Some(Self::RelativeRegisteredController),
            0x5 => Some(Self::RelativeAssignableController),
            0x6 => Some(Self::PerNotePitchBend),
            0x8 => Some(Self::NoteOff),
            0x9 => Some(Self::NoteOn),
            0xA => Some(Self::PolyPressure),
            0xB => Some(Self::ControlChange),
            0xC => Some(Self::ProgramChange),
            0xD => Some(Self::ChannelPressure),
            0xE => Some(Self::PitchBend),
            0xF => Some(Self::PerNoteManagement),
            _ => None,
        }
    }
}

/// System common / real-time status, byte 1 of word 0.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SystemOp {
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

impl SystemOp {
    pub fn from_byte(byte: u8) -> Option<Self> {
        match byte {
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
    }
}

/// Decode one UMP word buffer from `source`.
///
/// Group and channel telemetry are recorded and `did_see` fires for every
/// channel-voice message before filtering, with or without a receiver.
/// System messages are never filtered. Nothing here is fatal.
pub fn parse(
    source: EndpointId,
    words: &[u32],
    mut receiver: Option<&mut dyn Receiver>,
    mut monitor: Option<&mut dyn Monitor>,
    connections: &ConnectionMap,
) {
    let mut index = 0;
    while index < words.len() {
        let word = words[index];
        let Some(message_type) = MessageType::from_nibble(high_nibble(b0(word))) else {
            // Word count unknown, alignment untrustworthy from here on.
            debug!(source, word = format_args!("{word:#010X}"), "unknown message type, abandoning buffer");
            return;
        };

        let count = message_type.word_count();
        if index + count > words.len() {
            debug!(source, ?message_type, "buffer too short for message, dropping tail");
            return;
        }

        match message_type {
            MessageType::Utility | MessageType::Data64 | MessageType::Data128 => {
                // Recognized but carry nothing in the event vocabulary.
                debug!(source, ?message_type, "skipping");
            }
            MessageType::System => {
                dispatch_system(source, word, receiver.as_deref_mut());
            }
            MessageType::Midi1ChannelVoice => {
                dispatch_midi1(
                    source,
                    word,
                    receiver.as_deref_mut(),
                    monitor.as_deref_mut(),
                    connections,
                );
            }
            MessageType::Midi2ChannelVoice => {
                dispatch_midi2(
                    source,
                    word,
                    words[index + 1],
                    receiver.as_deref_mut(),
                    monitor.as_deref_mut(),
                    connections,
                );
            }
        }

        index += count;
    }
}

fn group_of(word: u32) -> u8 {
    low_nibble(b0(word))
}

fn channel_of(word: u32) -> u8 {
    low_nibble(b1(word))
}

/// Shared filter step for both channel-voice classes: record telemetry,
/// report the sighting, then test both filters.
fn observe_and_filter(
    source: EndpointId,
    word: u32,
    receiver: &Option<&mut (dyn Receiver + '_)>,
    monitor: &mut Option<&mut (dyn Monitor + '_)>,
    connections: &ConnectionMap,
) -> bool {
    let group = group_of(word);
    let channel = channel_of(word);
    connections.observe(source, Some(group), Some(channel));
    if let Some(m) = monitor.as_mut() {
        m.did_see(source, group as i32, channel as i32);
    }

    let (group_filter, channel_filter) = receiver
        .as_ref()
        .map(|r| (r.group(), r.channel()))
        .unwrap_or((ACCEPT_NONE, ACCEPT_NONE));
    let group_ok = group_filter == ACCEPT_ALL || group_filter == group as i32;
    let channel_ok = channel_filter == ACCEPT_ALL || channel_filter == channel as i32;
    group_ok && channel_ok
}

fn dispatch_system(source: EndpointId, word: u32, receiver: Option<&mut (dyn Receiver + '_)>) {
    let Some(op) = SystemOp::from_byte(b1(word)) else {
        debug!(source, status = b1(word), "unknown system status, dropping message");
        return;
    };
    let Some(receiver) = receiver else { return };

    let event = match op {
        SystemOp::TimeCodeQuarterFrame => Event::TimeCodeQuarterFrame {
            source,
            value: b2(word),
        },
        SystemOp::SongPositionPointer => Event::SongPositionPointer {
            source,
            value: word14(b3(word), b2(word)),
        },
        SystemOp::SongSelect => Event::SongSelect {
            source,
            value: b2(word),
        },
        SystemOp::TuneRequest => Event::TuneRequest { source },
        SystemOp::TimingClock => Event::TimingClock { source },
        SystemOp::Start => Event::Start { source },
        SystemOp::Continue => Event::Continue { source },
        SystemOp::Stop => Event::Stop { source },
        SystemOp::ActiveSensing => Event::ActiveSensing { source },
        SystemOp::SystemReset => Event::SystemReset { source },
    };
    receiver.receive(event);
}

/// The MIDI-1-in-UMP class reuses the legacy command set but lands as
/// v1-shaped events with the payload packed into the single word.
fn dispatch_midi1(
    source: EndpointId,
    word: u32,
    mut receiver: Option<&mut (dyn Receiver + '_)>,
    mut monitor: Option<&mut (dyn Monitor + '_)>,
    connections: &ConnectionMap,
) {
    let accepted = observe_and_filter(source, word, &receiver, &mut monitor, connections);
    if !accepted {
        return;
    }
    let Some(receiver) = receiver.as_deref_mut() else { return };

    let channel = channel_of(word);
    let event = match high_nibble(b1(word)) {
        0x8 => Event::NoteOff {
            source,
            channel,
            note: b2(word),
            velocity: b3(word),
        },
        0x9 => Event::NoteOn {
            source,
            channel,
            note: b2(word),
            velocity: b3(word),
        },
        0xA => Event::PolyPressure {
            source,
            channel,
            note: b2(word),
            pressure: b3(word),
        },
        0xB => Event::ControlChange {
            source,
            channel,
            controller: b2(word),
            value: b3(word),
        },
        0xC => Event::ProgramChange {
            source,
            channel,
            program: b2(word),
        },
        0xD => Event::ChannelPressure {
            source,
            channel,
            pressure: b2(word),
        },
        0xE => Event::PitchBend {
            source,
            channel,
            value: word14(b3(word), b2(word)),
        },
        opcode => {
            debug!(source, opcode, "unknown legacy channel-voice opcode, dropping message");
            return;
        }
    };
    receiver.receive(event);
}

fn dispatch_midi2(
    source: EndpointId,
    word0: u32,
    word1: u32,
    mut receiver: Option<&mut (dyn Receiver + '_)>,
    mut monitor: Option<&mut (dyn Monitor + '_)>,
    connections: &ConnectionMap,
) {
    let accepted = observe_and_filter(source, word0, &receiver, &mut monitor, connections);
    if !accepted {
        return;
    }
    let Some(receiver) = receiver.as_deref_mut() else { return };

    let Some(op) = ChannelVoiceOp::from_nibble(high_nibble(b1(word0))) else {
        debug!(
            source,
            opcode = high_nibble(b1(word0)),
            "unknown channel-voice opcode, dropping message"
        );
        return;
    };

    let group = group_of(word0);
    let channel = channel_of(word0);
    let event = match op {
        ChannelVoiceOp::RegisteredPerNoteController => Event::RegisteredPerNoteController {
            source,
            group,
            channel,
            note: b2(word0),
            controller: b3(word0),
            value: word1,
        },
        ChannelVoiceOp::AssignablePerNoteController => Event::AssignablePerNoteController {
            source,
            group,
            channel,
            note: b2(word0),
            controller: b3(word0),
            value: word1,
        },
        ChannelVoiceOp::RegisteredController => Event::RegisteredController {
            source,
            group,
            channel,
            controller: s1(word0),
            value: word1,
        },
        ChannelVoiceOp::AssignableController => Event::AssignableController {
            source,
            group,
            channel,
            controller: s1(word0),
            value: word1,
        },
        ChannelVoiceOp::RelativeRegisteredController => Event::RelativeRegisteredController {
            source,
            group,
            channel,
            controller: s1(word0),
            value: word1 as i32,
        },
        ChannelVoiceOp::RelativeAssignableController => Event::RelativeAssignableController {
            source,
            group,
            channel,
            controller: s1(word0),
            value: word1 as i32,
        },
        ChannelVoiceOp::PerNotePitchBend => Event::PerNotePitchBend {
            source,
            group,
            channel,
            note: b2(word0),
            value: word1,
        },
        ChannelVoiceOp::NoteOff => Event::NoteOff2 {
            source,
            group,
            channel,
            note: b2(word0),
            velocity: s0(word1),
            attribute_type: b3(word0),
            attribute_data: s1(word1),
        },
        ChannelVoiceOp::NoteOn => Event::NoteOn2 {
            source,
            group,
            channel,
            note: b2(word0),
            velocity: s0(word1),
            attribute_type: b3(word0),
            attribute_data: s1(word1),
        },
        ChannelVoiceOp::PolyPressure => Event::PolyPressure2 {
            source,
            group,
            channel,
            note: b2(word0),
            pressure: word1,
        },
        ChannelVoiceOp::ControlChange => Event::ControlChange2 {
            source,
            group,
            channel,
            controller: b2(word0),
            value: word1,
        },
        ChannelVoiceOp::ProgramChange => {
            // Bit 0 of the option byte says whether the bank fields are valid.
            // Without it the message degrades to a plain program change.
            if b3(word0) & 0x01 != 0 {
                Event::ProgramChange2 {
                    source,
                    group,
                    channel,
                    program: b0(word1),
                    bank: s1(word1),
                }
            } else {
                Event::ProgramChange {
                    source,
                    channel,
                    program: b0(word1),
                }
            }
        }
        ChannelVoiceOp::ChannelPressure => Event::ChannelPressure2 {
            source,
            group,
            channel,
            pressure: word1,
        },
        ChannelVoiceOp::PitchBend => Event::PitchBend2 {
            source,
            group,
            channel,
            value: word1,
        },
        ChannelVoiceOp::PerNoteManagement => Event::PerNoteManagement {
            source,
            group,
            channel,
            note: b2(word0),
            detach: b3(word0) & 0x02 != 0,
            reset: b3(word0) & 0x01 != 0,
        },
    };
    receiver.receive(event);
}

//! Host-facing event sink.

use crate::event::{EndpointId, Event};

/// Filter value accepting every channel or group.
pub const ACCEPT_ALL: i32 = -1;

/// Filter value rejecting every channel or group. Also what the decoders
/// assume when no receiver is installed.
pub const ACCEPT_NONE: i32 = -2;

/// Consumer of decoded MIDI events.
///
/// Every method has a no-op default, so an implementation only overrides what
/// it cares about: either the per-message methods, or [`Receiver::receive`]
/// to sink everything through one match.
///
/// [`Receiver::channel`] and [`Receiver::group`] are read by the decoders on
/// every filterable message; they select which channel-voice traffic reaches
/// the per-message methods. System common/real-time messages are never
/// filtered.
pub trait Receiver {
    /// Channel this receiver listens on: [`ACCEPT_ALL`], [`ACCEPT_NONE`], or 0-15.
    fn channel(&self) -> i32 {
        ACCEPT_ALL
    }

    /// UMP group this receiver listens on (MIDI 2.0 traffic only):
    /// [`ACCEPT_ALL`], [`ACCEPT_NONE`], or 0-15.
    fn group(&self) -> i32 {
        ACCEPT_ALL
    }

    /// Entry point used by the decoders. The default routes each variant to
    /// its dedicated method below.
    fn receive(&mut self, event: Event) {
        match event {
            Event::NoteOff {
                source,
                channel,
                note,
                velocity,
            } => self.note_off(source, note, velocity, channel),
            Event::NoteOn {
                source,
                channel,
                note,
                velocity,
            } => self.note_on(source, note, velocity, channel),
            Event::PolyPressure {
                source,
                channel,
                note,
                pressure,
            } => self.poly_pressure(source, note, pressure, channel),
            Event::ControlChange {
                source,
                channel,
                controller,
                value,
            } => self.control_change(source, controller, value, channel),
            Event::ProgramChange {
                source,
                channel,
                program,
            } => self.program_change(source, program, channel),
            Event::ChannelPressure {
                source,
                channel,
                pressure,
            } => self.channel_pressure(source, pressure, channel),
            Event::PitchBend {
                source,
                channel,
                value,
            } => self.pitch_bend(source, value, channel),
            Event::NoteOff2 {
                source,
                group,
                channel,
                note,
                velocity,
                attribute_type,
                attribute_data,
            } => self.note_off2(
                source,
                note,
                velocity,
                attribute_type,
                attribute_data,
                group,
                channel,
            ),
            Event::NoteOn2 {
                source,
                group,
                channel,
                note,
                velocity,
                attribute_type,
                attribute_data,
            } => self.note_on2(
                source,
                note,
                velocity,
                attribute_type,
                attribute_data,
                group,
                channel,
            ),
            Event::PolyPressure2 {
                source,
                group,
                channel,
                note,
                pressure,
            } => self.poly_pressure2(source, note, pressure, group, channel),
            Event::ControlChange2 {
                source,
                group,
                channel,
                controller,
                value,
            } => self.control_change2(source, controller, value, group, channel),
            Event::ChannelPressure2 {
                source,
                group,
                channel,
                pressure,
            } => self.channel_pressure2(source, pressure, group, channel),
            Event::ProgramChange2 {
                source,
                group,
                channel,
                program,
                bank,
            } => self.program_change2(source, program, bank, group, channel),
            Event::PitchBend2 {
                source,
                group,
                channel,
                value,
            } => self.pitch_bend2(source, value, group, channel),
            Event::PerNotePitchBend {
                source,
                group,
                channel,
                note,
                value,
            } => self.per_note_pitch_bend(source, note, value, group, channel),
            Event::RegisteredPerNoteController {
                source,
                group,
                channel,
                note,
                controller,
                value,
            } => self.registered_per_note_controller(source, note, controller, value, group, channel),
            Event::AssignablePerNoteController {
                source,
                group,
                channel,
                note,
                controller,
                value,
            } => self.assignable_per_note_controller(source, note, controller, value, group, channel),
            Event::RegisteredController {
                source,
                group,
                channel,
                controller,
                value,
            } => self.registered_controller(source, controller, value, group, channel),
            Event::AssignableController {
                source,
                group,
                channel,
                controller,
                value,
            } => self.assignable_controller(source, controller, value, group, channel),
            Event::RelativeRegisteredController {
                source,
                group,
                channel,
                controller,
                value,
            } => self.relative_registered_controller(source, controller, value, group, channel),
            Event::RelativeAssignableController {
                source,
                group,
                channel,
                controller,
                value,
            } => self.relative_assignable_controller(source, controller, value, group, channel),
            Event::PerNoteManagement {
                source,
                group,
                channel,
                note,
                detach,
                reset,
            } => self.per_note_management(source, note, detach, reset, group, channel),
            Event::TimeCodeQuarterFrame { source, value } => {
                self.time_code_quarter_frame(source, value)
            }
            Event::SongPositionPointer { source, value } => {
                self.song_position_pointer(source, value)
            }
            Event::SongSelect { source, value } => self.song_select(source, value),
            Event::TuneRequest { source } => self.tune_request(source),
            Event::TimingClock { source } => self.timing_clock(source),
            Event::Start { source } => self.start_sequence(source),
            Event::Continue { source } => self.continue_sequence(source),
            Event::Stop { source } => self.stop_sequence(source),
            Event::ActiveSensing { source } => self.active_sensing(source),
            Event::SystemReset { source } => self.system_reset(source),
        }
    }

    // MIDI 1.0 channel voice

    fn note_off(&mut self, _source: EndpointId, _note: u8, _velocity: u8, _channel: u8) {}
    fn note_on(&mut self, _source: EndpointId, _note: u8, _velocity: u8, _channel: u8) {}
    fn poly_pressure(&mut self, _source: EndpointId, _note: u8, _pressure: u8, _channel: u8) {}
    fn control_change(&mut self, _source: EndpointId, _controller: u8, _value: u8, _channel: u8) {}
    fn program_change(&mut self, _source: EndpointId, _program: u8, _channel: u8) {}
    fn channel_pressure(&mut self, _source: EndpointId, _pressure: u8, _channel: u8) {}
    fn pitch_bend(&mut self, _source: EndpointId, _value: u16, _channel: u8) {}

    // MIDI 2.0 channel voice

    /// Unlike v1, a v2 note-on with velocity 0 is still a note-on.
    #[allow(clippy::too_many_arguments)]
    fn note_on2(
        &mut self,
        _source: EndpointId,
        _note: u8,
        _velocity: u16,
        _attribute_type: u8,
        _attribute_data: u16,
        _group: u8,
        _channel: u8,
    ) {
    }

    #[allow(clippy::too_many_arguments)]
    fn note_off2(
        &mut self,
        _source: EndpointId,
        _note: u8,
        _velocity: u16,
        _attribute_type: u8,
        _attribute_data: u16,
        _group: u8,
        _channel: u8,
    ) {
    }

    fn poly_pressure2(
        &mut self,
        _source: EndpointId,
        _note: u8,
        _pressure: u32,
        _group: u8,
        _channel: u8,
    ) {
    }

    fn control_change2(
        &mut self,
        _source: EndpointId,
        _controller: u8,
        _value: u32,
        _group: u8,
        _channel: u8,
    ) {
    }

    fn channel_pressure2(
        &mut self,
        _source: EndpointId,
        _pressure: u32,
        _group: u8,
        _channel: u8,
    ) {
    }

    fn program_change2(
        &mut self,
        _source: EndpointId,
        _program: u8,
        _bank: u16,
        _group: u8,
        _channel: u8,
    ) {
    }

    fn pitch_bend2(&mut self, _source: EndpointId, _value: u32, _group: u8, _channel: u8) {}

    fn per_note_pitch_bend(
        &mut self,
        _source: EndpointId,
        _note: u8,
        _value: u32,
        _group: u8,
        _channel: u8,
    ) {
    }

    #[allow(clippy::too_many_arguments)]
    fn registered_per_note_controller(
        &mut self,
        _source: EndpointId,
        _note: u8,
        _controller: u8,
        _value: u32,
        _group: u8,
        _channel: u8,
    ) {
    }

    #[allow(clippy::too_many_arguments)]
    fn assignable_per_note_controller(
        &mut self,
        _source: EndpointId,
        _note: u8,
        _controller: u8,
        _value: u32,
        _group: u8,
        _channel: u8,
    ) {
    }

    fn registered_controller(
        &mut self,
        _source: EndpointId,
        _controller: u16,
        _value: u32,
        _group: u8,
        _channel: u8,
    ) {
    }

    fn assignable_controller(
        &mut self,
        _source: EndpointId,
        _controller: u16,
        _value: u32,
        _group: u8,
        _channel: u8,
    ) {
    }

    fn relative_registered_controller(
        &mut self,
        _source: EndpointId,
        _controller: u16,
        _value: i32,
        _group: u8,
        _channel: u8,
    ) {
    }

    fn relative_assignable_controller(
        &mut self,
        _source: EndpointId,
        _controller: u16,
        _value: i32,
        _group: u8,
        _channel: u8,
    ) {
    }

    #[allow(clippy::too_many_arguments)]
    fn per_note_management(
        &mut self,
        _source: EndpointId,
        _note: u8,
        _detach: bool,
        _reset: bool,
        _group: u8,
        _channel: u8,
    ) {
    }

    // System common / real-time

    fn time_code_quarter_frame(&mut self, _source: EndpointId, _value: u8) {}
    fn song_position_pointer(&mut self, _source: EndpointId, _value: u16) {}
    fn song_select(&mut self, _source: EndpointId, _value: u8) {}
    fn tune_request(&mut self, _source: EndpointId) {}
    fn timing_clock(&mut self, _source: EndpointId) {}
    fn start_sequence(&mut self, _source: EndpointId) {}
    fn continue_sequence(&mut self, _source: EndpointId) {}
    fn stop_sequence(&mut self, _source: EndpointId) {}
    fn active_sensing(&mut self, _source: EndpointId) {}

    /// Release any held notes. Never called by the decoders directly; the
    /// default [`Receiver::system_reset`] delegates here.
    fn all_notes_off(&mut self) {}

    fn system_reset(&mut self, _source: EndpointId) {
        self.all_notes_off();
    }
}

// Compile-time check that every method really has a default.
struct _DefaultsOnly;
impl Receiver for _DefaultsOnly {}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct NoteCounter {
        ons: usize,
        offs: usize,
        resets: usize,
        releases: usize,
    }

    impl Receiver for NoteCounter {
        fn note_on(&mut self, _source: EndpointId, _note: u8, _velocity: u8, _channel: u8) {
            self.ons += 1;
        }
        fn note_off(&mut self, _source: EndpointId, _note: u8, _velocity: u8, _channel: u8) {
            self.offs += 1;
        }
        fn all_notes_off(&mut self) {
            self.releases += 1;
        }
        fn system_reset(&mut self, _source: EndpointId) {
            self.resets += 1;
            self.all_notes_off();
        }
    }

    #[test]
    fn receive_dispatches_to_variant_methods() {
        let mut sink = NoteCounter::default();
        sink.receive(Event::NoteOn {
            source: 1,
            channel: 0,
            note: 60,
            velocity: 100,
        });
        sink.receive(Event::NoteOff {
            source: 1,
            channel: 0,
            note: 60,
            velocity: 0,
        });
        sink.receive(Event::TimingClock { source: 1 });
        assert_eq!(sink.ons, 1);
        assert_eq!(sink.offs, 1);
    }

    #[test]
    fn system_reset_default_releases_notes() {
        let mut sink = NoteCounter::default();
        sink.receive(Event::SystemReset { source: 1 });
        assert_eq!(sink.resets, 1);
        assert_eq!(sink.releases, 1);
    }

    #[test]
    fn default_filters_accept_everything() {
        let sink = NoteCounter::default();
        assert_eq!(sink.channel(), ACCEPT_ALL);
        assert_eq!(sink.group(), ACCEPT_ALL);
    }
}

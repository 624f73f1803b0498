//! MIDI stream decoding for the ostinato engine.
//!
//! Two decoders share one event vocabulary: [`midi1`] walks legacy MIDI 1.0
//! byte buffers and [`midi2`] walks MIDI 2.0 Universal MIDI Packet (UMP)
//! 32-bit word buffers. Both deliver [`Event`]s to a host-supplied
//! [`Receiver`] and record per-endpoint channel/group telemetry into a shared
//! [`ConnectionMap`].
//!
//! SysEx content is intentionally not decoded; a SysEx status byte only
//! consumes the remainder of its packet.

pub mod event;
pub use event::{EndpointId, Event};

pub mod receiver;
pub use receiver::{Receiver, ACCEPT_ALL, ACCEPT_NONE};

pub mod monitor;
pub use monitor::Monitor;

pub mod connections;
pub use connections::{ConnectionMap, ConnectionToken, EndpointState};

pub mod midi1;
pub mod midi2;

pub(crate) mod words;

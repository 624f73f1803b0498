//! Umbrella crate re-exporting the ostinato workspace.
//!
//! [`ostinato_midi`] decodes MIDI 1.0 byte streams and MIDI 2.0 Universal
//! MIDI Packet word streams into one event vocabulary. With the `io` feature
//! (default), [`ostinato_midi_io`] adds the transport contract, source
//! connection reconciliation, and the [`MidiClient`] facade.
//!
//! ```no_run
//! use ostinato::{MidiClient, Receiver, Event};
//! # struct AlsaTransport;
//! # impl ostinato::Transport for AlsaTransport {
//! #     fn sources(&mut self) -> Vec<ostinato::SourceEndpoint> { Vec::new() }
//! #     fn connect(&mut self, _: &ostinato::SourceEndpoint, _: ostinato::ConnectionToken) -> ostinato::io::Result<()> { Ok(()) }
//! #     fn disconnect(&mut self, _: ostinato::EndpointId) -> ostinato::io::Result<()> { Ok(()) }
//! # }
//!
//! struct Printer;
//! impl Receiver for Printer {
//!     fn receive(&mut self, event: Event) {
//!         println!("{event:?}");
//!     }
//! }
//!
//! let client = MidiClient::new(Box::new(AlsaTransport), 0, "ostinato in");
//! client.set_receiver(Printer);
//! client.start();
//! ```

pub use ostinato_midi::{
    midi1, midi2, ConnectionMap, ConnectionToken, EndpointId, Event, Monitor, Receiver,
    ACCEPT_ALL, ACCEPT_NONE,
};

#[cfg(feature = "io")]
pub use ostinato_midi_io as io;

#[cfg(feature = "io")]
pub use ostinato_midi_io::{
    ConnectionChanges, DeviceState, MidiClient, Reconciler, SourceEndpoint, Transport,
};

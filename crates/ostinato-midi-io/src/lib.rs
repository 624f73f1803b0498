//! Transport-facing layer: endpoint discovery, connection reconciliation,
//! and the client facade that feeds raw deliveries into the
//! [`ostinato_midi`] decoders.
//!
//! The platform transport (CoreMIDI, ALSA, a test double) implements
//! [`Transport`]; everything else here is platform-free.

pub mod client;
pub use client::{DeviceState, MidiClient};

pub mod error;
pub use error::{Error, Result};

pub mod reconciler;
pub use reconciler::{ConnectionChanges, Reconciler};

pub mod transport;
pub use transport::{SourceEndpoint, Transport};

//! Contract the platform transport layer fulfils.

use ostinato_midi::{ConnectionToken, EndpointId};
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One discoverable source endpoint as reported by the transport.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceEndpoint {
    pub unique_id: EndpointId,
    pub display_name: String,
}

impl SourceEndpoint {
    pub fn new(unique_id: EndpointId, display_name: impl Into<String>) -> Self {
        Self {
            unique_id,
            display_name: display_name.into(),
        }
    }
}

/// Platform plumbing the reconciler drives.
///
/// Implementations deliver incoming traffic by calling
/// [`MidiClient::receive_bytes`](crate::MidiClient::receive_bytes) or
/// [`MidiClient::receive_words`](crate::MidiClient::receive_words) with the
/// token passed to [`Transport::connect`]. They must not call back into the
/// client from within `connect`/`disconnect`; those run inside the client's
/// critical section.
pub trait Transport {
    /// Current universe of discoverable sources. Not cached by the client
    /// beyond one reconciliation pass.
    fn sources(&mut self) -> Vec<SourceEndpoint>;

    /// Subscribe to an endpoint's traffic, tagging deliveries with `token`.
    fn connect(&mut self, endpoint: &SourceEndpoint, token: ConnectionToken) -> Result<()>;

    /// Stop deliveries from an endpoint.
    fn disconnect(&mut self, id: EndpointId) -> Result<()>;
}

//! Facade tying the transport, the decoders, and the reconciler together.

use ostinato_midi::{midi1, midi2, ConnectionMap, ConnectionToken, EndpointId, Monitor, Receiver};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::error::Result;
use crate::reconciler::{ConnectionChanges, Reconciler};
use crate::transport::Transport;

/// One row of [`MidiClient::devices`]: a discoverable source joined with what
/// the connection map knows about it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceState {
    pub unique_id: EndpointId,
    pub display_name: String,
    pub connected: bool,
    pub group: Option<u8>,
    pub channel: Option<u8>,
}

/// Owns the transport and routes its deliveries into the decoders.
///
/// The delivery path and the application-facing control path both end up in
/// the connection map's single mutex, so connect/disconnect never races a
/// telemetry write. Internal lock order is transport, receiver, monitor,
/// connections; transport and monitor implementations must not call back
/// into the client, since they run with those locks held.
pub struct MidiClient {
    transport: Mutex<Box<dyn Transport + Send>>,
    receiver: Mutex<Option<Box<dyn Receiver + Send>>>,
    monitor: Mutex<Option<Box<dyn Monitor + Send>>>,
    connections: ConnectionMap,
    reconciler: Reconciler,
    our_id: EndpointId,
    port_name: String,
    started: Mutex<bool>,
}

impl MidiClient {
    /// `our_id` is the unique id of this process's own virtual endpoint; it
    /// is never offered for connection.
    pub fn new(
        transport: Box<dyn Transport + Send>,
        our_id: EndpointId,
        port_name: impl Into<String>,
    ) -> Self {
        Self {
            transport: Mutex::new(transport),
            receiver: Mutex::new(None),
            monitor: Mutex::new(None),
            connections: ConnectionMap::new(),
            reconciler: Reconciler::new(our_id),
            our_id,
            port_name: port_name.into(),
            started: Mutex::new(false),
        }
    }

    pub fn set_receiver(&self, receiver: impl Receiver + Send + 'static) {
        *self.receiver.lock() = Some(Box::new(receiver));
    }

    pub fn clear_receiver(&self) {
        *self.receiver.lock() = None;
    }

    pub fn set_monitor(&self, monitor: impl Monitor + Send + 'static) {
        *self.monitor.lock() = Some(Box::new(monitor));
    }

    /// Announce the input port, then run the first reconciliation pass.
    /// Starting twice is a no-op.
    pub fn start(&self) -> ConnectionChanges {
        {
            let mut started = self.started.lock();
            if *started {
                return ConnectionChanges::default();
            }
            *started = true;
        }
        {
            let mut monitor = self.monitor.lock();
            if let Some(m) = monitor.as_mut() {
                m.did_create_input_port(&self.port_name);
                m.did_initialize(self.our_id);
            }
        }
        self.reconcile()
    }

    /// Disconnect everything and announce teardown. Stopping an unstarted
    /// client is a no-op.
    pub fn stop(&self) {
        {
            let mut started = self.started.lock();
            if !*started {
                return;
            }
            *started = false;
        }
        let mut transport = self.transport.lock();
        let mut monitor = self.monitor.lock();
        if let Some(m) = monitor.as_mut() {
            m.will_uninitialize();
        }
        self.reconciler.disconnect_all(
            &mut **transport,
            monitor.as_mut().map(|m| &mut **m as &mut dyn Monitor),
            &self.connections,
        );
        if let Some(m) = monitor.as_mut() {
            m.did_delete_input_port(&self.port_name);
            m.did_uninitialize();
        }
    }

    /// Topology-change trigger from the transport layer.
    pub fn sources_changed(&self) -> ConnectionChanges {
        self.reconcile()
    }

    /// Explicitly connect one source, subject to the monitor veto.
    pub fn connect_source(&self, id: EndpointId) -> Result<()> {
        let mut transport = self.transport.lock();
        let mut monitor = self.monitor.lock();
        self.reconciler.connect_endpoint(
            &mut **transport,
            monitor.as_mut().map(|m| &mut **m as &mut dyn Monitor),
            &self.connections,
            id,
        )
    }

    /// Explicitly disconnect one source. Never-connected ids are a no-op.
    pub fn disconnect_source(&self, id: EndpointId) -> Result<()> {
        let mut transport = self.transport.lock();
        let mut monitor = self.monitor.lock();
        self.reconciler.disconnect_endpoint(
            &mut **transport,
            monitor.as_mut().map(|m| &mut **m as &mut dyn Monitor),
            &self.connections,
            id,
        )
    }

    /// MIDI 1.0 delivery entry point. A token that no longer resolves (late
    /// delivery after disconnect) drops the buffer silently.
    pub fn receive_bytes(&self, token: ConnectionToken, bytes: &[u8], timestamp: u64) {
        let Some(source) = self.connections.resolve(token) else {
            debug!(?token, "stale token, dropping delivery");
            return;
        };
        trace!(source, timestamp, len = bytes.len(), "bytes in");
        let mut receiver = self.receiver.lock();
        let mut monitor = self.monitor.lock();
        midi1::parse(
            source,
            bytes,
            receiver.as_mut().map(|r| &mut **r as &mut dyn Receiver),
            monitor.as_mut().map(|m| &mut **m as &mut dyn Monitor),
            &self.connections,
        );
    }

    /// MIDI 2.0 (UMP) delivery entry point; same stale-token rule.
    pub fn receive_words(&self, token: ConnectionToken, words: &[u32], timestamp: u64) {
        let Some(source) = self.connections.resolve(token) else {
            debug!(?token, "stale token, dropping delivery");
            return;
        };
        trace!(source, timestamp, len = words.len(), "words in");
        let mut receiver = self.receiver.lock();
        let mut monitor = self.monitor.lock();
        midi2::parse(
            source,
            words,
            receiver.as_mut().map(|r| &mut **r as &mut dyn Receiver),
            monitor.as_mut().map(|m| &mut **m as &mut dyn Monitor),
            &self.connections,
        );
    }

    /// Discoverable sources joined with connected flag and last-seen
    /// group/channel telemetry.
    pub fn devices(&self) -> Vec<DeviceState> {
        let mut transport = self.transport.lock();
        transport
            .sources()
            .into_iter()
            .filter(|endpoint| endpoint.unique_id != self.our_id)
            .map(|endpoint| {
                let state = self.connections.state(endpoint.unique_id).unwrap_or_default();
                DeviceState {
                    unique_id: endpoint.unique_id,
                    display_name: endpoint.display_name,
                    connected: state.connected,
                    group: state.group,
                    channel: state.channel,
                }
            })
            .collect()
    }

    pub fn is_connected(&self, id: EndpointId) -> bool {
        self.connections.is_connected(id)
    }

    fn reconcile(&self) -> ConnectionChanges {
        let mut transport = self.transport.lock();
        let mut monitor = self.monitor.lock();
        self.reconciler.reconcile(
            &mut **transport,
            monitor.as_mut().map(|m| &mut **m as &mut dyn Monitor),
            &self.connections,
        )
    }
}

impl Drop for MidiClient {
    fn drop(&mut self) {
        self.stop();
    }
}

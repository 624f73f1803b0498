//! Diff-and-apply alignment of the active-connection set with the
//! discoverable source universe.

use ostinato_midi::{ConnectionMap, EndpointId, Monitor};
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::transport::Transport;

/// Outcome of one reconciliation pass.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ConnectionChanges {
    pub added: Vec<EndpointId>,
    pub removed: Vec<EndpointId>,
}

impl ConnectionChanges {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Drives connect/disconnect against the transport from topology snapshots.
///
/// Each pass runs entirely inside the connection map's critical section, so
/// telemetry writes from the delivery path and concurrent passes serialize
/// against it.
pub struct Reconciler {
    /// This process's own virtual endpoint, excluded from every snapshot.
    our_id: EndpointId,
}

impl Reconciler {
    pub fn new(our_id: EndpointId) -> Self {
        Self { our_id }
    }

    /// One evaluate-decide-apply pass.
    ///
    /// New sources are offered to the monitor's `should_connect` veto before
    /// a connect attempt; vetoed sources are offered again next pass. Sources
    /// that vanished from the snapshot are disconnected and their telemetry
    /// cleared. Transport failures are logged and leave the endpoint in its
    /// pre-attempt state; the next pass re-evaluates. A pass that changes
    /// nothing emits no monitor notifications.
    pub fn reconcile(
        &self,
        transport: &mut dyn Transport,
        mut monitor: Option<&mut dyn Monitor>,
        connections: &ConnectionMap,
    ) -> ConnectionChanges {
        let snapshot: Vec<_> = transport
            .sources()
            .into_iter()
            .filter(|endpoint| endpoint.unique_id != self.our_id)
            .collect();

        let mut guard = connections.lock();

        let candidates: Vec<_> = snapshot
            .iter()
            .filter(|endpoint| !guard.is_connected(endpoint.unique_id))
            .cloned()
            .collect();
        let gone: Vec<EndpointId> = guard
            .connected_ids()
            .into_iter()
            .filter(|id| snapshot.iter().all(|endpoint| endpoint.unique_id != *id))
            .collect();

        if candidates.is_empty() && gone.is_empty() {
            return ConnectionChanges::default();
        }

        if let Some(m) = monitor.as_mut() {
            m.will_update_connections();
        }

        let mut changes = ConnectionChanges::default();

        for endpoint in &candidates {
            let approved = monitor
                .as_mut()
                .map(|m| m.should_connect(endpoint.unique_id, &endpoint.display_name))
                .unwrap_or(true);
            if !approved {
                debug!(id = endpoint.unique_id, name = %endpoint.display_name, "connection vetoed");
                continue;
            }
            let token = guard.mark_connected(endpoint.unique_id);
            match transport.connect(endpoint, token) {
                Ok(()) => {
                    debug!(id = endpoint.unique_id, name = %endpoint.display_name, "connected");
                    changes.added.push(endpoint.unique_id);
                }
                Err(err) => {
                    warn!(id = endpoint.unique_id, %err, "connect failed");
                    guard.mark_disconnected(endpoint.unique_id);
                }
            }
        }

        for id in gone {
            match transport.disconnect(id) {
                Ok(()) => {
                    guard.mark_disconnected(id);
                    debug!(id, "disconnected");
                    changes.removed.push(id);
                }
                Err(err) => {
                    // Still connected as far as we know; retried next pass.
                    warn!(id, %err, "disconnect failed");
                }
            }
        }

        if !changes.is_empty() {
            if let Some(m) = monitor.as_mut() {
                m.did_update_connections(&changes.added, &changes.removed);
            }
        }
        changes
    }

    /// Connect one endpoint by id, outside a full pass. The id must be in
    /// the current snapshot; the monitor veto still applies.
    pub fn connect_endpoint(
        &self,
        transport: &mut dyn Transport,
        mut monitor: Option<&mut dyn Monitor>,
        connections: &ConnectionMap,
        id: EndpointId,
    ) -> Result<()> {
        let endpoint = transport
            .sources()
            .into_iter()
            .filter(|endpoint| endpoint.unique_id != self.our_id)
            .find(|endpoint| endpoint.unique_id == id)
            .ok_or(Error::UnknownEndpoint(id))?;

        let mut guard = connections.lock();
        if guard.is_connected(id) {
            return Ok(());
        }
        let approved = monitor
            .as_mut()
            .map(|m| m.should_connect(id, &endpoint.display_name))
            .unwrap_or(true);
        if !approved {
            debug!(id, "connection vetoed");
            return Ok(());
        }
        if let Some(m) = monitor.as_mut() {
            m.will_update_connections();
        }
        let token = guard.mark_connected(id);
        match transport.connect(&endpoint, token) {
            Ok(()) => {
                if let Some(m) = monitor.as_mut() {
                    m.did_update_connections(&[id], &[]);
                }
                Ok(())
            }
            Err(err) => {
                guard.mark_disconnected(id);
                Err(err)
            }
        }
    }

    /// Disconnect one endpoint by id. Never-connected ids are a no-op.
    pub fn disconnect_endpoint(
        &self,
        transport: &mut dyn Transport,
        mut monitor: Option<&mut dyn Monitor>,
        connections: &ConnectionMap,
        id: EndpointId,
    ) -> Result<()> {
        let mut guard = connections.lock();
        if !guard.is_connected(id) {
            return Ok(());
        }
        if let Some(m) = monitor.as_mut() {
            m.will_update_connections();
        }
        transport.disconnect(id)?;
        guard.mark_disconnected(id);
        if let Some(m) = monitor.as_mut() {
            m.did_update_connections(&[], &[id]);
        }
        Ok(())
    }

    /// Tear everything down; used at shutdown. Disconnect failures are
    /// logged and the endpoint is dropped from the map anyway.
    pub fn disconnect_all(
        &self,
        transport: &mut dyn Transport,
        mut monitor: Option<&mut dyn Monitor>,
        connections: &ConnectionMap,
    ) {
        let mut guard = connections.lock();
        let connected = guard.connected_ids();
        if connected.is_empty() {
            guard.clear();
            return;
        }
        if let Some(m) = monitor.as_mut() {
            m.will_update_connections();
        }
        for &id in &connected {
            if let Err(err) = transport.disconnect(id) {
                warn!(id, %err, "disconnect failed during shutdown");
            }
        }
        guard.clear();
        if let Some(m) = monitor.as_mut() {
            m.did_update_connections(&[], &connected);
        }
    }
}

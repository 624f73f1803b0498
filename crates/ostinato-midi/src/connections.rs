//! Shared per-endpoint connection state and traffic telemetry.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::{Mutex, MutexGuard};
use serde::{Deserialize, Serialize};

use crate::event::EndpointId;

/// Opaque handle identifying one connection attempt. A fresh token is issued
/// on every connect, so deliveries tagged with a token from before a
/// disconnect no longer resolve to an endpoint.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ConnectionToken(u64);

/// What the map knows about one endpoint.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EndpointState {
    /// Last UMP group seen from this endpoint. `None` until v2 traffic
    /// arrives; MIDI 1.0 byte traffic never sets it.
    pub group: Option<u8>,
    /// Last channel seen from this endpoint. System messages never set it.
    pub channel: Option<u8>,
    pub connected: bool,
    token: Option<ConnectionToken>,
}

#[derive(Default)]
struct Inner {
    endpoints: HashMap<EndpointId, EndpointState>,
    // Live tokens only; invalidated on disconnect.
    tokens: HashMap<ConnectionToken, EndpointId>,
}

/// Map of endpoint id to connection state, guarded by a single mutex.
///
/// The decoders write telemetry through the one-shot convenience methods; the
/// reconciler takes [`ConnectionMap::lock`] once and performs its whole
/// evaluate-decide-apply pass under that guard, so no telemetry write or
/// concurrent reconcile can interleave with it.
#[derive(Default)]
pub struct ConnectionMap {
    inner: Mutex<Inner>,
    next_token: AtomicU64,
}

impl ConnectionMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Hold the map across a multi-step operation.
    pub fn lock(&self) -> ConnectionsGuard<'_> {
        ConnectionsGuard {
            inner: self.inner.lock(),
            next_token: &self.next_token,
        }
    }

    /// Record a traffic sighting. Creates the entry if the endpoint has never
    /// been seen before.
    pub fn observe(&self, id: EndpointId, group: Option<u8>, channel: Option<u8>) {
        self.lock().observe(id, group, channel);
    }

    /// Endpoint a live token points at, if any.
    pub fn resolve(&self, token: ConnectionToken) -> Option<EndpointId> {
        self.lock().resolve(token)
    }

    pub fn is_connected(&self, id: EndpointId) -> bool {
        self.lock().is_connected(id)
    }

    pub fn state(&self, id: EndpointId) -> Option<EndpointState> {
        self.lock().state(id)
    }
}

/// Exclusive access to the connection map.
pub struct ConnectionsGuard<'a> {
    inner: MutexGuard<'a, Inner>,
    next_token: &'a AtomicU64,
}

impl ConnectionsGuard<'_> {
    pub fn observe(&mut self, id: EndpointId, group: Option<u8>, channel: Option<u8>) {
        let state = self.inner.endpoints.entry(id).or_default();
        if group.is_some() {
            state.group = group;
        }
        if channel.is_some() {
            state.channel = channel;
        }
    }

    /// Flag the endpoint connected and issue it a fresh token. Any previous
    /// token for the endpoint is invalidated first.
    pub fn mark_connected(&mut self, id: EndpointId) -> ConnectionToken {
        let token = ConnectionToken(self.next_token.fetch_add(1, Ordering::Relaxed));
        let inner = &mut *self.inner;
        let state = inner.endpoints.entry(id).or_default();
        if let Some(old) = state.token.take() {
            inner.tokens.remove(&old);
        }
        state.connected = true;
        state.token = Some(token);
        inner.tokens.insert(token, id);
        token
    }

    /// Flag the endpoint disconnected, invalidate its token, and drop its
    /// telemetry. A never-connected id is a no-op.
    pub fn mark_disconnected(&mut self, id: EndpointId) {
        let inner = &mut *self.inner;
        if let Some(state) = inner.endpoints.get_mut(&id) {
            if let Some(token) = state.token.take() {
                inner.tokens.remove(&token);
            }
            *state = EndpointState::default();
        }
    }

    pub fn resolve(&self, token: ConnectionToken) -> Option<EndpointId> {
        self.inner.tokens.get(&token).copied()
    }

    pub fn is_connected(&self, id: EndpointId) -> bool {
        self.inner
            .endpoints
            .get(&id)
            .map(|state| state.connected)
            .unwrap_or(false)
    }

    pub fn connected_ids(&self) -> Vec<EndpointId> {
        let mut ids: Vec<EndpointId> = self
            .inner
            .endpoints
            .iter()
            .filter(|(_, state)| state.connected)
            .map(|(id, _)| *id)
            .collect();
        ids.sort_unstable();
        ids
    }

    pub fn state(&self, id: EndpointId) -> Option<EndpointState> {
        self.inner.endpoints.get(&id).copied()
    }

    pub fn clear(&mut self) {
        self.inner.endpoints.clear();
        self.inner.tokens.clear();
    }
}

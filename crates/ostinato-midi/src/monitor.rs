//! Lifecycle and traffic observation hooks.

use crate::event::EndpointId;

/// Observer of client lifecycle, connection churn, and raw traffic.
///
/// All methods default to no-ops except [`Monitor::should_connect`], which
/// defaults to accepting every discovered endpoint. [`Monitor::did_see`] fires
/// for every channel-voice message before any channel/group filtering, so a
/// monitor sees traffic even when no receiver is installed.
pub trait Monitor {
    /// The client is up; `our_id` is its own virtual endpoint, excluded from
    /// reconciliation.
    fn did_initialize(&mut self, _our_id: EndpointId) {}
    fn will_uninitialize(&mut self) {}
    fn did_uninitialize(&mut self) {}

    fn did_create_input_port(&mut self, _name: &str) {}
    fn did_delete_input_port(&mut self, _name: &str) {}

    /// Veto point for connection attempts. Returning `false` leaves the
    /// endpoint discovered but unconnected; it will be offered again on the
    /// next reconciliation pass.
    fn should_connect(&mut self, _id: EndpointId, _display_name: &str) -> bool {
        true
    }

    fn will_update_connections(&mut self) {}

    /// Reports the outcome of a reconciliation pass. Only called when at
    /// least one connection was added or removed.
    fn did_update_connections(&mut self, _added: &[EndpointId], _removed: &[EndpointId]) {}

    /// Raw channel-voice traffic sighting. `group` is -1 for MIDI 1.0 byte
    /// streams, which carry no group.
    fn did_see(&mut self, _source: EndpointId, _group: i32, _channel: i32) {}
}

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use parking_lot::Mutex;

use ostinato_midi::{ConnectionToken, EndpointId, Event, Monitor, Receiver};
use ostinato_midi_io::{Error, MidiClient, SourceEndpoint, Transport};

#[derive(Default)]
struct FakeState {
    sources: Vec<SourceEndpoint>,
    connected: HashMap<EndpointId, ConnectionToken>,
    fail_connect: HashSet<EndpointId>,
    connect_attempts: usize,
}

#[derive(Clone, Default)]
struct FakeTransport {
    state: Arc<Mutex<FakeState>>,
}

impl FakeTransport {
    fn with_sources(sources: &[(EndpointId, &str)]) -> Self {
        let transport = Self::default();
        transport.set_sources(sources);
        transport
    }

    fn set_sources(&self, sources: &[(EndpointId, &str)]) {
        self.state.lock().sources = sources
            .iter()
            .map(|(id, name)| SourceEndpoint::new(*id, *name))
            .collect();
    }

    fn fail_connect(&self, id: EndpointId, fail: bool) {
        let mut state = self.state.lock();
        if fail {
            state.fail_connect.insert(id);
        } else {
            state.fail_connect.remove(&id);
        }
    }

    fn token_for(&self, id: EndpointId) -> Option<ConnectionToken> {
        self.state.lock().connected.get(&id).copied()
    }

    fn connect_attempts(&self) -> usize {
        self.state.lock().connect_attempts
    }
}

impl Transport for FakeTransport {
    fn sources(&mut self) -> Vec<SourceEndpoint> {
        self.state.lock().sources.clone()
    }

    fn connect(
        &mut self,
        endpoint: &SourceEndpoint,
        token: ConnectionToken,
    ) -> ostinato_midi_io::Result<()> {
        let mut state = self.state.lock();
        state.connect_attempts += 1;
        if state.fail_connect.contains(&endpoint.unique_id) {
            return Err(Error::Transport("device busy".into()));
        }
        state.connected.insert(endpoint.unique_id, token);
        Ok(())
    }

    fn disconnect(&mut self, id: EndpointId) -> ostinato_midi_io::Result<()> {
        self.state.lock().connected.remove(&id);
        Ok(())
    }
}

#[derive(Clone, Default)]
struct Probe {
    log: Arc<Mutex<Vec<String>>>,
    vetoed: Arc<Mutex<HashSet<EndpointId>>>,
}

impl Probe {
    fn veto(&self, id: EndpointId, vetoed: bool) {
        let mut set = self.vetoed.lock();
        if vetoed {
            set.insert(id);
        } else {
            set.remove(&id);
        }
    }

    fn log(&self) -> Vec<String> {
        self.log.lock().clone()
    }

    fn take_log(&self) -> Vec<String> {
        std::mem::take(&mut *self.log.lock())
    }
}

impl Monitor for Probe {
    fn did_initialize(&mut self, our_id: EndpointId) {
        self.log.lock().push(format!("init {our_id}"));
    }
    fn will_uninitialize(&mut self) {
        self.log.lock().push("will-uninit".into());
    }
    fn did_uninitialize(&mut self) {
        self.log.lock().push("did-uninit".into());
    }
    fn did_create_input_port(&mut self, name: &str) {
        self.log.lock().push(format!("port+ {name}"));
    }
    fn did_delete_input_port(&mut self, name: &str) {
        self.log.lock().push(format!("port- {name}"));
    }
    fn should_connect(&mut self, id: EndpointId, _display_name: &str) -> bool {
        !self.vetoed.lock().contains(&id)
    }
    fn will_update_connections(&mut self) {
        self.log.lock().push("will-update".into());
    }
    fn did_update_connections(&mut self, added: &[EndpointId], removed: &[EndpointId]) {
        self.log
            .lock()
            .push(format!("did-update +{added:?} -{removed:?}"));
    }
    fn did_see(&mut self, source: EndpointId, group: i32, channel: i32) {
        self.log
            .lock()
            .push(format!("saw {source} g{group} c{channel}"));
    }
}

#[derive(Clone, Default)]
struct EventLog(Arc<Mutex<Vec<Event>>>);

impl EventLog {
    fn events(&self) -> Vec<Event> {
        self.0.lock().clone()
    }
}

impl Receiver for EventLog {
    fn receive(&mut self, event: Event) {
        self.0.lock().push(event);
    }
}

const OUR_ID: EndpointId = 99;

fn client_with(transport: &FakeTransport, probe: &Probe, events: &EventLog) -> MidiClient {
    let client = MidiClient::new(Box::new(transport.clone()), OUR_ID, "ostinato in");
    client.set_monitor(probe.clone());
    client.set_receiver(events.clone());
    client
}

#[test]
fn start_connects_discoverable_sources_and_skips_our_own() {
    let transport = FakeTransport::with_sources(&[(1, "keys"), (2, "pads"), (OUR_ID, "ourselves")]);
    let probe = Probe::default();
    let client = client_with(&transport, &probe, &EventLog::default());

    let changes = client.start();
    assert_eq!(changes.added, vec![1, 2]);
    assert!(changes.removed.is_empty());
    assert!(client.is_connected(1));
    assert!(client.is_connected(2));
    assert!(!client.is_connected(OUR_ID));
    assert_eq!(
        probe.log(),
        vec![
            "port+ ostinato in",
            "init 99",
            "will-update",
            "did-update +[1, 2] -[]",
        ]
    );
}

#[test]
fn reconciliation_is_idempotent() {
    let transport = FakeTransport::with_sources(&[(1, "keys")]);
    let probe = Probe::default();
    let client = client_with(&transport, &probe, &EventLog::default());

    client.start();
    probe.take_log();

    let changes = client.sources_changed();
    assert!(changes.is_empty());
    assert!(probe.log().is_empty());
}

#[test]
fn endpoint_lifecycle_clears_telemetry_only_at_disconnect() {
    let transport = FakeTransport::with_sources(&[(1, "keys")]);
    let probe = Probe::default();
    let events = EventLog::default();
    let client = client_with(&transport, &probe, &events);

    client.start();
    let token = transport.token_for(1).unwrap();
    client.receive_bytes(token, &[0x93, 60, 100], 1000);

    let device = client
        .devices()
        .into_iter()
        .find(|d| d.unique_id == 1)
        .unwrap();
    assert!(device.connected);
    assert_eq!(device.channel, Some(3));

    // Telemetry survives an unrelated pass.
    client.sources_changed();
    assert_eq!(client.devices()[0].channel, Some(3));

    transport.set_sources(&[]);
    let changes = client.sources_changed();
    assert_eq!(changes.removed, vec![1]);
    assert!(!client.is_connected(1));

    // Reappearing endpoint starts with a clean slate.
    transport.set_sources(&[(1, "keys")]);
    client.sources_changed();
    let devices = client.devices();
    assert!(devices[0].connected);
    assert_eq!(devices[0].channel, None);
}

#[test]
fn vetoed_sources_are_offered_again() {
    let transport = FakeTransport::with_sources(&[(1, "keys")]);
    let probe = Probe::default();
    probe.veto(1, true);
    let client = client_with(&transport, &probe, &EventLog::default());

    let changes = client.start();
    assert!(changes.is_empty());
    assert!(!client.is_connected(1));
    assert_eq!(transport.connect_attempts(), 0);

    probe.veto(1, false);
    let changes = client.sources_changed();
    assert_eq!(changes.added, vec![1]);
}

#[test]
fn connect_failure_leaves_endpoint_unconnected_and_retries_next_pass() {
    let transport = FakeTransport::with_sources(&[(1, "keys")]);
    let probe = Probe::default();
    let client = client_with(&transport, &probe, &EventLog::default());
    transport.fail_connect(1, true);

    let changes = client.start();
    assert!(changes.is_empty());
    assert!(!client.is_connected(1));
    // will-update fired (there was work) but no did-update (nothing changed).
    assert!(probe.log().iter().any(|line| line == "will-update"));
    assert!(!probe.log().iter().any(|line| line.starts_with("did-update")));

    transport.fail_connect(1, false);
    let changes = client.sources_changed();
    assert_eq!(changes.added, vec![1]);
    assert_eq!(transport.connect_attempts(), 2);
}

#[test]
fn stale_token_after_disconnect_drops_delivery_silently() {
    let transport = FakeTransport::with_sources(&[(1, "keys")]);
    let events = EventLog::default();
    let client = client_with(&transport, &Probe::default(), &events);

    client.start();
    let token = transport.token_for(1).unwrap();
    client.disconnect_source(1).unwrap();

    client.receive_bytes(token, &[0x90, 60, 100], 2000);
    assert!(events.events().is_empty());
    assert_eq!(client.devices()[0].channel, None);
}

#[test]
fn explicit_disconnect_of_never_connected_id_is_a_no_op() {
    let transport = FakeTransport::with_sources(&[(1, "keys")]);
    let client = client_with(&transport, &Probe::default(), &EventLog::default());
    assert!(client.disconnect_source(42).is_ok());
}

#[test]
fn explicit_connect_and_disconnect_pair_their_update_notifications() {
    let transport = FakeTransport::with_sources(&[(1, "keys")]);
    let probe = Probe::default();
    let client = client_with(&transport, &probe, &EventLog::default());
    probe.veto(1, true);
    client.start();
    probe.take_log();

    probe.veto(1, false);
    client.connect_source(1).unwrap();
    assert_eq!(probe.take_log(), vec!["will-update", "did-update +[1] -[]"]);

    client.disconnect_source(1).unwrap();
    assert_eq!(probe.take_log(), vec!["will-update", "did-update +[] -[1]"]);
}

#[test]
fn explicit_connect_of_unknown_id_is_an_error() {
    let transport = FakeTransport::with_sources(&[(1, "keys")]);
    let client = client_with(&transport, &Probe::default(), &EventLog::default());
    client.start();
    assert!(matches!(
        client.connect_source(42),
        Err(Error::UnknownEndpoint(42))
    ));
}

#[test]
fn deliveries_reach_the_receiver_on_both_protocols() {
    let transport = FakeTransport::with_sources(&[(1, "keys")]);
    let probe = Probe::default();
    let events = EventLog::default();
    let client = client_with(&transport, &probe, &events);

    client.start();
    let token = transport.token_for(1).unwrap();
    probe.take_log();

    client.receive_bytes(token, &[0x91, 64, 32], 3000);
    client.receive_words(token, &[0x40_92_40_00, 0xFFFF_0000], 3001);

    assert_eq!(
        events.events(),
        vec![
            Event::NoteOn {
                source: 1,
                channel: 1,
                note: 64,
                velocity: 32
            },
            Event::NoteOn2 {
                source: 1,
                group: 0,
                channel: 2,
                note: 64,
                velocity: 0xFFFF,
                attribute_type: 0,
                attribute_data: 0,
            },
        ]
    );
    assert_eq!(probe.log(), vec!["saw 1 g-1 c1", "saw 1 g0 c2"]);

    let devices = client.devices();
    assert_eq!(devices[0].group, Some(0));
    assert_eq!(devices[0].channel, Some(2));
}

#[test]
fn stop_disconnects_everything_and_reports_teardown() {
    let transport = FakeTransport::with_sources(&[(1, "keys"), (2, "pads")]);
    let probe = Probe::default();
    let client = client_with(&transport, &probe, &EventLog::default());

    client.start();
    probe.take_log();
    client.stop();

    assert!(transport.token_for(1).is_none());
    assert!(transport.token_for(2).is_none());
    assert!(!client.is_connected(1));
    assert_eq!(
        probe.log(),
        vec![
            "will-uninit",
            "will-update",
            "did-update +[] -[1, 2]",
            "port- ostinato in",
            "did-uninit",
        ]
    );
}

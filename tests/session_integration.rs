//! Integration tests for the session façade.
//!
//! Drives a SessionClient against an in-memory mock engine that records
//! every call, so slot allocation, lazy tree building, handle lifecycle,
//! and event relay are all observable.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use capquery::prelude::*;
use capquery::{RawFrame, NULL_HANDLE};

/// In-memory engine that records calls for assertions.
#[derive(Default)]
struct MockEngine {
    next_token: AtomicU32,
    tokens: Mutex<HashMap<String, u32>>,
    installed: Mutex<Vec<(u32, CompiledFilter)>>,
    frames: Mutex<Vec<RawFrame>>,
    sources: Mutex<HashMap<String, u64>>,
    closed_readers: Mutex<Vec<u64>>,
    closed_writers: Mutex<Vec<u64>>,
    session_closes: AtomicU64,
}

impl MockEngine {
    fn new() -> Self {
        Self {
            next_token: AtomicU32::new(1),
            ..Default::default()
        }
    }

    fn with_source(self, id: &str, handle: u64) -> Self {
        self.sources.lock().unwrap().insert(id.to_string(), handle);
        self
    }

    fn push_frame(&self, index: u64, ids: &[u32], counts: &[u32]) {
        let nodes = ids
            .iter()
            .map(|&id| LayerRecord::with_data(Token(id), Bytes::from_static(b"\x00")))
            .collect();
        self.frames.lock().unwrap().push(RawFrame {
            index,
            nodes,
            child_counts: counts.to_vec(),
        });
    }

    fn installed(&self) -> Vec<(u32, CompiledFilter)> {
        self.installed.lock().unwrap().clone()
    }
}

impl TokenAuthority for MockEngine {
    fn intern(&self, name: &str) -> u32 {
        let mut tokens = self.tokens.lock().unwrap();
        *tokens
            .entry(name.to_string())
            .or_insert_with(|| self.next_token.fetch_add(1, Ordering::Relaxed))
    }

    fn resolve(&self, id: u32) -> String {
        let tokens = self.tokens.lock().unwrap();
        tokens
            .iter()
            .find(|(_, &v)| v == id)
            .map(|(k, _)| k.clone())
            .unwrap_or_default()
    }
}

impl CaptureEngine for MockEngine {
    fn install_filter(&self, slot: u32, filter: &CompiledFilter) {
        self.installed.lock().unwrap().push((slot, filter.clone()));
    }

    fn frames(&self, start: u64, end: u64) -> Vec<RawFrame> {
        self.frames
            .lock()
            .unwrap()
            .iter()
            .filter(|f| f.index >= start && f.index < end)
            .cloned()
            .collect()
    }

    fn filtered_frames(&self, _slot: u32, start: u64, end: u64) -> Vec<RawFrame> {
        // The mock does not evaluate predicates; filtering semantics are
        // engine-side and out of scope here.
        self.frames(start, end)
    }

    fn open_reader(&self, id: &str, _arg: &str) -> u64 {
        self.sources
            .lock()
            .unwrap()
            .get(id)
            .copied()
            .unwrap_or(NULL_HANDLE)
    }

    fn open_writer(&self, id: &str, arg: &str) -> u64 {
        self.open_reader(id, arg)
    }

    fn close_reader(&self, handle: u64) {
        self.closed_readers.lock().unwrap().push(handle);
    }

    fn close_writer(&self, handle: u64) {
        self.closed_writers.lock().unwrap().push(handle);
    }

    fn close(&self) {
        self.session_closes.fetch_add(1, Ordering::Relaxed);
    }
}

#[test]
fn set_filter_allocates_sequential_slots() {
    let engine = Arc::new(MockEngine::new());
    let session = SessionClient::new(engine.clone());

    session.set_filter("main", "tcp").unwrap();
    session.set_filter("side", "udp").unwrap();
    // Reinstalling under an existing id reuses its slot
    session.set_filter("main", "ipv4").unwrap();

    let installed = engine.installed();
    assert_eq!(installed.len(), 3);
    assert_eq!(installed[0].0, 0);
    assert_eq!(installed[1].0, 1);
    assert_eq!(installed[2].0, 0);
}

#[test]
fn empty_expression_installs_match_all() {
    let engine = Arc::new(MockEngine::new());
    let session = SessionClient::new(engine.clone());

    session.set_filter("main", "").unwrap();

    let installed = engine.installed();
    assert_eq!(installed.len(), 1);
    assert!(installed[0].1.is_match_all());
}

#[test]
fn empty_filter_id_is_invalid() {
    let engine = Arc::new(MockEngine::new());
    let session = SessionClient::new(engine.clone());

    let result = session.set_filter("", "tcp");
    assert!(matches!(result, Err(Error::InvalidArgument(_))));
    // Nothing reached the engine
    assert!(engine.installed().is_empty());
}

#[test]
fn syntax_error_surfaces_and_installs_nothing() {
    let engine = Arc::new(MockEngine::new());
    let session = SessionClient::new(engine.clone());

    let result = session.set_filter("main", "tcp.port ==");
    assert!(matches!(
        result,
        Err(Error::Filter(FilterError::Syntax { .. }))
    ));
    assert!(engine.installed().is_empty());
}

#[test]
fn frames_wrap_without_building_trees() {
    let engine = Arc::new(MockEngine::new());
    // eth -> ipv4 -> tcp chain plus an eth trailer sibling
    engine.push_frame(0, &[1, 2, 3, 4], &[2, 1, 0, 0]);
    engine.push_frame(1, &[1], &[0]);
    let session = SessionClient::new(engine);

    let frames = session.frames(0, 10);
    assert_eq!(frames.len(), 2);
    assert_eq!(frames[0].index(), 0);
    assert_eq!(frames[0].records().len(), 4);

    // Tree builds on first root() access and is memoized
    let root = frames[0].root().unwrap();
    assert_eq!(root.children.len(), 2);
    assert_eq!(root.children[0].children.len(), 1);
    let again = frames[0].root().unwrap();
    assert!(Arc::ptr_eq(&root, &again));
}

#[test]
fn malformed_frame_surfaces_on_access() {
    let engine = Arc::new(MockEngine::new());
    // Count overruns the stream
    engine.push_frame(0, &[1], &[3]);
    let session = SessionClient::new(engine);

    let frames = session.frames(0, 1);
    assert!(matches!(
        frames[0].root(),
        Err(Error::MalformedFrameData { .. })
    ));
}

#[test]
fn filtered_frames_require_installed_id() {
    let engine = Arc::new(MockEngine::new());
    engine.push_frame(0, &[1], &[0]);
    let session = SessionClient::new(engine);

    assert!(matches!(
        session.filtered_frames("nope", 0, 10),
        Err(Error::InvalidArgument(_))
    ));

    session.set_filter("main", "tcp").unwrap();
    let frames = session.filtered_frames("main", 0, 10).unwrap();
    assert_eq!(frames.len(), 1);
}

#[test]
fn unknown_source_is_unregistered() {
    let engine = Arc::new(MockEngine::new());
    let session = SessionClient::new(engine.clone());

    let result = session.create_reader("missing", "");
    assert!(matches!(
        result,
        Err(Error::UnregisteredSource { ref id }) if id == "missing"
    ));
    // No handle was allocated, so nothing gets closed
    assert!(engine.closed_readers.lock().unwrap().is_empty());
}

#[test]
fn handle_release_is_idempotent() {
    let engine = Arc::new(MockEngine::new().with_source("pcap-file", 7));
    let session = SessionClient::new(engine.clone());

    let mut reader = session.create_reader("pcap-file", "/tmp/a.pcap").unwrap();
    assert_eq!(reader.raw(), 7);
    assert!(!reader.is_released());

    reader.release();
    reader.release();
    drop(reader);

    // Closed exactly once despite two releases and a drop
    assert_eq!(engine.closed_readers.lock().unwrap().as_slice(), &[7]);
}

#[test]
fn handle_closes_on_drop() {
    let engine = Arc::new(MockEngine::new().with_source("pcap-file", 9));
    let session = SessionClient::new(engine.clone());

    {
        let _writer = session.create_writer("pcap-file", "/tmp/out.pcap").unwrap();
        assert!(engine.closed_writers.lock().unwrap().is_empty());
    }
    assert_eq!(engine.closed_writers.lock().unwrap().as_slice(), &[9]);
}

#[test]
fn close_is_safe_with_open_handles() {
    let engine = Arc::new(MockEngine::new().with_source("pcap-file", 3));
    let session = SessionClient::new(engine.clone());

    let _reader = session.create_reader("pcap-file", "").unwrap();
    session.close();
    assert_eq!(engine.session_closes.load(Ordering::Relaxed), 1);
}

#[test]
fn events_relay_in_order() {
    let engine = Arc::new(MockEngine::new());
    let session = SessionClient::new(engine);

    let rx = session.subscribe();
    session.deliver(EngineEvent::StatusChanged {
        status: "capturing".to_string(),
    });
    session.deliver(EngineEvent::FrameArrived { index: 41 });
    session.deliver(EngineEvent::FrameArrived { index: 42 });

    assert!(matches!(
        rx.recv().unwrap(),
        EngineEvent::StatusChanged { .. }
    ));
    assert_eq!(rx.recv().unwrap(), EngineEvent::FrameArrived { index: 41 });
    assert_eq!(rx.recv().unwrap(), EngineEvent::FrameArrived { index: 42 });
}

#[test]
fn tokens_round_trip_through_session() {
    let engine = Arc::new(MockEngine::new());
    let session = SessionClient::new(engine);

    let tokens = session.tokens();
    let tcp = tokens.get("tcp");
    assert_eq!(tokens.get("tcp"), tcp);
    assert_eq!(tokens.string(tcp), "tcp");
    assert_eq!(tokens.get(""), Token::NONE);
    assert_eq!(tokens.string(Token::NONE), "");
}

#[test]
fn layer_names_resolve_against_engine_tokens() {
    let engine = Arc::new(MockEngine::new());
    let eth = engine.intern("eth");
    let ipv4 = engine.intern("ipv4");
    engine.push_frame(0, &[eth, ipv4], &[1, 0]);
    let session = SessionClient::new(engine);

    let frames = session.frames(0, 1);
    let root = frames[0].root().unwrap();
    assert_eq!(session.tokens().string(root.id), "eth");
    assert_eq!(session.tokens().string(root.children[0].id), "ipv4");
}

//! In-memory [`Transport`] that replays canned outcomes and counts calls.

use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use paper_vis_core::progress::{ProgressEvent, ProgressSink};
use paper_vis_core::transport::UploadRequest;
use paper_vis_core::{RawResponse, Transport, TransportError};
use serde_json::Value;
use url::Url;

/// What the stub answers to every call.
#[derive(Debug, Clone)]
pub enum Canned {
    Body(u16, Value),
    Error(TransportError),
}

#[derive(Debug)]
pub struct StubTransport {
    canned: Canned,
    probe: Result<u16, TransportError>,
    transfer_events: Vec<u8>,
    pub sends: AtomicUsize,
    pub probes: AtomicUsize,
    pub json_posts: AtomicUsize,
    pub last_url: Mutex<Option<String>>,
    pub last_json: Mutex<Option<Value>>,
}

impl StubTransport {
    pub fn answering(canned: Canned) -> Self {
        Self {
            canned,
            probe: Ok(405),
            transfer_events: vec![50, 100],
            sends: AtomicUsize::new(0),
            probes: AtomicUsize::new(0),
            json_posts: AtomicUsize::new(0),
            last_url: Mutex::new(None),
            last_json: Mutex::new(None),
        }
    }

    pub fn ok(body: Value) -> Self {
        Self::answering(Canned::Body(200, body))
    }

    pub fn failing(error: TransportError) -> Self {
        Self::answering(Canned::Error(error))
    }

    pub fn with_probe(mut self, probe: Result<u16, TransportError>) -> Self {
        self.probe = probe;
        self
    }

    pub fn total_calls(&self) -> usize {
        self.sends.load(Ordering::SeqCst)
            + self.probes.load(Ordering::SeqCst)
            + self.json_posts.load(Ordering::SeqCst)
    }

    fn answer(&self, url: &Url) -> Result<RawResponse, TransportError> {
        *self.last_url.lock().unwrap() = Some(url.to_string());
        match &self.canned {
            Canned::Body(status, body) => Ok(RawResponse {
                status: *status,
                body: body.clone(),
            }),
            Canned::Error(error) => Err(error.clone()),
        }
    }
}

#[async_trait]
impl Transport for StubTransport {
    async fn send(&self, request: UploadRequest<'_>) -> Result<RawResponse, TransportError> {
        self.sends.fetch_add(1, Ordering::SeqCst);
        if let Some(sink) = request.progress {
            for percent in &self.transfer_events {
                sink.report(ProgressEvent::transfer(*percent));
            }
        }
        self.answer(request.endpoint)
    }

    async fn probe(&self, endpoint: &Url) -> Result<u16, TransportError> {
        self.probes.fetch_add(1, Ordering::SeqCst);
        *self.last_url.lock().unwrap() = Some(endpoint.to_string());
        self.probe.clone()
    }

    async fn post_json(&self, endpoint: &Url, body: &Value) -> Result<RawResponse, TransportError> {
        self.json_posts.fetch_add(1, Ordering::SeqCst);
        *self.last_json.lock().unwrap() = Some(body.clone());
        self.answer(endpoint)
    }
}

/// Sink collecting every event, for assertions.
#[derive(Debug, Default)]
pub struct RecordingSink {
    events: Mutex<Vec<ProgressEvent>>,
}

impl RecordingSink {
    pub fn events(&self) -> Vec<ProgressEvent> {
        self.events.lock().unwrap().clone()
    }
}

impl ProgressSink for RecordingSink {
    fn report(&self, event: ProgressEvent) {
        self.events.lock().unwrap().push(event);
    }
}

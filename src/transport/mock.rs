//! Scripted in-memory transport for tests.
//!
//! Responses are queued up front and handed out one per `recv`. The
//! correlation rule matches [`UdpTransport`](super::UdpTransport): a
//! datagram whose request-id differs from the awaited one is dropped and the
//! next queued response is tried.

use std::collections::VecDeque;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use bytes::Bytes;

use super::{Transport, accept_datagram, extract_request_id};
use crate::error::{Error, Result};
use crate::message::{Message, decode_packet};
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType};
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;

/// What the next `recv` produces.
#[derive(Debug, Clone)]
pub enum MockResponse {
    /// A response whose request-id is rewritten to match the request.
    Data(Bytes),
    /// Bytes delivered untouched.
    Raw(Bytes),
    /// Nothing arrives before the deadline.
    Timeout,
    /// Socket failure.
    IoError(String),
}

/// A datagram the client sent.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub data: Bytes,
    pub request_id: Option<i32>,
}

impl RecordedRequest {
    /// Decode the request.
    pub fn message(&self) -> Result<Message> {
        decode_packet(self.data.clone())
    }
}

#[derive(Debug)]
struct MockState {
    target: SocketAddr,
    responses: VecDeque<MockResponse>,
    requests: Vec<RecordedRequest>,
}

/// Scripted transport.
#[derive(Debug, Clone)]
pub struct MockTransport {
    state: Arc<Mutex<MockState>>,
}

impl MockTransport {
    pub fn new(target: SocketAddr) -> Self {
        Self {
            state: Arc::new(Mutex::new(MockState {
                target,
                responses: VecDeque::new(),
                requests: Vec::new(),
            })),
        }
    }

    fn state(&self) -> MutexGuard<'_, MockState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, response: MockResponse) {
        self.state().responses.push_back(response);
    }

    /// Queue a response; its request-id is patched on delivery.
    pub fn queue_response(&self, data: impl Into<Bytes>) {
        self.push(MockResponse::Data(data.into()));
    }

    /// Queue bytes delivered exactly as given.
    pub fn queue_raw_response(&self, data: impl Into<Bytes>) {
        self.push(MockResponse::Raw(data.into()));
    }

    pub fn queue_timeout(&self) {
        self.push(MockResponse::Timeout);
    }

    pub fn queue_io_error(&self, msg: impl Into<String>) {
        self.push(MockResponse::IoError(msg.into()));
    }

    /// Everything sent so far, oldest first.
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state().requests.clone()
    }

    pub fn queued(&self) -> usize {
        self.state().responses.len()
    }
}

fn with_request_id(data: Bytes, request_id: i32) -> Bytes {
    match decode_packet(data.clone()) {
        Ok(mut msg) => {
            msg.pdu.request_id = request_id;
            msg.encode()
        }
        Err(_) => data,
    }
}

impl Transport for MockTransport {
    async fn send(&self, data: &[u8]) -> Result<()> {
        let data = Bytes::copy_from_slice(data);
        let request_id = extract_request_id(&data);
        self.state().requests.push(RecordedRequest { data, request_id });
        Ok(())
    }

    async fn recv(&self, request_id: i32, timeout: Duration) -> Result<(Bytes, SocketAddr)> {
        let target = self.peer_addr();
        loop {
            let next = self.state().responses.pop_front();
            match next {
                Some(MockResponse::Data(data)) => {
                    return Ok((with_request_id(data, request_id), target));
                }
                Some(MockResponse::Raw(data)) => {
                    if accept_datagram(&data, request_id, target) {
                        return Ok((data, target));
                    }
                }
                Some(MockResponse::IoError(msg)) => {
                    return Err(Error::Io {
                        target: Some(target),
                        source: std::io::Error::other(msg),
                    });
                }
                Some(MockResponse::Timeout) | None => {
                    return Err(Error::Timeout {
                        target: Some(target),
                        elapsed: timeout,
                        request_id,
                        retries: 0,
                    });
                }
            }
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.state().target
    }

    fn local_addr(&self) -> SocketAddr {
        SocketAddr::from(([127, 0, 0, 1], 0))
    }
}

/// Builds encoded Response messages.
#[derive(Debug, Clone)]
pub struct ResponseBuilder {
    request_id: i32,
    error_status: i32,
    error_index: i32,
    varbinds: Vec<VarBind>,
}

impl ResponseBuilder {
    pub fn new(request_id: i32) -> Self {
        Self {
            request_id,
            error_status: 0,
            error_index: 0,
            varbinds: Vec::new(),
        }
    }

    pub fn varbind(mut self, oid: Oid, value: Value) -> Self {
        self.varbinds.push(VarBind::new(oid, value));
        self
    }

    pub fn error_status(mut self, status: i32) -> Self {
        self.error_status = status;
        self
    }

    pub fn error_index(mut self, index: i32) -> Self {
        self.error_index = index;
        self
    }

    pub fn build(self, version: Version, community: &[u8]) -> Bytes {
        let pdu = Pdu {
            pdu_type: PduType::Response,
            request_id: self.request_id,
            error_status: self.error_status,
            error_index: self.error_index,
            varbinds: self.varbinds,
        };
        Message::new(version, Bytes::copy_from_slice(community), pdu).encode()
    }

    pub fn build_v2c(self, community: &[u8]) -> Bytes {
        self.build(Version::V2c, community)
    }

    pub fn build_v1(self, community: &[u8]) -> Bytes {
        self.build(Version::V1, community)
    }
}

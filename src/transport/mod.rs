//! Transports.
//!
//! A [`Transport`] moves datagrams to and from one agent. It also does the
//! first round of correlation: `recv` only returns a datagram whose
//! request-id matches the one it was asked for, discarding stale replies
//! until its deadline passes.

mod udp;

#[cfg(any(test, feature = "testing"))]
mod mock;

pub use udp::UdpTransport;

#[cfg(any(test, feature = "testing"))]
pub use mock::{MockResponse, MockTransport, RecordedRequest, ResponseBuilder};

use std::future::Future;
use std::net::SocketAddr;
use std::time::Duration;

use bytes::Bytes;

use crate::ber::{Decoder, tag};
use crate::error::Result;

/// Largest datagram we read.
pub const MAX_DATAGRAM: usize = 65_535;

/// Datagram transport to a single agent.
///
/// `Clone` is required because walks hold their own client handle; every
/// implementation shares its state behind an `Arc`.
pub trait Transport: Send + Sync + Clone + 'static {
    /// Send one request datagram.
    fn send(&self, data: &[u8]) -> impl Future<Output = Result<()>> + Send;

    /// Wait up to `timeout` for the response to `request_id`.
    ///
    /// Datagrams carrying any other request-id are dropped and the wait
    /// continues. Expiry yields [`Error::Timeout`](crate::Error::Timeout)
    /// with `retries` set to zero; the client fills in the real count.
    fn recv(
        &self,
        request_id: i32,
        timeout: Duration,
    ) -> impl Future<Output = Result<(Bytes, SocketAddr)>> + Send;

    /// The agent's address.
    fn peer_addr(&self) -> SocketAddr;

    /// Our bound address.
    fn local_addr(&self) -> SocketAddr;
}

/// Pull the request-id out of a v1/v2c message without decoding varbinds.
pub(crate) fn extract_request_id(data: &Bytes) -> Option<i32> {
    let mut outer = Decoder::new(data.clone());
    let mut msg = outer.read_sequence().ok()?;
    msg.read_integer().ok()?;
    msg.read_octet_string().ok()?;

    let pdu_tag = msg.read_tag().ok()?;
    if !(tag::pdu::GET_REQUEST..=tag::pdu::REPORT).contains(&pdu_tag) {
        return None;
    }
    let len = msg.read_length().ok()?;
    msg.sub_decoder(len).ok()?.read_integer().ok()
}

/// Whether a received datagram answers `request_id`, logging when it does not.
pub(crate) fn accept_datagram(data: &Bytes, request_id: i32, from: SocketAddr) -> bool {
    match extract_request_id(data) {
        Some(id) if id == request_id => true,
        Some(id) => {
            tracing::warn!(
                target: "snmp_probe::transport",
                { snmp.target = %from, snmp.request_id = request_id, snmp.received_id = id },
                "discarding response with stale request id"
            );
            false
        }
        None => {
            tracing::warn!(
                target: "snmp_probe::transport",
                { snmp.target = %from, snmp.request_id = request_id, snmp.bytes = data.len() },
                "discarding datagram without a readable request id"
            );
            false
        }
    }
}

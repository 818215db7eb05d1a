//! Connected UDP socket to one agent.

use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use tokio::net::UdpSocket;
use tokio::time::{Instant, timeout_at};

use super::{MAX_DATAGRAM, Transport, accept_datagram};
use crate::error::{Error, Result};
use crate::util::bind_ephemeral_udp_socket;

/// UDP transport owning one connected socket.
///
/// The socket is closed when the last clone is dropped.
#[derive(Clone)]
pub struct UdpTransport {
    inner: Arc<UdpInner>,
}

struct UdpInner {
    socket: UdpSocket,
    target: SocketAddr,
    local_addr: SocketAddr,
}

impl std::fmt::Debug for UdpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UdpTransport")
            .field("target", &self.inner.target)
            .field("local_addr", &self.inner.local_addr)
            .finish()
    }
}

impl UdpTransport {
    /// Bind an ephemeral socket of the target's family and connect it.
    ///
    /// Failures here are connection failures: [`Error::Connect`].
    pub async fn connect(target: SocketAddr) -> Result<Self> {
        let connect_err = |source: io::Error| Error::Connect {
            target: target.to_string(),
            source,
        };

        let socket = bind_ephemeral_udp_socket(target)
            .await
            .map_err(connect_err)?;
        socket.connect(target).await.map_err(connect_err)?;
        let local_addr = socket.local_addr().map_err(connect_err)?;

        tracing::debug!(
            target: "snmp_probe::transport",
            { snmp.target = %target, snmp.local_addr = %local_addr },
            "UDP socket connected"
        );

        Ok(Self {
            inner: Arc::new(UdpInner {
                socket,
                target,
                local_addr,
            }),
        })
    }

    fn io_err(&self, source: io::Error) -> Error {
        Error::Io {
            target: Some(self.inner.target),
            source,
        }
    }
}

impl Transport for UdpTransport {
    async fn send(&self, data: &[u8]) -> Result<()> {
        tracing::trace!(
            target: "snmp_probe::transport",
            { snmp.target = %self.inner.target, snmp.bytes = data.len() },
            "UDP send"
        );
        self.inner
            .socket
            .send(data)
            .await
            .map_err(|e| self.io_err(e))?;
        Ok(())
    }

    async fn recv(&self, request_id: i32, timeout: Duration) -> Result<(Bytes, SocketAddr)> {
        let target = self.inner.target;
        let deadline = Instant::now() + timeout;
        let mut buf = vec![0u8; MAX_DATAGRAM];

        loop {
            let len = match timeout_at(deadline, self.inner.socket.recv(&mut buf)).await {
                Ok(Ok(len)) => len,
                // ICMP port unreachable surfaces here on a connected socket.
                // Nothing will answer, but the wait still runs to its deadline.
                Ok(Err(e)) if e.kind() == io::ErrorKind::ConnectionRefused => {
                    tracing::trace!(
                        target: "snmp_probe::transport",
                        { snmp.target = %target, snmp.request_id = request_id },
                        "port unreachable"
                    );
                    tokio::time::sleep_until(deadline).await;
                    continue;
                }
                Ok(Err(e)) => return Err(self.io_err(e)),
                Err(_) => {
                    tracing::trace!(
                        target: "snmp_probe::transport",
                        { snmp.target = %target, snmp.request_id = request_id },
                        "UDP recv timed out"
                    );
                    return Err(Error::Timeout {
                        target: Some(target),
                        elapsed: timeout,
                        request_id,
                        retries: 0,
                    });
                }
            };

            let data = Bytes::copy_from_slice(&buf[..len]);
            tracing::trace!(
                target: "snmp_probe::transport",
                { snmp.target = %target, snmp.bytes = len },
                "UDP recv"
            );
            if accept_datagram(&data, request_id, target) {
                return Ok((data, target));
            }
        }
    }

    fn peer_addr(&self) -> SocketAddr {
        self.inner.target
    }

    fn local_addr(&self) -> SocketAddr {
        self.inner.local_addr
    }
}

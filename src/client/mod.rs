//! SNMP client.
//!
//! A [`Client`] owns one association to one agent. Requests on a handle are
//! serialized: the session lock is held from send until the correlated
//! response (or the final timeout), so request-id allocation and socket use
//! never interleave. Clones share the association.

mod builder;
mod retry;
mod walk;

pub use builder::ClientBuilder;
pub use retry::{Backoff, Retry, RetryBuilder};
pub use walk::{OidOrdering, Walk, WalkMode, WalkOutcome};

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use bytes::Bytes;
use tokio::sync::Mutex;
use tracing::{Span, instrument};

use crate::error::{DecodeErrorKind, Error, Result};
use crate::message::{Message, decode_packet};
use crate::oid::Oid;
use crate::pdu::{Pdu, PduType};
use crate::transport::{Transport, UdpTransport};
use crate::varbind::VarBind;
use crate::version::Version;

/// Port used when the target names none.
pub const DEFAULT_PORT: u16 = 161;
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);
pub const DEFAULT_MAX_OIDS_PER_REQUEST: usize = 10;
pub const DEFAULT_MAX_REPETITIONS: u32 = 25;

/// Open a client to `target` with the given community and version.
///
/// `target` is `host`, `host:port`, `[v6]:port` or a bare IPv6 address; the
/// port defaults to 161. An empty target yields an offline handle that can
/// only [`debug`](Client::debug) packets.
///
/// ```no_run
/// use snmp_probe::{Version, new_client, oid};
///
/// # async fn example() -> snmp_probe::Result<()> {
/// let client = new_client("192.0.2.10", "public", Version::V2c, 2).await?;
/// let descr = client.get(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)).await?;
/// println!("{descr}");
/// client.close().await;
/// # Ok(())
/// # }
/// ```
pub async fn new_client(
    target: &str,
    community: &str,
    version: Version,
    timeout_secs: u64,
) -> Result<Client> {
    Client::builder(target)
        .community(community)
        .version(version)
        .timeout(Duration::from_secs(timeout_secs))
        .connect()
        .await
}

/// Client configuration.
///
/// Usually produced by [`ClientBuilder`].
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Protocol version (default: v2c)
    pub version: Version,
    /// Community string (default: "public")
    pub community: Bytes,
    /// Wait per attempt (default: 5 seconds)
    pub timeout: Duration,
    /// Re-sends after a timeout (default: 1, no backoff)
    pub retry: Retry,
    /// OIDs per request before `get_many` splits (default: 10)
    pub max_oids_per_request: usize,
    /// Request type walks use (default: GetNext)
    pub walk_mode: WalkMode,
    /// Handling of OIDs that fail to advance during a walk (default: Strict)
    pub oid_ordering: OidOrdering,
    /// Cap on bindings one walk yields (default: unlimited)
    pub max_walk_results: Option<usize>,
    /// max-repetitions for GETBULK walks (default: 25)
    pub max_repetitions: u32,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            version: Version::V2c,
            community: Bytes::from_static(b"public"),
            timeout: DEFAULT_TIMEOUT,
            retry: Retry::default(),
            max_oids_per_request: DEFAULT_MAX_OIDS_PER_REQUEST,
            walk_mode: WalkMode::GetNext,
            oid_ordering: OidOrdering::Strict,
            max_walk_results: None,
            max_repetitions: DEFAULT_MAX_REPETITIONS,
        }
    }
}

/// SNMP client handle, generic over its transport.
#[derive(Clone)]
pub struct Client<T: Transport = UdpTransport> {
    inner: Arc<ClientInner<T>>,
}

struct ClientInner<T: Transport> {
    target: Option<SocketAddr>,
    config: ClientConfig,
    session: Mutex<Option<Session<T>>>,
    closed: AtomicBool,
}

struct Session<T> {
    transport: T,
    next_request_id: i32,
}

impl<T> Session<T> {
    /// Hand out the next id; ids stay in `0..2^31`.
    fn alloc_request_id(&mut self) -> i32 {
        let id = self.next_request_id;
        self.next_request_id = id.wrapping_add(1) & 0x7FFF_FFFF;
        id
    }
}

fn seed_request_id() -> i32 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() ^ (d.as_secs() as u32))
        .unwrap_or(0);
    ((nanos ^ std::process::id().rotate_left(16)) & 0x7FFF_FFFF) as i32
}

impl<T: Transport> std::fmt::Debug for Client<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("target", &self.inner.target)
            .field("version", &self.inner.config.version)
            .field("closed", &self.is_closed())
            .finish()
    }
}

impl Client<UdpTransport> {
    /// Start building a UDP client.
    pub fn builder(target: impl Into<String>) -> ClientBuilder {
        ClientBuilder::new(target)
    }
}

impl<T: Transport> Client<T> {
    /// Wrap an established transport.
    pub fn new(transport: T, config: ClientConfig) -> Self {
        Self::with_request_id(transport, config, seed_request_id())
    }

    /// Like [`new`](Self::new) with a chosen first request-id.
    pub fn with_request_id(transport: T, config: ClientConfig, first_request_id: i32) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                target: Some(transport.peer_addr()),
                config,
                session: Mutex::new(Some(Session {
                    transport,
                    next_request_id: first_request_id & 0x7FFF_FFFF,
                })),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// A handle with no association; only [`debug`](Self::debug) works.
    pub fn offline(config: ClientConfig) -> Self {
        Self {
            inner: Arc::new(ClientInner {
                target: None,
                config,
                session: Mutex::new(None),
                closed: AtomicBool::new(false),
            }),
        }
    }

    /// The agent's address, `None` when offline.
    pub fn peer_addr(&self) -> Option<SocketAddr> {
        self.inner.target
    }

    pub fn config(&self) -> &ClientConfig {
        &self.inner.config
    }

    pub fn is_closed(&self) -> bool {
        self.inner.closed.load(Ordering::Acquire)
    }

    /// Release the socket. Later calls on any clone fail with
    /// [`Error::Closed`]. Calling it again does nothing.
    pub async fn close(&self) {
        if self.inner.closed.swap(true, Ordering::AcqRel) {
            return;
        }
        let session = self.inner.session.lock().await.take();
        if session.is_some() {
            tracing::debug!(
                target: "snmp_probe::client",
                { snmp.target = ?self.inner.target },
                "client closed"
            );
        }
    }

    /// Decode a raw datagram without any network I/O.
    ///
    /// Responses received by [`get`](Self::get) and friends go through this
    /// same routine.
    pub fn debug(&self, raw: impl Into<Bytes>) -> Result<Message> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        decode_packet(raw)
    }

    /// Send `request` and wait for its response, re-sending on timeout.
    ///
    /// Every attempt carries a fresh request-id.
    #[instrument(
        level = "debug",
        skip(self, request),
        fields(
            snmp.target = ?self.inner.target,
            snmp.pdu_type = %request.pdu_type,
            snmp.request_id = tracing::field::Empty,
            snmp.attempt = tracing::field::Empty,
            snmp.elapsed_ms = tracing::field::Empty,
        )
    )]
    async fn exchange(&self, request: Pdu) -> Result<Message> {
        if self.is_closed() {
            return Err(Error::Closed);
        }
        // Anything validate rejects would reach the agent as a different OID.
        for vb in &request.varbinds {
            vb.oid.validate().map_err(|e| match e {
                Error::InvalidOid { kind, input: None } => Error::InvalidOid {
                    kind,
                    input: Some(vb.oid.to_string().into()),
                },
                other => other,
            })?;
        }
        let mut guard = self.inner.session.lock().await;
        let Some(session) = guard.as_mut() else {
            return Err(if self.is_closed() {
                Error::Closed
            } else {
                Error::NoTarget
            });
        };

        let config = &self.inner.config;
        let retries = config.retry.max_attempts;
        let start = Instant::now();
        let mut message = Message::new(config.version, config.community.clone(), request);
        let mut request_id = message.pdu.request_id;

        for attempt in 0..=retries {
            request_id = session.alloc_request_id();
            message.pdu.request_id = request_id;
            Span::current().record("snmp.request_id", request_id);
            Span::current().record("snmp.attempt", attempt);
            if attempt > 0 {
                tracing::debug!(target: "snmp_probe::client", "retrying request");
            }

            let data = message.encode();
            tracing::trace!(target: "snmp_probe::client", { snmp.bytes = data.len() }, "sending request");
            session.transport.send(&data).await?;

            match session.transport.recv(request_id, config.timeout).await {
                Ok((raw, _from)) => {
                    Span::current().record("snmp.elapsed_ms", start.elapsed().as_millis() as u64);
                    return self.check_response(&message, raw);
                }
                Err(Error::Timeout { .. }) => {
                    if attempt < retries {
                        let delay = config.retry.delay_for(attempt);
                        if !delay.is_zero() {
                            tracing::debug!(
                                target: "snmp_probe::client",
                                { snmp.delay_ms = delay.as_millis() as u64 },
                                "backing off"
                            );
                            tokio::time::sleep(delay).await;
                        }
                    }
                }
                Err(e) => return Err(e),
            }
        }

        let elapsed = start.elapsed();
        Span::current().record("snmp.elapsed_ms", elapsed.as_millis() as u64);
        tracing::debug!(
            target: "snmp_probe::client",
            { snmp.request_id = request_id, snmp.retries = retries, ?elapsed },
            "request timed out"
        );
        Err(Error::Timeout {
            target: self.inner.target,
            elapsed,
            request_id,
            retries,
        })
    }

    /// Decode a datagram and validate it against the request it answers.
    fn check_response(&self, request: &Message, raw: Bytes) -> Result<Message> {
        tracing::trace!(target: "snmp_probe::client", { snmp.bytes = raw.len() }, "received response");
        let response = decode_packet(raw)?;

        if response.version != request.version {
            tracing::warn!(
                target: "snmp_probe::client",
                { snmp.target = ?self.inner.target, expected = %request.version, actual = %response.version },
                "version mismatch in response"
            );
            return Err(Error::VersionMismatch {
                expected: request.version,
                actual: response.version,
            });
        }
        if response.pdu.request_id != request.pdu.request_id {
            return Err(Error::RequestIdMismatch {
                expected: request.pdu.request_id,
                actual: response.pdu.request_id,
            });
        }

        let pdu = &response.pdu;
        if pdu.pdu_type != PduType::Response {
            tracing::warn!(
                target: "snmp_probe::client",
                { snmp.target = ?self.inner.target, snmp.pdu_type = %pdu.pdu_type },
                "correlated reply is not a Response"
            );
            return Err(Error::decode(0, DecodeErrorKind::UnexpectedPduType(pdu.pdu_type)));
        }
        if pdu.is_error() {
            // errorIndex is 1-based into the request's bindings; 0 means the
            // whole PDU.
            let oid = usize::try_from(pdu.error_index)
                .ok()
                .and_then(|i| i.checked_sub(1))
                .and_then(|i| request.pdu.varbinds.get(i))
                .map(|vb| vb.oid.clone());
            return Err(Error::Snmp {
                target: self.inner.target,
                status: pdu.error_status_enum(),
                index: pdu.error_index.max(0) as u32,
                oid,
            });
        }

        tracing::debug!(
            target: "snmp_probe::client",
            { snmp.pdu_type = %pdu.pdu_type, snmp.varbind_count = pdu.varbinds.len() },
            "received {} response", pdu.pdu_type
        );
        Ok(response)
    }

    fn first_varbind(response: Message) -> Result<VarBind> {
        response
            .into_pdu()
            .varbinds
            .into_iter()
            .next()
            .ok_or_else(|| Error::decode(0, DecodeErrorKind::EmptyResponse))
    }

    /// Issue one request per `max_oids_per_request` chunk and concatenate.
    async fn batched(&self, pdu_type: PduType, oids: &[Oid]) -> Result<Vec<VarBind>> {
        if oids.is_empty() {
            return Ok(Vec::new());
        }
        let per_request = self.inner.config.max_oids_per_request.max(1);
        let batches = oids.len().div_ceil(per_request);
        if batches > 1 {
            tracing::debug!(
                target: "snmp_probe::client",
                { snmp.oid_count = oids.len(), snmp.batch_count = batches },
                "splitting {} into batches", pdu_type
            );
        }

        let mut results = Vec::with_capacity(oids.len());
        for chunk in oids.chunks(per_request) {
            let response = self.exchange(Pdu::request(pdu_type, 0, chunk)).await?;
            results.extend(response.into_pdu().varbinds);
        }
        Ok(results)
    }

    /// GET one OID.
    #[instrument(skip(self), err, fields(snmp.oid = %oid))]
    pub async fn get(&self, oid: &Oid) -> Result<VarBind> {
        let response = self
            .exchange(Pdu::get_request(0, std::slice::from_ref(oid)))
            .await?;
        Self::first_varbind(response)
    }

    /// GETNEXT from one OID.
    #[instrument(skip(self), err, fields(snmp.oid = %oid))]
    pub async fn get_next(&self, oid: &Oid) -> Result<VarBind> {
        let response = self
            .exchange(Pdu::get_next_request(0, std::slice::from_ref(oid)))
            .await?;
        Self::first_varbind(response)
    }

    /// GET several OIDs, splitting into batches of `max_oids_per_request`.
    ///
    /// Results come back in request order.
    pub async fn get_many(&self, oids: &[Oid]) -> Result<Vec<VarBind>> {
        self.batched(PduType::GetRequest, oids).await
    }

    /// GETNEXT for several OIDs, batched like [`get_many`](Self::get_many).
    pub async fn get_next_many(&self, oids: &[Oid]) -> Result<Vec<VarBind>> {
        self.batched(PduType::GetNextRequest, oids).await
    }

    /// GET in a single request, returning the whole response message.
    pub async fn get_request(&self, oids: &[Oid]) -> Result<Message> {
        self.exchange(Pdu::get_request(0, oids)).await
    }

    /// GETNEXT in a single request, returning the whole response message.
    pub async fn get_next_request(&self, oids: &[Oid]) -> Result<Message> {
        self.exchange(Pdu::get_next_request(0, oids)).await
    }

    /// GETBULK (v2c only).
    ///
    /// The first `non_repeaters` OIDs get one successor each; every other
    /// OID gets up to `max_repetitions`.
    #[instrument(skip(self, oids), err, fields(snmp.oid_count = oids.len()))]
    pub async fn get_bulk(
        &self,
        oids: &[Oid],
        non_repeaters: i32,
        max_repetitions: i32,
    ) -> Result<Vec<VarBind>> {
        if self.inner.config.version == Version::V1 {
            return Err(Error::GetBulkNotSupportedInV1);
        }
        let pdu = Pdu::get_bulk_request(0, non_repeaters, max_repetitions, oids);
        Ok(self.exchange(pdu).await?.into_pdu().varbinds)
    }

    /// Walk the subtree under `prefix` using the configured [`WalkMode`].
    ///
    /// ```no_run
    /// use snmp_probe::{Version, new_client, oid};
    ///
    /// # async fn example() -> snmp_probe::Result<()> {
    /// let client = new_client("192.0.2.10:1161", "public", Version::V2c, 1).await?;
    /// let outcome = client.walk(oid!(1, 3, 6, 1, 2, 1, 2)).collect_partial().await;
    /// for vb in &outcome.varbinds {
    ///     println!("{vb}");
    /// }
    /// if let Some(err) = outcome.error {
    ///     eprintln!("walk stopped early: {err}");
    /// }
    /// # Ok(())
    /// # }
    /// ```
    pub fn walk(&self, prefix: Oid) -> Walk<T> {
        let config = &self.inner.config;
        self.walk_with(prefix, config.walk_mode)
    }

    /// Walk with an explicit mode, ignoring the configured one.
    pub fn walk_with(&self, prefix: Oid, mode: WalkMode) -> Walk<T> {
        let config = &self.inner.config;
        Walk::new(
            self.clone(),
            prefix,
            mode,
            config.oid_ordering,
            config.max_walk_results,
            config.max_repetitions.min(i32::MAX as u32) as i32,
        )
    }
}

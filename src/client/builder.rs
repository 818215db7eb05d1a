//! Client construction.

use std::io;
use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use bytes::Bytes;

use super::{
    Client, ClientConfig, DEFAULT_MAX_OIDS_PER_REQUEST, DEFAULT_MAX_REPETITIONS, DEFAULT_PORT,
    DEFAULT_TIMEOUT, OidOrdering, Retry, WalkMode,
};
use crate::error::{Error, Result};
use crate::transport::{Transport, UdpTransport};
use crate::version::Version;

/// Builder for [`Client`].
///
/// ```rust,no_run
/// use snmp_probe::{Client, Retry, Version, WalkMode};
/// use std::time::Duration;
///
/// # async fn example() -> snmp_probe::Result<()> {
/// let client = Client::builder("[2001:db8::1]:1161")
///     .community("monitor")
///     .version(Version::V2c)
///     .timeout(Duration::from_millis(800))
///     .retry(Retry::fixed(2, Duration::from_millis(100)))
///     .walk_mode(WalkMode::GetBulk)
///     .connect()
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct ClientBuilder {
    target: String,
    version: Version,
    community: Bytes,
    timeout: Duration,
    retry: Retry,
    max_oids_per_request: usize,
    max_repetitions: u32,
    walk_mode: WalkMode,
    oid_ordering: OidOrdering,
    max_walk_results: Option<usize>,
}

impl ClientBuilder {
    /// `target` may be empty for an offline handle.
    pub fn new(target: impl Into<String>) -> Self {
        Self {
            target: target.into(),
            version: Version::V2c,
            community: Bytes::from_static(b"public"),
            timeout: DEFAULT_TIMEOUT,
            retry: Retry::default(),
            max_oids_per_request: DEFAULT_MAX_OIDS_PER_REQUEST,
            max_repetitions: DEFAULT_MAX_REPETITIONS,
            walk_mode: WalkMode::GetNext,
            oid_ordering: OidOrdering::Strict,
            max_walk_results: None,
        }
    }

    pub fn version(mut self, version: Version) -> Self {
        self.version = version;
        self
    }

    pub fn community(mut self, community: impl AsRef<[u8]>) -> Self {
        self.community = Bytes::copy_from_slice(community.as_ref());
        self
    }

    /// Wait per attempt.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn retry(mut self, retry: impl Into<Retry>) -> Self {
        self.retry = retry.into();
        self
    }

    pub fn max_oids_per_request(mut self, max: usize) -> Self {
        self.max_oids_per_request = max;
        self
    }

    pub fn max_repetitions(mut self, max: u32) -> Self {
        self.max_repetitions = max;
        self
    }

    pub fn walk_mode(mut self, mode: WalkMode) -> Self {
        self.walk_mode = mode;
        self
    }

    pub fn oid_ordering(mut self, ordering: OidOrdering) -> Self {
        self.oid_ordering = ordering;
        self
    }

    pub fn max_walk_results(mut self, limit: usize) -> Self {
        self.max_walk_results = Some(limit);
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(Error::Config("timeout must be non-zero".into()));
        }
        if self.max_oids_per_request == 0 {
            return Err(Error::Config("max_oids_per_request must be at least 1".into()));
        }
        if self.walk_mode == WalkMode::GetBulk {
            if self.version == Version::V1 {
                return Err(Error::Config("GETBULK walks are not supported in SNMPv1".into()));
            }
            if self.max_repetitions == 0 {
                return Err(Error::Config("max_repetitions must be at least 1".into()));
            }
        }
        Ok(())
    }

    fn config(&self) -> ClientConfig {
        ClientConfig {
            version: self.version,
            community: self.community.clone(),
            timeout: self.timeout,
            retry: self.retry.clone(),
            max_oids_per_request: self.max_oids_per_request,
            walk_mode: self.walk_mode,
            oid_ordering: self.oid_ordering,
            max_walk_results: self.max_walk_results,
            max_repetitions: self.max_repetitions,
        }
    }

    /// Resolve the target and open a UDP socket to it.
    ///
    /// Resolution and socket failures are [`Error::Connect`]. An empty
    /// target skips both and returns an offline handle.
    pub async fn connect(self) -> Result<Client<UdpTransport>> {
        self.validate()?;
        let Some((host, port)) = parse_target(&self.target)? else {
            tracing::debug!(target: "snmp_probe::client", "no target; building offline client");
            return Ok(Client::offline(self.config()));
        };
        let addr = resolve(&self.target, host, port).await?;
        let transport = UdpTransport::connect(addr).await?;
        Ok(Client::new(transport, self.config()))
    }

    /// Use an existing transport; the target string is ignored.
    pub fn build_with<T: Transport>(self, transport: T) -> Result<Client<T>> {
        self.validate()?;
        Ok(Client::new(transport, self.config()))
    }
}

/// Split a target into host and port. `None` for an empty target.
fn parse_target(target: &str) -> Result<Option<(&str, u16)>> {
    let target = target.trim();
    if target.is_empty() {
        return Ok(None);
    }
    let bad = |why: &str| Error::Config(format!("invalid target '{target}': {why}"));
    let port_of = |s: &str| s.parse::<u16>().map_err(|_| bad("bad port"));

    if let Some(rest) = target.strip_prefix('[') {
        let (host, tail) = rest.split_once(']').ok_or_else(|| bad("unclosed '['"))?;
        let port = match tail {
            "" => DEFAULT_PORT,
            _ => port_of(tail.strip_prefix(':').ok_or_else(|| bad("expected ':' after ']'"))?)?,
        };
        return Ok(Some((host, port)));
    }
    if target.parse::<IpAddr>().is_ok() {
        return Ok(Some((target, DEFAULT_PORT)));
    }
    match target.rsplit_once(':') {
        Some((host, _)) if host.contains(':') => Err(bad("IPv6 with a port needs brackets")),
        Some((host, port)) => Ok(Some((host, port_of(port)?))),
        None => Ok(Some((target, DEFAULT_PORT))),
    }
}

async fn resolve(target: &str, host: &str, port: u16) -> Result<SocketAddr> {
    if let Ok(ip) = host.parse::<IpAddr>() {
        return Ok(SocketAddr::new(ip, port));
    }
    let connect_err = |source: io::Error| Error::Connect {
        target: target.to_string(),
        source,
    };
    tokio::net::lookup_host((host, port))
        .await
        .map_err(connect_err)?
        .next()
        .ok_or_else(|| {
            connect_err(io::Error::new(
                io::ErrorKind::NotFound,
                format!("no addresses for '{host}'"),
            ))
        })
}

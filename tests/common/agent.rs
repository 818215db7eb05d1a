//! In-process SNMP agent for integration tests.
//!
//! Answers GET, GETNEXT and GETBULK from a `BTreeMap` on an ephemeral
//! localhost port, using the crate's own codec. Fault knobs let tests drop
//! requests, inject stale replies or corrupt ordering. The task stops when
//! the agent is dropped.

use std::collections::BTreeMap;
use std::net::SocketAddr;
use std::ops::Bound;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use snmp_probe::{Message, Oid, Pdu, PduType, Value, VarBind, Version, decode_packet};
use tokio::net::UdpSocket;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use super::fixtures;

type Mib = Arc<Mutex<BTreeMap<Oid, Value>>>;

#[derive(Debug, Clone)]
struct Behavior {
    community: Bytes,
    drop_first: usize,
    stale_before_reply: bool,
    /// GETNEXT from this OID answers with this (earlier) OID.
    loop_back: Option<(Oid, Oid)>,
    error_status: Option<(i32, i32)>,
}

pub struct TestAgentBuilder {
    data: BTreeMap<Oid, Value>,
    behavior: Behavior,
}

impl TestAgentBuilder {
    pub fn data(mut self, data: BTreeMap<Oid, Value>) -> Self {
        self.data = data;
        self
    }

    pub fn community(mut self, community: &str) -> Self {
        self.behavior.community = Bytes::copy_from_slice(community.as_bytes());
        self
    }

    /// Ignore the first `n` datagrams.
    pub fn drop_first(mut self, n: usize) -> Self {
        self.behavior.drop_first = n;
        self
    }

    /// Send a reply with a wrong request-id ahead of every real reply.
    pub fn stale_before_reply(mut self) -> Self {
        self.behavior.stale_before_reply = true;
        self
    }

    /// Make GETNEXT on `from` return `to` with its stored value.
    pub fn loop_back(mut self, from: Oid, to: Oid) -> Self {
        self.behavior.loop_back = Some((from, to));
        self
    }

    /// Answer every request with this errorStatus/errorIndex.
    pub fn error_status(mut self, status: i32, index: i32) -> Self {
        self.behavior.error_status = Some((status, index));
        self
    }

    pub async fn start(self) -> TestAgent {
        super::init_tracing();
        let socket = UdpSocket::bind("127.0.0.1:0")
            .await
            .expect("bind test agent");
        let addr = socket.local_addr().expect("test agent addr");
        let mib: Mib = Arc::new(Mutex::new(self.data));
        let received = Arc::new(AtomicUsize::new(0));
        let cancel = CancellationToken::new();

        let task = tokio::spawn(serve(
            socket,
            mib.clone(),
            self.behavior,
            received.clone(),
            cancel.clone(),
        ));

        TestAgent {
            addr,
            mib,
            received,
            cancel,
            _task: task,
        }
    }
}

pub struct TestAgent {
    addr: SocketAddr,
    mib: Mib,
    received: Arc<AtomicUsize>,
    cancel: CancellationToken,
    _task: JoinHandle<()>,
}

impl TestAgent {
    pub fn builder() -> TestAgentBuilder {
        TestAgentBuilder {
            data: fixtures::system_mib(),
            behavior: Behavior {
                community: Bytes::from_static(b"public"),
                drop_first: 0,
                stale_before_reply: false,
                loop_back: None,
                error_status: None,
            },
        }
    }

    /// Agent serving the system group.
    pub async fn new() -> Self {
        Self::builder().start().await
    }

    pub async fn with_data(data: BTreeMap<Oid, Value>) -> Self {
        Self::builder().data(data).start().await
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    pub fn target(&self) -> String {
        self.addr.to_string()
    }

    pub fn set(&self, oid: Oid, value: Value) {
        self.mib.lock().unwrap().insert(oid, value);
    }

    /// Datagrams received so far, dropped ones included.
    pub fn received(&self) -> usize {
        self.received.load(Ordering::SeqCst)
    }

    pub fn stop(&self) {
        self.cancel.cancel();
    }
}

impl Drop for TestAgent {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

async fn serve(
    socket: UdpSocket,
    mib: Mib,
    behavior: Behavior,
    received: Arc<AtomicUsize>,
    cancel: CancellationToken,
) {
    let mut buf = vec![0u8; 65_535];
    loop {
        let (len, peer) = tokio::select! {
            _ = cancel.cancelled() => return,
            r = socket.recv_from(&mut buf) => match r {
                Ok(r) => r,
                Err(_) => continue,
            },
        };
        let n = received.fetch_add(1, Ordering::SeqCst) + 1;
        if n <= behavior.drop_first {
            continue;
        }
        let Ok(request) = decode_packet(Bytes::copy_from_slice(&buf[..len])) else {
            continue;
        };
        if request.community != behavior.community {
            continue;
        }

        let response = {
            let mib = mib.lock().unwrap();
            answer(&mib, &behavior, &request)
        };
        if behavior.stale_before_reply {
            let mut stale = response.clone();
            stale.pdu.request_id = response.pdu.request_id.wrapping_add(7919) & 0x7FFF_FFFF;
            let _ = socket.send_to(&stale.encode(), peer).await;
        }
        let _ = socket.send_to(&response.encode(), peer).await;
    }
}

fn successor<'a>(mib: &'a BTreeMap<Oid, Value>, oid: &Oid) -> Option<(&'a Oid, &'a Value)> {
    mib.range((Bound::Excluded(oid.clone()), Bound::Unbounded))
        .next()
}

fn answer(mib: &BTreeMap<Oid, Value>, behavior: &Behavior, request: &Message) -> Message {
    let req = &request.pdu;
    let v1 = request.version == Version::V1;
    let mut error_status = 0;
    let mut error_index = 0;
    let mut varbinds = Vec::new();

    let next_of = |oid: &Oid, position: usize, error: &mut (i32, i32)| -> VarBind {
        if let Some((from, to)) = &behavior.loop_back
            && from == oid
        {
            let value = mib.get(to).cloned().unwrap_or(Value::Null);
            return VarBind::new(to.clone(), value);
        }
        match successor(mib, oid) {
            Some((next, value)) => VarBind::new(next.clone(), value.clone()),
            None if v1 => {
                if error.0 == 0 {
                    *error = (2, position as i32 + 1);
                }
                VarBind::null(oid.clone())
            }
            None => VarBind::new(oid.clone(), Value::EndOfMibView),
        }
    };

    let mut error = (0, 0);
    match req.pdu_type {
        PduType::GetRequest => {
            for (i, vb) in req.varbinds.iter().enumerate() {
                match mib.get(&vb.oid) {
                    Some(value) => varbinds.push(VarBind::new(vb.oid.clone(), value.clone())),
                    None if v1 => {
                        if error.0 == 0 {
                            error = (2, i as i32 + 1);
                        }
                        varbinds.push(VarBind::null(vb.oid.clone()));
                    }
                    None => varbinds.push(VarBind::new(vb.oid.clone(), Value::NoSuchObject)),
                }
            }
        }
        PduType::GetNextRequest => {
            for (i, vb) in req.varbinds.iter().enumerate() {
                varbinds.push(next_of(&vb.oid, i, &mut error));
            }
        }
        PduType::GetBulkRequest => {
            let non_repeaters = (req.error_status.max(0) as usize).min(req.varbinds.len());
            let max_repetitions = req.error_index.max(0) as usize;
            for (i, vb) in req.varbinds[..non_repeaters].iter().enumerate() {
                varbinds.push(next_of(&vb.oid, i, &mut error));
            }
            let mut cursors: Vec<Oid> = req.varbinds[non_repeaters..]
                .iter()
                .map(|vb| vb.oid.clone())
                .collect();
            'rows: for _ in 0..max_repetitions {
                let mut all_ended = true;
                for (j, cursor) in cursors.iter_mut().enumerate() {
                    let vb = next_of(cursor, non_repeaters + j, &mut error);
                    if !matches!(vb.value, Value::EndOfMibView) {
                        all_ended = false;
                    }
                    *cursor = vb.oid.clone();
                    varbinds.push(vb);
                }
                if all_ended {
                    break 'rows;
                }
            }
        }
        _ => {
            error = (5, 0);
            varbinds = req.varbinds.clone();
        }
    }
    if error.0 != 0 {
        error_status = error.0;
        error_index = error.1;
        varbinds = req.varbinds.clone();
    }
    if let Some((status, index)) = behavior.error_status {
        error_status = status;
        error_index = index;
        varbinds = req.varbinds.clone();
    }

    let pdu = Pdu {
        pdu_type: PduType::Response,
        request_id: req.request_id,
        error_status,
        error_index,
        varbinds,
    };
    Message::new(request.version, request.community.clone(), pdu)
}

//! Subtree walks.
//!
//! A [`Walk`] repeatedly asks the agent for the successor of the last OID it
//! saw and yields bindings until one of these holds, checked in order:
//!
//! 1. the returned OID is outside the prefix (that binding is dropped),
//! 2. the value is `endOfMibView`,
//! 3. the OID does not advance past the previous one (see [`OidOrdering`]).
//!
//! Each round trip is bounded by the client's timeout and retry policy; the
//! walk as a whole has no deadline.

use std::collections::{HashSet, VecDeque};
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;

use crate::error::{Error, ErrorStatus, Result};
use crate::oid::Oid;
use crate::transport::Transport;
use crate::value::Value;
use crate::varbind::VarBind;
use crate::version::Version;

use super::Client;

/// Request type a walk uses.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum WalkMode {
    /// One GETNEXT per binding.
    #[default]
    GetNext,
    /// GETBULK with `max_repetitions` successors per round trip (v2c only).
    GetBulk,
}

/// What a walk does when an OID fails to advance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum OidOrdering {
    /// Log a warning and end the walk, keeping what was collected.
    #[default]
    Strict,
    /// End the walk with [`Error::NonIncreasingOid`].
    Reject,
    /// Accept out-of-order OIDs; end with [`Error::DuplicateOid`] when one
    /// repeats. For agents with broken ordering.
    AllowNonIncreasing,
}

enum Verdict {
    Accept,
    Stop,
    Fail(Error),
}

enum OidTracker {
    Ordered { reject: bool },
    Relaxed { seen: HashSet<Oid> },
}

impl OidTracker {
    fn new(ordering: OidOrdering) -> Self {
        match ordering {
            OidOrdering::Strict => Self::Ordered { reject: false },
            OidOrdering::Reject => Self::Ordered { reject: true },
            OidOrdering::AllowNonIncreasing => Self::Relaxed {
                seen: HashSet::new(),
            },
        }
    }

    fn check(&mut self, previous: &Oid, candidate: &Oid) -> Verdict {
        match self {
            Self::Ordered { reject } => {
                if candidate > previous {
                    return Verdict::Accept;
                }
                if *reject {
                    return Verdict::Fail(Error::NonIncreasingOid {
                        previous: previous.clone(),
                        current: candidate.clone(),
                    });
                }
                tracing::warn!(
                    target: "snmp_probe::walk",
                    { snmp.previous = %previous, snmp.oid = %candidate },
                    "agent returned a non-increasing OID; ending walk"
                );
                Verdict::Stop
            }
            Self::Relaxed { seen } => {
                if seen.insert(candidate.clone()) {
                    Verdict::Accept
                } else {
                    Verdict::Fail(Error::DuplicateOid {
                        oid: candidate.clone(),
                    })
                }
            }
        }
    }
}

/// Bindings a walk produced plus the error that cut it short, if any.
#[derive(Debug)]
pub struct WalkOutcome {
    pub varbinds: Vec<VarBind>,
    pub error: Option<Error>,
}

impl WalkOutcome {
    /// The bindings, or the error if there was one.
    pub fn into_result(self) -> Result<Vec<VarBind>> {
        match self.error {
            Some(e) => Err(e),
            None => Ok(self.varbinds),
        }
    }
}

type Fetch = Pin<Box<dyn Future<Output = Result<Vec<VarBind>>> + Send>>;

/// Stream of the bindings under a prefix.
///
/// Built by [`Client::walk`]. After yielding an error the stream ends.
pub struct Walk<T: Transport> {
    client: Client<T>,
    prefix: Oid,
    current: Oid,
    mode: WalkMode,
    tracker: OidTracker,
    max_results: Option<usize>,
    max_repetitions: i32,
    count: usize,
    done: bool,
    buffer: VecDeque<VarBind>,
    pending: Option<Fetch>,
}

impl<T: Transport> Walk<T> {
    pub(crate) fn new(
        client: Client<T>,
        prefix: Oid,
        mode: WalkMode,
        ordering: OidOrdering,
        max_results: Option<usize>,
        max_repetitions: i32,
    ) -> Self {
        tracing::debug!(
            target: "snmp_probe::walk",
            { snmp.oid = %prefix, snmp.walk_mode = ?mode },
            "starting walk"
        );
        Self {
            client,
            current: prefix.clone(),
            prefix,
            mode,
            tracker: OidTracker::new(ordering),
            max_results,
            max_repetitions: max_repetitions.max(1),
            count: 0,
            done: false,
            buffer: VecDeque::new(),
            pending: None,
        }
    }

    fn fetch(&self) -> Fetch {
        let client = self.client.clone();
        let oid = self.current.clone();
        match self.mode {
            WalkMode::GetNext => Box::pin(async move { client.get_next(&oid).await.map(|vb| vec![vb]) }),
            WalkMode::GetBulk => {
                let max_repetitions = self.max_repetitions;
                Box::pin(async move {
                    client
                        .get_bulk(std::slice::from_ref(&oid), 0, max_repetitions)
                        .await
                })
            }
        }
    }

    /// Apply the stop rules to one binding.
    fn admit(&mut self, vb: VarBind) -> Option<Result<VarBind>> {
        if !vb.oid.starts_with(&self.prefix) {
            tracing::debug!(target: "snmp_probe::walk", { snmp.oid = %vb.oid }, "left subtree");
            return None;
        }
        if matches!(vb.value, Value::EndOfMibView) {
            tracing::debug!(target: "snmp_probe::walk", { snmp.oid = %vb.oid }, "end of MIB view");
            return None;
        }
        match self.tracker.check(&self.current, &vb.oid) {
            Verdict::Accept => {
                self.current = vb.oid.clone();
                self.count += 1;
                Some(Ok(vb))
            }
            Verdict::Stop => None,
            Verdict::Fail(e) => Some(Err(e)),
        }
    }

    /// Whether a request error means "nothing further" rather than failure.
    ///
    /// v1 agents answer a GETNEXT past the last object with noSuchName.
    fn is_v1_end(&self, err: &Error) -> bool {
        self.client.config().version == Version::V1
            && matches!(
                err,
                Error::Snmp {
                    status: ErrorStatus::NoSuchName,
                    ..
                }
            )
    }

    pub async fn next(&mut self) -> Option<Result<VarBind>> {
        std::future::poll_fn(|cx| Pin::new(&mut *self).poll_next(cx)).await
    }

    /// Collect every binding; any error discards what was gathered.
    pub async fn collect(self) -> Result<Vec<VarBind>> {
        self.collect_partial().await.into_result()
    }

    /// Collect every binding, keeping them alongside a terminating error.
    pub async fn collect_partial(mut self) -> WalkOutcome {
        let mut varbinds = Vec::new();
        while let Some(item) = self.next().await {
            match item {
                Ok(vb) => varbinds.push(vb),
                Err(e) => {
                    tracing::debug!(
                        target: "snmp_probe::walk",
                        { snmp.collected = varbinds.len(), error = %e },
                        "walk ended with error"
                    );
                    return WalkOutcome {
                        varbinds,
                        error: Some(e),
                    };
                }
            }
        }
        WalkOutcome {
            varbinds,
            error: None,
        }
    }
}

impl<T: Transport> Stream for Walk<T> {
    type Item = Result<VarBind>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        loop {
            if this.done {
                return Poll::Ready(None);
            }
            if this.max_results.is_some_and(|max| this.count >= max) {
                this.done = true;
                return Poll::Ready(None);
            }

            if let Some(vb) = this.buffer.pop_front() {
                let item = this.admit(vb);
                if !matches!(item, Some(Ok(_))) {
                    this.done = true;
                    this.buffer.clear();
                }
                return Poll::Ready(item);
            }

            if this.pending.is_none() {
                this.pending = Some(this.fetch());
            }
            let Some(fetch) = this.pending.as_mut() else {
                return Poll::Ready(None);
            };
            let result = match fetch.as_mut().poll(cx) {
                Poll::Pending => return Poll::Pending,
                Poll::Ready(result) => result,
            };
            this.pending = None;

            match result {
                Ok(varbinds) if varbinds.is_empty() => {
                    this.done = true;
                    return Poll::Ready(None);
                }
                Ok(varbinds) => this.buffer.extend(varbinds),
                Err(e) if this.is_v1_end(&e) => {
                    tracing::debug!(target: "snmp_probe::walk", "noSuchName from v1 agent; walk complete");
                    this.done = true;
                    return Poll::Ready(None);
                }
                Err(e) => {
                    this.done = true;
                    return Poll::Ready(Some(Err(e)));
                }
            }
        }
    }
}

// The Error enum carries OIDs and addresses inline; boxing them would cost an
// allocation on every failure path for little gain.
#![allow(clippy::result_large_err)]

//! # snmp-probe
//!
//! Async SNMPv1/v2c client built on Tokio.
//!
//! - BER codec with strict framing and a generic TLV view
//! - GET, GETNEXT, GETBULK with per-attempt timeout and retry
//! - Subtree walks as a [`Stream`](futures_core::Stream) with partial results
//! - Offline decoding of captured packets through the same decode path the
//!   network calls use
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use snmp_probe::{Version, new_client, oid};
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> snmp_probe::Result<()> {
//!     let client = new_client("192.0.2.10", "public", Version::V2c, 2).await?;
//!
//!     let descr = client.get(&oid!(1, 3, 6, 1, 2, 1, 1, 1, 0)).await?;
//!     println!("{descr}");
//!
//!     for vb in client.walk(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2)).collect().await? {
//!         println!("{vb}");
//!     }
//!
//!     client.close().await;
//!     Ok(())
//! }
//! ```
//!
//! ## Offline decoding
//!
//! ```rust
//! use snmp_probe::{Version, new_client};
//!
//! # #[tokio::main(flavor = "current_thread")]
//! # async fn main() -> snmp_probe::Result<()> {
//! let client = new_client("", "", Version::V2c, 5).await?;
//! let raw = [
//!     0x30, 0x18, 0x02, 0x01, 0x01, 0x04, 0x06, b'p', b'u', b'b', b'l', b'i', b'c',
//!     0xa2, 0x0b, 0x02, 0x01, 0x07, 0x02, 0x01, 0x00, 0x02, 0x01, 0x00, 0x30, 0x00,
//! ];
//! let msg = client.debug(raw.to_vec())?;
//! assert_eq!(msg.community_str(), "public");
//! assert_eq!(msg.pdu.request_id, 7);
//! assert!(msg.pdu.varbinds.is_empty());
//! # Ok(())
//! # }
//! ```

pub mod ber;
pub mod client;
pub mod error;
pub mod format;
pub mod message;
pub mod oid;
pub mod pdu;
pub mod transport;
pub mod value;
pub mod varbind;
pub mod version;

pub(crate) mod util;

#[cfg(feature = "cli")]
pub mod cli;

pub use ber::{Asn1Ber, Tlv, decode_tlv, encode_tlv};
pub use client::{
    Backoff, Client, ClientBuilder, ClientConfig, OidOrdering, Retry, RetryBuilder, Walk,
    WalkMode, WalkOutcome, new_client,
};
pub use error::{DecodeErrorKind, Error, ErrorStatus, OidErrorKind, Result};
pub use message::{Message, decode_packet, encode_request};
pub use oid::Oid;
pub use pdu::{Pdu, PduType};
pub use transport::{Transport, UdpTransport};
pub use value::Value;
pub use varbind::VarBind;
pub use version::Version;

/// Helpers for integration tests and benches.
#[cfg(feature = "testing")]
pub mod testing {
    pub use crate::format::hex::{decode as decode_hex, encode as encode_hex};
    pub use crate::transport::{MockResponse, MockTransport, RecordedRequest, ResponseBuilder};
}

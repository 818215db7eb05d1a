//! Client behavior against a scripted transport.

use bytes::Bytes;
use snmp_probe::testing::{MockTransport, ResponseBuilder};
use snmp_probe::{
    Client, ClientBuilder, DecodeErrorKind, Error, ErrorStatus, Oid, PduType, Retry, Value,
    Version, encode_request, oid,
};
use std::net::SocketAddr;
use std::time::Duration;

mod common;

fn target() -> SocketAddr {
    "127.0.0.1:161".parse().unwrap()
}

fn mock_client(mock: &MockTransport) -> Client<MockTransport> {
    common::init_tracing();
    ClientBuilder::new("")
        .timeout(Duration::from_millis(20))
        .build_with(mock.clone())
        .unwrap()
}

fn v2c(builder: ResponseBuilder) -> Bytes {
    builder.build_v2c(b"public")
}

/// GET returns the agent's binding and sends a well-formed request.
#[tokio::test]
async fn get_sends_community_and_returns_value() {
    let mock = MockTransport::new(target());
    mock.queue_response(v2c(
        ResponseBuilder::new(0).varbind(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(42)),
    ));
    let client = mock_client(&mock);

    let vb = client.get(&oid!(1, 3, 6, 1, 2, 1, 1, 3, 0)).await.unwrap();
    assert_eq!(vb.value, Value::TimeTicks(42));

    let requests = mock.requests();
    assert_eq!(requests.len(), 1);
    let sent = requests[0].message().unwrap();
    assert_eq!(sent.version, Version::V2c);
    assert_eq!(sent.community_str(), "public");
    assert_eq!(sent.pdu.pdu_type, PduType::GetRequest);
    assert_eq!(sent.pdu.varbinds.len(), 1);
    assert_eq!(sent.pdu.varbinds[0].value, Value::Null);
}

/// GET for a missing object surfaces the v2c exception value, not an error.
#[tokio::test]
async fn get_no_such_object_is_a_value() {
    let mock = MockTransport::new(target());
    mock.queue_response(v2c(
        ResponseBuilder::new(0).varbind(oid!(1, 3, 6, 1, 9, 9), Value::NoSuchObject),
    ));
    let vb = mock_client(&mock).get(&oid!(1, 3, 6, 1, 9, 9)).await.unwrap();
    assert!(vb.value.is_exception());
}

/// A non-zero errorStatus becomes an error naming the offending OID.
#[tokio::test]
async fn agent_error_status_names_request_oid() {
    let mock = MockTransport::new(target());
    mock.queue_response(v2c(
        ResponseBuilder::new(0)
            .error_status(2)
            .error_index(2)
            .varbind(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::Null)
            .varbind(oid!(1, 3, 6, 1, 2, 1, 1, 99, 0), Value::Null),
    ));

    let err = mock_client(&mock)
        .get_many(&[oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), oid!(1, 3, 6, 1, 2, 1, 1, 99, 0)])
        .await
        .unwrap_err();
    match err {
        Error::Snmp {
            status,
            index,
            oid,
            target: t,
        } => {
            assert_eq!(status, ErrorStatus::NoSuchName);
            assert_eq!(index, 2);
            assert_eq!(oid, Some(oid!(1, 3, 6, 1, 2, 1, 1, 99, 0)));
            assert_eq!(t, Some(target()));
        }
        other => panic!("unexpected {other:?}"),
    }
}

/// errorIndex 0 refers to the whole PDU.
#[tokio::test]
async fn error_index_zero_has_no_oid() {
    let mock = MockTransport::new(target());
    mock.queue_response(v2c(ResponseBuilder::new(0).error_status(5)));
    let err = mock_client(&mock).get(&oid!(1, 3, 6)).await.unwrap_err();
    assert!(matches!(
        err,
        Error::Snmp {
            status: ErrorStatus::GenErr,
            index: 0,
            oid: None,
            ..
        }
    ));
}

/// Responses with another request-id are skipped while waiting.
#[tokio::test]
async fn mismatched_request_ids_are_discarded() {
    let mock = MockTransport::new(target());
    let client = Client::with_request_id(
        mock.clone(),
        snmp_probe::ClientConfig::default(),
        500,
    );
    mock.queue_raw_response(v2c(
        ResponseBuilder::new(499).varbind(oid!(1, 3, 6, 1), Value::Integer(1)),
    ));
    mock.queue_raw_response(v2c(
        ResponseBuilder::new(500).varbind(oid!(1, 3, 6, 1), Value::Integer(2)),
    ));

    let vb = client.get(&oid!(1, 3, 6, 1)).await.unwrap();
    assert_eq!(vb.value, Value::Integer(2));
    assert_eq!(mock.queued(), 0);
    assert_eq!(mock.requests().len(), 1);
}

/// The harness subscriber tolerates repeat installs from every test.
#[test]
fn tracing_subscriber_installs_once() {
    common::init_tracing();
    common::init_tracing();
    tracing::debug!(target: "snmp_probe::client", "harness subscriber ready");
}

/// A correlated reply that is not a Response PDU is rejected.
#[tokio::test]
async fn echoed_request_is_not_a_response() {
    let mock = MockTransport::new(target());
    let sys_descr = oid!(1, 3, 6, 1, 2, 1, 1, 1, 0);
    mock.queue_response(
        encode_request(
            PduType::GetRequest,
            0,
            std::slice::from_ref(&sys_descr),
            b"public",
            Version::V2c,
        )
        .unwrap(),
    );

    let err = mock_client(&mock).get(&sys_descr).await.unwrap_err();
    assert!(
        matches!(
            err,
            Error::Decode {
                kind: DecodeErrorKind::UnexpectedPduType(PduType::GetRequest),
                ..
            }
        ),
        "{err:?}"
    );
}

/// A walk ends with an error when the agent echoes the GETNEXT back.
#[tokio::test]
async fn walk_stops_on_echoed_getnext() {
    let mock = MockTransport::new(target());
    let prefix = oid!(1, 3, 6, 1, 2, 1, 1);
    mock.queue_response(
        encode_request(
            PduType::GetNextRequest,
            0,
            std::slice::from_ref(&prefix),
            b"public",
            Version::V2c,
        )
        .unwrap(),
    );

    let outcome = mock_client(&mock).walk(prefix).collect_partial().await;
    assert!(outcome.varbinds.is_empty());
    assert!(matches!(
        outcome.error,
        Some(Error::Decode {
            kind: DecodeErrorKind::UnexpectedPduType(PduType::GetNextRequest),
            ..
        })
    ));
}

/// OIDs whose first arcs cannot be encoded faithfully never reach the wire.
#[tokio::test]
async fn unencodable_oids_are_rejected_before_sending() {
    let mock = MockTransport::new(target());
    let client = mock_client(&mock);

    for text in ["1", "5.3", "1.50.7"] {
        let oid: Oid = text.parse().unwrap();
        let err = client.get(&oid).await.unwrap_err();
        match err {
            Error::InvalidOid { input, .. } => assert_eq!(input.as_deref(), Some(text)),
            other => panic!("{text}: unexpected {other:?}"),
        }
    }

    let outcome = client
        .walk("1.50.7".parse().unwrap())
        .collect_partial()
        .await;
    assert!(matches!(outcome.error, Some(Error::InvalidOid { .. })));

    let err = client
        .get_many(&[oid!(1, 3, 6, 1), "1.50.7".parse().unwrap()])
        .await
        .unwrap_err();
    assert!(matches!(err, Error::InvalidOid { .. }));
    assert!(mock.requests().is_empty());
}

/// A socket failure is reported without retrying.
#[tokio::test]
async fn io_error_is_not_retried() {
    let mock = MockTransport::new(target());
    mock.queue_io_error("network unreachable");
    let client = ClientBuilder::new("")
        .retry(Retry::fixed(3, Duration::ZERO))
        .build_with(mock.clone())
        .unwrap();

    let err = client.get(&oid!(1, 3, 6)).await.unwrap_err();
    assert!(matches!(err, Error::Io { .. }));
    assert_eq!(mock.requests().len(), 1);
}

/// get_many splits into batches and keeps request order.
#[tokio::test]
async fn get_many_batches_requests() {
    let mock = MockTransport::new(target());
    let oids: Vec<_> = (1..=5u32).map(|i| oid!(1, 3, 6, 1, 2, 1, 1, i, 0)).collect();
    for chunk in oids.chunks(2) {
        let mut response = ResponseBuilder::new(0);
        for oid in chunk {
            response = response.varbind(oid.clone(), Value::Integer(oid.arcs()[7] as i32));
        }
        mock.queue_response(v2c(response));
    }
    let client = ClientBuilder::new("")
        .max_oids_per_request(2)
        .build_with(mock.clone())
        .unwrap();

    let vbs = client.get_many(&oids).await.unwrap();
    let values: Vec<_> = vbs.iter().filter_map(|vb| vb.value.as_i32()).collect();
    assert_eq!(values, [1, 2, 3, 4, 5]);

    let sizes: Vec<_> = mock
        .requests()
        .iter()
        .map(|r| r.message().unwrap().pdu.varbinds.len())
        .collect();
    assert_eq!(sizes, [2, 2, 1]);
}

/// An empty OID list sends nothing.
#[tokio::test]
async fn get_many_empty() {
    let mock = MockTransport::new(target());
    assert!(mock_client(&mock).get_many(&[]).await.unwrap().is_empty());
    assert!(mock.requests().is_empty());
}

/// get_next_request hands back the whole message.
#[tokio::test]
async fn get_next_request_returns_message() {
    let mock = MockTransport::new(target());
    mock.queue_response(v2c(
        ResponseBuilder::new(0).varbind(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::from("x")),
    ));
    let msg = mock_client(&mock)
        .get_next_request(&[oid!(1, 3, 6, 1, 2, 1, 1)])
        .await
        .unwrap();
    assert_eq!(msg.pdu.pdu_type, PduType::Response);
    assert_eq!(msg.pdu.varbinds[0].oid, oid!(1, 3, 6, 1, 2, 1, 1, 1, 0));

    let sent = mock.requests()[0].message().unwrap();
    assert_eq!(sent.pdu.pdu_type, PduType::GetNextRequest);
    assert_eq!(sent.pdu.request_id, msg.pdu.request_id);
}

/// GETBULK puts non-repeaters and max-repetitions in the error fields.
#[tokio::test]
async fn get_bulk_request_fields() {
    let mock = MockTransport::new(target());
    mock.queue_response(v2c(
        ResponseBuilder::new(0)
            .varbind(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::from("a"))
            .varbind(oid!(1, 3, 6, 1, 2, 1, 1, 2, 0), Value::from("b")),
    ));
    let vbs = mock_client(&mock)
        .get_bulk(&[oid!(1, 3, 6, 1, 2, 1, 1)], 0, 10)
        .await
        .unwrap();
    assert_eq!(vbs.len(), 2);

    let sent = mock.requests()[0].message().unwrap();
    assert_eq!(sent.pdu.pdu_type, PduType::GetBulkRequest);
    assert_eq!(sent.pdu.error_status, 0);
    assert_eq!(sent.pdu.error_index, 10);
}

/// A v1 client encodes version 0 and its own community.
#[tokio::test]
async fn v1_client_sends_v1() {
    let mock = MockTransport::new(target());
    mock.queue_response(
        ResponseBuilder::new(0)
            .varbind(oid!(1, 3, 6, 1), Value::Integer(7))
            .build_v1(b"private"),
    );
    let client = ClientBuilder::new("")
        .version(Version::V1)
        .community("private")
        .build_with(mock.clone())
        .unwrap();
    client.get(&oid!(1, 3, 6, 1)).await.unwrap();
    let sent = mock.requests()[0].message().unwrap();
    assert_eq!(sent.version, Version::V1);
    assert_eq!(sent.community_str(), "private");
}

/// close is idempotent and poisons every clone.
#[tokio::test]
async fn close_is_idempotent() {
    let mock = MockTransport::new(target());
    let client = mock_client(&mock);
    let other = client.clone();

    client.close().await;
    client.close().await;
    assert!(other.is_closed());
    assert!(matches!(other.get(&oid!(1, 3)).await, Err(Error::Closed)));
    assert!(matches!(other.debug(vec![0x30, 0x00]), Err(Error::Closed)));
    assert!(mock.requests().is_empty());
}

/// A closed walk yields the close error and ends.
#[tokio::test]
async fn walk_after_close() {
    let mock = MockTransport::new(target());
    let client = mock_client(&mock);
    client.close().await;
    let outcome = client.walk(oid!(1, 3, 6, 1)).collect_partial().await;
    assert!(outcome.varbinds.is_empty());
    assert!(matches!(outcome.error, Some(Error::Closed)));
}

/// Invalid configuration is caught before any transport is used.
#[test]
fn builder_rejects_bad_config() {
    let mock = MockTransport::new(target());
    let err = ClientBuilder::new("")
        .timeout(Duration::ZERO)
        .build_with(mock.clone())
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));

    let err = ClientBuilder::new("")
        .version(Version::V1)
        .walk_mode(snmp_probe::WalkMode::GetBulk)
        .build_with(mock)
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

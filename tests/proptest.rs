//! Property-based tests.
//!
//! The protocol tests share one runtime, agent and client across cases to
//! keep socket use flat. The codec tests run in isolation.

mod common;

use bytes::Bytes;
use common::TestAgent;
use proptest::prelude::*;
use snmp_probe::ber::{Decoder, EncodeBuf};
use snmp_probe::{
    Client, Oid, Pdu, PduType, Tlv, Value, VarBind, Version, decode_packet, decode_tlv,
    encode_request, encode_tlv,
};
use std::collections::BTreeMap;
use std::sync::OnceLock;
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Duration;
use tokio::runtime::Runtime;

struct SharedEnv {
    runtime: Runtime,
    agent: TestAgent,
    client: Client,
    case_counter: AtomicU32,
}

impl SharedEnv {
    fn new() -> Self {
        let runtime = Runtime::new().expect("runtime");
        let agent = runtime.block_on(TestAgent::with_data(BTreeMap::new()));
        let client = runtime
            .block_on(
                Client::builder(agent.target())
                    .timeout(Duration::from_secs(2))
                    .max_oids_per_request(7)
                    .connect(),
            )
            .expect("connect");
        Self {
            runtime,
            agent,
            client,
            case_counter: AtomicU32::new(0),
        }
    }

    fn next_case_id(&self) -> u32 {
        self.case_counter.fetch_add(1, Ordering::Relaxed)
    }
}

static SHARED_ENV: OnceLock<SharedEnv> = OnceLock::new();

fn env() -> &'static SharedEnv {
    SHARED_ENV.get_or_init(SharedEnv::new)
}

/// OIDs whose first two arcs satisfy X.690 8.19.4.
fn arb_oid() -> impl Strategy<Value = Oid> {
    (0u32..=2, any::<u32>(), prop::collection::vec(any::<u32>(), 0..=18)).prop_map(
        |(first, second, rest)| {
            let second = if first < 2 { second % 40 } else { second };
            let mut arcs = vec![first, second];
            arcs.extend(rest);
            Oid::from_slice(&arcs)
        },
    )
}

fn arb_bytes() -> impl Strategy<Value = Bytes> {
    prop::collection::vec(any::<u8>(), 0..=300).prop_map(Bytes::from)
}

/// Values an agent can store and hand back.
fn arb_value() -> impl Strategy<Value = Value> {
    prop_oneof![
        any::<i32>().prop_map(Value::Integer),
        arb_bytes().prop_map(Value::OctetString),
        Just(Value::Null),
        arb_oid().prop_map(Value::ObjectIdentifier),
        any::<[u8; 4]>().prop_map(Value::IpAddress),
        any::<u32>().prop_map(Value::Counter32),
        any::<u32>().prop_map(Value::Gauge32),
        any::<u32>().prop_map(Value::TimeTicks),
        arb_bytes().prop_map(Value::Opaque),
        any::<u64>().prop_map(Value::Counter64),
    ]
}

fn arb_value_with_exceptions() -> impl Strategy<Value = Value> {
    prop_oneof![
        10 => arb_value(),
        1 => Just(Value::NoSuchObject),
        1 => Just(Value::NoSuchInstance),
        1 => Just(Value::EndOfMibView),
    ]
}

fn arb_varbind() -> impl Strategy<Value = VarBind> {
    (arb_oid(), arb_value_with_exceptions()).prop_map(|(oid, value)| VarBind::new(oid, value))
}

fn arb_pdu() -> impl Strategy<Value = Pdu> {
    (
        prop_oneof![
            Just(PduType::GetRequest),
            Just(PduType::GetNextRequest),
            Just(PduType::Response),
            Just(PduType::GetBulkRequest),
        ],
        0..=i32::MAX,
        any::<i32>(),
        any::<i32>(),
        prop::collection::vec(arb_varbind(), 0..=10),
    )
        .prop_map(
            |(pdu_type, request_id, error_status, error_index, varbinds)| Pdu {
                pdu_type,
                request_id,
                error_status,
                error_index,
                varbinds,
            },
        )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(300))]

    #[test]
    fn value_survives_get(value in arb_value()) {
        let env = env();
        let oid = Oid::from_slice(&[1, 3, 6, 1, 99, 1, env.next_case_id()]);
        env.agent.set(oid.clone(), value.clone());

        env.runtime.block_on(async {
            let vb = env.client.get(&oid).await.unwrap();
            prop_assert_eq!(vb.oid, oid);
            prop_assert_eq!(vb.value, value);
            Ok(())
        })?;
    }

    #[test]
    fn get_many_keeps_order(values in prop::collection::vec(arb_value(), 1..20)) {
        let env = env();
        let case_id = env.next_case_id();
        let oids: Vec<Oid> = (0..values.len())
            .map(|i| Oid::from_slice(&[1, 3, 6, 1, 99, 2, case_id, i as u32]))
            .collect();
        for (oid, value) in oids.iter().zip(&values) {
            env.agent.set(oid.clone(), value.clone());
        }

        env.runtime.block_on(async {
            let vbs = env.client.get_many(&oids).await.unwrap();
            prop_assert_eq!(vbs.len(), values.len());
            for ((vb, oid), value) in vbs.iter().zip(&oids).zip(&values) {
                prop_assert_eq!(&vb.oid, oid);
                prop_assert_eq!(&vb.value, value);
            }
            Ok(())
        })?;
    }

    #[test]
    fn walk_returns_subtree_in_order(arcs in prop::collection::btree_set(any::<u32>(), 1..15)) {
        let env = env();
        let case_id = env.next_case_id();
        let root = Oid::from_slice(&[1, 3, 6, 1, 99, 3, case_id]);
        for &arc in &arcs {
            env.agent.set(root.child(arc), Value::Gauge32(arc));
        }

        env.runtime.block_on(async {
            let vbs = env.client.walk(root.clone()).collect().await.unwrap();
            let got: Vec<u32> = vbs.iter().filter_map(|vb| vb.value.as_u32()).collect();
            let want: Vec<u32> = arcs.iter().copied().collect();
            prop_assert_eq!(got, want);
            prop_assert!(vbs.iter().all(|vb| vb.oid.starts_with(&root)));
            Ok(())
        })?;
    }
}

proptest! {
    #![proptest_config(ProptestConfig { max_global_rejects: 8192, ..ProptestConfig::with_cases(2000) })]

    #[test]
    fn oid_ber_roundtrip(oid in arb_oid()) {
        let decoded = Oid::from_ber(&oid.to_ber()).unwrap();
        prop_assert_eq!(oid, decoded);
    }

    #[test]
    fn oid_display_parse_roundtrip(oid in arb_oid()) {
        let parsed = Oid::parse(&oid.to_string()).unwrap();
        prop_assert_eq!(oid, parsed);
    }

    #[test]
    fn value_ber_roundtrip(value in arb_value_with_exceptions()) {
        let mut buf = EncodeBuf::new();
        value.encode(&mut buf);
        let mut decoder = Decoder::new(buf.finish());
        let decoded = Value::decode(&mut decoder).unwrap();
        prop_assert!(decoder.is_empty());
        prop_assert_eq!(value, decoded);
    }

    #[test]
    fn message_roundtrip(pdu in arb_pdu(), community in arb_bytes(), v1 in any::<bool>()) {
        let version = if v1 { Version::V1 } else { Version::V2c };
        let msg = snmp_probe::Message::new(version, community, pdu);
        let decoded = decode_packet(msg.encode()).unwrap();
        prop_assert_eq!(msg, decoded);
    }

    #[test]
    fn request_has_null_bindings(
        oids in prop::collection::vec(arb_oid(), 0..8),
        request_id in 0..=i32::MAX,
    ) {
        let raw = encode_request(PduType::GetNextRequest, request_id, &oids, b"public", Version::V2c)
            .unwrap();
        let msg = decode_packet(raw).unwrap();
        prop_assert_eq!(msg.pdu.request_id, request_id);
        prop_assert_eq!(msg.pdu.error_status, 0);
        prop_assert_eq!(msg.pdu.varbinds.len(), oids.len());
        for (vb, oid) in msg.pdu.varbinds.iter().zip(&oids) {
            prop_assert_eq!(&vb.oid, oid);
            prop_assert_eq!(&vb.value, &Value::Null);
        }
    }

    #[test]
    fn tlv_roundtrip(tag in any::<u8>(), payload in arb_bytes()) {
        // skip the high-tag-number form and constructed tags, whose payload
        // would have to be nested TLVs
        prop_assume!(tag & 0x1F != 0x1F && tag & 0x20 == 0);
        let node = Tlv::primitive(tag, payload);
        let bytes = encode_tlv(&node);
        let (decoded, used) = decode_tlv(&bytes, 0).unwrap();
        prop_assert_eq!(used, bytes.len());
        prop_assert_eq!(decoded, node);
    }

    #[test]
    fn decode_never_panics(data in prop::collection::vec(any::<u8>(), 0..200)) {
        let _ = decode_packet(data.clone());
        let _ = decode_tlv(&data, 0);
    }
}

//! MIB data and captured packets.

use snmp_probe::{Oid, Value, oid};
use std::collections::BTreeMap;

/// Captured v2c Response packets, hex encoded.
///
/// 1. one Counter32 (ifInOctets.2), long-form lengths throughout
/// 2. 255-byte Cisco IOS sysDescr
/// 3. Linux sysDescr
/// 4. one Counter64 (ifHCOutOctets.262)
/// 5. ifInOctets for interfaces 2 to 10 and 16
pub const PACKETS: [&str; 5] = [
    "3082003202010104067075626c6963a28200230201000201000201003082001630820012060a2b060102010202010a02410409b3fe85",
    "30820132020101040977767370645f345f5fa28201200204264a86e6020100020100308201103082010c06082b060102010101000481ff436973636f20494f5320536f6674776172652c20633736303072737037323034335f727020536f6674776172652028633736303072737037323034335f72702d414456495053455256494345534b392d4d292c2056657273696f6e2031352e3328312953312c2052454c4541534520534f4654574152452028666331290d0a546563686e6963616c20537570706f72743a20687474703a2f2f7777772e636973636f2e636f6d2f74656368737570706f72740d0a436f707972696768742028632920313938362d3230313320627920436973636f2053797374656d732c20496e632e0d0a436f6d70696c6564205468752030372d4665622d31332030363a32",
    "307b020101040977767370645f345f5fa26b020431b6dfa5020100020100305d305b06082b06010201010100044f4c696e757820646e733120322e362e33322d34352d73657276657220233130342d5562756e747520534d5020547565204665622031392032313a33353a3031205554432032303133207838365f3634",
    "3036020101040977767370645f345f5fa2260204662322fa02010002010030183016060c2b060102011f0101010a8206460619ed7896f6e0",
    "3081ce02010104067075626c6963a281c0020408659d0c0201000201003081b13012060a2b060102010202010a02410400f34d353012060a2b060102010202010a03410401119cc3300f060a2b060102010202010a04410100300f060a2b060102010202010a05410100300f060a2b060102010202010a06410100300f060a2b060102010202010a07410100300f060a2b060102010202010a08410100300f060a2b060102010202010a09410100300f060a2b060102010202010a0a4101003010060a2b060102010202010a1041020a59",
];

/// system group (1.3.6.1.2.1.1), seven scalars.
pub fn system_mib() -> BTreeMap<Oid, Value> {
    let mut data = BTreeMap::new();
    data.insert(oid!(1, 3, 6, 1, 2, 1, 1, 1, 0), Value::from("probe test agent"));
    data.insert(
        oid!(1, 3, 6, 1, 2, 1, 1, 2, 0),
        Value::ObjectIdentifier(oid!(1, 3, 6, 1, 4, 1, 8072, 3, 2, 10)),
    );
    data.insert(oid!(1, 3, 6, 1, 2, 1, 1, 3, 0), Value::TimeTicks(8_640_123));
    data.insert(oid!(1, 3, 6, 1, 2, 1, 1, 4, 0), Value::from("noc@example.net"));
    data.insert(oid!(1, 3, 6, 1, 2, 1, 1, 5, 0), Value::from("edge-01"));
    data.insert(oid!(1, 3, 6, 1, 2, 1, 1, 6, 0), Value::from("rack 4"));
    data.insert(oid!(1, 3, 6, 1, 2, 1, 1, 7, 0), Value::Integer(72));
    data
}

/// ifNumber plus ifIndex/ifDescr/ifInOctets/ifHCInOctets for `count` rows.
pub fn interface_table(count: u32) -> BTreeMap<Oid, Value> {
    let mut data = BTreeMap::new();
    data.insert(oid!(1, 3, 6, 1, 2, 1, 2, 1, 0), Value::Integer(count as i32));
    for i in 1..=count {
        data.insert(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 1, i), Value::Integer(i as i32));
        data.insert(
            oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 2, i),
            Value::from(format!("eth{}", i - 1).as_str()),
        );
        data.insert(oid!(1, 3, 6, 1, 2, 1, 2, 2, 1, 10, i), Value::Counter32(i * 1000));
        data.insert(
            oid!(1, 3, 6, 1, 2, 1, 31, 1, 1, 1, 6, i),
            Value::Counter64(u64::from(i) << 33),
        );
    }
    data
}

pub fn combined() -> BTreeMap<Oid, Value> {
    let mut data = system_mib();
    data.extend(interface_table(4));
    data
}

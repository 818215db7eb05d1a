//! Shared pieces of the `snmp-get`, `snmp-walk` and `snmp-decode` tools.

pub mod args;
pub mod output;

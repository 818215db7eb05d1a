//! snmp-decode: decode a captured SNMP datagram offline.

use std::io::{Read, Write};
use std::process::ExitCode;

use clap::Parser;
use snmp_probe::cli::args::OutputArgs;
use snmp_probe::cli::output::{OutputContext, write_error};
use snmp_probe::format::hex;
use snmp_probe::{Client, ClientConfig, Message};

/// Decode a hex-encoded SNMP packet and list its bindings.
#[derive(Debug, Parser)]
#[command(name = "snmp-decode", version, about)]
struct Args {
    #[command(flatten)]
    output: OutputArgs,

    /// Packet as hex; read from stdin when omitted.
    #[arg(value_name = "HEX")]
    packet: Option<String>,
}

fn main() -> ExitCode {
    let args = Args::parse();
    args.output.init_tracing();

    let text = match &args.packet {
        Some(text) => text.clone(),
        None => {
            let mut text = String::new();
            if let Err(e) = std::io::stdin().read_to_string(&mut text) {
                eprintln!("Error reading stdin: {e}");
                return ExitCode::FAILURE;
            }
            text
        }
    };
    let raw = match hex::decode(&text) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let client: Client = Client::offline(ClientConfig::default());
    let message: Message = match client.debug(raw) {
        Ok(message) => message,
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };

    let ctx = OutputContext {
        format: args.output.format,
        force_hex: args.output.hex,
    };
    let mut stdout = std::io::stdout().lock();
    match ctx
        .write_message(&mut stdout, &message)
        .and_then(|()| stdout.flush())
    {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error writing output: {e}");
            ExitCode::FAILURE
        }
    }
}

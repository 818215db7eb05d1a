//! snmp-get: fetch OID values from an agent.

use std::io::Write;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use snmp_probe::cli::args::{CommonArgs, OutputArgs};
use snmp_probe::cli::output::{OutputContext, write_error, write_timing};
use snmp_probe::{Oid, VarBind};

/// Fetch one or more OIDs with GET (or GETNEXT).
#[derive(Debug, Parser)]
#[command(name = "snmp-get", version, about)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    output: OutputArgs,

    /// Send GETNEXT instead of GET.
    #[arg(short = 'n', long = "next")]
    next: bool,

    /// OIDs in dotted notation.
    #[arg(required = true, value_name = "OID")]
    oids: Vec<String>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    args.output.init_tracing();

    let start = Instant::now();
    let result = run(&args).await;
    let elapsed = start.elapsed();

    match result {
        Ok(varbinds) => {
            let ctx = OutputContext {
                format: args.output.format,
                force_hex: args.output.hex,
            };
            let mut stdout = std::io::stdout().lock();
            if let Err(e) = ctx
                .write_varbinds(&mut stdout, &varbinds)
                .and_then(|()| stdout.flush())
            {
                eprintln!("Error writing output: {e}");
                return ExitCode::FAILURE;
            }
            if args.output.timing {
                write_timing(elapsed);
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            write_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> snmp_probe::Result<Vec<VarBind>> {
    let oids = args
        .oids
        .iter()
        .map(|s| s.parse::<Oid>())
        .collect::<snmp_probe::Result<Vec<_>>>()?;

    let client = args.common.builder().connect().await?;
    let result = if args.next {
        client.get_next_many(&oids).await
    } else {
        client.get_many(&oids).await
    };
    client.close().await;
    result
}

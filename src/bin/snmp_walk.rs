//! snmp-walk: list every binding under a subtree.

use std::io::Write;
use std::process::ExitCode;
use std::time::Instant;

use clap::Parser;
use snmp_probe::cli::args::{CommonArgs, OutputArgs, WalkArgs};
use snmp_probe::cli::output::{OutputContext, write_error, write_timing};
use snmp_probe::{Oid, WalkOutcome};

/// Walk a subtree with GETNEXT (or GETBULK).
#[derive(Debug, Parser)]
#[command(name = "snmp-walk", version, about)]
struct Args {
    #[command(flatten)]
    common: CommonArgs,

    #[command(flatten)]
    output: OutputArgs,

    #[command(flatten)]
    walk: WalkArgs,

    /// Subtree root in dotted notation.
    #[arg(value_name = "OID", default_value = "1.3.6.1.2.1")]
    oid: String,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    args.output.init_tracing();

    let start = Instant::now();
    let outcome = match run(&args).await {
        Ok(outcome) => outcome,
        Err(e) => {
            write_error(&e);
            return ExitCode::FAILURE;
        }
    };
    let elapsed = start.elapsed();

    // Partial results are printed even when the walk ended in an error.
    let ctx = OutputContext {
        format: args.output.format,
        force_hex: args.output.hex,
    };
    let mut stdout = std::io::stdout().lock();
    if let Err(e) = ctx
        .write_varbinds(&mut stdout, &outcome.varbinds)
        .and_then(|()| stdout.flush())
    {
        eprintln!("Error writing output: {e}");
        return ExitCode::FAILURE;
    }
    if args.output.timing {
        write_timing(elapsed);
    }

    match outcome.error {
        None => ExitCode::SUCCESS,
        Some(e) => {
            write_error(&e);
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> snmp_probe::Result<WalkOutcome> {
    let prefix: Oid = args.oid.parse()?;
    let client = args.walk.apply(args.common.builder()).connect().await?;
    let outcome = client.walk(prefix).collect_partial().await;
    client.close().await;
    Ok(outcome)
}

//! Argument structures shared by the `snmp-*` tools.

use std::time::Duration;

use clap::{Parser, ValueEnum};

use crate::client::{Backoff, ClientBuilder, OidOrdering, Retry, WalkMode};
use crate::version::Version;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum SnmpVersion {
    #[value(name = "1")]
    V1,
    #[default]
    #[value(name = "2c")]
    V2c,
}

impl From<SnmpVersion> for Version {
    fn from(v: SnmpVersion) -> Self {
        match v {
            SnmpVersion::V1 => Version::V1,
            SnmpVersion::V2c => Version::V2c,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// `OID = TYPE: value`
    #[default]
    Human,
    /// Tab-separated OID, type and value.
    Raw,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum BackoffStrategy {
    #[default]
    None,
    Fixed,
    Exponential,
}

/// Connection arguments.
#[derive(Debug, Parser)]
pub struct CommonArgs {
    /// Target host, host:port or [v6]:port (default port 161).
    #[arg(value_name = "TARGET")]
    pub target: String,

    /// SNMP version: 1 or 2c.
    #[arg(short = 'v', long = "snmp-version", default_value = "2c")]
    pub snmp_version: SnmpVersion,

    #[arg(short = 'c', long = "community", default_value = "public")]
    pub community: String,

    /// Seconds to wait per attempt.
    #[arg(short = 't', long = "timeout", default_value = "5")]
    pub timeout: f64,

    /// Re-sends after a timeout.
    #[arg(short = 'r', long = "retries", default_value = "1")]
    pub retries: u32,

    #[arg(long = "backoff", default_value = "none")]
    pub backoff: BackoffStrategy,

    /// Backoff delay in milliseconds (initial delay when exponential).
    #[arg(long = "backoff-delay", default_value = "500")]
    pub backoff_delay: u64,

    /// Backoff ceiling in milliseconds (exponential only).
    #[arg(long = "backoff-max", default_value = "5000")]
    pub backoff_max: u64,
}

impl CommonArgs {
    pub fn timeout_duration(&self) -> Duration {
        Duration::try_from_secs_f64(self.timeout).unwrap_or(Duration::ZERO)
    }

    pub fn retry_config(&self) -> Retry {
        let backoff = match self.backoff {
            BackoffStrategy::None => Backoff::None,
            BackoffStrategy::Fixed => Backoff::Fixed {
                delay: Duration::from_millis(self.backoff_delay),
            },
            BackoffStrategy::Exponential => Backoff::Exponential {
                initial: Duration::from_millis(self.backoff_delay),
                max: Duration::from_millis(self.backoff_max),
                jitter: 0.25,
            },
        };
        Retry {
            max_attempts: self.retries,
            backoff,
        }
    }

    /// A builder carrying every connection flag.
    pub fn builder(&self) -> ClientBuilder {
        ClientBuilder::new(self.target.clone())
            .version(self.snmp_version.into())
            .community(&self.community)
            .timeout(self.timeout_duration())
            .retry(self.retry_config())
    }
}

/// Output and logging control.
#[derive(Debug, Parser)]
pub struct OutputArgs {
    #[arg(short = 'O', long = "output", default_value = "human")]
    pub format: OutputFormat,

    /// Always render OctetString values as hex.
    #[arg(long = "hex")]
    pub hex: bool,

    /// Print elapsed time to stderr.
    #[arg(long = "timing")]
    pub timing: bool,

    /// Debug logging (snmp_probe=debug).
    #[arg(short = 'd', long = "debug")]
    pub debug: bool,

    /// Trace logging (snmp_probe=trace).
    #[arg(short = 'D', long = "trace")]
    pub trace: bool,
}

impl OutputArgs {
    /// Install a stderr subscriber; `RUST_LOG` overrides the flags.
    pub fn init_tracing(&self) {
        use tracing_subscriber::EnvFilter;

        let level = if self.trace {
            "snmp_probe=trace"
        } else if self.debug {
            "snmp_probe=debug"
        } else {
            "snmp_probe=warn"
        };
        let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// Walk-specific arguments.
#[derive(Debug, Parser)]
pub struct WalkArgs {
    /// Use GETBULK instead of GETNEXT (v2c only).
    #[arg(long = "bulk")]
    pub bulk: bool,

    /// GETBULK max-repetitions.
    #[arg(long = "max-rep", default_value = "25")]
    pub max_repetitions: u32,

    /// Keep walking when the agent returns OIDs out of order.
    #[arg(long = "allow-disorder")]
    pub allow_disorder: bool,

    /// Stop after this many bindings.
    #[arg(long = "limit")]
    pub limit: Option<usize>,
}

impl WalkArgs {
    pub fn apply(&self, builder: ClientBuilder) -> ClientBuilder {
        let mode = if self.bulk {
            WalkMode::GetBulk
        } else {
            WalkMode::GetNext
        };
        let ordering = if self.allow_disorder {
            OidOrdering::AllowNonIncreasing
        } else {
            OidOrdering::Strict
        };
        let builder = builder
            .walk_mode(mode)
            .oid_ordering(ordering)
            .max_repetitions(self.max_repetitions);
        match self.limit {
            Some(limit) => builder.max_walk_results(limit),
            None => builder,
        }
    }
}

//! Timeout retry policy.
//!
//! A request that times out is re-sent with a fresh request-id up to
//! `max_attempts` more times. The pause between sends comes from [`Backoff`].

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// How many times to re-send after a timeout, and how long to pause.
///
/// ```rust
/// use snmp_probe::{Backoff, Retry};
/// use std::time::Duration;
///
/// assert_eq!(Retry::default().max_attempts, 1);
///
/// let patient = Retry::exponential(4)
///     .initial_delay(Duration::from_millis(100))
///     .max_delay(Duration::from_secs(2))
///     .build();
/// assert!(matches!(patient.backoff, Backoff::Exponential { .. }));
/// ```
#[derive(Clone, Debug, PartialEq)]
pub struct Retry {
    /// Re-sends after the first attempt. Zero sends once.
    pub max_attempts: u32,
    pub backoff: Backoff,
}

/// Pause between a timeout and the next send.
#[derive(Clone, Debug, Default, PartialEq)]
pub enum Backoff {
    /// Re-send immediately.
    #[default]
    None,
    Fixed { delay: Duration },
    /// `initial * 2^attempt`, capped at `max`, scaled by a factor in
    /// `[1 - jitter, 1 + jitter]`. `jitter` is read clamped to `0.0..=1.0`.
    Exponential {
        initial: Duration,
        max: Duration,
        jitter: f64,
    },
}

impl Default for Retry {
    /// One re-send, no pause.
    fn default() -> Self {
        Self {
            max_attempts: 1,
            backoff: Backoff::None,
        }
    }
}

impl Retry {
    /// Send once; the first timeout is final.
    pub fn none() -> Self {
        Self {
            max_attempts: 0,
            backoff: Backoff::None,
        }
    }

    pub fn fixed(attempts: u32, delay: Duration) -> Self {
        Self {
            max_attempts: attempts,
            backoff: Backoff::Fixed { delay },
        }
    }

    pub fn exponential(attempts: u32) -> RetryBuilder {
        RetryBuilder {
            max_attempts: attempts,
            ..RetryBuilder::default()
        }
    }

    /// Pause to take after timeout number `attempt` (0-based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        match &self.backoff {
            Backoff::None => Duration::ZERO,
            Backoff::Fixed { delay } => *delay,
            Backoff::Exponential {
                initial,
                max,
                jitter,
            } => {
                let factor = 1u32.checked_shl(attempt.min(31)).unwrap_or(u32::MAX);
                let capped = initial.saturating_mul(factor).min(*max);
                // Saturate rather than panic when jitter pushes past Duration::MAX.
                Duration::try_from_secs_f64(capped.as_secs_f64() * jitter_factor(*jitter))
                    .unwrap_or(Duration::MAX)
            }
        }
    }
}

/// Builder for [`Backoff::Exponential`].
#[derive(Debug, Clone)]
pub struct RetryBuilder {
    max_attempts: u32,
    initial: Duration,
    max: Duration,
    jitter: f64,
}

impl Default for RetryBuilder {
    fn default() -> Self {
        Self {
            max_attempts: 1,
            initial: Duration::from_millis(500),
            max: Duration::from_secs(5),
            jitter: 0.25,
        }
    }
}

impl RetryBuilder {
    pub fn initial_delay(mut self, delay: Duration) -> Self {
        self.initial = delay;
        self
    }

    pub fn max_delay(mut self, delay: Duration) -> Self {
        self.max = delay;
        self
    }

    /// Clamped to `[0.0, 1.0]`.
    pub fn jitter(mut self, jitter: f64) -> Self {
        self.jitter = clamp_jitter(jitter);
        self
    }

    pub fn build(self) -> Retry {
        Retry {
            max_attempts: self.max_attempts,
            backoff: Backoff::Exponential {
                initial: self.initial,
                max: self.max,
                jitter: self.jitter,
            },
        }
    }
}

impl From<RetryBuilder> for Retry {
    fn from(builder: RetryBuilder) -> Self {
        builder.build()
    }
}

static JITTER_SEQ: AtomicU64 = AtomicU64::new(0);

/// Factor in `[1 - jitter, 1 + jitter]` from a hashed counter.
fn clamp_jitter(jitter: f64) -> f64 {
    if jitter.is_nan() {
        0.0
    } else {
        jitter.clamp(0.0, 1.0)
    }
}

/// Multiplier in `[1 - jitter, 1 + jitter]`, with `jitter` forced into `0.0..=1.0`.
fn jitter_factor(jitter: f64) -> f64 {
    let jitter = clamp_jitter(jitter);
    if jitter == 0.0 {
        return 1.0;
    }
    let n = JITTER_SEQ.fetch_add(1, Ordering::Relaxed);
    let mixed = n.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15);
    let unit = (mixed >> 11) as f64 / (1u64 << 53) as f64;
    1.0 + (unit * 2.0 - 1.0) * jitter
}

//! Time value types used by the block planner.
//!
//! [`Time`] is an opaque UTC instant with millisecond accessors, [`TimeProvider`] abstracts the
//! clock so that relative upper bounds can be resolved deterministically in tests, and
//! [`TimeOrDuration`] is the user facing "absolute instant or offset from now" expression.
#![deny(rustdoc::broken_intra_doc_links, rustdoc::bare_urls, rust_2018_idioms)]
#![warn(
    missing_debug_implementations,
    clippy::explicit_iter_loop,
    clippy::use_self,
    clippy::clone_on_ref_ptr
)]

use chrono::{DateTime, TimeZone, Utc};
use parking_lot::RwLock;
use std::str::FromStr;
use std::time::Duration;

/// A UTC Timestamp returned by a [`TimeProvider`]
///
/// Purposefully does not provide [`std::convert::From`] implementations
/// as intended to be an opaque type returned by a `TimeProvider` - the construction methods
/// provided are intended for parsing and tests only
#[derive(Copy, Clone, Ord, PartialOrd, Eq, PartialEq, Hash)]
pub struct Time(DateTime<Utc>);

impl std::fmt::Debug for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        std::fmt::Display::fmt(self, f)
    }
}

impl std::fmt::Display for Time {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.to_rfc3339())
    }
}

impl Time {
    pub const MAX: Self = Self(DateTime::<Utc>::MAX_UTC);
    pub const MIN: Self = Self(DateTime::<Utc>::MIN_UTC);

    /// Makes a new `Time` from the number of non-leap milliseconds
    /// since January 1, 1970 0:00:00 UTC (aka "UNIX timestamp").
    ///
    /// Returns None if out of range
    pub fn from_timestamp_millis_opt(millis: i64) -> Option<Self> {
        Some(Self(Utc.timestamp_millis_opt(millis).single()?))
    }

    /// Makes a new `Time` from the number of non-leap milliseconds
    /// since January 1, 1970 0:00:00 UTC.
    ///
    /// # Panic
    ///
    /// Panics if `millis` is out of the representable range
    pub fn from_timestamp_millis(millis: i64) -> Self {
        Self::from_timestamp_millis_opt(millis).expect("timestamp out of range")
    }

    /// Returns an RFC 3339 and ISO 8601 date and time string such as `1996-12-19T16:39:57+00:00`.
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339()
    }

    /// Returns a human readable rendering such as `2009-11-10 23:00:00.5 +0000 UTC`.
    ///
    /// Fractional seconds are trimmed of trailing zeros and left out entirely when zero.
    pub fn to_human_string(&self) -> String {
        let mut out = self.0.format("%Y-%m-%d %H:%M:%S").to_string();
        let nanos = self.0.timestamp_subsec_nanos();
        if nanos != 0 {
            let fraction = format!("{nanos:09}");
            out.push('.');
            out.push_str(fraction.trim_end_matches('0'));
        }
        out.push_str(" +0000 UTC");
        out
    }

    /// Returns the number of non-leap-milliseconds since January 1, 1970 UTC
    pub fn timestamp_millis(&self) -> i64 {
        self.0.timestamp_millis()
    }

    /// Adds given [`Duration`] to the current date and time.
    ///
    /// Returns `None` if it would result in overflow
    pub fn checked_add(&self, duration: Duration) -> Option<Self> {
        let duration = chrono::Duration::from_std(duration).ok()?;
        Some(Self(self.0.checked_add_signed(duration)?))
    }

    /// Subtracts the given [`Duration`] from the current date and time.
    ///
    /// Returns `None` if it would result in overflow
    pub fn checked_sub(&self, duration: Duration) -> Option<Self> {
        let duration = chrono::Duration::from_std(duration).ok()?;
        Some(Self(self.0.checked_sub_signed(duration)?))
    }
}

pub trait TimeProvider: std::fmt::Debug + Send + Sync + 'static {
    /// Returns the current `Time`. No guarantees are made about monotonicity
    fn now(&self) -> Time;
}

/// A [`TimeProvider`] that uses [`Utc::now`] as a clock source
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemProvider {}

impl SystemProvider {
    pub fn new() -> Self {
        Self::default()
    }
}

impl TimeProvider for SystemProvider {
    fn now(&self) -> Time {
        Time(Utc::now())
    }
}

/// A [`TimeProvider`] that returns a fixed `Time` that can be set by [`MockProvider::set`]
#[derive(Debug)]
pub struct MockProvider {
    now: RwLock<Time>,
}

impl MockProvider {
    pub fn new(start: Time) -> Self {
        Self {
            now: RwLock::new(start),
        }
    }

    pub fn set(&self, time: Time) {
        *self.now.write() = time
    }
}

impl TimeProvider for MockProvider {
    fn now(&self) -> Time {
        *self.now.read()
    }
}

#[derive(Debug, thiserror::Error)]
#[error(
    "invalid time expression '{input}': expected 'now', an RFC 3339 instant or an offset such as '-2h'"
)]
pub struct ParseTimeError {
    input: String,
}

/// Either an absolute instant or an offset relative to "now".
///
/// Parses from:
///
/// * `now`
/// * an RFC 3339 instant, e.g. `2023-10-30T19:10:00-04:00` or `2023-10-30 23:10:00Z`
/// * a `humantime` duration with an optional sign, e.g. `-2h`, `+30m`, `1day`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeOrDuration {
    Time(Time),
    Offset { duration: Duration, negative: bool },
}

impl TimeOrDuration {
    /// The current instant of whichever provider resolves this value.
    pub fn now() -> Self {
        Self::Offset {
            duration: Duration::ZERO,
            negative: false,
        }
    }

    /// Resolve to an absolute instant using `provider` as the reference clock.
    ///
    /// Returns `None` if the offset moves the instant out of the representable range.
    pub fn resolve(&self, provider: &dyn TimeProvider) -> Option<Time> {
        match *self {
            Self::Time(t) => Some(t),
            Self::Offset { duration, negative } => {
                let now = provider.now();
                if negative {
                    now.checked_sub(duration)
                } else {
                    now.checked_add(duration)
                }
            }
        }
    }
}

impl FromStr for TimeOrDuration {
    type Err = ParseTimeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.eq_ignore_ascii_case("now") {
            return Ok(Self::now());
        }

        if let Ok(t) = DateTime::parse_from_rfc3339(s) {
            return Ok(Self::Time(Time(t.with_timezone(&Utc))));
        }
        if let Ok(t) = humantime::parse_rfc3339_weak(s) {
            return Ok(Self::Time(Time(DateTime::<Utc>::from(t))));
        }

        let (negative, rest) = match s.strip_prefix('-') {
            Some(rest) => (true, rest),
            None => (false, s.strip_prefix('+').unwrap_or(s)),
        };
        humantime::parse_duration(rest)
            .map(|duration| Self::Offset { duration, negative })
            .map_err(|_| ParseTimeError {
                input: s.to_string(),
            })
    }
}

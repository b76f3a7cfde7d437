//! Process-wide monotonic nanosecond clock.
//!
//! The first call to [`now`] (or [`init`]) captures the clock baseline and any
//! conversion factor the platform needs; every later reading is relative to it.
//! Readings are meaningless across processes.

mod error;

#[cfg(windows)]
mod win;
#[cfg(windows)]
use win as imp;

#[cfg(any(target_os = "macos", target_os = "ios"))]
mod mach;
#[cfg(any(target_os = "macos", target_os = "ios"))]
use mach as imp;

#[cfg(all(unix, not(any(target_os = "macos", target_os = "ios"))))]
mod posix;
#[cfg(all(unix, not(any(target_os = "macos", target_os = "ios"))))]
use posix as imp;

#[cfg(not(any(windows, unix)))]
compile_error!("No monotonic clock is available for your target");

use {
    std::{
        fmt::{self, Display, Formatter},
        ops::{Add, AddAssign},
        sync::OnceLock,
        time::Duration,
    },
    tracing::debug,
};

pub use error::TicksError;

const NANOS_PER_SEC: u64 = 1_000_000_000;
const NANOS_PER_MILLI: u64 = 1_000_000;
const NANOS_PER_MICRO: u64 = 1_000;

static TIMEBASE: OnceLock<imp::Timebase> = OnceLock::new();

fn timebase() -> &'static imp::Timebase {
    TIMEBASE.get_or_init(|| {
        let timebase = imp::Timebase::capture();
        debug!(clock = imp::NAME, ?timebase, "captured clock baseline");
        timebase
    })
}

/// Captures the clock baseline if no thread has done so yet.
///
/// Calling this is never required; [`now`] initializes the clock on first use.
pub fn init() {
    timebase();
}

/// Whether the clock baseline has been captured.
pub fn is_initialized() -> bool {
    TIMEBASE.get().is_some()
}

/// Returns the nanoseconds elapsed since the process-wide baseline.
///
/// Never decreases between two calls ordered in time.
/// Concurrent first callers all block until one of them captures the baseline.
///
/// # Panics
///
/// Panics if the OS clock function fails.
pub fn now() -> Ticks {
    Ticks(timebase().elapsed_nanos())
}

/// Returns the duration between two readings.
///
/// # Panics
///
/// Panics if `newer` is earlier than `older`.
pub fn delta(newer: Ticks, older: Ticks) -> TickDelta {
    try_delta(newer, older).unwrap_or_else(|err| panic!("{}", err))
}

/// Returns the duration between two readings.
///
/// # Errors
///
/// Returns [`TicksError::OutOfOrder`] if `newer` is earlier than `older`.
pub fn try_delta(newer: Ticks, older: Ticks) -> Result<TickDelta, TicksError> {
    newer
        .0
        .checked_sub(older.0)
        .map(TickDelta)
        .ok_or(TicksError::OutOfOrder { newer, older })
}

/// Monotonic timestamp in nanoseconds relative to the process-wide baseline.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct Ticks(u64);

impl Ticks {
    /// The baseline itself.
    pub const ZERO: Ticks = Ticks(0);

    /// See [`now`].
    pub fn now() -> Ticks {
        now()
    }

    /// Reading `nanos` nanoseconds after the baseline.
    pub fn from_nanos(nanos: u64) -> Ticks {
        Ticks(nanos)
    }

    /// Nanoseconds since the baseline.
    pub fn as_nanos(self) -> u64 {
        self.0
    }

    /// Duration from `older` to `self`.
    ///
    /// # Panics
    ///
    /// Panics if `older` is later than `self`.
    pub fn since(self, older: Ticks) -> TickDelta {
        delta(self, older)
    }

    /// Duration from `self` to [`now`].
    ///
    /// # Panics
    ///
    /// Panics if `self` is later than [`now`], which only happens for made-up readings.
    pub fn elapsed(self) -> TickDelta {
        delta(now(), self)
    }
}

impl Display for Ticks {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{}ns", self.0)
    }
}

/// Non-negative duration between two [`Ticks`], in nanoseconds.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Debug)]
pub struct TickDelta(u64);

impl TickDelta {
    /// Empty duration.
    pub const ZERO: TickDelta = TickDelta(0);

    /// Saturates at `u64::MAX` nanoseconds.
    pub fn from_seconds(seconds: u64) -> TickDelta {
        TickDelta(seconds.saturating_mul(NANOS_PER_SEC))
    }

    /// Saturates at `u64::MAX` nanoseconds.
    pub fn from_millis(millis: u64) -> TickDelta {
        TickDelta(millis.saturating_mul(NANOS_PER_MILLI))
    }

    /// Saturates at `u64::MAX` nanoseconds.
    pub fn from_micros(micros: u64) -> TickDelta {
        TickDelta(micros.saturating_mul(NANOS_PER_MICRO))
    }

    /// Duration of `nanos` nanoseconds.
    pub fn from_nanos(nanos: u64) -> TickDelta {
        TickDelta(nanos)
    }

    /// Fractional seconds.
    pub fn in_seconds_f(self) -> f64 {
        self.0 as f64 / NANOS_PER_SEC as f64
    }

    /// Fractional milliseconds.
    pub fn in_millis_f(self) -> f64 {
        self.0 as f64 / NANOS_PER_MILLI as f64
    }

    /// Fractional microseconds.
    pub fn in_micros_f(self) -> f64 {
        self.0 as f64 / NANOS_PER_MICRO as f64
    }

    /// Whole seconds, truncated.
    pub fn in_seconds(self) -> u64 {
        self.0 / NANOS_PER_SEC
    }

    /// Whole milliseconds, truncated.
    pub fn in_millis(self) -> u64 {
        self.0 / NANOS_PER_MILLI
    }

    /// Whole microseconds, truncated.
    pub fn in_micros(self) -> u64 {
        self.0 / NANOS_PER_MICRO
    }

    /// Nanoseconds.
    pub fn in_nanos(self) -> u64 {
        self.0
    }
}

impl Add for TickDelta {
    type Output = TickDelta;

    /// Saturates at `u64::MAX` nanoseconds.
    fn add(self, rhs: TickDelta) -> TickDelta {
        TickDelta(self.0.saturating_add(rhs.0))
    }
}

impl AddAssign for TickDelta {
    fn add_assign(&mut self, rhs: TickDelta) {
        *self = *self + rhs;
    }
}

impl From<TickDelta> for Duration {
    fn from(delta: TickDelta) -> Duration {
        Duration::from_nanos(delta.0)
    }
}

impl TryFrom<Duration> for TickDelta {
    type Error = TicksError;

    fn try_from(duration: Duration) -> Result<TickDelta, TicksError> {
        u64::try_from(duration.as_nanos())
            .map(TickDelta)
            .map_err(|_| TicksError::OutOfRange)
    }
}

impl Display for TickDelta {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        write!(f, "{:?}", Duration::from(*self))
    }
}

//! Portable counting semaphore and monotonic tick clock.
//!
//! [`Semaphore`] wraps the native OS semaphore where one exists
//! ([`semaphore`](https://docs.microsoft.com/en-us/windows/win32/api/winbase/nf-winbase-createsemaphorea)
//! on Windows, a Mach semaphore on macOS / iOS, unnamed
//! [`sem_t`](https://pubs.opengroup.org/onlinepubs/9699919799/functions/sem_init.html)
//! on Linux and other Unix systems) and falls back to a mutex and condition
//! variable ([`CondvarSemaphore`]) elsewhere, or when built with the
//! `generic-semaphore` feature.
//!
//! [`ticks::now`] returns nanoseconds elapsed since a process-wide baseline
//! captured on first use, read from `QueryPerformanceCounter`, `mach_absolute_time`
//! or `clock_gettime(CLOCK_MONOTONIC)`.
//!
//! Uses [`winapi`](https://docs.rs/winapi/0.3.8/winapi/) on Windows and
//! [`libc`](https://docs.rs/libc/0.2/libc/) / [`mach2`](https://docs.rs/mach2/0.4/mach2/) on Unix.

#![warn(missing_docs)]

pub mod semaphore;
pub mod ticks;

pub use crate::semaphore::{CondvarSemaphore, RawSemaphore, Semaphore, SemaphoreError, MAX_COUNT};

pub use crate::ticks::{TickDelta, Ticks, TicksError};

use {
    super::NANOS_PER_SEC,
    std::{io, mem},
    tracing::error,
    winapi::{
        shared::minwindef::FALSE,
        um::{
            profileapi::{QueryPerformanceCounter, QueryPerformanceFrequency},
            winnt::LARGE_INTEGER,
        },
    },
};

pub(super) const NAME: &str = "QueryPerformanceCounter";

/// Performance counter reading taken at initialization, with the counter frequency.
/// See [`QueryPerformanceCounter`](https://docs.microsoft.com/en-us/windows/win32/api/profileapi/nf-profileapi-queryperformancecounter) on MSDN.
#[derive(Debug)]
pub(super) struct Timebase {
    frequency: u64,
    start: u64,
}

impl Timebase {
    pub(super) fn capture() -> Timebase {
        let mut frequency: LARGE_INTEGER = unsafe { mem::zeroed() };

        let result = unsafe { QueryPerformanceFrequency(&mut frequency) };
        let frequency = unsafe { *frequency.QuadPart() };

        if result == FALSE || frequency <= 0 {
            let err = io::Error::last_os_error();
            error!(%err, frequency, "QueryPerformanceFrequency failed");
            panic!("QueryPerformanceFrequency failed: {}", err);
        }

        Timebase {
            frequency: frequency as u64,
            start: performance_counter(),
        }
    }

    pub(super) fn elapsed_nanos(&self) -> u64 {
        let elapsed = performance_counter().saturating_sub(self.start);

        (u128::from(elapsed) * u128::from(NANOS_PER_SEC) / u128::from(self.frequency)) as u64
    }
}

fn performance_counter() -> u64 {
    let mut counter: LARGE_INTEGER = unsafe { mem::zeroed() };

    // Never fails on Windows XP and later.
    let result = unsafe { QueryPerformanceCounter(&mut counter) };

    if result == FALSE {
        let err = io::Error::last_os_error();
        error!(%err, "QueryPerformanceCounter failed");
        panic!("QueryPerformanceCounter failed: {}", err);
    }

    unsafe { *counter.QuadPart() as u64 }
}

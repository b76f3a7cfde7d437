use {
    super::NANOS_PER_SEC,
    std::{io, mem::MaybeUninit},
    tracing::error,
};

pub(super) const NAME: &str = "clock_gettime";

/// `CLOCK_MONOTONIC` reading taken at initialization.
#[derive(Debug)]
pub(super) struct Timebase {
    start: u64,
}

impl Timebase {
    pub(super) fn capture() -> Timebase {
        Timebase {
            start: monotonic_nanos(),
        }
    }

    pub(super) fn elapsed_nanos(&self) -> u64 {
        monotonic_nanos().saturating_sub(self.start)
    }
}

fn monotonic_nanos() -> u64 {
    let mut ts = MaybeUninit::<libc::timespec>::uninit();

    let result = unsafe { libc::clock_gettime(libc::CLOCK_MONOTONIC, ts.as_mut_ptr()) };

    if result != 0 {
        let err = io::Error::last_os_error();
        error!(%err, "clock_gettime(CLOCK_MONOTONIC) failed");
        panic!("clock_gettime(CLOCK_MONOTONIC) failed: {}", err);
    }

    let ts = unsafe { ts.assume_init() };

    (ts.tv_sec as u64) * NANOS_PER_SEC + ts.tv_nsec as u64
}

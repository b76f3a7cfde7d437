//! Counting semaphore with interchangeable platform backends.

mod error;
mod generic;

#[cfg(all(windows, not(feature = "generic-semaphore")))]
mod win;

#[cfg(all(
    unix,
    not(any(target_os = "macos", target_os = "ios")),
    not(feature = "generic-semaphore")
))]
mod posix;

#[cfg(all(
    any(target_os = "macos", target_os = "ios"),
    not(feature = "generic-semaphore")
))]
mod mach;

use std::fmt::{self, Debug, Formatter};

pub use error::SemaphoreError;
pub use generic::CondvarSemaphore;

#[cfg(all(windows, not(feature = "generic-semaphore")))]
type Backend = win::Win32Semaphore;

#[cfg(all(
    unix,
    not(any(target_os = "macos", target_os = "ios")),
    not(feature = "generic-semaphore")
))]
type Backend = posix::PosixSemaphore;

#[cfg(all(
    any(target_os = "macos", target_os = "ios"),
    not(feature = "generic-semaphore")
))]
type Backend = mach::MachSemaphore;

#[cfg(any(feature = "generic-semaphore", not(any(windows, unix))))]
type Backend = CondvarSemaphore;

/// Maximum value of the internal counter, identical on every backend.
///
/// Matches the Win32 semaphore maximum and `SEM_VALUE_MAX` on Linux.
pub const MAX_COUNT: u32 = i32::MAX as u32;

/// Counting semaphore operations every backend provides.
///
/// Transient conditions (interrupted system calls, spurious wakeups) are
/// retried by the implementation and never returned to the caller.
pub trait RawSemaphore: Sized + Send + Sync {
    /// Short backend name, e.g. `"posix"`.
    const NAME: &'static str;

    /// Creates a semaphore with the internal counter set to `count`.
    ///
    /// # Errors
    ///
    /// Returns [`SemaphoreError::InvalidCount`] if `count` exceeds [`MAX_COUNT`],
    /// or [`SemaphoreError::FailedToCreate`] if the OS object could not be created.
    fn new(count: u32) -> Result<Self, SemaphoreError>;

    /// Increments the counter, waking up at most one waiting thread.
    ///
    /// # Errors
    ///
    /// Returns [`SemaphoreError::Overflow`] if the counter is already at [`MAX_COUNT`].
    fn signal(&self) -> Result<(), SemaphoreError>;

    /// Blocks until the counter is positive, then decrements it.
    fn wait(&self) -> Result<(), SemaphoreError>;

    /// Decrements the counter and returns `true` if it was positive.
    /// Returns `false` immediately otherwise, leaving the counter untouched.
    fn try_wait(&self) -> Result<bool, SemaphoreError>;
}

fn check_count(count: u32) -> Result<(), SemaphoreError> {
    if count > MAX_COUNT {
        Err(SemaphoreError::InvalidCount {
            count,
            max: MAX_COUNT,
        })
    } else {
        Ok(())
    }
}

/// Counting semaphore backed by the best primitive the platform offers.
///
/// Windows uses a Win32 semaphore, macOS / iOS a Mach semaphore, other Unix
/// systems an unnamed POSIX `sem_t`. Everything else, or any target built with
/// the `generic-semaphore` feature, uses [`CondvarSemaphore`].
///
/// Owns the OS object exclusively and releases it when dropped.
/// Share it between threads with an `Arc`.
pub struct Semaphore {
    raw: Backend,
}

impl Semaphore {
    /// Creates a new semaphore with the internal counter set to `init_count`.
    ///
    /// # Errors
    ///
    /// Returns an error if `init_count` exceeds [`MAX_COUNT`] or the OS semaphore creation failed.
    pub fn new(init_count: u32) -> Result<Semaphore, SemaphoreError> {
        Backend::new(init_count).map(|raw| Semaphore { raw })
    }

    /// Increments the semaphore's internal counter by `1`.
    /// At most one waiting thread may be woken up.
    ///
    /// Never blocks. Safe to call from any thread.
    ///
    /// # Errors
    ///
    /// Fails if the internal counter is already at [`MAX_COUNT`], or if the OS function fails.
    pub fn signal(&self) -> Result<(), SemaphoreError> {
        self.raw.signal()
    }

    /// Blocks the thread until the internal counter is above `0`, then decrements it.
    ///
    /// There's no guarantee which thread is woken up when multiple threads
    /// are waiting on one semaphore.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS function fails.
    pub fn wait(&self) -> Result<(), SemaphoreError> {
        self.raw.wait()
    }

    /// Decrements the internal counter if it is above `0` and returns `true`.
    /// Returns `false` without blocking otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if the OS function fails.
    pub fn try_wait(&self) -> Result<bool, SemaphoreError> {
        self.raw.try_wait()
    }

    /// Largest value the internal counter can reach, see [`MAX_COUNT`].
    pub fn max_count() -> u32 {
        MAX_COUNT
    }

    /// Name of the backend selected for this build: `"win32"`, `"mach"`, `"posix"` or `"generic"`.
    pub fn backend() -> &'static str {
        Backend::NAME
    }
}

impl RawSemaphore for Semaphore {
    const NAME: &'static str = Backend::NAME;

    fn new(count: u32) -> Result<Self, SemaphoreError> {
        Semaphore::new(count)
    }

    fn signal(&self) -> Result<(), SemaphoreError> {
        Semaphore::signal(self)
    }

    fn wait(&self) -> Result<(), SemaphoreError> {
        Semaphore::wait(self)
    }

    fn try_wait(&self) -> Result<bool, SemaphoreError> {
        Semaphore::try_wait(self)
    }
}

impl Debug for Semaphore {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.debug_struct("Semaphore")
            .field("backend", &Backend::NAME)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::{
            sync::{mpsc, Arc},
            thread,
            time::Duration,
        },
    };

    #[test]
    fn initial_count() {
        let s = Semaphore::new(3).unwrap();

        for _ in 0..3 {
            s.wait().unwrap(); // Does not block.
        }

        assert!(!s.try_wait().unwrap());
    }

    #[test]
    fn invalid_count() {
        match Semaphore::new(MAX_COUNT + 1) {
            Err(SemaphoreError::InvalidCount { count, max }) => {
                assert_eq!(count, MAX_COUNT + 1);
                assert_eq!(max, MAX_COUNT);
            }
            other => panic!("unexpected result: {:?}", other),
        }
    }

    #[test]
    fn overflow() {
        let s = Semaphore::new(MAX_COUNT).unwrap();

        match s.signal() {
            Err(SemaphoreError::Overflow) => {}
            other => panic!("unexpected result: {:?}", other),
        }

        // Counter left untouched.
        assert!(s.try_wait().unwrap());
        s.signal().unwrap();
    }

    #[test]
    fn thread_signal() {
        let s = Arc::new(Semaphore::new(0).unwrap()); // Not signaled.
        let s_clone = s.clone();

        let (tx, rx) = mpsc::channel();

        let t = thread::spawn(move || {
            s_clone.wait().unwrap();
            tx.send(()).unwrap();
        });

        thread::sleep(Duration::from_millis(100));

        // Still waiting.
        assert!(rx.try_recv().is_err());

        s.signal().unwrap();

        rx.recv_timeout(Duration::from_secs(10)).unwrap();
        t.join().unwrap();

        // The signal was consumed by the waiter.
        assert!(!s.try_wait().unwrap());
    }

    #[test]
    fn backend_name() {
        #[cfg(feature = "generic-semaphore")]
        assert_eq!(Semaphore::backend(), "generic");

        #[cfg(all(windows, not(feature = "generic-semaphore")))]
        assert_eq!(Semaphore::backend(), "win32");

        #[cfg(all(target_os = "linux", not(feature = "generic-semaphore")))]
        assert_eq!(Semaphore::backend(), "posix");

        #[cfg(all(target_os = "macos", not(feature = "generic-semaphore")))]
        assert_eq!(Semaphore::backend(), "mach");

        assert!(format!("{:?}", Semaphore::new(0).unwrap()).contains(Semaphore::backend()));
    }
}

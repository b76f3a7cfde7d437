use {
    super::{check_count, RawSemaphore, SemaphoreError},
    std::{cell::UnsafeCell, io},
    tracing::error,
};

// `pshared` argument of `sem_init`.
const SINGLE_PROCESS_PRIVATE: libc::c_int = 0;

/// Unnamed process-private POSIX semaphore wrapper.
/// See [`sem_init`](https://pubs.opengroup.org/onlinepubs/9699919799/functions/sem_init.html).
///
/// The `sem_t` lives on the heap so its address stays stable after `sem_init`,
/// whatever happens to the owning value.
///
/// Destroys the owned `sem_t` when dropped.
pub struct PosixSemaphore {
    handle: Box<UnsafeCell<libc::sem_t>>,
}

impl PosixSemaphore {
    fn as_ptr(&self) -> *mut libc::sem_t {
        self.handle.get()
    }
}

impl RawSemaphore for PosixSemaphore {
    const NAME: &'static str = "posix";

    fn new(count: u32) -> Result<Self, SemaphoreError> {
        check_count(count)?;

        // SAFETY: `sem_t` is a plain C type, all-zeroes is a valid (uninitialized) bit pattern.
        let handle = Box::new(UnsafeCell::new(unsafe { std::mem::zeroed::<libc::sem_t>() }));

        let result = unsafe { libc::sem_init(handle.get(), SINGLE_PROCESS_PRIVATE, count) };

        if result != 0 {
            let err = io::Error::last_os_error();
            error!(count, %err, "sem_init failed");
            return Err(SemaphoreError::FailedToCreate(err));
        }

        tracing::trace!(count, "created posix semaphore");

        Ok(PosixSemaphore { handle })
    }

    fn signal(&self) -> Result<(), SemaphoreError> {
        let result = unsafe { libc::sem_post(self.as_ptr()) };

        if result == 0 {
            return Ok(());
        }

        let err = io::Error::last_os_error();

        if err.raw_os_error() == Some(libc::EOVERFLOW) {
            Err(SemaphoreError::Overflow)
        } else {
            error!(%err, "sem_post failed");
            Err(SemaphoreError::FailedToSignal(err))
        }
    }

    fn wait(&self) -> Result<(), SemaphoreError> {
        loop {
            let result = unsafe { libc::sem_wait(self.as_ptr()) };

            if result == 0 {
                return Ok(());
            }

            let err = io::Error::last_os_error();

            // Interrupted by a signal handler.
            if err.raw_os_error() == Some(libc::EINTR) {
                continue;
            }

            error!(%err, "sem_wait failed");
            return Err(SemaphoreError::FailedToWait(err));
        }
    }

    fn try_wait(&self) -> Result<bool, SemaphoreError> {
        loop {
            let result = unsafe { libc::sem_trywait(self.as_ptr()) };

            if result == 0 {
                return Ok(true);
            }

            let err = io::Error::last_os_error();

            match err.raw_os_error() {
                Some(libc::EAGAIN) => return Ok(false),
                Some(libc::EINTR) => continue,
                _ => {
                    error!(%err, "sem_trywait failed");
                    return Err(SemaphoreError::FailedToWait(err));
                }
            }
        }
    }
}

impl Drop for PosixSemaphore {
    fn drop(&mut self) {
        // No waiters can remain: `wait` borrows `self`.
        let result = unsafe { libc::sem_destroy(self.as_ptr()) };

        if result == 0 {
            tracing::trace!("destroyed posix semaphore");
        } else {
            let err = io::Error::last_os_error();
            error!(%err, "sem_destroy failed");
            debug_assert!(false, "sem_destroy failed: {}", err);
        }
    }
}

unsafe impl Send for PosixSemaphore {}
unsafe impl Sync for PosixSemaphore {}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::{
            os::unix::thread::JoinHandleExt,
            ptr,
            sync::{
                atomic::{AtomicUsize, Ordering},
                mpsc, Arc,
            },
            thread,
            time::Duration,
        },
    };

    static INTERRUPTS: AtomicUsize = AtomicUsize::new(0);

    extern "C" fn count_interrupt(_: libc::c_int) {
        INTERRUPTS.fetch_add(1, Ordering::SeqCst);
    }

    // No `SA_RESTART`: a blocked `sem_wait` returns `EINTR` when the handler runs.
    fn install_sigusr1_handler() {
        let mut action: libc::sigaction = unsafe { std::mem::zeroed() };
        action.sa_sigaction = count_interrupt as extern "C" fn(libc::c_int) as libc::sighandler_t;
        action.sa_flags = 0;

        let result = unsafe {
            libc::sigemptyset(&mut action.sa_mask);
            libc::sigaction(libc::SIGUSR1, &action, ptr::null_mut())
        };
        assert_eq!(result, 0);
    }

    fn value(s: &PosixSemaphore) -> libc::c_int {
        let mut value = 0;
        let result = unsafe { libc::sem_getvalue(s.as_ptr(), &mut value) };
        assert_eq!(result, 0);
        value
    }

    #[test]
    fn signaled() {
        let s = PosixSemaphore::new(2).unwrap();
        assert_eq!(value(&s), 2);

        s.wait().unwrap();
        s.wait().unwrap();
        assert_eq!(value(&s), 0);

        assert!(!s.try_wait().unwrap());
        assert_eq!(value(&s), 0);

        s.signal().unwrap();
        assert_eq!(value(&s), 1);

        assert!(s.try_wait().unwrap());
        assert_eq!(value(&s), 0);
    }

    #[test]
    fn moved_after_init() {
        let s = PosixSemaphore::new(1).unwrap();
        let ptr = s.as_ptr();

        let moved = Box::new(s);
        assert_eq!(moved.as_ptr(), ptr);

        assert!(moved.try_wait().unwrap());
    }

    #[test]
    fn thread_signal() {
        let s = Arc::new(PosixSemaphore::new(0).unwrap()); // Not signaled.
        let s_clone = s.clone();

        let t = thread::spawn(move || {
            s_clone.wait().unwrap();
        });

        thread::sleep(Duration::from_millis(100));

        s.signal().unwrap();

        t.join().unwrap();

        assert_eq!(value(&s), 0);
    }

    #[test]
    fn interrupted_wait() {
        install_sigusr1_handler();

        let s = Arc::new(PosixSemaphore::new(0).unwrap()); // Not signaled.
        let s_clone = s.clone();

        let (tx, rx) = mpsc::channel();

        let t = thread::spawn(move || {
            s_clone.wait().unwrap();
            tx.send(()).unwrap();
        });

        thread::sleep(Duration::from_millis(100));

        for _ in 0..5 {
            let result = unsafe { libc::pthread_kill(t.as_pthread_t(), libc::SIGUSR1) };
            assert_eq!(result, 0);

            thread::sleep(Duration::from_millis(20));
        }

        // The handler ran, yet the wait did not return.
        assert!(INTERRUPTS.load(Ordering::SeqCst) > 0);
        assert!(rx.try_recv().is_err());

        s.signal().unwrap();

        rx.recv_timeout(Duration::from_secs(10)).unwrap();
        t.join().unwrap();

        // Returned exactly once, consuming the one signal.
        assert!(rx.try_recv().is_err());
        assert_eq!(value(&s), 0);
    }
}

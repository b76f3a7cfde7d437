use {
    super::{check_count, RawSemaphore, SemaphoreError, MAX_COUNT},
    std::sync::{Condvar, Mutex, MutexGuard, PoisonError},
};

/// Semaphore built from a mutex-guarded counter and a condition variable.
///
/// Used as the [`Semaphore`](super::Semaphore) backend on platforms without a
/// usable native counting semaphore, but available everywhere.
///
/// No FIFO guarantee: any waiting thread may be the one woken up.
#[derive(Debug)]
pub struct CondvarSemaphore {
    count: Mutex<u32>,
    condvar: Condvar,
}

impl CondvarSemaphore {
    // The counter is never left inconsistent by a panic, so poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, u32> {
        self.count.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl RawSemaphore for CondvarSemaphore {
    const NAME: &'static str = "generic";

    fn new(count: u32) -> Result<Self, SemaphoreError> {
        check_count(count)?;

        tracing::trace!(count, "created generic semaphore");

        Ok(CondvarSemaphore {
            count: Mutex::new(count),
            condvar: Condvar::new(),
        })
    }

    fn signal(&self) -> Result<(), SemaphoreError> {
        let mut count = self.lock();

        if *count >= MAX_COUNT {
            return Err(SemaphoreError::Overflow);
        }

        *count += 1;
        drop(count);

        self.condvar.notify_one();

        Ok(())
    }

    fn wait(&self) -> Result<(), SemaphoreError> {
        let mut count = self.lock();

        // Spurious wakeups.
        while *count == 0 {
            count = self
                .condvar
                .wait(count)
                .unwrap_or_else(PoisonError::into_inner);
        }

        *count -= 1;

        Ok(())
    }

    fn try_wait(&self) -> Result<bool, SemaphoreError> {
        let mut count = self.lock();

        if *count > 0 {
            *count -= 1;
            Ok(true)
        } else {
            Ok(false)
        }
    }
}

impl Drop for CondvarSemaphore {
    fn drop(&mut self) {
        tracing::trace!("destroyed generic semaphore");
    }
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        std::{
            sync::{
                atomic::{AtomicUsize, Ordering},
                Arc,
            },
            thread,
            time::{Duration, Instant},
        },
    };

    #[test]
    fn try_wait() {
        let s = CondvarSemaphore::new(1).unwrap();

        assert!(s.try_wait().unwrap());
        assert!(!s.try_wait().unwrap());
        assert_eq!(*s.lock(), 0);

        s.signal().unwrap();

        assert_eq!(*s.lock(), 1);
        assert!(s.try_wait().unwrap());
        assert_eq!(*s.lock(), 0);
    }

    #[test]
    fn overflow() {
        let s = CondvarSemaphore::new(MAX_COUNT).unwrap();

        s.signal().err().unwrap(); // Must have failed.
        assert_eq!(*s.lock(), MAX_COUNT);

        CondvarSemaphore::new(MAX_COUNT + 1).err().unwrap();
    }

    #[test]
    fn thread_signal() {
        let s = Arc::new(CondvarSemaphore::new(0).unwrap()); // Not signaled.
        let s_clone_1 = s.clone();
        let s_clone_2 = s.clone();

        let t_1 = thread::spawn(move || {
            let now = Instant::now();
            s_clone_1.wait().unwrap();
            now.elapsed()
        });

        let t_2 = thread::spawn(move || {
            let now = Instant::now();
            s_clone_2.wait().unwrap();
            now.elapsed()
        });

        thread::sleep(Duration::from_millis(500));

        s.signal().unwrap();

        // One of the threads has exited, the other is still waiting.

        thread::sleep(Duration::from_millis(500));

        s.signal().unwrap();

        // Now both have exited.

        let elapsed_1 = t_1.join().unwrap();
        let elapsed_2 = t_2.join().unwrap();

        assert!(elapsed_1.as_millis() >= 250);
        assert!(elapsed_2.as_millis() >= 250);

        let diff = if elapsed_1 > elapsed_2 {
            elapsed_1 - elapsed_2
        } else {
            elapsed_2 - elapsed_1
        };
        assert!(diff.as_millis() >= 250);

        assert!(!s.try_wait().unwrap());
    }

    #[test]
    fn releases_one_waiter_per_signal() {
        let s = Arc::new(CondvarSemaphore::new(0).unwrap());
        let woken = Arc::new(AtomicUsize::new(0));

        let threads: Vec<_> = (0..4)
            .map(|_| {
                let s = s.clone();
                let woken = woken.clone();
                thread::spawn(move || {
                    s.wait().unwrap();
                    woken.fetch_add(1, Ordering::SeqCst);
                })
            })
            .collect();

        s.signal().unwrap();
        s.signal().unwrap();

        let start = Instant::now();
        while woken.load(Ordering::SeqCst) < 2 && start.elapsed() < Duration::from_secs(10) {
            thread::sleep(Duration::from_millis(1));
        }

        thread::sleep(Duration::from_millis(100));
        assert_eq!(woken.load(Ordering::SeqCst), 2);

        s.signal().unwrap();
        s.signal().unwrap();

        for t in threads {
            t.join().unwrap();
        }

        assert_eq!(woken.load(Ordering::SeqCst), 4);
        assert_eq!(*s.lock(), 0);
    }
}

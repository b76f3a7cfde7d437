use {
    super::{check_count, RawSemaphore, SemaphoreError, MAX_COUNT},
    mach2::{
        clock_types::mach_timespec_t,
        kern_return::{kern_return_t, KERN_ABORTED, KERN_OPERATION_TIMED_OUT, KERN_SUCCESS},
        mach_types::semaphore_t,
        semaphore::{
            semaphore_create, semaphore_destroy, semaphore_signal, semaphore_timedwait,
            semaphore_wait,
        },
        sync_policy::SYNC_POLICY_FIFO,
        traps::mach_task_self,
    },
    std::{
        io,
        sync::atomic::{AtomicU32, Ordering},
    },
    tracing::error,
};

fn kern_error(call: &str, result: kern_return_t) -> io::Error {
    io::Error::new(
        io::ErrorKind::Other,
        format!("{} returned kern_return_t {}", call, result),
    )
}

/// Mach semaphore wrapper, woken up in FIFO order.
/// See `semaphore_create` in the XNU `osfmk/mach/semaphore.h`.
///
/// Mach semaphores have no maximum value, so the counter is mirrored to
/// report [`SemaphoreError::Overflow`] at [`MAX_COUNT`] like the other backends.
/// The mirror is incremented before the kernel counter and decremented after it,
/// so it is never below the kernel value.
///
/// Destroys the owned semaphore when dropped.
pub struct MachSemaphore {
    handle: semaphore_t,
    count: AtomicU32,
}

impl MachSemaphore {
    fn acquired(&self) {
        self.count.fetch_sub(1, Ordering::AcqRel);
    }
}

impl RawSemaphore for MachSemaphore {
    const NAME: &'static str = "mach";

    fn new(count: u32) -> Result<Self, SemaphoreError> {
        check_count(count)?;

        let mut handle: semaphore_t = 0;

        let result = unsafe {
            semaphore_create(
                mach_task_self(),
                &mut handle,
                SYNC_POLICY_FIFO,
                count as libc::c_int,
            )
        };

        if result != KERN_SUCCESS {
            let err = kern_error("semaphore_create", result);
            error!(count, %err, "semaphore_create failed");
            return Err(SemaphoreError::FailedToCreate(err));
        }

        tracing::trace!(count, "created mach semaphore");

        Ok(MachSemaphore {
            handle,
            count: AtomicU32::new(count),
        })
    }

    fn signal(&self) -> Result<(), SemaphoreError> {
        self.count
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |count| {
                if count < MAX_COUNT {
                    Some(count + 1)
                } else {
                    None
                }
            })
            .map_err(|_| SemaphoreError::Overflow)?;

        let result = unsafe { semaphore_signal(self.handle) };

        if result == KERN_SUCCESS {
            Ok(())
        } else {
            self.acquired();
            let err = kern_error("semaphore_signal", result);
            error!(%err, "semaphore_signal failed");
            Err(SemaphoreError::FailedToSignal(err))
        }
    }

    fn wait(&self) -> Result<(), SemaphoreError> {
        loop {
            let result = unsafe { semaphore_wait(self.handle) };

            match result {
                KERN_SUCCESS => {
                    self.acquired();
                    return Ok(());
                }
                // Interrupted.
                KERN_ABORTED => continue,
                _ => {
                    let err = kern_error("semaphore_wait", result);
                    error!(%err, "semaphore_wait failed");
                    return Err(SemaphoreError::FailedToWait(err));
                }
            }
        }
    }

    fn try_wait(&self) -> Result<bool, SemaphoreError> {
        let zero = mach_timespec_t {
            tv_sec: 0,
            tv_nsec: 0,
        };

        loop {
            let result = unsafe { semaphore_timedwait(self.handle, zero) };

            match result {
                KERN_SUCCESS => {
                    self.acquired();
                    return Ok(true);
                }
                KERN_OPERATION_TIMED_OUT => return Ok(false),
                KERN_ABORTED => continue,
                _ => {
                    let err = kern_error("semaphore_timedwait", result);
                    error!(%err, "semaphore_timedwait failed");
                    return Err(SemaphoreError::FailedToWait(err));
                }
            }
        }
    }
}

impl Drop for MachSemaphore {
    fn drop(&mut self) {
        let result = unsafe { semaphore_destroy(mach_task_self(), self.handle) };

        if result == KERN_SUCCESS {
            tracing::trace!("destroyed mach semaphore");
        } else {
            let err = kern_error("semaphore_destroy", result);
            error!(%err, "semaphore_destroy failed");
            debug_assert!(false, "semaphore_destroy failed: {}", err);
        }
    }
}

unsafe impl Send for MachSemaphore {}
unsafe impl Sync for MachSemaphore {}

use {
    super::{check_count, RawSemaphore, SemaphoreError, MAX_COUNT},
    std::{io, ptr},
    tracing::error,
    winapi::{
        shared::{
            minwindef::FALSE,
            winerror::{ERROR_TOO_MANY_POSTS, WAIT_TIMEOUT},
        },
        um::{
            handleapi::CloseHandle,
            synchapi::{ReleaseSemaphore, WaitForSingleObject},
            winbase::{CreateSemaphoreA, INFINITE, WAIT_OBJECT_0},
            winnt::HANDLE,
        },
    },
};

/// Unnamed semaphore wrapper.
/// See [`semaphore`](https://docs.microsoft.com/en-us/windows/win32/api/winbase/nf-winbase-createsemaphorea) on MSDN.
///
/// The internal counter may be incremented up to [`MAX_COUNT`].
///
/// Closes the owned OS semaphore handle when dropped.
pub struct Win32Semaphore {
    handle: HANDLE,
}

impl Win32Semaphore {
    fn wait_impl(&self, ms: u32) -> Result<bool, SemaphoreError> {
        let result = unsafe { WaitForSingleObject(self.handle, ms) };

        match result {
            WAIT_OBJECT_0 => Ok(true),
            WAIT_TIMEOUT => Ok(false),
            _ => {
                let err = io::Error::last_os_error();
                error!(%err, "WaitForSingleObject failed");
                Err(SemaphoreError::FailedToWait(err))
            }
        }
    }
}

impl RawSemaphore for Win32Semaphore {
    const NAME: &'static str = "win32";

    fn new(count: u32) -> Result<Self, SemaphoreError> {
        check_count(count)?;

        let handle = unsafe {
            CreateSemaphoreA(ptr::null_mut(), count as i32, MAX_COUNT as i32, ptr::null())
        };

        if handle.is_null() {
            let err = io::Error::last_os_error();
            error!(count, %err, "CreateSemaphoreA failed");
            Err(SemaphoreError::FailedToCreate(err))
        } else {
            tracing::trace!(count, "created win32 semaphore");
            Ok(Win32Semaphore { handle })
        }
    }

    fn signal(&self) -> Result<(), SemaphoreError> {
        let result = unsafe { ReleaseSemaphore(self.handle, 1, ptr::null_mut()) };

        if result != FALSE {
            return Ok(());
        }

        let err = io::Error::last_os_error();

        if err.raw_os_error() == Some(ERROR_TOO_MANY_POSTS as i32) {
            Err(SemaphoreError::Overflow)
        } else {
            error!(%err, "ReleaseSemaphore failed");
            Err(SemaphoreError::FailedToSignal(err))
        }
    }

    fn wait(&self) -> Result<(), SemaphoreError> {
        // An infinite wait only ever returns signaled or failed.
        self.wait_impl(INFINITE).map(|_| ())
    }

    fn try_wait(&self) -> Result<bool, SemaphoreError> {
        self.wait_impl(0)
    }
}

impl Drop for Win32Semaphore {
    fn drop(&mut self) {
        let result = unsafe { CloseHandle(self.handle) };

        if result != FALSE {
            tracing::trace!("destroyed win32 semaphore");
        } else {
            let err = io::Error::last_os_error();
            error!(%err, "CloseHandle failed");
            debug_assert!(false, "CloseHandle failed: {}", err);
        }
    }
}

unsafe impl Send for Win32Semaphore {}
unsafe impl Sync for Win32Semaphore {}

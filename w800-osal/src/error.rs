use w800_osal_api::{KernelError, KernelResult};

/// A result with the [`Error`] error.
pub type Result<T> = core::result::Result<T, Error>;

/// The single failure value reported to firmware callers.
///
/// Whatever went wrong underneath (allocation failure, invalid handle, full queue, timeout, kernel-internal error)
/// is collapsed into this value. The kernel's own code is logged at `debug` level when the collapse happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
#[error("operating system call failed")]
pub struct Error;

/// Two-valued status for C-style callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(i32)]
pub enum Status {
    /// The operation succeeded.
    Success = 0,
    /// The operation failed.
    Error = -1,
}

impl Status {
    /// Returns the raw status code.
    pub const fn as_raw(self) -> i32 {
        self as i32
    }

    /// Returns `true` for [`Status::Success`].
    pub const fn is_success(self) -> bool {
        matches!(self, Status::Success)
    }
}

impl<T> From<Result<T>> for Status {
    fn from(result: Result<T>) -> Self {
        match result {
            Ok(_) => Status::Success,
            Err(Error) => Status::Error,
        }
    }
}

/// Helper trait to collapse kernel results into osal results.
///
/// We cannot implement `From` as that would silently drop the kernel code without logging it.
pub(crate) trait IntoOsalError<T> {
    /// Converts the result, logging the kernel code of a failed `operation`.
    fn into_osal_error(self, operation: &'static str) -> Result<T>;
}

impl<T> IntoOsalError<T> for KernelResult<T> {
    fn into_osal_error(self, operation: &'static str) -> Result<T> {
        self.map_err(|error: KernelError| {
            tracing::debug!(operation, %error, "kernel call failed");
            Error
        })
    }
}

/// A result with the [`KernelError`] error.
pub type KernelResult<T> = core::result::Result<T, KernelError>;

/// The result codes a kernel binding may report.
///
/// These are the "rich" codes of the underlying kernel. The adapter collapses all of them into a single upstream
/// error, so bindings are free to pick whichever variant describes the failure best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, thiserror::Error)]
pub enum KernelError {
    /// The kernel could not allocate memory for the object.
    #[error("out of memory")]
    NoMemory,
    /// An argument was rejected, e.g. a zero sized queue or a too small control block.
    #[error("invalid argument")]
    InvalidArgument,
    /// The handle does not refer to a live kernel object.
    #[error("invalid handle")]
    InvalidHandle,
    /// The queue has no free slot left.
    #[error("queue full")]
    QueueFull,
    /// A finite wait elapsed before the event occurred.
    #[error("timed out")]
    Timeout,
    /// The object was deleted while the caller was waiting on it.
    #[error("object deleted")]
    Deleted,
    /// Any other kernel-internal failure.
    #[error("kernel internal error")]
    Internal,
}

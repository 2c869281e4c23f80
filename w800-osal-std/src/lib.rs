//! Std host binding of the W800 operating system abstraction layer.
//!
//! This provides the kernel, platform and memory primitives the adapter forwards to, using the std library, so
//! firmware code written against [`w800_osal::Osal`] can run and be tested on a development machine.

#![forbid(unsafe_code)]
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

use std::sync::LazyLock;

use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::{FromEnvError, LevelFilter};
use w800_osal::{Osal, OsalConfig};

mod clock;
pub mod kernel;
pub mod log;
pub mod memory;
pub mod platform;
pub mod sync;
pub mod task;
pub mod timer;

pub use kernel::{StdKernel, StdKernelConfig};
pub use memory::HeapAllocator;
pub use platform::StdPlatform;
pub use sync::{StdQueue, StdSemaphore};
pub use task::StdTask;
pub use timer::StdTimer;

/// The adapter running on the host binding.
pub type StdOsal = Osal<StdKernel, StdPlatform>;

/// Returns the process-wide adapter, created with the default configuration on first use.
///
/// It lives until the process exits.
pub fn osal() -> &'static StdOsal {
    static OSAL: LazyLock<StdOsal> = LazyLock::new(|| {
        Osal::new(
            StdKernel::default(),
            StdPlatform::default(),
            HeapAllocator::shared(),
            OsalConfig::default(),
        )
        .expect("the default configuration has distinct well-known priorities")
    });

    &OSAL
}

/// Errors installing the tracing subscriber.
#[derive(Debug, thiserror::Error)]
pub enum InitTracingError {
    /// `W800_OSAL_LOG` holds an invalid filter.
    #[error("invalid log filter")]
    Filter(#[from] FromEnvError),
    /// Another global subscriber is already installed.
    #[error("a global subscriber is already installed")]
    AlreadyInstalled(#[from] tracing::subscriber::SetGlobalDefaultError),
}

/// Installs a compact `fmt` subscriber on stderr, filtered by `W800_OSAL_LOG` (default `info`).
pub fn init_tracing() -> Result<(), InitTracingError> {
    tracing::subscriber::set_global_default(
        tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::builder()
                    .with_default_directive(LevelFilter::INFO.into())
                    .with_env_var("W800_OSAL_LOG")
                    .from_env()?,
            )
            .with_writer(std::io::stderr)
            .compact()
            .finish(),
    )?;
    Ok(())
}

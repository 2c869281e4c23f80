//! Diagnostic print sink.

use std::io::Write;

pub use w800_osal_api::log::LogTarget;

/// Implements the [`LogTarget`] trait by printing to standard output.
#[derive(Debug)]
pub struct Log;

impl LogTarget for Log {
    fn init() {
        // noöp
    }

    /// Prints to [`std::io::stdout`] and flushes, the process may abort right after.
    fn println(args: core::fmt::Arguments<'_>) {
        let mut stdout = std::io::stdout().lock();
        // this is a logger, ignore any errors writing
        let _ = std::writeln!(stdout, "{args}");
        let _ = stdout.flush();
    }
}

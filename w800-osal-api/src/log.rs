//! Traits for outputting diagnostic strings.

/// `LogTarget` is the unformatted platform print sink.
///
/// It is used for diagnostics that must reach the console even when no structured logging is set up, most notably
/// right before the platform is deliberately halted.
pub trait LogTarget: Send + Sync + 'static {
    /// Initializes global state necessary for this type.
    fn init();

    /// Outputs a line of text through this log target.
    fn println(args: core::fmt::Arguments<'_>);
}

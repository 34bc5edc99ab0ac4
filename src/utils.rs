//! utils — small shared helpers: label formatting and logger construction.
//!
//! Logging follows the `slog` model: every options struct carries a
//! [`slog::Logger`] that defaults to [`discard_logger`]. With the `obs_slog`
//! feature, [`terminal_logger`] builds a non-blocking terminal drain.
use slog::{Discard, Logger, o};

/// Format a number for contrast labels and group keys.
///
/// Integral values print without a fractional part (`1`, `-3`), everything
/// else uses the shortest round-trip representation (`0.5`, `1e-4` prints as
/// `0.0001`).
pub fn format_number(x: f64) -> String {
    if x.is_finite() && x.fract() == 0.0 && x.abs() < 1e15 {
        format!("{}", x as i64)
    } else {
        format!("{x}")
    }
}

/// Root logger that drops every record.
pub fn discard_logger() -> Logger {
    Logger::root(Discard, o!())
}

/// Root logger writing compact records to stderr through an async drain.
#[cfg(feature = "obs_slog")]
pub fn terminal_logger() -> Logger {
    use slog::Drain;
    let decorator = slog_term::TermDecorator::new().stderr().build();
    let drain = slog_term::CompactFormat::new(decorator).build().fuse();
    let drain = slog_async::Async::new(drain).build().fuse();
    Logger::root(drain, o!("crate" => "marginal_effects"))
}

//! Log output for every herald crate
//!
//! Events are written through the macros below so each one sits inside a
//! span naming the direction of the traffic it describes: `incoming` for
//! messages read from monitored chats, `outgoing` for copies, forwards and
//! notices sent to destinations, and `internal` for the relay's own
//! bookkeeping (queue, worker, controller).

use tracing::{Metadata, metadata::LevelFilter};
use tracing_subscriber::{
    Layer,
    filter::FilterFn,
    fmt::{self, time::ChronoUtc},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};

const LOG_LEVEL_ENV: &str = "LOG_LEVEL";

/// Emit an event at `$level` inside a span called `$span`
#[macro_export]
macro_rules! log {
    ($level:expr, $span:expr, $($msg:expr),*) => {
        $crate::tracing::span!($level, $span)
            .in_scope(|| $crate::tracing::event!($level, $($msg),*))
    };
}

/// Traffic leaving the relay, e.g. a copy sent to a destination chat
#[macro_export]
macro_rules! outgoing {
    (level = $level:ident, $($msg:expr),*) => {
        $crate::log!($crate::tracing::Level::$level, "outgoing", $($msg),*)
    };

    ($($msg:expr),*) => {
        $crate::outgoing!(level = TRACE, $($msg),*)
    };
}

/// Traffic arriving at the relay from a monitored chat
#[macro_export]
macro_rules! incoming {
    (level = $level:ident, $($msg:expr),*) => {
        $crate::log!($crate::tracing::Level::$level, "incoming", $($msg),*)
    };

    ($($msg:expr),*) => {
        $crate::incoming!(level = TRACE, $($msg),*)
    };
}

/// Relay bookkeeping: queue changes, worker passes, reloads and shutdown.
/// Defaults to `TRACE`.
#[macro_export]
macro_rules! internal {
    (level = $level:ident, $($msg:expr),*) => {
        $crate::log!($crate::tracing::Level::$level, "internal", $($msg),*)
    };

    ($($msg:expr),*) => {
        $crate::internal!(level = TRACE, $($msg),*)
    };
}

const fn default_level() -> LevelFilter {
    if cfg!(debug_assertions) {
        LevelFilter::TRACE
    } else {
        LevelFilter::INFO
    }
}

/// `LOG_LEVEL` if it names a level, otherwise `default`
fn level_from_env(default: LevelFilter) -> LevelFilter {
    match std::env::var(LOG_LEVEL_ENV) {
        Ok(level) => level.parse().unwrap_or_else(|_| {
            eprintln!("Ignoring {LOG_LEVEL_ENV}={level}, using {default}");
            default
        }),
        Err(_) => default,
    }
}

fn is_herald_target(metadata: &Metadata<'_>) -> bool {
    metadata.target().starts_with("herald")
}

/// Install the global subscriber: compact lines with RFC 3339 UTC
/// timestamps, limited to events from the herald crates.
///
/// The level comes from `LOG_LEVEL` and defaults to `TRACE` in debug builds
/// and `INFO` in release builds.
pub fn init() {
    let level = level_from_env(default_level());

    let output = fmt::layer()
        .compact()
        .with_ansi(true)
        .with_file(false)
        .with_line_number(false)
        .with_timer(ChronoUtc::rfc_3339())
        .with_filter(level)
        .with_filter(FilterFn::new(is_herald_target));

    tracing_subscriber::registry().with(output).init();
}

// Process-wide log level control for library diagnostics
use std::sync::atomic::{AtomicU8, Ordering};

pub const LEVEL_ERROR: u8 = 0;
pub const LEVEL_INFO: u8 = 1;
pub const LEVEL_DEBUG: u8 = 2;
pub const LEVEL_TRACE: u8 = 3;

static LOG_LEVEL: AtomicU8 = AtomicU8::new(LEVEL_INFO);

pub fn set_log_level(level: u8) {
    LOG_LEVEL.store(level.min(LEVEL_TRACE), Ordering::Relaxed);
}

pub fn log_level() -> u8 {
    LOG_LEVEL.load(Ordering::Relaxed)
}

// Level-gated logging macros, usable anywhere in the crate
#[macro_export]
macro_rules! log_at {
    ($level:expr, $tag:expr, $($arg:tt)*) => {
        if $crate::logging::log_level() >= $level {
            eprintln!("[{}] {}", $tag, format!($($arg)*));
        }
    };
}

/// Always emitted, regardless of the configured level.
#[macro_export]
macro_rules! log_error {
    ($($arg:tt)*) => { $crate::log_at!($crate::logging::LEVEL_ERROR, "ERROR", $($arg)*); };
}

#[macro_export]
macro_rules! log_info {
    ($($arg:tt)*) => { $crate::log_at!($crate::logging::LEVEL_INFO, "INFO", $($arg)*); };
}

#[macro_export]
macro_rules! log_debug {
    ($($arg:tt)*) => { $crate::log_at!($crate::logging::LEVEL_DEBUG, "DEBUG", $($arg)*); };
}

/// Per-request detail; one line per outbound call.
#[macro_export]
macro_rules! log_trace {
    ($($arg:tt)*) => { $crate::log_at!($crate::logging::LEVEL_TRACE, "TRACE", $($arg)*); };
}

#![deny(missing_docs)]
//! Shared logging utilities for the harvester workspace.
//!
//! This crate provides the `engine_*` logging macros used across the codebase,
//! a per-thread session label that prefixes every line, and a minimal test
//! initializer for the global logger.

use std::cell::RefCell;

#[doc(hidden)]
pub use log;

thread_local! {
    /// Label of the extraction session running on the current thread.
    static SESSION_LABEL: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Tags every subsequent log line on this thread with `[label]`.
///
/// Sessions run sequentially on one thread, so the label stays accurate for
/// the whole walk.
pub fn set_session_label(label: impl Into<String>) {
    let label = label.into();
    SESSION_LABEL.with(|v| *v.borrow_mut() = Some(label));
}

/// Removes the session label for the current thread.
pub fn clear_session_label() {
    SESSION_LABEL.with(|v| *v.borrow_mut() = None);
}

/// Returns the session label for the current thread, if any.
pub fn session_label() -> Option<String> {
    SESSION_LABEL.with(|v| v.borrow().clone())
}

/// Prefix inserted in front of every message by the `engine_*` macros.
#[doc(hidden)]
pub fn label_prefix() -> String {
    SESSION_LABEL.with(|v| match v.borrow().as_deref() {
        Some(label) => format!("[{label}] "),
        None => String::new(),
    })
}

/// Logs a trace-level message using the global logging facade.
#[macro_export]
macro_rules! engine_trace {
    ($($arg:tt)*) => {{
        $crate::log::trace!("{}{}", $crate::label_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an info-level message using the global logging facade.
#[macro_export]
macro_rules! engine_info {
    ($($arg:tt)*) => {{
        $crate::log::info!("{}{}", $crate::label_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a debug-level message using the global logging facade.
#[macro_export]
macro_rules! engine_debug {
    ($($arg:tt)*) => {{
        $crate::log::debug!("{}{}", $crate::label_prefix(), format_args!($($arg)*));
    }};
}

/// Logs a warn-level message using the global logging facade.
#[macro_export]
macro_rules! engine_warn {
    ($($arg:tt)*) => {{
        $crate::log::warn!("{}{}", $crate::label_prefix(), format_args!($($arg)*));
    }};
}

/// Logs an error-level message using the global logging facade.
#[macro_export]
macro_rules! engine_error {
    ($($arg:tt)*) => {{
        $crate::log::error!("{}{}", $crate::label_prefix(), format_args!($($arg)*));
    }};
}

/// Initializes a simple terminal logger for use in tests.
///
/// This safely no-ops if another logger has already been initialized.
pub fn initialize_for_tests() {
    use simplelog::{ColorChoice, CombinedLogger, Config, TermLogger, TerminalMode};

    // Use debug level in debug builds, info in release builds.
    let level = if cfg!(debug_assertions) {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    // Ignore the error if a logger was already set by another test.
    let _ = CombinedLogger::init(vec![TermLogger::new(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )]);
}

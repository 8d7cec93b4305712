//! Log forwarding for FFI hosts
//!
//! Diagnostics inside the library go through the `log` facade. Rust callers
//! install whatever logger they like; C callers register a callback with
//! `rocketchat_set_log_callback` and get every record forwarded to it.

use std::ffi::CString;
use std::os::raw::{c_char, c_void};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::RwLock;

/// Log levels for callbacks
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogLevel {
    Debug = 0,
    Info = 1,
    Warning = 2,
    Error = 3,
}

impl From<log::Level> for LogLevel {
    fn from(level: log::Level) -> Self {
        match level {
            log::Level::Error => LogLevel::Error,
            log::Level::Warn => LogLevel::Warning,
            log::Level::Info => LogLevel::Info,
            log::Level::Debug | log::Level::Trace => LogLevel::Debug,
        }
    }
}

/// Callback function type for logging
/// Parameters: level, message, user_data
pub type LogCallback = extern "C" fn(LogLevel, *const c_char, *mut c_void);

struct Sink {
    callback: LogCallback,
    user_data: *mut c_void,
}

// The host owns user_data and promises it is usable from any thread.
unsafe impl Send for Sink {}
unsafe impl Sync for Sink {}

lazy_static::lazy_static! {
    static ref SINK: RwLock<Option<Sink>> = RwLock::new(None);
}

/// `log::Log` implementation that forwards to the registered callback
pub struct CallbackLogger;

static LOGGER: CallbackLogger = CallbackLogger;

/// Set once `LOGGER` has become the process-wide `log` implementation
static INSTALLED: AtomicBool = AtomicBool::new(false);

impl log::Log for CallbackLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        SINK.read().map(|sink| sink.is_some()).unwrap_or(false)
    }

    fn log(&self, record: &log::Record) {
        let Ok(sink) = SINK.read() else {
            return;
        };
        if let Some(sink) = sink.as_ref() {
            let message = format!("[{}] {}", record.target(), record.args());
            if let Ok(c_string) = CString::new(message) {
                (sink.callback)(record.level().into(), c_string.as_ptr(), sink.user_data);
            }
        }
    }

    fn flush(&self) {}
}

/// Register `callback` and install the forwarding logger.
///
/// Every registration applies `max_level`. If the host process already
/// installed another `log` implementation, that one keeps receiving records
/// and its level is left alone; the callback is only stored.
pub fn set_callback(callback: LogCallback, user_data: *mut c_void, max_level: log::LevelFilter) {
    if let Ok(mut sink) = SINK.write() {
        *sink = Some(Sink { callback, user_data });
    }
    if log::set_logger(&LOGGER).is_ok() {
        INSTALLED.store(true, Ordering::SeqCst);
    }
    if INSTALLED.load(Ordering::SeqCst) {
        log::set_max_level(max_level);
    }
}

/// Remove the registered callback
pub fn clear_callback() {
    if let Ok(mut sink) = SINK.write() {
        *sink = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use log::Log;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Mutex;

    static WARNINGS: AtomicUsize = AtomicUsize::new(0);

    // the sink and the max level are process-wide
    static SERIAL: Mutex<()> = Mutex::new(());

    extern "C" fn counting_callback(level: LogLevel, message: *const c_char, _user_data: *mut c_void) {
        if level == LogLevel::Warning && !message.is_null() {
            WARNINGS.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(LogLevel::from(log::Level::Trace), LogLevel::Debug);
        assert_eq!(LogLevel::from(log::Level::Warn), LogLevel::Warning);
        assert_eq!(LogLevel::from(log::Level::Error), LogLevel::Error);
    }

    #[test]
    fn test_callback_receives_records() {
        let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        set_callback(counting_callback, std::ptr::null_mut(), log::LevelFilter::Debug);
        let before = WARNINGS.load(Ordering::SeqCst);

        CallbackLogger.log(
            &log::Record::builder()
                .level(log::Level::Warn)
                .target("rocketchat::test")
                .args(format_args!("attachment dropped"))
                .build(),
        );
        assert!(WARNINGS.load(Ordering::SeqCst) > before);

        clear_callback();
        assert!(!CallbackLogger.enabled(&log::Metadata::builder().build()));
    }

    #[test]
    fn test_reregistration_updates_max_level() {
        let _guard = SERIAL.lock().unwrap_or_else(|e| e.into_inner());
        set_callback(counting_callback, std::ptr::null_mut(), log::LevelFilter::Error);
        assert_eq!(log::max_level(), log::LevelFilter::Error);

        set_callback(counting_callback, std::ptr::null_mut(), log::LevelFilter::Debug);
        assert_eq!(log::max_level(), log::LevelFilter::Debug);
        assert!(CallbackLogger.enabled(&log::Metadata::builder().build()));

        clear_callback();
    }
}

use std::{sync::Arc, sync::OnceLock};

/// Receives every log record emitted by tally.
///
/// Implemented by the host so that engine diagnostics (migration progress, degraded
/// legacy data, ignored identity changes) end up in the app's own log pipeline.
///
/// ```rust
/// use tally::primitives::logger::{LogLevel, Logger};
///
/// struct StdoutLogger;
///
/// impl Logger for StdoutLogger {
///     fn log(&self, level: LogLevel, message: String) {
///         println!("[{level:?}] {message}");
///     }
/// }
/// ```
///
/// ## kotlin
///
/// ```kotlin
/// object TallyLogBridge : Logger {
///     override fun log(level: LogLevel, message: String) {
///         Log.println(level.toAndroidPriority(), "Tally", message)
///     }
/// }
///
/// setLogger(TallyLogBridge) // once, before TallyClient.start
/// ```
#[uniffi::export(with_foreign)]
pub trait Logger: Sync + Send {
    /// Logs a message at the specified log level.
    fn log(&self, level: LogLevel, message: String);
}

/// Severity of a forwarded log record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, uniffi::Enum)]
pub enum LogLevel {
    /// Very detailed tracing output.
    Trace,
    /// Debugging information.
    Debug,
    /// Progress of migrations and identity changes.
    Info,
    /// Degraded or ignored input that did not stop the operation.
    Warn,
    /// Rejected input or store failures.
    Error,
}

/// `log::Log` implementation forwarding to the host [`Logger`].
struct ForeignLogger;

impl log::Log for ForeignLogger {
    fn enabled(&self, _metadata: &log::Metadata) -> bool {
        true
    }

    fn log(&self, record: &log::Record) {
        if !should_forward(record.level(), record.module_path()) {
            return;
        }

        if let Some(logger) = LOGGER_INSTANCE.get() {
            logger.log(log_level(record.level()), format!("{}", record.args()));
        } else {
            eprintln!("Logger not set: {}", record.args());
        }
    }

    fn flush(&self) {}
}

/// Debug and trace records from other crates are noise for the host.
fn should_forward(level: log::Level, module_path: Option<&str>) -> bool {
    let is_from_tally = module_path.is_some_and(|path| path.starts_with("tally"));
    let is_verbose = matches!(level, log::Level::Debug | log::Level::Trace);
    is_from_tally || !is_verbose
}

const fn log_level(level: log::Level) -> LogLevel {
    match level {
        log::Level::Error => LogLevel::Error,
        log::Level::Warn => LogLevel::Warn,
        log::Level::Info => LogLevel::Info,
        log::Level::Debug => LogLevel::Debug,
        log::Level::Trace => LogLevel::Trace,
    }
}

static LOGGER_INSTANCE: OnceLock<Arc<dyn Logger>> = OnceLock::new();
static FOREIGN_LOGGER: ForeignLogger = ForeignLogger;

/// Installs the host logger. Only the first call has an effect.
#[allow(clippy::module_name_repetitions)]
#[uniffi::export]
pub fn set_logger(logger: Arc<dyn Logger>) {
    if LOGGER_INSTANCE.set(logger).is_err() {
        println!("Logger already set");
        return;
    }

    if let Err(e) = log::set_logger(&FOREIGN_LOGGER) {
        eprintln!("Failed to install tally logger: {e}");
        return;
    }
    log::set_max_level(log::LevelFilter::Trace);
}

/// Logs a trace-level message with automatic context prefixing
#[macro_export]
macro_rules! trace {
    ($($arg:tt)*) => {
        if let Some(ctx) = $crate::primitives::logger::get_context() {
            log::trace!("{} {}", ctx, format_args!($($arg)*))
        } else {
            log::trace!($($arg)*)
        }
    };
}

/// Logs a debug-level message with automatic context prefixing
#[macro_export]
macro_rules! debug {
    ($($arg:tt)*) => {
        if let Some(ctx) = $crate::primitives::logger::get_context() {
            log::debug!("{} {}", ctx, format_args!($($arg)*))
        } else {
            log::debug!($($arg)*)
        }
    };
}

/// Logs an info-level message with automatic context prefixing
#[macro_export]
macro_rules! info {
    ($($arg:tt)*) => {
        if let Some(ctx) = $crate::primitives::logger::get_context() {
            log::info!("{} {}", ctx, format_args!($($arg)*))
        } else {
            log::info!($($arg)*)
        }
    };
}

/// Logs a warning-level message with automatic context prefixing
#[macro_export]
macro_rules! warn {
    ($($arg:tt)*) => {
        if let Some(ctx) = $crate::primitives::logger::get_context() {
            log::warn!("{} {}", ctx, format_args!($($arg)*))
        } else {
            log::warn!($($arg)*)
        }
    };
}

/// Logs an error-level message with automatic context prefixing
#[macro_export]
macro_rules! error {
    ($($arg:tt)*) => {
        if let Some(ctx) = $crate::primitives::logger::get_context() {
            log::error!("{} {}", ctx, format_args!($($arg)*))
        } else {
            log::error!($($arg)*)
        }
    };
}

/// Scoped logging context.
pub mod context;
pub use context::{get_context, LogContext};

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::sync::Mutex;

    struct CapturingLogger {
        records: Mutex<Vec<(LogLevel, String)>>,
    }

    impl Logger for CapturingLogger {
        fn log(&self, level: LogLevel, message: String) {
            self.records.lock().unwrap().push((level, message));
        }
    }

    /// The host logger shared by every test in this binary; installed on first use.
    fn capturing_logger() -> &'static Arc<CapturingLogger> {
        static CAPTURING: OnceLock<Arc<CapturingLogger>> = OnceLock::new();
        CAPTURING.get_or_init(|| {
            let logger = Arc::new(CapturingLogger {
                records: Mutex::new(Vec::new()),
            });
            set_logger(logger.clone());
            logger
        })
    }

    #[test]
    fn test_verbose_records_from_other_crates_are_dropped() {
        assert!(!should_forward(log::Level::Debug, Some("serde_json::de")));
        assert!(!should_forward(log::Level::Trace, None));
        assert!(should_forward(log::Level::Debug, Some("tally::migration")));
        assert!(should_forward(log::Level::Warn, Some("serde_json::de")));
    }

    #[test]
    fn test_level_mapping() {
        assert_eq!(log_level(log::Level::Warn), LogLevel::Warn);
        assert_eq!(log_level(log::Level::Trace), LogLevel::Trace);
    }

    #[test]
    #[serial]
    fn test_context_prefix_reaches_host_logger() {
        let logger = capturing_logger();
        logger.records.lock().unwrap().clear();

        {
            let _ctx = LogContext::new("MigrationController");
            crate::info!("migration_run.started from=0");
        }

        let records = logger.records.lock().unwrap();
        assert!(records.iter().any(|(level, message)| {
            *level == LogLevel::Info
                && message == "[MigrationController] migration_run.started from=0"
        }));
    }

    #[test]
    #[serial]
    fn test_second_logger_is_ignored() {
        let logger = capturing_logger();
        logger.records.lock().unwrap().clear();

        let late = Arc::new(CapturingLogger {
            records: Mutex::new(Vec::new()),
        });
        set_logger(late.clone());
        crate::warn!("logger.second_install_check");

        assert!(late.records.lock().unwrap().is_empty());
        assert!(logger
            .records
            .lock()
            .unwrap()
            .iter()
            .any(|(_, message)| message == "logger.second_install_check"));
    }
}

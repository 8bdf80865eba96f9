use std::cell::RefCell;

thread_local! {
    static LOG_CONTEXT: RefCell<Option<String>> = const { RefCell::new(None) };
}

/// Scope guard that prefixes log lines with `[module]` until dropped.
///
/// ```rust
/// use tally::primitives::logger::{get_context, LogContext};
///
/// {
///     let _ctx = LogContext::new("DeviceIdController");
///     assert_eq!(get_context().as_deref(), Some("[DeviceIdController]"));
/// }
/// assert_eq!(get_context(), None);
/// ```
pub struct LogContext {
    previous: Option<String>,
}

impl LogContext {
    /// Opens a context; nested contexts restore the outer one on drop.
    #[must_use]
    pub fn new(module: &str) -> Self {
        let previous = LOG_CONTEXT.with(|ctx| ctx.borrow_mut().replace(format!("[{module}]")));
        Self { previous }
    }
}

impl Drop for LogContext {
    fn drop(&mut self) {
        LOG_CONTEXT.with(|ctx| {
            (*ctx.borrow_mut()).clone_from(&self.previous);
        });
    }
}

/// Gets the current logging context, if any.
#[must_use]
pub fn get_context() -> Option<String> {
    LOG_CONTEXT.with(|ctx| ctx.borrow().clone())
}

/// Runs a block inside a logging context.
///
/// ```rust
/// use tally::with_log_context;
///
/// let steps = with_log_context!("MigrationController" => {
///     tally::primitives::logger::get_context()
/// });
/// assert_eq!(steps.as_deref(), Some("[MigrationController]"));
/// ```
#[macro_export]
macro_rules! with_log_context {
    ($module:expr => $block:block) => {{
        let _ctx = $crate::primitives::logger::LogContext::new($module);
        $block
    }};
}

/// Opens a logging context for the rest of the current scope.
#[macro_export]
macro_rules! set_log_context {
    ($module:expr) => {
        $crate::primitives::logger::LogContext::new($module)
    };
}

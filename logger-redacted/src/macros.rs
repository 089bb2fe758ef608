// Logging macros

/// Log a change-event record at `debug` with PHI masked
#[macro_export]
macro_rules! redacted_debug {
    ($redactor:expr, $record:expr, $($arg:tt)*) => {
        tracing::debug!(record = %$redactor.redact_record($record), $($arg)*)
    };
}

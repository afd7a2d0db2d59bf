use log::Level;

/// Logging of errors that are handled by dropping them.
pub trait ResultExt<T> {
    /// Log the error at `error` level and discard it.
    fn log_error(self, what: &str) -> Option<T>;

    /// Log the error at `warn` level and discard it.
    fn log_warn(self, what: &str) -> Option<T>;
}

impl<T, E: std::fmt::Debug> ResultExt<T> for Result<T, E> {
    fn log_error(self, what: &str) -> Option<T> {
        log_at(Level::Error, self, what)
    }

    fn log_warn(self, what: &str) -> Option<T> {
        log_at(Level::Warn, self, what)
    }
}

fn log_at<T, E: std::fmt::Debug>(
    level: Level,
    result: Result<T, E>,
    what: &str,
) -> Option<T> {
    result.map_err(|e| log::log!(level, "{what}: {e:?}")).ok()
}

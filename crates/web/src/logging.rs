//! Installs the process-wide `tracing` subscriber.

use tracing::Level;
use tracing_subscriber::FmtSubscriber;

/// How much the server logs. Ordered from silent to most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub enum LogLevel {
    Disabled,
    Error,
    Warning,
    #[default]
    Info,
    Debug,
}

impl LogLevel {
    /// The most verbose `tracing` level to record, `None` when disabled.
    pub fn max_level(self) -> Option<Level> {
        match self {
            Self::Disabled => None,
            Self::Error => Some(Level::ERROR),
            Self::Warning => Some(Level::WARN),
            Self::Info => Some(Level::INFO),
            Self::Debug => Some(Level::DEBUG),
        }
    }
}

/// Installs a fmt subscriber for `level` as the global default.
///
/// Returns whether it was installed: nothing happens when logging is disabled
/// or when the application already set a global subscriber.
pub fn init(level: LogLevel) -> bool {
    let Some(max_level) = level.max_level() else {
        return false;
    };

    let subscriber = FmtSubscriber::builder().with_max_level(max_level).finish();
    tracing::subscriber::set_global_default(subscriber).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_levels() {
        assert_eq!(LogLevel::default(), LogLevel::Info);
        assert_eq!(LogLevel::Warning.max_level(), Some(Level::WARN));
        assert!(LogLevel::Disabled < LogLevel::Error);
        assert!(LogLevel::Debug > LogLevel::Info);
    }

    #[test]
    fn test_init() {
        assert!(!init(LogLevel::Disabled));
        // a second global subscriber is refused without panicking
        init(LogLevel::Debug);
        assert!(!init(LogLevel::Info));
    }
}

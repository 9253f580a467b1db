//! User-facing diagnostics.
//!
//! The configured level is mapped to a [`log::Level`] once, when options are
//! set, instead of being re-resolved for every message.

use std::fmt;
use std::str::FromStr;

/// Target used for every record emitted by the engine.
pub const LOG_TARGET: &str = "lazyimg";

/// Level at which diagnostics are reported.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LogLevel {
    #[default]
    Error,
    Warn,
    Info,
    Debug,
}

impl LogLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Error => "error",
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
        }
    }

    pub fn to_level(self) -> log::Level {
        match self {
            LogLevel::Error => log::Level::Error,
            LogLevel::Warn => log::Level::Warn,
            LogLevel::Info => log::Level::Info,
            LogLevel::Debug => log::Level::Debug,
        }
    }
}

impl fmt::Display for LogLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ParseLogLevelError(String);

impl fmt::Display for ParseLogLevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown log level {:?}", self.0)
    }
}

impl std::error::Error for ParseLogLevelError {}

impl FromStr for LogLevel {
    type Err = ParseLogLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "error" => Ok(LogLevel::Error),
            "warn" => Ok(LogLevel::Warn),
            "info" => Ok(LogLevel::Info),
            "debug" => Ok(LogLevel::Debug),
            other => Err(ParseLogLevelError(other.to_string())),
        }
    }
}

/// Resolved diagnostic sink: `None` when diagnostics are disabled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct DiagnosticSink {
    level: Option<log::Level>,
}

impl DiagnosticSink {
    pub(crate) fn resolve(enabled: bool, level: LogLevel) -> Self {
        Self {
            level: enabled.then(|| level.to_level()),
        }
    }

    pub(crate) fn emit(&self, args: fmt::Arguments<'_>) {
        if let Some(level) = self.level {
            log::log!(target: LOG_TARGET, level, "{}", args);
        }
    }

    #[cfg(test)]
    fn level(&self) -> Option<log::Level> {
        self.level
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_levels() {
        assert_eq!("error".parse::<LogLevel>(), Ok(LogLevel::Error));
        assert_eq!("warn".parse::<LogLevel>(), Ok(LogLevel::Warn));
        assert_eq!("info".parse::<LogLevel>(), Ok(LogLevel::Info));
        assert_eq!("debug".parse::<LogLevel>(), Ok(LogLevel::Debug));
        assert!("verbose".parse::<LogLevel>().is_err());
    }

    #[test]
    fn sink_is_resolved_once_from_options() {
        assert_eq!(DiagnosticSink::resolve(false, LogLevel::Warn).level(), None);
        assert_eq!(
            DiagnosticSink::resolve(true, LogLevel::Warn).level(),
            Some(log::Level::Warn)
        );
    }
}

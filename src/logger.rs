//! Logging capability handed to the sensor layer
//!
//! The sensor code never logs through a global; it gets a `Logger` at
//! construction. `NullLogger` keeps it silent (tests, `--once`),
//! `TracingLogger` forwards into the process-wide `tracing` subscriber.

pub trait Logger {
    fn trace(&self, message: &str);
    fn debug(&self, message: &str);
    fn info(&self, message: &str);
    fn warn(&self, message: &str);
    fn error(&self, message: &str);
    fn critical(&self, message: &str);
}

/// Discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullLogger;

impl Logger for NullLogger {
    fn trace(&self, _message: &str) {}
    fn debug(&self, _message: &str) {}
    fn info(&self, _message: &str) {}
    fn warn(&self, _message: &str) {}
    fn error(&self, _message: &str) {}
    fn critical(&self, _message: &str) {}
}

#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn trace(&self, message: &str) {
        tracing::trace!("{}", message);
    }

    fn debug(&self, message: &str) {
        tracing::debug!("{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!("{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!("{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!("{}", message);
    }

    // tracing has no level above ERROR
    fn critical(&self, message: &str) {
        tracing::error!(critical = true, "{}", message);
    }
}

impl<L: Logger + ?Sized> Logger for &L {
    fn trace(&self, message: &str) {
        (**self).trace(message)
    }
    fn debug(&self, message: &str) {
        (**self).debug(message)
    }
    fn info(&self, message: &str) {
        (**self).info(message)
    }
    fn warn(&self, message: &str) {
        (**self).warn(message)
    }
    fn error(&self, message: &str) {
        (**self).error(message)
    }
    fn critical(&self, message: &str) {
        (**self).critical(message)
    }
}

#[cfg(test)]
pub mod recording {
    use super::Logger;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub enum Level {
        Trace,
        Debug,
        Info,
        Warn,
        Error,
        Critical,
    }

    /// Keeps every message; clones share the same record
    #[derive(Debug, Clone, Default)]
    pub struct RecordingLogger {
        records: Arc<Mutex<Vec<(Level, String)>>>,
    }

    impl RecordingLogger {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn count(&self, level: Level) -> usize {
            self.records
                .lock()
                .unwrap()
                .iter()
                .filter(|(l, _)| *l == level)
                .count()
        }

        pub fn messages(&self, level: Level) -> Vec<String> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .filter(|(l, _)| *l == level)
                .map(|(_, m)| m.clone())
                .collect()
        }

        /// Every message in the order it was logged
        pub fn lines(&self) -> Vec<String> {
            self.records
                .lock()
                .unwrap()
                .iter()
                .map(|(_, m)| m.clone())
                .collect()
        }

        fn push(&self, level: Level, message: &str) {
            self.records.lock().unwrap().push((level, message.to_string()));
        }
    }

    impl Logger for RecordingLogger {
        fn trace(&self, message: &str) {
            self.push(Level::Trace, message)
        }
        fn debug(&self, message: &str) {
            self.push(Level::Debug, message)
        }
        fn info(&self, message: &str) {
            self.push(Level::Info, message)
        }
        fn warn(&self, message: &str) {
            self.push(Level::Warn, message)
        }
        fn error(&self, message: &str) {
            self.push(Level::Error, message)
        }
        fn critical(&self, message: &str) {
            self.push(Level::Critical, message)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::recording::{Level, RecordingLogger};
    use super::*;

    fn log_all(logger: &impl Logger) {
        logger.trace("t");
        logger.debug("d");
        logger.info("i");
        logger.warn("w");
        logger.error("e");
        logger.critical("c");
    }

    #[test]
    fn test_null_logger_accepts_every_level() {
        log_all(&NullLogger);
    }

    #[test]
    fn test_reference_forwards_to_inner_logger() {
        let logger = RecordingLogger::new();
        log_all(&&logger);
        for level in [
            Level::Trace,
            Level::Debug,
            Level::Info,
            Level::Warn,
            Level::Error,
            Level::Critical,
        ] {
            assert_eq!(logger.count(level), 1);
        }
        assert_eq!(logger.messages(Level::Warn), vec!["w".to_string()]);
    }
}

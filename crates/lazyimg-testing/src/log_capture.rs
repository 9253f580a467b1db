//! Captures `log` records so tests can assert on what the engine reports.
//!
//! The `log` facade takes one global logger, so records are buffered per
//! thread. Each test sees only what it emitted itself, even when the harness
//! runs tests in parallel.

use std::cell::RefCell;
use std::sync::Once;

use log::{Level, LevelFilter, Log, Metadata, Record};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CapturedRecord {
    pub target: String,
    pub level: Level,
    pub message: String,
}

thread_local! {
    static RECORDS: RefCell<Vec<CapturedRecord>> = const { RefCell::new(Vec::new()) };
}

struct CaptureLogger;

impl Log for CaptureLogger {
    fn enabled(&self, _: &Metadata<'_>) -> bool {
        true
    }

    fn log(&self, record: &Record<'_>) {
        let captured = CapturedRecord {
            target: record.target().to_string(),
            level: record.level(),
            message: record.args().to_string(),
        };
        RECORDS.with(|records| records.borrow_mut().push(captured));
    }

    fn flush(&self) {}
}

static LOGGER: CaptureLogger = CaptureLogger;
static INSTALL: Once = Once::new();

/// Handle on the current thread's captured records.
pub struct LogCapture {
    _private: (),
}

impl LogCapture {
    /// Installs the capturing logger on first use and forgets anything this
    /// thread captured before.
    pub fn start() -> Self {
        INSTALL.call_once(|| {
            if log::set_logger(&LOGGER).is_ok() {
                log::set_max_level(LevelFilter::Trace);
            }
        });
        RECORDS.with(|records| records.borrow_mut().clear());
        Self { _private: () }
    }

    pub fn records(&self) -> Vec<CapturedRecord> {
        RECORDS.with(|records| records.borrow().clone())
    }

    /// Records for `target` at `Info` or more severe. Engine traces are
    /// left out.
    pub fn reported(&self, target: &str) -> Vec<CapturedRecord> {
        self.records()
            .into_iter()
            .filter(|record| record.target == target && record.level <= Level::Info)
            .collect()
    }
}

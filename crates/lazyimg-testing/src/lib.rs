//! Testing utilities and harness for lazyimg

pub mod log_capture;
pub mod test_platform;
pub mod test_rule;

pub use log_capture::{CapturedRecord, LogCapture};
pub use test_platform::{TestElement, TestPlatform, TestTimer, TestWatcher};
pub use test_rule::*;

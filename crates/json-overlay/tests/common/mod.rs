#![allow(dead_code)]

pub mod assertions;
pub mod fixtures;

/// Routes `log` output through the test harness; repeated calls are fine.
pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

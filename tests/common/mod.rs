#![allow(dead_code)]

pub use dagpool_test_utils::builders;
pub use dagpool_test_utils::{init_tracing, with_deadline, with_timeout};

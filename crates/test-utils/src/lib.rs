pub mod builders;
pub mod fake_dispatcher;
pub mod fake_sink;
pub mod tasks;

use std::sync::Once;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use tracing_subscriber::{fmt, EnvFilter};

static INIT: Once = Once::new();

/// Install a test-captured `tracing` subscriber once per test binary.
///
/// Worker threads log through the same subscriber, with thread names, so a
/// failing scheduler test shows which `dagpool-worker-*` did what. Filter
/// with `RUST_LOG`, e.g. `RUST_LOG=dagpool=trace`.
pub fn init_tracing() {
    INIT.call_once(|| {
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

        fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_names(true)
            .init();
    });
}

/// Run `f` on a helper thread and wait at most 5 seconds for its result.
pub fn with_timeout<F, T>(f: F) -> T
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    with_deadline(Duration::from_secs(5), f).expect("Test timed out after 5 seconds")
}

/// Run `f` on a helper thread and wait at most `deadline` for its result.
///
/// Returns `None` on timeout. The helper thread is left running (detached),
/// which is what we want for checking that something *does not* finish.
pub fn with_deadline<F, T>(deadline: Duration, f: F) -> Option<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel();
    thread::spawn(move || {
        let _ = tx.send(f());
    });
    rx.recv_timeout(deadline).ok()
}

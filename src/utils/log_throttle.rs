use std::collections::HashMap;
use std::sync::Mutex;
use std::time::{Duration, Instant};

#[derive(Debug)]
struct WindowState {
    window_started_at: Instant,
    suppressed: u64,
}

/// Per-key rate limiting for log emission.
///
/// Each key gets one emit per interval; calls in between are counted and the
/// count is reported with the next emit. Owned per `Metrics` instance so that
/// registries coexisting in one process throttle independently.
#[derive(Debug, Default)]
pub struct LogThrottle {
    windows: Mutex<HashMap<String, WindowState>>,
}

impl LogThrottle {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `Some(suppressed_count)` when a log for `key` should be
    /// emitted, otherwise `None` and the event is counted as suppressed for
    /// the active window.
    pub fn should_emit(&self, key: &str, interval: Duration) -> Option<u64> {
        let mut windows = self.windows.lock().expect("log throttle mutex poisoned");
        let now = Instant::now();

        match windows.get_mut(key) {
            Some(state) => {
                if now.duration_since(state.window_started_at) >= interval {
                    let suppressed = state.suppressed;
                    state.window_started_at = now;
                    state.suppressed = 0;
                    Some(suppressed)
                } else {
                    state.suppressed += 1;
                    None
                }
            }
            None => {
                windows.insert(
                    key.to_string(),
                    WindowState {
                        window_started_at: now,
                        suppressed: 0,
                    },
                );
                Some(0)
            }
        }
    }
}

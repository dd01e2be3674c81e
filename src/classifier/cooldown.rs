// Per-user cooldown tracker for classification calls.
//
// Remembers when each user's last successful call began. A user inside the
// window is skipped rather than delayed. State is process-local and starts
// empty on every launch; it is created once in main and shared via Arc.

use std::collections::HashMap;
use std::sync::Mutex;

use tokio::time::{Duration, Instant};

/// Default window between two calls attributed to the same user.
pub const DEFAULT_COOLDOWN: Duration = Duration::from_secs(8);

pub struct CooldownTracker {
    window: Duration,
    last_call: Mutex<HashMap<String, Instant>>,
}

impl Default for CooldownTracker {
    fn default() -> Self {
        Self::new(DEFAULT_COOLDOWN)
    }
}

impl CooldownTracker {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            last_call: Mutex::new(HashMap::new()),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Whether `user_id` made a recorded call less than `window` before `now`.
    pub fn is_cooling(&self, user_id: &str, now: Instant) -> bool {
        let last_call = self.last_call.lock().unwrap_or_else(|e| e.into_inner());
        last_call
            .get(user_id)
            .is_some_and(|last| now.saturating_duration_since(*last) < self.window)
    }

    /// Record a call for `user_id` that began at `at`.
    pub fn record(&self, user_id: &str, at: Instant) {
        let mut last_call = self.last_call.lock().unwrap_or_else(|e| e.into_inner());
        last_call.insert(user_id.to_string(), at);
    }

    /// Number of users currently tracked.
    pub fn len(&self) -> usize {
        self.last_call
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

use crate::*;

/// A transient value shown for a fixed duration.
#[derive(Clone, Debug, PartialEq)]
pub struct TimedFlash<T> {
    value: Option<T>,
    expires_at: Millis,
}

impl<T> Default for TimedFlash<T> {
    fn default() -> Self {
        Self {
            value: None,
            expires_at: 0,
        }
    }
}

impl<T> TimedFlash<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the current value and restarts the timer.
    pub fn show(&mut self, value: T, now: Millis, duration: Millis) {
        self.value = Some(value);
        self.expires_at = now.saturating_add(duration);
    }

    pub fn value(&self) -> Option<&T> {
        self.value.as_ref()
    }

    pub fn clear(&mut self) -> bool {
        self.value.take().is_some()
    }

    pub fn next_deadline(&self) -> Option<Millis> {
        self.value.as_ref().map(|_| self.expires_at)
    }

    /// Clears the value once expired, returns true when it did.
    pub fn poll(&mut self, now: Millis) -> bool {
        if self.value.is_some() && self.expires_at <= now {
            self.clear()
        } else {
            false
        }
    }
}

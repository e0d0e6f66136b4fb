use std::time::{Duration, Instant};
use tracing::trace;

/// Startup notices, shown the way a toast widget would: every queued
/// message is instantiated and shown immediately at launch, nothing is
/// configured beyond the default time-to-live.
pub struct Toast {
    pub message: String,
    shown_at: Instant,
}

pub struct ToastRack {
    toasts: Vec<Toast>,
    ttl: Duration,
}

impl ToastRack {
    pub fn new(ttl_ms: u64) -> Self {
        ToastRack {
            toasts: Vec::new(),
            ttl: Duration::from_millis(ttl_ms),
        }
    }

    pub fn show(&mut self, message: impl Into<String>) {
        let message = message.into();
        trace!("Showing toast: {message}");
        self.toasts.push(Toast {
            message,
            shown_at: Instant::now(),
        });
    }

    /// Drop toasts whose time-to-live has passed. Called once per event
    /// loop turn.
    pub fn sweep(&mut self) {
        let ttl = self.ttl;
        self.toasts.retain(|t| t.shown_at.elapsed() < ttl);
    }

    pub fn messages(&self) -> Vec<String> {
        self.toasts.iter().map(|t| t.message.clone()).collect()
    }

    pub fn is_empty(&self) -> bool {
        self.toasts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn toasts_show_immediately_and_expire_on_sweep() {
        let mut rack = ToastRack::new(60_000);
        rack.show("Loaded 12 products");
        rack.show("Welcome back");
        assert_eq!(rack.messages(), vec!["Loaded 12 products", "Welcome back"]);

        rack.sweep();
        assert_eq!(rack.messages().len(), 2);

        let mut expired = ToastRack::new(0);
        expired.show("gone");
        expired.sweep();
        assert!(expired.is_empty());
    }
}

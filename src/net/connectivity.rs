//! Reachability tracking.
//!
//! The monitor owns the single online/offline boolean. It is updated only by
//! platform connectivity transitions delivered as [`ConnectivityEvent`]s, and
//! distributed to interested tasks through a watch channel. The monitor drives
//! the advisory banner; it does not gate remote sync (there is no offline
//! write queue) and does not gate the rate-refresh timer.

use tokio::sync::watch;
use tracing::info;

use crate::render::SharedRenderer;

/// Fixed advisory shown while offline.
pub const OFFLINE_BANNER_MESSAGE: &str =
    "You are offline. Cached data is shown; changes cannot be saved until you reconnect.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectivityEvent {
    Online,
    Offline,
}

pub struct ConnectivityMonitor {
    tx: watch::Sender<bool>,
    renderer: SharedRenderer,
}

impl ConnectivityMonitor {
    /// Starts in the online state, matching a freshly loaded page.
    pub fn new(renderer: SharedRenderer) -> Self {
        let (tx, _) = watch::channel(true);
        Self { tx, renderer }
    }

    pub fn is_online(&self) -> bool {
        *self.tx.borrow()
    }

    /// Receiver for tasks that want to observe transitions.
    pub fn subscribe(&self) -> watch::Receiver<bool> {
        self.tx.subscribe()
    }

    /// Apply one platform transition. Banner visibility follows the event;
    /// the rate-status label refresh is the caller's responsibility since the
    /// label text depends on state this monitor does not own.
    pub fn apply(&self, event: ConnectivityEvent) {
        let online = matches!(event, ConnectivityEvent::Online);
        info!(online, "connectivity transition");
        self.tx.send_replace(online);
        if online {
            self.renderer.hide_offline_banner();
        } else {
            self.renderer.show_offline_banner(OFFLINE_BANNER_MESSAGE);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::render::testing::CountingRenderer;

    #[test]
    fn test_starts_online_without_banner() {
        let renderer = Arc::new(CountingRenderer::default());
        let monitor = ConnectivityMonitor::new(renderer.clone());
        assert!(monitor.is_online());
        assert!(renderer.banner_visible.lock().unwrap().is_none());
    }

    #[test]
    fn test_offline_event_shows_banner_and_flips_state() {
        let renderer = Arc::new(CountingRenderer::default());
        let monitor = ConnectivityMonitor::new(renderer.clone());

        monitor.apply(ConnectivityEvent::Offline);

        assert!(!monitor.is_online());
        assert_eq!(
            renderer.banner_visible.lock().unwrap().as_deref(),
            Some(OFFLINE_BANNER_MESSAGE)
        );
    }

    #[test]
    fn test_online_event_hides_banner() {
        let renderer = Arc::new(CountingRenderer::default());
        let monitor = ConnectivityMonitor::new(renderer.clone());

        monitor.apply(ConnectivityEvent::Offline);
        monitor.apply(ConnectivityEvent::Online);

        assert!(monitor.is_online());
        assert!(renderer.banner_visible.lock().unwrap().is_none());
    }

    #[test]
    fn test_watch_subscribers_observe_transitions() {
        let renderer = Arc::new(CountingRenderer::default());
        let monitor = ConnectivityMonitor::new(renderer);
        let rx = monitor.subscribe();

        monitor.apply(ConnectivityEvent::Offline);
        assert!(!*rx.borrow());

        monitor.apply(ConnectivityEvent::Online);
        assert!(*rx.borrow());
    }
}

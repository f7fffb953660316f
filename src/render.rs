//! The narrow seam to the presentation layer.
//!
//! Chart drawing, tables, and tab navigation live outside this crate; the
//! core only needs to signal "state changed, redraw", update the rate-status
//! label, and toggle the offline banner. Collaborators are injected at
//! construction rather than probed for at call time.

use std::sync::Arc;

use tracing::info;

use crate::state::AppState;

pub trait Renderer: Send + Sync {
    /// Full re-render from current state. Called after load, rate refresh,
    /// and every local mutation.
    fn render_all(&self, state: &AppState);

    /// Update the human-readable rate freshness label.
    fn set_rate_status(&self, label: &str);

    fn show_offline_banner(&self, message: &str);

    fn hide_offline_banner(&self);
}

pub type SharedRenderer = Arc<dyn Renderer>;

/// Headless renderer that reports through the log stream.
/// Stands in for the dashboard UI when the core runs on its own.
pub struct TraceRenderer;

impl Renderer for TraceRenderer {
    fn render_all(&self, state: &AppState) {
        if state.privacy_mode {
            info!(assets = state.assets.len(), total = "hidden", "render");
        } else {
            info!(
                assets = state.assets.len(),
                total = state.total_value(),
                currency = %state.base_currency,
                "render"
            );
        }
    }

    fn set_rate_status(&self, label: &str) {
        info!(label, "rate status");
    }

    fn show_offline_banner(&self, message: &str) {
        info!(message, "offline banner shown");
    }

    fn hide_offline_banner(&self) {
        info!("offline banner hidden");
    }
}

#[cfg(test)]
pub mod testing {
    //! Counting renderer shared by tests across modules.

    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;

    #[derive(Default)]
    pub struct CountingRenderer {
        pub renders: AtomicUsize,
        pub rate_labels: Mutex<Vec<String>>,
        pub banner_visible: Mutex<Option<String>>,
    }

    impl Renderer for CountingRenderer {
        fn render_all(&self, _state: &AppState) {
            self.renders.fetch_add(1, Ordering::SeqCst);
        }

        fn set_rate_status(&self, label: &str) {
            self.rate_labels.lock().unwrap().push(label.to_string());
        }

        fn show_offline_banner(&self, message: &str) {
            *self.banner_visible.lock().unwrap() = Some(message.to_string());
        }

        fn hide_offline_banner(&self) {
            *self.banner_visible.lock().unwrap() = None;
        }
    }

    impl CountingRenderer {
        pub fn render_count(&self) -> usize {
            self.renders.load(Ordering::SeqCst)
        }
    }
}

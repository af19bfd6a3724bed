//! Render-function trait for session view updates.
//!
//! Inject an [`Arc<dyn SessionRenderer>`] via
//! [`crate::config::ClientConfigBuilder::renderer`] to be handed the full
//! [`ViewState`] after every session transition.
//!
//! The controller never draws anything itself: it mutates its view-model and
//! calls [`SessionRenderer::render`]. Terminal output, JSON event logs and
//! test snapshots are all just renderers.
//!
//! # Example
//!
//! ```rust
//! use edgequake_doc2office::{ClientConfig, Phase, SessionRenderer, ViewState};
//! use std::sync::{Arc, Mutex};
//!
//! #[derive(Default)]
//! struct LastProgress(Mutex<Option<u8>>);
//!
//! impl SessionRenderer for LastProgress {
//!     fn render(&self, view: &ViewState, _phase: Phase) {
//!         *self.0.lock().unwrap() = view.progress.as_ref().map(|p| p.percent);
//!     }
//! }
//!
//! let config = ClientConfig::builder()
//!     .renderer(Arc::new(LastProgress::default()) as Arc<dyn SessionRenderer>)
//!     .build()
//!     .unwrap();
//! ```

use crate::session::Phase;
use crate::view::ViewState;
use std::sync::Arc;

/// Receives the view-model after each transition.
///
/// All methods have default no-op implementations so renderers only
/// override what they care about. Calls are made from the task driving the
/// controller, one at a time and in transition order.
pub trait SessionRenderer: Send + Sync {
    /// Draw the current view. `phase` is the phase the session is in *after*
    /// the transition.
    fn render(&self, view: &ViewState, phase: Phase) {
        let _ = (view, phase);
    }

    /// Called when the phase changes, before the matching `render`.
    fn on_phase_change(&self, from: Phase, to: Phase) {
        let _ = (from, to);
    }
}

/// A renderer that draws nothing. Used when none is configured.
pub struct NoopRenderer;

impl SessionRenderer for NoopRenderer {}

/// Convenience alias matching the type stored in [`crate::config::ClientConfig`].
pub type Renderer = Arc<dyn SessionRenderer>;

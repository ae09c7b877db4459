//! Window visual state
//!
//! Provides the shared application state record and the controller that
//! owns every opacity and visibility transition:
//! - Opacity adjustments with recovery from near-invisible windows
//! - Forced and emergency visibility
//! - Visibility and click-through toggles

mod app_state;
mod visibility;

pub use app_state::{AppState, View};
pub use visibility::{VisibilityController, OPACITY_STEP};

pub mod panels;
pub mod state;
pub mod theme;

pub use panels::draw_control_panel;
pub use state::{EndPosTracker, ViewerState};
pub use theme::apply_theme;

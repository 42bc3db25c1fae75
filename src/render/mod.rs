//! Text rendering of screen views into titled panels. Panels are hashed so a
//! redraw only writes the ones whose text changed.

mod core;
mod registry;
mod views;

pub use core::{RendererSettings, TextRenderer, display_width, wrap_to_width};
pub use registry::{Panel, PanelId, PanelRegistry, PanelState};
pub use views::{
    PANEL_CATS, PANEL_CONTROLS, PANEL_GAME_SETTINGS, PANEL_MEDIATION_INTRO,
    PANEL_MEDIATION_STATUS, PANEL_MEDIATORS, PANEL_NARRATIVE, PANEL_PAIR, PANEL_SITE, PANEL_THEME,
    mediation_panels, settings_panels, theme_panel,
};

//! Custom theme editor.

mod core;

pub use core::{CUSTOM_THEME_CLASS, THEME_PROPERTIES, ThemeEditor, format_property_name};

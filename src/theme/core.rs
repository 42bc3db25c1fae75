use crate::document::DocumentHost;
use crate::error::{FrontError, Result};

pub const CUSTOM_THEME_CLASS: &str = ".theme-custom";

/// Editable colour properties and their fallback values, in display order.
pub const THEME_PROPERTIES: &[(&str, &str)] = &[
    ("--page-background-color", "rgb(56,50,38)"),
    ("--text-color", "black"),
    ("--link-color", "rgb(106, 57, 69)"),
    ("--content-background-color", "white"),
    ("--navbar-background-color", "#655934"),
    ("--navbar-text-color", "#EFE5CE"),
    ("--navbar-hovered-text-color", "rgb(48,41,28)"),
    ("--breadcrumbs-background-color", "rgb(234, 234, 234)"),
    ("--cat-display-hovered-background-color", "#EFE5CE"),
    ("--progress-bar-bg", "rgb(231, 231, 231)"),
    ("--progress-bar-fill", "#80bc08"),
    ("--icon-button-text-color", "darkgray"),
    ("--icon-button-hovered-text-color", "gray"),
    ("--button-background-color", "#655934"),
    ("--button-hovered-background-color", "rgb(82, 73, 55)"),
    ("--button-text-color", "#EFE5CE"),
    ("--button-disabled-background-color", "#938764"),
    ("--button-secondary-background-color", "#EFE5CE"),
    ("--button-secondary-hovered-background-color", "#e5c680"),
    ("--button-secondary-text-color", "#655934"),
    ("--summary-background-color", "#EFE5CE"),
];

/// Custom theme builder: a fixed set of colour properties plus a free-text
/// CSS fragment, rendered into one `.theme-custom` rule block.
///
/// Neither the colours nor the fragment are validated; the user is trusted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ThemeEditor {
    properties: Vec<(String, String)>,
    extra_css: String,
}

impl Default for ThemeEditor {
    fn default() -> Self {
        Self {
            properties: THEME_PROPERTIES
                .iter()
                .map(|(name, value)| (name.to_string(), value.to_string()))
                .collect(),
            extra_css: String::new(),
        }
    }
}

impl ThemeEditor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Take each property's current computed value. Properties the document
    /// does not define keep their previous value.
    pub fn seed_from(&mut self, document: &dyn DocumentHost) {
        for (name, value) in self.properties.iter_mut() {
            if let Some(computed) = document.computed_property(name) {
                let computed = computed.trim();
                if !computed.is_empty() {
                    *value = computed.to_string();
                }
            }
        }
    }

    pub fn set_property(&mut self, name: &str, value: impl Into<String>) -> Result<()> {
        let slot = self
            .properties
            .iter_mut()
            .find(|(candidate, _)| candidate == name)
            .ok_or_else(|| FrontError::UnknownThemeProperty(name.to_string()))?;
        slot.1 = value.into();
        Ok(())
    }

    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(candidate, _)| candidate == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn properties(&self) -> impl Iterator<Item = (&str, &str)> {
        self.properties
            .iter()
            .map(|(name, value)| (name.as_str(), value.as_str()))
    }

    pub fn set_extra_css(&mut self, css: impl Into<String>) {
        self.extra_css = css.into();
    }

    pub fn extra_css(&self) -> &str {
        &self.extra_css
    }

    pub fn generate_css(&self) -> String {
        let mut css = format!("{CUSTOM_THEME_CLASS} {{\n");
        for (name, value) in &self.properties {
            css.push_str(name);
            css.push_str(": ");
            css.push_str(value);
            css.push_str(";\n");
        }
        css.push_str(&self.extra_css);
        css.push_str("\n}");
        css
    }
}

/// `--page-background-color` becomes `Page Background Color`.
pub fn format_property_name(name: &str) -> String {
    let trimmed = name.strip_prefix("--").unwrap_or(name);
    trimmed
        .split('-')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::MemoryDocument;

    #[test]
    fn css_lists_properties_then_extra_fragment() {
        let mut editor = ThemeEditor::new();
        editor.set_extra_css("font-family: serif;");
        let css = editor.generate_css();

        assert!(css.starts_with(".theme-custom {\n--page-background-color: rgb(56,50,38);\n"));
        assert!(css.ends_with("--summary-background-color: #EFE5CE;\nfont-family: serif;\n}"));
        assert_eq!(css.lines().count(), THEME_PROPERTIES.len() + 3);
    }

    #[test]
    fn generation_is_deterministic() {
        let mut a = ThemeEditor::new();
        let mut b = ThemeEditor::new();
        for editor in [&mut a, &mut b] {
            editor.set_property("--text-color", "#101010").unwrap();
            editor.set_extra_css("a { color: teal; }");
        }
        assert_eq!(a.generate_css().as_bytes(), b.generate_css().as_bytes());
    }

    #[test]
    fn seeding_prefers_computed_values() {
        let document = MemoryDocument::new()
            .with_property("--text-color", " #222 ")
            .with_property("--link-color", "");
        let mut editor = ThemeEditor::new();
        editor.seed_from(&document);
        assert_eq!(editor.property("--text-color"), Some("#222"));
        assert_eq!(editor.property("--link-color"), Some("rgb(106, 57, 69)"));
    }

    #[test]
    fn unknown_property_rejected() {
        let mut editor = ThemeEditor::new();
        let err = editor.set_property("--glow", "pink").unwrap_err();
        assert!(matches!(err, FrontError::UnknownThemeProperty(name) if name == "--glow"));
    }

    #[test]
    fn property_names_are_title_cased() {
        assert_eq!(
            format_property_name("--page-background-color"),
            "Page Background Color"
        );
        assert_eq!(format_property_name("--progress-bar-bg"), "Progress Bar Bg");
    }
}

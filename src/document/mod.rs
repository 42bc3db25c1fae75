use std::collections::HashMap;

/// The live page the screens render into: computed style lookups, the
/// injected custom stylesheet and the page title.
pub trait DocumentHost: Send {
    /// Computed value of a CSS custom property on the root element.
    fn computed_property(&self, name: &str) -> Option<String>;
    /// Replace the text of the custom CSS element.
    fn set_custom_css(&mut self, css: &str);
    fn custom_css(&self) -> &str;
    fn set_title(&mut self, title: &str);
    fn title(&self) -> &str;
}

#[derive(Debug, Default, Clone)]
pub struct MemoryDocument {
    computed: HashMap<String, String>,
    custom_css: String,
    title: String,
}

impl MemoryDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_property(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.computed.insert(name.into(), value.into());
        self
    }
}

impl DocumentHost for MemoryDocument {
    fn computed_property(&self, name: &str) -> Option<String> {
        self.computed.get(name).cloned()
    }

    fn set_custom_css(&mut self, css: &str) {
        self.custom_css = css.to_string();
    }

    fn custom_css(&self) -> &str {
        &self.custom_css
    }

    fn set_title(&mut self, title: &str) {
        self.title = title.to_string();
    }

    fn title(&self) -> &str {
        &self.title
    }
}

use std::io::Write;

use crate::error::Result;

use super::registry::{PanelId, PanelState};

/// Compute the display width of a string after stripping ANSI escapes.
pub fn display_width(text: &str) -> usize {
    let clean = strip_ansi_escapes::strip(text);
    let clean_str = String::from_utf8_lossy(&clean);
    unicode_width::UnicodeWidthStr::width(&*clean_str)
}

/// Renderer runtime parameters.
#[derive(Debug, Clone)]
pub struct RendererSettings {
    /// Column budget for wrapped panel text.
    pub width: u16,
    /// Print a `[Title]` line above each panel.
    pub show_titles: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            width: 80,
            show_titles: true,
        }
    }
}

/// Plain text renderer writing changed panels one after another.
pub struct TextRenderer {
    settings: RendererSettings,
}

impl TextRenderer {
    pub fn new(settings: RendererSettings) -> Self {
        Self { settings }
    }

    pub fn with_default() -> Self {
        Self::new(RendererSettings::default())
    }

    pub fn settings_mut(&mut self) -> &mut RendererSettings {
        &mut self.settings
    }

    pub fn render(&mut self, writer: &mut impl Write, dirty: &[(PanelId, PanelState)]) -> Result<()> {
        for (_id, state) in dirty {
            self.render_panel(writer, state)?;
        }
        writer.flush()?;
        Ok(())
    }

    fn render_panel(&self, writer: &mut impl Write, state: &PanelState) -> Result<()> {
        if self.settings.show_titles && !state.title.is_empty() {
            writeln!(writer, "[{}]", state.title)?;
        }
        for line in wrap_to_width(&state.content, self.settings.width) {
            writeln!(writer, "{line}")?;
        }
        writeln!(writer)?;
        Ok(())
    }
}

/// Word wrap `content` to `width` display columns. Explicit newlines are
/// kept; a word wider than the line is split by character.
pub fn wrap_to_width(content: &str, width: u16) -> Vec<String> {
    if width == 0 {
        return Vec::new();
    }
    let width = width as usize;

    let mut lines = Vec::new();
    for raw in content.split('\n') {
        let mut current = String::new();
        for word in raw.split_whitespace() {
            let needed = if current.is_empty() {
                display_width(word)
            } else {
                display_width(&current) + 1 + display_width(word)
            };
            if needed <= width {
                if !current.is_empty() {
                    current.push(' ');
                }
                current.push_str(word);
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }
            if display_width(word) <= width {
                current.push_str(word);
            } else {
                for ch in word.chars() {
                    current.push(ch);
                    if display_width(&current) > width {
                        current.pop();
                        if !current.is_empty() {
                            lines.push(std::mem::take(&mut current));
                        }
                        current.push(ch);
                    }
                }
            }
        }
        lines.push(current);
    }

    lines
}

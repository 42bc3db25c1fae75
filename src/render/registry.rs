use std::collections::{HashMap, HashSet};

use blake3::Hash;

pub type PanelId = String;

/// One titled block of screen text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Panel {
    pub id: PanelId,
    pub title: String,
    pub content: String,
}

impl Panel {
    pub fn new(id: impl Into<String>, title: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            content: content.into(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct PanelState {
    pub title: String,
    pub content: String,
    hash: Option<Hash>,
    pub is_dirty: bool,
}

impl PanelState {
    fn new(title: String) -> Self {
        Self {
            title,
            content: String::new(),
            hash: None,
            is_dirty: true,
        }
    }

    fn update(&mut self, title: String, content: String) {
        let mut hasher = blake3::Hasher::new();
        hasher.update(title.as_bytes());
        hasher.update(&[0]);
        hasher.update(content.as_bytes());
        let new_hash = hasher.finalize();
        if self.hash.map(|h| h != new_hash).unwrap_or(true) {
            self.title = title;
            self.content = content;
            self.hash = Some(new_hash);
            self.is_dirty = true;
        }
    }
}

/// Last rendered state of every panel on screen. Only panels whose text
/// changed are handed back for drawing.
#[derive(Debug, Default)]
pub struct PanelRegistry {
    entries: HashMap<PanelId, PanelState>,
    order: Vec<PanelId>,
    dirty: HashSet<PanelId>,
}

impl PanelRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the panel set with `panels`, in their given order. Panels not
    /// listed are dropped.
    pub fn sync(&mut self, panels: Vec<Panel>) {
        let keep: HashSet<&str> = panels.iter().map(|panel| panel.id.as_str()).collect();
        self.entries.retain(|id, _| keep.contains(id.as_str()));
        self.dirty.retain(|id| keep.contains(id.as_str()));
        self.order = panels.iter().map(|panel| panel.id.clone()).collect();

        for panel in panels {
            let state = self
                .entries
                .entry(panel.id.clone())
                .or_insert_with(|| PanelState::new(panel.title.clone()));
            state.update(panel.title, panel.content);
            if state.is_dirty {
                self.dirty.insert(panel.id);
            }
        }
    }

    /// Force every panel to be drawn again on the next `take_dirty`.
    pub fn invalidate(&mut self) {
        for (id, state) in self.entries.iter_mut() {
            state.is_dirty = true;
            self.dirty.insert(id.clone());
        }
    }

    pub fn take_dirty(&mut self) -> Vec<(PanelId, PanelState)> {
        let mut out = Vec::new();
        for id in &self.order {
            if !self.dirty.remove(id) {
                continue;
            }
            if let Some(state) = self.entries.get_mut(id) {
                state.is_dirty = false;
                out.push((id.clone(), state.clone()));
            }
        }
        out
    }

    pub fn content_of(&self, id: &str) -> Option<&str> {
        self.entries.get(id).map(|state| state.content.as_str())
    }

    pub fn has_dirty(&self) -> bool {
        !self.dirty.is_empty()
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

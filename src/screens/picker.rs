use crate::bridge::Cat;

/// Paged, filterable cat chooser with a selection cap.
///
/// The cap is applied by [`CatPicker::toggle`] only; [`CatPicker::set_selected`]
/// stores whatever it is given.
#[derive(Debug, Clone)]
pub struct CatPicker {
    max_selection: usize,
    per_page: usize,
    query: String,
    page: usize,
    selected: Vec<String>,
}

impl CatPicker {
    pub fn new(max_selection: usize, per_page: usize) -> Self {
        Self {
            max_selection: max_selection.max(1),
            per_page: per_page.max(1),
            query: String::new(),
            page: 0,
            selected: Vec::new(),
        }
    }

    pub fn selected(&self) -> &[String] {
        &self.selected
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.iter().any(|candidate| candidate == id)
    }

    pub fn set_selected(&mut self, ids: Vec<String>) {
        self.selected = ids;
    }

    pub fn clear(&mut self) {
        self.selected.clear();
        self.query.clear();
        self.page = 0;
    }

    /// Select `id`, or deselect it if already selected. Going past the cap
    /// evicts the oldest selection.
    pub fn toggle(&mut self, id: &str) {
        if let Some(index) = self.selected.iter().position(|candidate| candidate == id) {
            self.selected.remove(index);
            return;
        }
        while self.selected.len() >= self.max_selection {
            self.selected.remove(0);
        }
        self.selected.push(id.to_string());
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
        self.page = 0;
    }

    pub fn filtered<'a>(&self, cats: &'a [Cat]) -> Vec<&'a Cat> {
        let needle = self.query.trim().to_lowercase();
        cats.iter()
            .filter(|cat| needle.is_empty() || cat.display_name().to_lowercase().contains(&needle))
            .collect()
    }

    pub fn page_count(&self, cats: &[Cat]) -> usize {
        self.filtered(cats).len().div_ceil(self.per_page).max(1)
    }

    pub fn page(&self) -> usize {
        self.page
    }

    pub fn current_page<'a>(&self, cats: &'a [Cat]) -> Vec<&'a Cat> {
        let page = self.page.min(self.page_count(cats) - 1);
        self.filtered(cats)
            .into_iter()
            .skip(page * self.per_page)
            .take(self.per_page)
            .collect()
    }

    pub fn next_page(&mut self, cats: &[Cat]) {
        if self.page + 1 < self.page_count(cats) {
            self.page += 1;
        }
    }

    pub fn prev_page(&mut self) {
        self.page = self.page.saturating_sub(1);
    }
}

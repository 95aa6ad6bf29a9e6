//! Page-level text search with a circular result cursor.

use doc_model::{CollaboratorError, TextSearch};

/// Result of running a search.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchOutcome {
    /// Matching pages, current page first and then ascending.
    pub pages: Vec<u32>,
    /// Pages whose text could not be read. They count as non-matching.
    pub failed: Vec<CollaboratorError>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SearchSession {
    term: String,
    results: Vec<u32>,
    /// `None` means "before the first result".
    cursor: Option<usize>,
}

impl SearchSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn term(&self) -> &str {
        &self.term
    }

    pub fn results(&self) -> &[u32] {
        &self.results
    }

    pub fn cursor(&self) -> Option<usize> {
        self.cursor
    }

    pub fn is_active(&self) -> bool {
        !self.results.is_empty()
    }

    /// Look for `term` starting at `current_page`, then every other page in
    /// ascending order. The cursor is reset to before the first result.
    pub fn search(
        &mut self,
        term: &str,
        current_page: u32,
        page_count: u32,
        text: &dyn TextSearch,
    ) -> SearchOutcome {
        self.invalidate();
        let term = term.trim();
        if term.is_empty() {
            return SearchOutcome::default();
        }
        self.term = term.to_owned();

        let order = std::iter::once(current_page)
            .filter(|page| *page < page_count)
            .chain((0..page_count).filter(|page| *page != current_page));

        let mut outcome = SearchOutcome::default();
        for page in order {
            match text.page_contains(page, term) {
                Ok(true) => outcome.pages.push(page),
                Ok(false) => {}
                Err(err) => {
                    log::warn!("search skipped page {page}: {err}");
                    outcome.failed.push(err);
                }
            }
        }

        log::debug!("search {:?} matched {} page(s)", self.term, outcome.pages.len());
        self.results = outcome.pages.clone();
        outcome
    }

    /// Advance to the next result, wrapping around. Returns its page.
    pub fn next_match(&mut self) -> Option<u32> {
        if self.results.is_empty() {
            return None;
        }
        let index = match self.cursor {
            Some(index) => (index + 1) % self.results.len(),
            None => 0,
        };
        self.cursor = Some(index);
        self.results.get(index).copied()
    }

    /// Step back to the previous result, wrapping around.
    ///
    /// "Before the first result" counts as index -1, so from a fresh search
    /// this lands on the second-to-last result (the last one when there is
    /// only one).
    pub fn previous_match(&mut self) -> Option<u32> {
        if self.results.is_empty() {
            return None;
        }
        let current = self.cursor.map_or(-1, |index| index as isize);
        let index = (current - 1).rem_euclid(self.results.len() as isize) as usize;
        self.cursor = Some(index);
        self.results.get(index).copied()
    }

    pub fn invalidate(&mut self) {
        self.term.clear();
        self.results.clear();
        self.cursor = None;
    }
}

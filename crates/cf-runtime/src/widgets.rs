use std::collections::HashMap;

use cf_core::{EntryId, RenderedElement};

/// Per-entry micro-state of decorative elements (carousel page), kept out of
/// the sequencer.
#[derive(Debug, Clone, Default)]
pub struct WidgetState {
    pages: HashMap<EntryId, usize>,
}

impl WidgetState {
    pub fn page(&self, entry: EntryId) -> usize {
        self.pages.get(&entry).copied().unwrap_or(0)
    }

    pub fn next_page(&mut self, entry: EntryId, element: &RenderedElement) -> usize {
        self.turn(entry, element, 1)
    }

    pub fn previous_page(&mut self, entry: EntryId, element: &RenderedElement) -> usize {
        let count = element.pages.len();
        self.turn(entry, element, count.saturating_sub(1))
    }

    pub fn clear(&mut self) {
        self.pages.clear();
    }

    fn turn(&mut self, entry: EntryId, element: &RenderedElement, step: usize) -> usize {
        let count = element.pages.len();
        if count == 0 {
            return 0;
        }
        let page = (self.page(entry) + step) % count;
        self.pages.insert(entry, page);
        page
    }
}

//! Autoscroll shell: keeps the transcript viewport pinned to the newest
//! content and re-pins on a short trailing schedule so late layout changes
//! are still followed.

use cf_core::{PlayerEvent, AUTOSCROLL_RETRY_OFFSETS_MS};

#[derive(Debug, Clone)]
pub struct AutoscrollShell {
    offsets: Vec<u64>,
    pending: Vec<u64>,
    content_rows: usize,
    viewport_rows: usize,
    scroll_top: usize,
    typing_visible: bool,
}

impl Default for AutoscrollShell {
    fn default() -> Self {
        Self::new(AUTOSCROLL_RETRY_OFFSETS_MS.to_vec())
    }
}

impl AutoscrollShell {
    pub fn new(offsets: Vec<u64>) -> Self {
        Self {
            offsets,
            pending: Vec::new(),
            content_rows: 0,
            viewport_rows: 0,
            scroll_top: 0,
            typing_visible: false,
        }
    }

    /// Replaces any outstanding retries with a fresh schedule starting at `now`.
    pub fn trigger(&mut self, now: u64) {
        self.pending = self
            .offsets
            .iter()
            .map(|offset| now.saturating_add(*offset))
            .collect();
        self.pending.sort_unstable();
    }

    /// Reacts to a player event. Appends, typing toggles and phase changes
    /// re-arm the schedule.
    pub fn observe(&mut self, event: &PlayerEvent, now: u64) {
        match event {
            PlayerEvent::TypingStarted => self.typing_visible = true,
            PlayerEvent::TypingStopped => self.typing_visible = false,
            PlayerEvent::Restarted => {
                self.typing_visible = false;
                self.scroll_top = 0;
            }
            PlayerEvent::EntryAppended { .. }
            | PlayerEvent::PhaseLoaded { .. }
            | PlayerEvent::ChainSpliced { .. } => {}
            _ => return,
        }
        self.trigger(now);
    }

    pub fn set_layout(&mut self, content_rows: usize, viewport_rows: usize) {
        self.content_rows = content_rows;
        self.viewport_rows = viewport_rows;
        self.scroll_top = self.scroll_top.min(self.max_scroll());
    }

    /// Fires every retry due at `now`. Returns how many fired.
    pub fn tick(&mut self, now: u64) -> usize {
        let due = self.pending.iter().take_while(|at| **at <= now).count();
        if due > 0 {
            self.pending.drain(..due);
            self.scroll_top = self.max_scroll();
        }
        due
    }

    pub fn next_deadline(&self) -> Option<u64> {
        self.pending.first().copied()
    }

    pub fn max_scroll(&self) -> usize {
        self.content_rows.saturating_sub(self.viewport_rows)
    }

    pub fn scroll_top(&self) -> usize {
        self.scroll_top
    }

    pub fn is_pinned(&self) -> bool {
        self.scroll_top >= self.max_scroll()
    }

    pub fn typing_visible(&self) -> bool {
        self.typing_visible
    }

    pub fn scroll_up(&mut self, rows: usize) {
        self.scroll_top = self.scroll_top.saturating_sub(rows);
    }

    pub fn scroll_down(&mut self, rows: usize) {
        self.scroll_top = self.scroll_top.saturating_add(rows).min(self.max_scroll());
    }
}

use std::time::Instant;

use cf_core::{EntryId, PlayerEvent};
use cf_runtime::{AutoscrollShell, FunnelPlayer, Pending, WidgetState};

pub(crate) const OPTION_VIEWPORT_ROWS: usize = 4;

#[derive(Debug, Default)]
pub(crate) struct TuiUiState {
    pub(crate) shell: AutoscrollShell,
    pub(crate) widgets: WidgetState,
    pub(crate) selected_option: usize,
    pub(crate) option_scroll_offset: usize,
    pub(crate) help_visible: bool,
    pub(crate) status: String,
}

impl TuiUiState {
    pub(crate) fn observe(&mut self, event: &PlayerEvent, now: u64) {
        self.shell.observe(event, now);
        match event {
            PlayerEvent::AwaitingChoice { .. } => {
                self.selected_option = 0;
                self.option_scroll_offset = 0;
            }
            PlayerEvent::LinkOpened { url } => self.status = format!("opened {}", url),
            PlayerEvent::Restarted => {
                self.widgets.clear();
                self.selected_option = 0;
                self.option_scroll_offset = 0;
                self.status = "restarted".to_string();
            }
            _ => {}
        }
    }

    pub(crate) fn select_previous(&mut self) {
        self.selected_option = self.selected_option.saturating_sub(1);
        if self.selected_option < self.option_scroll_offset {
            self.option_scroll_offset = self.selected_option;
        }
    }

    pub(crate) fn select_next(&mut self, option_count: usize) {
        let last = option_count.saturating_sub(1);
        self.selected_option = (self.selected_option + 1).min(last);
        if self.selected_option >= self.option_scroll_offset + OPTION_VIEWPORT_ROWS {
            self.option_scroll_offset = self.selected_option + 1 - OPTION_VIEWPORT_ROWS;
        }
    }

    /// Option id under the cursor, when a choice is pending.
    pub(crate) fn selected_option_id(&self, player: &FunnelPlayer) -> Option<String> {
        match player.pending() {
            Some(Pending::Choice { options, .. }) => options
                .get(self.selected_option)
                .map(|option| option.id.clone()),
            _ => None,
        }
    }

    /// Turns the newest carousel. Returns the entry and its new page.
    pub(crate) fn page_carousel(
        &mut self,
        player: &FunnelPlayer,
        forward: bool,
    ) -> Option<(EntryId, usize)> {
        let entry = player
            .transcript()
            .iter()
            .rev()
            .find(|entry| !entry.element.pages.is_empty())?;
        let page = if forward {
            self.widgets.next_page(entry.id, &entry.element)
        } else {
            self.widgets.previous_page(entry.id, &entry.element)
        };
        Some((entry.id, page))
    }
}

/// Maps wall-clock time onto the player's virtual clock.
#[derive(Debug, Clone)]
pub(crate) struct VirtualClock {
    started: Instant,
    base_ms: u64,
    speed: f64,
}

impl VirtualClock {
    pub(crate) fn start(base_ms: u64, speed: f64) -> Self {
        Self {
            started: Instant::now(),
            base_ms,
            speed,
        }
    }

    pub(crate) fn now(&self) -> u64 {
        virtual_ms(self.base_ms, self.started.elapsed().as_millis(), self.speed)
    }
}

pub(crate) fn virtual_ms(base_ms: u64, elapsed_wall_ms: u128, speed: f64) -> u64 {
    let scaled = (elapsed_wall_ms as f64 * speed).max(0.0);
    base_ms.saturating_add(scaled as u64)
}

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use cf_runtime::{FunnelPlayer, Pending};

use crate::pricing_binding;
use crate::tui_state::TuiUiState;

const SCROLL_PAGE_ROWS: usize = 10;

/// Applies one key press. Returns true when the player should quit.
pub(crate) fn handle_key(key: KeyEvent, player: &mut FunnelPlayer, ui: &mut TuiUiState) -> bool {
    if key.code == KeyCode::Esc || matches!(key.code, KeyCode::Char('q')) {
        return true;
    }
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    let option_count = match player.pending() {
        Some(Pending::Choice { options, .. }) => options.len(),
        _ => 0,
    };

    match key.code {
        KeyCode::Char('h') => ui.help_visible = !ui.help_visible,
        KeyCode::Char('r') => player.restart(),
        KeyCode::Char('c') | KeyCode::Char('g') => {
            let slot = usize::from(key.code == KeyCode::Char('g'));
            match pricing_binding(player, slot) {
                Some(binding) => {
                    player.activate(&binding);
                }
                None => ui.status = "no pricing offer on screen".to_string(),
            }
        }
        KeyCode::Left | KeyCode::Right => {
            match ui.page_carousel(player, key.code == KeyCode::Right) {
                Some((_, page)) => ui.status = format!("slide {}", page + 1),
                None => ui.status = "no carousel on screen".to_string(),
            }
        }
        KeyCode::Up if option_count > 0 => ui.select_previous(),
        KeyCode::Down if option_count > 0 => ui.select_next(option_count),
        KeyCode::Up => ui.shell.scroll_up(1),
        KeyCode::Down => ui.shell.scroll_down(1),
        KeyCode::PageUp => ui.shell.scroll_up(SCROLL_PAGE_ROWS),
        KeyCode::PageDown => ui.shell.scroll_down(SCROLL_PAGE_ROWS),
        KeyCode::Enter => answer_pending(player, ui),
        _ => {}
    }
    false
}

fn answer_pending(player: &mut FunnelPlayer, ui: &mut TuiUiState) {
    if let Some(option_id) = ui.selected_option_id(player) {
        if player.resolve_choice(&option_id) {
            ui.status = format!("chose {}", option_id);
        }
        return;
    }
    if matches!(player.pending(), Some(Pending::Action { .. })) {
        player.resolve_action(None);
        ui.status = "continued".to_string();
        return;
    }
    ui.status = if player.is_idle() {
        "end of funnel; r restarts".to_string()
    } else {
        "bot is still talking".to_string()
    };
}

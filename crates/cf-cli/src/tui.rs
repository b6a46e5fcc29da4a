#[cfg(coverage)]
pub(super) fn run_tui_ratatui_mode(
    loaded: &super::LoadedFunnels,
    player: &mut cf_runtime::FunnelPlayer,
    _speed: f64,
) -> Result<i32, cf_core::FunnelError> {
    super::run_tui_line_mode(loaded, player)
}

#[cfg(not(coverage))]
pub(super) use rich::run_tui_ratatui_mode;

#[cfg(not(coverage))]
mod rich {
    use std::io;
    use std::time::Duration;

    use cf_core::FunnelError;
    use cf_runtime::FunnelPlayer;
    use crossterm::event::{self, Event, KeyEventKind};
    use crossterm::terminal::{
        disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
    };
    use crossterm::ExecutableCommand;
    use ratatui::backend::CrosstermBackend;
    use ratatui::Terminal;

    use crate::tui_actions::handle_key;
    use crate::tui_render::render_tui;
    use crate::tui_state::{TuiUiState, VirtualClock};
    use crate::{map_tui_io, LoadedFunnels};

    const FRAME_TICK_MS: u64 = 33;

    struct TuiTerminal {
        terminal: Terminal<CrosstermBackend<io::Stdout>>,
    }

    impl TuiTerminal {
        fn new() -> Result<Self, FunnelError> {
            enable_raw_mode().map_err(map_tui_io)?;
            io::stdout()
                .execute(EnterAlternateScreen)
                .map_err(map_tui_io)?;
            let backend = CrosstermBackend::new(io::stdout());
            let terminal = Terminal::new(backend).map_err(map_tui_io)?;
            Ok(Self { terminal })
        }

        fn terminal_mut(&mut self) -> &mut Terminal<CrosstermBackend<io::Stdout>> {
            &mut self.terminal
        }
    }

    impl Drop for TuiTerminal {
        fn drop(&mut self) {
            let _ = disable_raw_mode();
            let _ = io::stdout().execute(LeaveAlternateScreen);
        }
    }

    pub(crate) fn run_tui_ratatui_mode(
        loaded: &LoadedFunnels,
        player: &mut FunnelPlayer,
        speed: f64,
    ) -> Result<i32, FunnelError> {
        let mut terminal = TuiTerminal::new()?;
        let mut ui = TuiUiState {
            status: "ready".to_string(),
            ..TuiUiState::default()
        };
        let clock = VirtualClock::start(player.now_ms(), speed);
        let tick = Duration::from_millis(FRAME_TICK_MS);

        loop {
            let now = clock.now();
            player.advance_to(now);
            for player_event in player.take_events() {
                ui.observe(&player_event, now);
            }
            ui.shell.tick(now);

            terminal
                .terminal_mut()
                .draw(|frame| render_tui(frame, &mut ui, &*player, loaded, now))
                .map_err(map_tui_io)?;

            if !event::poll(tick).map_err(map_tui_io)? {
                continue;
            }

            if let Event::Key(key) = event::read().map_err(map_tui_io)? {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if handle_key(key, player, &mut ui) {
                    break;
                }
            }
        }

        tracing::debug!(clock_ms = player.now_ms(), "terminal player closed");
        Ok(0)
    }
}

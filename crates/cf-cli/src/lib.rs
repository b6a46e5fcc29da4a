use std::ffi::OsString;
use std::io::IsTerminal;

use cf_api::builtin_funnels;
use cf_core::FunnelError;
use clap::Parser;

mod agent;
mod boundary_runner;
mod cli_args;
mod error_map;
mod line_tui;
mod logging;
mod models;
mod session_ops;
mod source_loader;
mod tui;
mod tui_actions;
mod tui_render;
mod tui_state;
mod validate;

pub(crate) use boundary_runner::{boundary_lines, run_to_boundary};
pub(crate) use cli_args::{
    AgentArgs, AgentCommand, Cli, Mode, PlayArgs, SourceArgs, TuiArgs, ValidateArgs,
};
pub(crate) use error_map::{
    emit_error, json_text, map_cli_log_file, map_cli_output_json, map_cli_source_path,
    map_cli_source_read, map_cli_source_scan, map_tui_io,
};
pub(crate) use line_tui::run_tui_line_mode;
pub(crate) use models::{BoundaryEvent, BoundaryResult, LoadedFunnels, TuiCommandAction};
pub(crate) use session_ops::{create_player_for_source, pricing_binding};
pub(crate) use source_loader::load_source;

use logging::{init_logging, LogTarget};

pub fn run_cli_from_args<I, T>(args: I) -> i32
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(error) => {
            let _ = error.print();
            return error.exit_code();
        }
    };
    match run(cli) {
        Ok(code) => code,
        Err(error) => emit_error(error),
    }
}

fn run(cli: Cli) -> Result<i32, FunnelError> {
    match cli.command {
        Mode::Agent(args) => agent::run_agent(args),
        Mode::Tui(args) => run_tui(args),
        Mode::Validate(args) => validate::run_validate(args),
        Mode::List => run_list(),
    }
}

fn run_tui(args: TuiArgs) -> Result<i32, FunnelError> {
    if !(args.speed.is_finite() && args.speed > 0.0) {
        return Err(FunnelError::new(
            "CLI_SPEED_INVALID",
            format!("--speed must be a positive number, got {}", args.speed),
        ));
    }

    let interactive = std::io::stdin().is_terminal() && std::io::stdout().is_terminal();
    let fallback = if interactive {
        LogTarget::Sink
    } else {
        LogTarget::Stderr
    };
    init_logging(&LogTarget::pick(args.log_file.as_deref(), fallback))?;

    let loaded = load_source(&args.source)?;
    let mut player = create_player_for_source(&loaded, args.entry_phase.as_deref())?;
    if !interactive {
        tracing::info!("stdin/stdout is not a terminal; using line mode");
        return run_tui_line_mode(&loaded, &mut player);
    }
    tui::run_tui_ratatui_mode(&loaded, &mut player, args.speed)
}

fn run_list() -> Result<i32, FunnelError> {
    let tables = builtin_funnels()?;
    println!("RESULT:OK");
    for (name, table) in &tables {
        println!(
            "FUNNEL:{}|entry={}|phases={}",
            name,
            table.entry,
            table.phases.len()
        );
    }
    Ok(0)
}

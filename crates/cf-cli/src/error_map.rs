use cf_core::FunnelError;
use std::fmt::Display;

fn map_error(code: &'static str, error: impl Display) -> FunnelError {
    FunnelError::new(code, error.to_string())
}

/// JSON string literal for protocol lines.
pub(crate) fn json_text(value: &str) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| "\"\"".to_string())
}

pub(crate) fn emit_error(error: FunnelError) -> i32 {
    println!("RESULT:ERROR");
    println!("ERROR_CODE:{}", error.code);
    println!("ERROR_MSG_JSON:{}", json_text(&error.message));
    1
}

pub(crate) fn map_tui_io(error: std::io::Error) -> FunnelError {
    map_error("TUI_IO", error)
}

pub(crate) fn map_cli_source_path(error: std::io::Error) -> FunnelError {
    map_error("CLI_SOURCE_PATH", error)
}

pub(crate) fn map_cli_source_scan(error: std::path::StripPrefixError) -> FunnelError {
    map_error("CLI_SOURCE_SCAN", error)
}

pub(crate) fn map_cli_source_read(error: std::io::Error) -> FunnelError {
    map_error("CLI_SOURCE_READ", error)
}

pub(crate) fn map_cli_log_file(error: std::io::Error) -> FunnelError {
    map_error("CLI_LOG_FILE", error)
}

pub(crate) fn map_cli_output_json(error: serde_json::Error) -> FunnelError {
    map_error("CLI_OUTPUT_JSON", error)
}

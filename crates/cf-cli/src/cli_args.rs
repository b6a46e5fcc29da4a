use clap::{Args, Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(name = "chatfunnel-player")]
#[command(about = "Scripted chat funnel player")]
pub(crate) struct Cli {
    #[command(subcommand)]
    pub(crate) command: Mode,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Mode {
    Agent(AgentArgs),
    Tui(TuiArgs),
    Validate(ValidateArgs),
    List,
}

/// Where funnel sources come from. Without `--scripts-dir` the built-in
/// funnels are used; `--funnel` then picks one of them by name.
#[derive(Debug, Clone, Default, Args)]
pub(crate) struct SourceArgs {
    #[arg(long = "funnel")]
    pub(crate) funnel: Option<String>,
    #[arg(long = "scripts-dir")]
    pub(crate) scripts_dir: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct AgentArgs {
    #[command(subcommand)]
    pub(crate) command: AgentCommand,
}

#[derive(Debug, Subcommand)]
pub(crate) enum AgentCommand {
    Play(PlayArgs),
}

#[derive(Debug, Args)]
pub(crate) struct PlayArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    #[arg(long = "entry-phase")]
    pub(crate) entry_phase: Option<String>,
    /// Answer for the next halt: an option id, or `action`.
    #[arg(long = "choose")]
    pub(crate) choose: Vec<String>,
    #[arg(long = "log-file")]
    pub(crate) log_file: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct TuiArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
    #[arg(long = "entry-phase")]
    pub(crate) entry_phase: Option<String>,
    /// Virtual milliseconds per wall-clock millisecond.
    #[arg(long = "speed", default_value_t = 1.0)]
    pub(crate) speed: f64,
    #[arg(long = "log-file")]
    pub(crate) log_file: Option<String>,
}

#[derive(Debug, Args)]
pub(crate) struct ValidateArgs {
    #[command(flatten)]
    pub(crate) source: SourceArgs,
}

use cf_core::FunnelError;
use cf_runtime::FunnelPlayer;

use crate::logging::{init_logging, LogTarget};
use crate::{
    boundary_lines, create_player_for_source, load_source, run_to_boundary, AgentArgs,
    AgentCommand, BoundaryEvent, BoundaryResult, PlayArgs,
};

/// Pick that answers an action prompt.
pub(crate) const ACTION_PICK: &str = "action";

pub(super) fn run_agent(args: AgentArgs) -> Result<i32, FunnelError> {
    match args.command {
        AgentCommand::Play(args) => run_play(args),
    }
}

pub(super) fn run_play(args: PlayArgs) -> Result<i32, FunnelError> {
    init_logging(&LogTarget::pick(args.log_file.as_deref(), LogTarget::Stderr))?;
    let loaded = load_source(&args.source)?;
    let mut player = create_player_for_source(&loaded, args.entry_phase.as_deref())?;
    for line in play_lines(&mut player, &args.choose)? {
        println!("{}", line);
    }
    Ok(0)
}

/// Plays until the picks run out or the funnel goes idle. Output is only
/// produced when every pick applied.
pub(crate) fn play_lines(
    player: &mut FunnelPlayer,
    picks: &[String],
) -> Result<Vec<String>, FunnelError> {
    let mut lines = vec![
        "RESULT:OK".to_string(),
        format!("FUNNEL:{}", player.table().name),
    ];
    let mut picks = picks.iter();
    loop {
        let boundary = run_to_boundary(player);
        lines.extend(boundary_lines(&boundary)?);
        let Some(pick) = picks.next() else {
            break;
        };
        apply_pick(player, &boundary, pick)?;
    }
    Ok(lines)
}

fn apply_pick(
    player: &mut FunnelPlayer,
    boundary: &BoundaryResult,
    pick: &str,
) -> Result<(), FunnelError> {
    match boundary.event {
        BoundaryEvent::Choices => {
            if player.resolve_choice(pick) {
                return Ok(());
            }
            Err(FunnelError::new(
                "AGENT_PICK_INVALID",
                format!(
                    "Option \"{}\" is not offered in phase \"{}\". Offered: {}.",
                    pick,
                    boundary.phase,
                    boundary
                        .choices
                        .iter()
                        .map(|(id, _)| id.as_str())
                        .collect::<Vec<_>>()
                        .join(", ")
                ),
            ))
        }
        BoundaryEvent::Action => {
            if pick == ACTION_PICK {
                player.resolve_action(None);
                return Ok(());
            }
            Err(FunnelError::new(
                "AGENT_PICK_INVALID",
                format!(
                    "Phase \"{}\" waits on an action prompt; pick \"{}\" instead of \"{}\".",
                    boundary.phase, ACTION_PICK, pick
                ),
            ))
        }
        BoundaryEvent::Idle => Err(FunnelError::new(
            "AGENT_PICK_UNUSED",
            format!(
                "Funnel went idle in phase \"{}\" before pick \"{}\" was used.",
                boundary.phase, pick
            ),
        )),
    }
}

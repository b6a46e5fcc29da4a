use cf_core::{FunnelError, PlayerEvent};
use cf_runtime::{FunnelPlayer, Pending};

use crate::{json_text, map_cli_output_json, BoundaryEvent, BoundaryResult};

/// Runs the virtual clock until the player halts, then collects what was
/// appended and opened on the way.
pub(crate) fn run_to_boundary(player: &mut FunnelPlayer) -> BoundaryResult {
    player.run_until_idle();
    collect_boundary(player)
}

pub(crate) fn collect_boundary(player: &mut FunnelPlayer) -> BoundaryResult {
    let mut appended = Vec::new();
    let mut opened_links = Vec::new();
    for event in player.take_events() {
        match event {
            PlayerEvent::EntryAppended { id } => appended.push(id),
            PlayerEvent::LinkOpened { url } => opened_links.push(url),
            // entry ids are reused after a restart
            PlayerEvent::Restarted => appended.clear(),
            _ => {}
        }
    }

    let entries = player
        .transcript()
        .iter()
        .filter(|entry| appended.contains(&entry.id))
        .cloned()
        .collect();

    let (event, choices, action_label) = match player.pending() {
        Some(Pending::Choice { options, .. }) => (
            BoundaryEvent::Choices,
            options
                .iter()
                .map(|option| (option.id.clone(), option.label.clone()))
                .collect(),
            None,
        ),
        Some(Pending::Action { label, .. }) => {
            (BoundaryEvent::Action, Vec::new(), Some(label.clone()))
        }
        None => (BoundaryEvent::Idle, Vec::new(), None),
    };

    BoundaryResult {
        event,
        phase: player.current_phase().clone(),
        entries,
        opened_links,
        choices,
        action_label,
        clock_ms: player.now_ms(),
    }
}

pub(crate) fn boundary_lines(boundary: &BoundaryResult) -> Result<Vec<String>, FunnelError> {
    let mut lines = vec![format!("PHASE:{}", boundary.phase)];

    for entry in &boundary.entries {
        let json = serde_json::to_string(entry).map_err(map_cli_output_json)?;
        lines.push(format!("ENTRY_JSON:{}", json));
    }

    for url in &boundary.opened_links {
        lines.push(format!("OPEN_URL:{}", url));
    }

    lines.push(
        match boundary.event {
            BoundaryEvent::Choices => "EVENT:CHOICES",
            BoundaryEvent::Action => "EVENT:ACTION",
            BoundaryEvent::Idle => "EVENT:IDLE",
        }
        .to_string(),
    );

    for (id, label) in &boundary.choices {
        lines.push(format!("CHOICE:{}|{}", id, json_text(label)));
    }

    if let Some(label) = &boundary.action_label {
        lines.push(format!("ACTION_JSON:{}", json_text(label)));
    }

    lines.push(format!("CLOCK_MS:{}", boundary.clock_ms));
    Ok(lines)
}

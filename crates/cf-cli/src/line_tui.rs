use std::io::{self, BufRead, Write};

use cf_core::{ElementKind, FunnelError, Sender, TranscriptEntry};
use cf_runtime::FunnelPlayer;

use crate::agent::ACTION_PICK;
use crate::{
    map_tui_io, pricing_binding, run_to_boundary, BoundaryEvent, LoadedFunnels,
    TuiCommandAction,
};

const LINE_COMMANDS: &str = "commands: :help :cta :ghost :restart :quit";

pub(crate) fn run_tui_line_mode(
    loaded: &LoadedFunnels,
    player: &mut FunnelPlayer,
) -> Result<i32, FunnelError> {
    let stdin = io::stdin();
    let mut reader = stdin.lock();
    let mut writer = io::stdout();
    run_tui_line_mode_with_io(loaded, player, &mut reader, &mut writer)
}

pub(crate) fn run_tui_line_mode_with_io(
    loaded: &LoadedFunnels,
    player: &mut FunnelPlayer,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<i32, FunnelError> {
    writeln!(writer, "ChatFunnel | {}", loaded.title).map_err(map_tui_io)?;
    writeln!(writer, "{}", LINE_COMMANDS).map_err(map_tui_io)?;

    loop {
        let boundary = run_to_boundary(player);
        for entry in &boundary.entries {
            writeln!(writer).map_err(map_tui_io)?;
            for line in entry_plain_lines(entry) {
                writeln!(writer, "{}", line).map_err(map_tui_io)?;
            }
        }
        for url in &boundary.opened_links {
            writeln!(writer, "[link] {}", url).map_err(map_tui_io)?;
        }

        match boundary.event {
            BoundaryEvent::Choices => {
                writeln!(writer).map_err(map_tui_io)?;
                for (id, label) in &boundary.choices {
                    writeln!(writer, "  [{}] {}", id, label).map_err(map_tui_io)?;
                }
            }
            BoundaryEvent::Action => {
                writeln!(
                    writer,
                    "  [enter] {}",
                    boundary.action_label.as_deref().unwrap_or_default()
                )
                .map_err(map_tui_io)?;
            }
            BoundaryEvent::Idle => {
                writeln!(writer).map_err(map_tui_io)?;
                writeln!(writer, "[idle] :restart to play again, :quit to leave")
                    .map_err(map_tui_io)?;
            }
        }

        loop {
            let Some(raw) = prompt_input_from("> ", reader, writer)? else {
                return Ok(0);
            };
            let mut emit = |line: String| writeln!(writer, "{}", line);
            let action = handle_tui_command(raw.trim(), player, &mut emit).map_err(map_tui_io)?;
            match action {
                TuiCommandAction::Continue => continue,
                TuiCommandAction::RefreshBoundary => break,
                TuiCommandAction::Quit => return Ok(0),
                TuiCommandAction::NotHandled => {}
            }

            let answered = match boundary.event {
                BoundaryEvent::Choices => player.resolve_choice(raw.trim()),
                BoundaryEvent::Action => {
                    let pick = raw.trim();
                    (pick.is_empty() || pick == ACTION_PICK) && player.resolve_action(None)
                }
                BoundaryEvent::Idle => false,
            };
            if answered {
                break;
            }
            writeln!(writer, "not an answer here: {:?} (:help)", raw.trim()).map_err(map_tui_io)?;
        }
    }
}

pub(crate) fn handle_tui_command(
    raw: &str,
    player: &mut FunnelPlayer,
    emit: &mut dyn FnMut(String) -> io::Result<()>,
) -> io::Result<TuiCommandAction> {
    match raw {
        ":help" => {
            emit(LINE_COMMANDS.to_string())?;
            emit("answer a choice with its id; press enter at an action prompt".to_string())?;
            Ok(TuiCommandAction::Continue)
        }
        ":cta" | ":ghost" => {
            let slot = usize::from(raw == ":ghost");
            match pricing_binding(player, slot) {
                Some(binding) => {
                    player.activate(&binding);
                    Ok(TuiCommandAction::RefreshBoundary)
                }
                None => {
                    emit("no pricing offer on screen".to_string())?;
                    Ok(TuiCommandAction::Continue)
                }
            }
        }
        ":restart" => {
            player.restart();
            emit("restarted".to_string())?;
            Ok(TuiCommandAction::RefreshBoundary)
        }
        ":quit" => {
            emit("bye".to_string())?;
            Ok(TuiCommandAction::Quit)
        }
        _ => Ok(TuiCommandAction::NotHandled),
    }
}

/// Plain-text rendition of one transcript entry.
pub(crate) fn entry_plain_lines(entry: &TranscriptEntry) -> Vec<String> {
    let element = &entry.element;
    let prefix = match entry.sender {
        Sender::Bot => "bot",
        Sender::User => "you",
    };
    let mut lines = element
        .lines
        .iter()
        .enumerate()
        .map(|(index, line)| {
            if index == 0 {
                format!("{}> {}", prefix, line.text())
            } else {
                format!("     {}", line.text())
            }
        })
        .collect::<Vec<_>>();

    for (index, page) in element.pages.iter().enumerate() {
        lines.push(format!("  ({}/{})", index + 1, element.pages.len()));
        lines.extend(page.iter().map(|line| format!("     {}", line.text())));
    }

    match element.kind {
        // listed again at the prompt
        ElementKind::OptionList | ElementKind::ActionButton { .. } => {}
        _ => {
            let keys = [":cta", ":ghost"];
            for (index, control) in element.controls.iter().enumerate() {
                let key = keys.get(index).copied().unwrap_or("");
                lines.push(format!("  [{}] {}", key, control.label));
            }
        }
    }
    lines
}

/// Reads one line; `None` once the input is exhausted.
pub(crate) fn prompt_input_from(
    prefix: &str,
    reader: &mut dyn BufRead,
    writer: &mut dyn Write,
) -> Result<Option<String>, FunnelError> {
    write!(writer, "{}", prefix).map_err(map_tui_io)?;
    writer.flush().map_err(map_tui_io)?;
    let mut input = String::new();
    let read = reader.read_line(&mut input).map_err(map_tui_io)?;
    if read == 0 {
        return Ok(None);
    }
    Ok(Some(input.trim_end_matches(&['\r', '\n'][..]).to_string()))
}

#[cfg(test)]
mod line_tui_tests {
    use super::*;
    use crate::cli_test_support::*;
    use crate::source_loader::load_builtin_source;
    use std::io::Cursor;

    fn run_with_input(input: &str) -> (i32, String, FunnelPlayer) {
        let mut player = tiny_player();
        let mut reader = Cursor::new(input.as_bytes().to_vec());
        let mut writer = Vec::new();
        let code = run_tui_line_mode_with_io(
            &load_builtin_source(None),
            &mut player,
            &mut reader,
            &mut writer,
        )
        .expect("line mode runs");
        (code, String::from_utf8(writer).expect("utf8"), player)
    }

    #[test]
    fn plays_choice_action_and_pricing_link() {
        let (code, output, player) = run_with_input("buy\n\n:cta\n:quit\n");
        assert_eq!(code, 0);
        assert!(output.contains("bot> Hi there"));
        assert!(output.contains("  [look] Just looking"));
        assert!(output.contains("you> Show me"));
        assert!(output.contains("  [enter] Show price"));
        assert!(output.contains("[link] https://pay.example/checkout"));
        assert!(output.contains("[idle]"));
        assert!(output.ends_with("bye\n"));
        assert_eq!(player.current_phase().as_str(), "offer");
    }

    #[test]
    fn unknown_answers_are_reprompted() {
        let (_, output, player) = run_with_input("maybe\n");
        assert!(output.contains("not an answer here: \"maybe\""));
        assert!(player.pending().is_some());
    }

    #[test]
    fn restart_replays_from_entry() {
        let (_, output, player) = run_with_input("buy\n:restart\n");
        assert!(output.contains("restarted"));
        assert_eq!(output.matches("bot> Hi there").count(), 2);
        assert_eq!(player.current_phase().as_str(), "start");
    }

    #[test]
    fn cta_without_offer_keeps_prompting() {
        let mut player = tiny_player();
        let mut lines = Vec::new();
        let action = handle_tui_command(":cta", &mut player, &mut |line| {
            lines.push(line);
            Ok(())
        })
        .expect("command runs");
        assert_eq!(action, TuiCommandAction::Continue);
        assert_eq!(lines, vec!["no pricing offer on screen".to_string()]);

        let action =
            handle_tui_command("look", &mut player, &mut |_| Ok(())).expect("command runs");
        assert_eq!(action, TuiCommandAction::NotHandled);
    }

    #[test]
    fn prompt_input_reports_end_of_input() {
        let mut reader = Cursor::new(b"one\r\n".to_vec());
        let mut writer = Vec::new();
        assert_eq!(
            prompt_input_from("> ", &mut reader, &mut writer).expect("read"),
            Some("one".to_string())
        );
        assert_eq!(
            prompt_input_from("> ", &mut reader, &mut writer).expect("read"),
            None
        );
    }
}

use super::runtime_test_support::*;
use super::*;
use cf_core::{ElementKind, Sender};

fn message_entries(player: &FunnelPlayer) -> usize {
    player
        .transcript()
        .iter()
        .filter(|entry| matches!(entry.element.kind, ElementKind::BotBubble { .. }))
        .count()
}

#[test]
fn messages_then_choice_halts_at_choice() {
    let (mut player, _) = player_with_host();
    let finished_at = player.run_until_idle();
    assert_eq!(finished_at, 2_600);
    assert_eq!(message_entries(&player), 2);
    assert_eq!(bot_count(&player), 3);
    assert_eq!(player.transcript()[2].element.kind, ElementKind::OptionList);
    assert_eq!(player.transcript()[2].element.controls.len(), 2);
    assert_eq!(player.cursor(), 2);
    assert!(matches!(player.pending(), Some(Pending::Choice { .. })));
}

#[test]
fn soft_exit_echoes_and_opens_link_once() {
    let (mut player, calls) = player_with_host();
    player.run_until_idle();
    player.take_events();

    assert!(player.resolve_choice("A"));
    let echo = player.transcript().last().expect("echo entry");
    assert_eq!(echo.sender, Sender::User);
    assert_eq!(echo.element.plain_text(), "Just looking");

    player.run_until_idle();
    assert_eq!(player.current_phase(), &PhaseId::from("1"));
    assert_eq!(player.transcript().len(), 4);
    assert_eq!(
        calls.borrow().as_slice(),
        &[
            HostCall::Interaction,
            HostCall::Open("https://t.me/community".to_string())
        ]
    );
    let opened = player
        .take_events()
        .into_iter()
        .filter(|event| matches!(event, PlayerEvent::LinkOpened { .. }))
        .count();
    assert_eq!(opened, 1);
}

#[test]
fn continue_branch_loads_next_phase_after_route_delay() {
    let (mut player, _) = player_with_host();
    player.run_until_idle();
    assert!(player.resolve_choice("B"));
    assert_eq!(player.transcript().len(), 4);

    player.advance_by(499);
    assert_eq!(player.current_phase(), &PhaseId::from("1"));
    player.advance_by(1);
    assert_eq!(player.current_phase(), &PhaseId::from("2"));
    assert_eq!(player.cursor(), 0);
    assert_eq!(player.active_len(), 2);

    player.run_until_idle();
    let phase_two = &player.transcript()[4..];
    assert_eq!(phase_two[0].element.plain_text(), "Phase two");
    assert!(phase_two.iter().all(|entry| entry.phase == PhaseId::from("2")));
    assert!(matches!(player.pending(), Some(Pending::Action { .. })));
}

#[test]
fn chained_phase_splices_without_external_event() {
    let (mut player, _) = player_with_host();
    player.load_phase("4");
    player.take_events();
    player.run_until_idle();

    assert_eq!(player.active_len(), 4);
    assert_eq!(player.cursor(), 4);
    let phases = player
        .transcript()
        .iter()
        .map(|entry| entry.phase.as_str().to_string())
        .collect::<Vec<_>>();
    assert_eq!(phases, vec!["4", "4", "5", "5"]);
    assert!(player.take_events().contains(&PlayerEvent::ChainSpliced {
        from: PhaseId::from("4"),
        to: PhaseId::from("5"),
    }));
    assert!(player.is_idle());
}

#[test]
fn double_load_only_plays_second_phase() {
    let (mut player, _) = player_with_host();
    player.load_phase("3");
    player.load_phase("2");
    player.run_until_idle();
    assert!(!player.transcript().is_empty());
    assert!(player
        .transcript()
        .iter()
        .all(|entry| entry.phase == PhaseId::from("2")));
}

#[test]
fn load_phase_cancels_in_flight_typing() {
    let (mut player, _) = player_with_host();
    player.load_phase("3");
    player.advance_by(500);
    assert!(player.is_typing());

    player.load_phase("2");
    assert!(!player.is_typing());
    player.run_until_idle();
    assert!(player
        .transcript()
        .iter()
        .all(|entry| entry.phase != PhaseId::from("3")));
}

#[test]
fn restart_mid_typing_matches_fresh_load() {
    let (mut player, _) = player_with_host();
    player.load_phase("3");
    player.advance_by(100);
    assert!(player.is_typing());
    let generation = player.generation();

    player.restart();
    assert_eq!(player.now_ms(), 100);
    assert!(player.generation() > generation);
    assert!(!player.is_typing());
    assert!(player.transcript().is_empty());
    assert_eq!(player.current_phase(), &PhaseId::from("1"));
    assert_eq!(player.cursor(), 0);
    assert!(player.pending().is_none());

    player.run_until_idle();
    let (mut fresh, _) = player_with_host();
    fresh.run_until_idle();
    assert_eq!(player.transcript(), fresh.transcript());
}

#[test]
fn restart_is_idempotent_from_any_state() {
    let (mut player, _) = player_with_host();
    player.run_until_idle();
    player.resolve_choice("B");
    player.advance_by(650);
    player.restart();
    player.restart();
    player.run_until_idle();

    let (mut fresh, _) = player_with_host();
    fresh.run_until_idle();
    assert_eq!(player.transcript(), fresh.transcript());
    assert_eq!(player.cursor(), fresh.cursor());
    assert_eq!(player.pending(), fresh.pending());
}

#[test]
fn transcript_only_grows_and_never_rewrites() {
    let (mut player, _) = player_with_host();
    let mut snapshot: Vec<TranscriptEntry> = Vec::new();
    let mut check = |player: &FunnelPlayer| {
        assert!(player.transcript().len() >= snapshot.len());
        assert_eq!(&player.transcript()[..snapshot.len()], snapshot.as_slice());
        snapshot = player.transcript().to_vec();
    };

    for _ in 0..20 {
        player.advance_by(250);
        check(&player);
    }
    player.resolve_choice("B");
    check(&player);
    player.resolve_choice("nope");
    check(&player);
    player.run_until_idle();
    check(&player);
    player.resolve_action(None);
    player.run_until_idle();
    check(&player);
}

#[test]
fn typing_never_overlaps() {
    let (mut player, _) = player_with_host();
    player.run_until_idle();
    player.resolve_choice("B");
    player.run_until_idle();
    player.resolve_action(None);
    player.run_until_idle();

    let mut typing = false;
    for event in player.take_events() {
        match event {
            PlayerEvent::TypingStarted => {
                assert!(!typing, "second message started typing while one was typing");
                typing = true;
            }
            PlayerEvent::TypingStopped => typing = false,
            _ => {}
        }
    }
}

#[test]
fn pending_choice_blocks_progress() {
    let (mut player, _) = player_with_host();
    player.run_until_idle();
    let appended = player.transcript().len();
    let cursor = player.cursor();

    player.advance_by(60_000);
    assert_eq!(player.transcript().len(), appended);
    assert_eq!(player.cursor(), cursor);
    assert!(player.next_deadline().is_none());

    assert!(!player.resolve_choice("missing"));
    assert_eq!(player.transcript().len(), appended);
    assert!(!player.resolve_action(None));
}

#[test]
fn missing_durations_use_defaults() {
    let (mut player, _) = player_with_host();
    player.advance_to(1_500);
    assert_eq!(player.cursor(), 1);
    assert!(player.is_typing());

    player.advance_to(2_299);
    assert_eq!(player.transcript().len(), 1);
    player.advance_to(2_300);
    assert_eq!(player.transcript().len(), 2);
    assert!(!player.is_typing());

    player.advance_to(2_599);
    assert_eq!(player.cursor(), 1);
    player.advance_to(2_600);
    assert_eq!(player.cursor(), 2);
}

#[test]
fn decorative_steps_append_at_once_and_settle_by_kind() {
    let (mut player, _) = player_with_host();
    player.load_phase("4");

    // message: typing 100, delay 100; carousel appended when it settles
    player.advance_to(200);
    assert_eq!(player.cursor(), 1);
    assert_eq!(player.transcript().len(), 2);
    let carousel = player.transcript().last().expect("carousel entry");
    assert_eq!(carousel.step_index, Some(1));
    assert_eq!(carousel.phase, PhaseId::from("4"));
    assert!(player.pending().is_none());

    player.advance_to(699);
    assert_eq!(player.cursor(), 1);
    assert_eq!(player.transcript().len(), 2);
    player.advance_to(700);
    assert_eq!(player.cursor(), 2);
    assert!(player.is_typing());

    // chained phase 5: message 100/100, then pricing at 900
    player.advance_to(900);
    assert_eq!(player.cursor(), 3);
    assert_eq!(player.transcript().len(), 4);
    let pricing = player.transcript().last().expect("pricing entry");
    assert_eq!(pricing.phase, PhaseId::from("5"));
    assert_eq!(pricing.step_index, Some(1));

    player.advance_to(1_699);
    assert_eq!(player.cursor(), 3);
    assert!(!player.is_idle());
    player.advance_to(1_700);
    assert_eq!(player.cursor(), 4);
    assert!(player.is_idle());
    assert_eq!(player.transcript().len(), 4);
}

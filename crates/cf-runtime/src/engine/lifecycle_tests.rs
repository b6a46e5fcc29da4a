use super::runtime_test_support::*;
use super::*;
use cf_compiler::compile_funnel_from_xml;
use cf_core::{Binding, ElementKind, Sender};

#[test]
fn new_loads_entry_without_appending() {
    let (player, _) = player_with_host();
    assert_eq!(player.current_phase(), &PhaseId::from("1"));
    assert_eq!(player.active_len(), 3);
    assert_eq!(player.cursor(), 0);
    assert!(player.transcript().is_empty());
    assert_eq!(player.next_deadline(), Some(0));
}

#[test]
fn entry_override_wins_over_table_entry() {
    let player = FunnelPlayer::new(
        sample_table(),
        PlayerOptions {
            entry: Some(PhaseId::from("2")),
            ..PlayerOptions::default()
        },
    );
    assert_eq!(player.entry_phase(), &PhaseId::from("2"));
    assert_eq!(player.current_phase(), &PhaseId::from("2"));
}

#[test]
fn unknown_phase_goes_idle_without_entries() {
    let (mut player, _) = player_with_host();
    player.load_phase("404");
    player.run_until_idle();
    assert!(player.transcript().is_empty());
    assert_eq!(player.active_len(), 0);
    assert!(player.is_idle());
    let events = player.take_events();
    assert!(events.contains(&PlayerEvent::PhaseLoaded {
        phase: PhaseId::from("404")
    }));
    assert_eq!(events.last(), Some(&PlayerEvent::Idle));
}

#[test]
fn stale_generation_task_is_dropped() {
    let (mut player, _) = player_with_host();
    player.run_until_idle();
    let before = player.transcript().len();
    player.fire(player.generation() - 1, Task::Settle { cursor: 2 });
    assert_eq!(player.transcript().len(), before);
    assert_eq!(player.cursor(), 2);
}

#[test]
fn chain_cycle_does_not_loop_forever() {
    let table = compile_funnel_from_xml(
        r#"<funnel name="loop" entry="a">
            <phase id="a" chain="b"><message typing="10" delay="10">A</message></phase>
            <phase id="b" chain="a"><message typing="10" delay="10">B</message></phase>
        </funnel>"#,
    )
    .expect("compile");
    let mut player = FunnelPlayer::new(table, PlayerOptions::default());
    player.run_until_idle();
    assert_eq!(texts(&player), vec!["A", "B"]);
    assert!(player.is_idle());
}

#[test]
fn action_without_target_goes_idle() {
    let table = compile_funnel_from_xml(
        r#"<funnel name="dead-end"><phase id="1"><action label="Stay"/></phase></funnel>"#,
    )
    .expect("compile");
    let mut player = FunnelPlayer::new(table, PlayerOptions::default());
    player.run_until_idle();
    assert!(matches!(player.pending(), Some(Pending::Action { .. })));
    assert!(player.resolve_action(None));
    assert!(player.pending().is_none());
    assert_eq!(player.current_phase(), &PhaseId::from("1"));
    assert_eq!(player.take_events().last(), Some(&PlayerEvent::Idle));
}

#[test]
fn resolve_action_loads_target_without_echo() {
    let (mut player, calls) = player_with_host();
    player.load_phase("2");
    player.run_until_idle();
    let before = player.transcript().len();
    assert!(!player.resolve_choice("B"));
    assert!(player.resolve_action(None));
    assert_eq!(player.transcript().len(), before);
    assert_eq!(player.current_phase(), &PhaseId::from("4"));
    assert_eq!(calls.borrow().as_slice(), &[HostCall::Interaction]);
    assert!(!player.resolve_action(None));
}

#[test]
fn rearmed_soft_exit_keeps_choice_open() {
    let (mut player, calls) = player_with_host();
    player.load_phase("6");
    player.run_until_idle();
    let choice_entry = player.pending().map(Pending::entry).expect("pending choice");

    assert!(player.resolve_choice("again"));
    assert!(player.pending().is_none());
    player.run_until_idle();
    assert_eq!(player.pending().map(Pending::entry), Some(choice_entry));
    assert!(calls
        .borrow()
        .contains(&HostCall::Open("https://t.me/community".to_string())));

    assert!(player.resolve_choice("go"));
    player.run_until_idle();
    assert_eq!(player.current_phase(), &PhaseId::from("2"));
    let interactions = calls
        .borrow()
        .iter()
        .filter(|call| **call == HostCall::Interaction)
        .count();
    assert_eq!(interactions, 1);
}

#[test]
fn activate_runs_rendered_bindings() {
    let (mut player, calls) = player_with_host();
    player.load_phase("5");
    player.run_until_idle();
    let pricing = player
        .transcript()
        .iter()
        .find(|entry| entry.element.kind == ElementKind::PricingOffer)
        .expect("pricing entry");
    let cta = pricing.element.controls[0].binding.clone();
    assert_eq!(
        cta,
        Binding::OpenLink {
            url: "https://pay.example/checkout".to_string()
        }
    );
    assert!(player.activate(&cta));
    assert_eq!(
        calls.borrow().as_slice(),
        &[HostCall::Open("https://pay.example/checkout".to_string())]
    );
    assert!(player.take_events().contains(&PlayerEvent::LinkOpened {
        url: "https://pay.example/checkout".to_string()
    }));
}

#[test]
fn failed_link_open_is_not_fatal() {
    let host = RecordingHost {
        fail_opens: true,
        ..RecordingHost::default()
    };
    let calls = host.calls.clone();
    let mut player = FunnelPlayer::new(
        sample_table(),
        PlayerOptions {
            host: Some(Box::new(host)),
            ..PlayerOptions::default()
        },
    );
    player.run_until_idle();
    assert!(player.resolve_choice("A"));
    player.run_until_idle();
    assert_eq!(calls.borrow().len(), 2);
    assert!(player.is_idle());
    assert_eq!(player.transcript().last().map(|entry| entry.sender), Some(Sender::User));
}

#[test]
fn restart_notifies_host_and_resets_ids() {
    let (mut player, calls) = player_with_host();
    player.run_until_idle();
    player.restart();
    assert_eq!(calls.borrow().as_slice(), &[HostCall::Restart]);
    player.run_until_idle();
    assert_eq!(player.transcript()[0].id, EntryId(1));
    let events = player.take_events();
    assert_eq!(events.first(), Some(&PlayerEvent::Restarted));
}

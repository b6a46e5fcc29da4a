use std::collections::BTreeSet;

use cf_core::{
    ChoiceOption, EntryId, PhaseId, PlayerEvent, Route, ScriptTable, StepDescriptor,
    TranscriptEntry, CHOICE_ROUTE_DELAY_MS,
};

use crate::host::{FunnelHost, NoopHost};
use crate::scheduler::Scheduler;

mod boundary;
mod clock;
mod lifecycle;
mod step;

#[cfg(test)]
mod lifecycle_tests;
#[cfg(test)]
mod scenario_tests;

/// Upper bound on tasks fired by one clock call.
const MAX_TASKS_PER_RUN: usize = 10_000;

pub struct PlayerOptions {
    /// Phase loaded on start and restart; defaults to the table entry.
    pub entry: Option<PhaseId>,
    pub route_delay_ms: u64,
    pub host: Option<Box<dyn FunnelHost>>,
}

impl Default for PlayerOptions {
    fn default() -> Self {
        Self {
            entry: None,
            route_delay_ms: CHOICE_ROUTE_DELAY_MS,
            host: None,
        }
    }
}

/// Interactive halt the player is waiting on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Pending {
    Choice {
        entry: EntryId,
        phase: PhaseId,
        options: Vec<ChoiceOption>,
    },
    Action {
        entry: EntryId,
        label: String,
        target: Option<PhaseId>,
    },
}

impl Pending {
    pub fn entry(&self) -> EntryId {
        match self {
            Self::Choice { entry, .. } | Self::Action { entry, .. } => *entry,
        }
    }
}

#[derive(Debug, Clone)]
struct ActiveStep {
    phase: PhaseId,
    index: usize,
    step: StepDescriptor,
}

#[derive(Debug, Clone)]
enum Task {
    Advance,
    Reveal { cursor: usize },
    Settle { cursor: usize },
    /// Branch of a resolved choice; `choice` is the cleared halt, kept so a
    /// soft exit can re-arm it.
    Dispatch { route: Route, choice: Pending },
}

/// The sequencer and branch router over one script table.
pub struct FunnelPlayer {
    table: ScriptTable,
    entry: PhaseId,
    route_delay_ms: u64,
    host: Box<dyn FunnelHost>,
    scheduler: Scheduler<Task>,
    generation: u64,

    phase: PhaseId,
    tail: PhaseId,
    spliced: BTreeSet<PhaseId>,
    active: Vec<ActiveStep>,
    cursor: usize,
    typing: bool,
    pending: Option<Pending>,

    transcript: Vec<TranscriptEntry>,
    next_entry_id: u64,
    interacted: bool,
    events: Vec<PlayerEvent>,
}

impl FunnelPlayer {
    pub fn table(&self) -> &ScriptTable {
        &self.table
    }

    pub fn transcript(&self) -> &[TranscriptEntry] {
        &self.transcript
    }

    pub fn current_phase(&self) -> &PhaseId {
        &self.phase
    }

    pub fn entry_phase(&self) -> &PhaseId {
        &self.entry
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Steps currently queued, including any spliced in by chains.
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    pub fn is_typing(&self) -> bool {
        self.typing
    }

    pub fn pending(&self) -> Option<&Pending> {
        self.pending.as_ref()
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Nothing scheduled and nothing to answer.
    pub fn is_idle(&self) -> bool {
        self.scheduler.is_empty() && self.pending.is_none()
    }

    pub fn take_events(&mut self) -> Vec<PlayerEvent> {
        std::mem::take(&mut self.events)
    }

    fn emit(&mut self, event: PlayerEvent) {
        self.events.push(event);
    }
}

#[cfg(test)]
pub(crate) mod runtime_test_support {
    use std::cell::RefCell;
    use std::rc::Rc;

    use cf_compiler::compile_funnel_from_xml;
    use cf_core::{FunnelError, Sender};

    use super::*;

    #[derive(Debug, Clone, PartialEq, Eq)]
    pub(crate) enum HostCall {
        Open(String),
        Interaction,
        Restart,
    }

    #[derive(Debug, Clone, Default)]
    pub(crate) struct RecordingHost {
        pub(crate) calls: Rc<RefCell<Vec<HostCall>>>,
        pub(crate) fail_opens: bool,
    }

    impl FunnelHost for RecordingHost {
        fn open_url(&mut self, url: &str) -> Result<(), FunnelError> {
            self.calls.borrow_mut().push(HostCall::Open(url.to_string()));
            if self.fail_opens {
                return Err(FunnelError::new("HOST_OPEN_BLOCKED", "popup blocked"));
            }
            Ok(())
        }

        fn on_interaction(&mut self) {
            self.calls.borrow_mut().push(HostCall::Interaction);
        }

        fn on_restart(&mut self) {
            self.calls.borrow_mut().push(HostCall::Restart);
        }
    }

    pub(crate) const SAMPLE_FUNNEL: &str = r#"
<funnel name="sample" entry="1">
  <link id="community" href="https://t.me/community"/>
  <link id="checkout" href="https://pay.example/checkout"/>
  <phase id="1">
    <message typing="1000" delay="500">Hello</message>
    <message>How are you?</message>
    <choice>
      <option id="A" label="Just looking" open="community"/>
      <option id="B" label="Serious" goto="2"/>
    </choice>
  </phase>
  <phase id="2">
    <message typing="100" delay="100">Phase two</message>
    <action label="Continue" goto="4"/>
  </phase>
  <phase id="3">
    <message typing="2000" delay="100">Long one</message>
    <message>Another</message>
  </phase>
  <phase id="4" chain="5">
    <message typing="100" delay="100">Four</message>
    <carousel><slide id="s1" caption="One"/><slide id="s2" caption="Two"/></carousel>
  </phase>
  <phase id="5">
    <message typing="100" delay="100">Five</message>
    <pricing original="Rp 5.000.000" current="Rp 750.000" cta-link="checkout" ghost-link="community"/>
  </phase>
  <phase id="6">
    <choice>
      <option id="again" label="Remind me" open="community" rearm="true"/>
      <option id="go" label="Go" goto="2"/>
    </choice>
  </phase>
</funnel>
"#;

    pub(crate) fn sample_table() -> ScriptTable {
        compile_funnel_from_xml(SAMPLE_FUNNEL).expect("sample funnel should compile")
    }

    pub(crate) fn player_with_host() -> (FunnelPlayer, Rc<RefCell<Vec<HostCall>>>) {
        let host = RecordingHost::default();
        let calls = host.calls.clone();
        let player = FunnelPlayer::new(
            sample_table(),
            PlayerOptions {
                host: Some(Box::new(host)),
                ..PlayerOptions::default()
            },
        );
        (player, calls)
    }

    pub(crate) fn texts(player: &FunnelPlayer) -> Vec<String> {
        player
            .transcript()
            .iter()
            .map(|entry| entry.element.plain_text())
            .collect()
    }

    pub(crate) fn bot_count(player: &FunnelPlayer) -> usize {
        player
            .transcript()
            .iter()
            .filter(|entry| entry.sender == Sender::Bot)
            .count()
    }
}

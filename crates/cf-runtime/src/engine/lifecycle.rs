use super::*;

impl FunnelPlayer {
    /// Builds a player and loads the entry phase. Nothing is appended until
    /// the clock runs.
    pub fn new(table: ScriptTable, options: PlayerOptions) -> Self {
        let entry = options.entry.unwrap_or_else(|| table.entry.clone());
        let mut player = Self {
            table,
            entry: entry.clone(),
            route_delay_ms: options.route_delay_ms,
            host: options.host.unwrap_or_else(|| Box::new(NoopHost)),
            scheduler: Scheduler::default(),
            generation: 0,
            phase: entry.clone(),
            tail: entry.clone(),
            spliced: BTreeSet::new(),
            active: Vec::new(),
            cursor: 0,
            typing: false,
            pending: None,
            transcript: Vec::new(),
            next_entry_id: 0,
            interacted: false,
            events: Vec::new(),
        };
        player.load_phase(entry);
        player
    }

    /// Replaces the queue with `phase`'s steps and starts processing it.
    /// Every task of the previous phase is cancelled first.
    pub fn load_phase(&mut self, phase: impl Into<PhaseId>) {
        let phase = phase.into();
        self.generation += 1;
        let purged = self.scheduler.purge_except(self.generation);
        if purged > 0 {
            tracing::debug!(
                phase = %phase,
                purged,
                "cancelled tasks of previous phase"
            );
        }

        if self.typing {
            self.typing = false;
            self.emit(PlayerEvent::TypingStopped);
        }
        self.pending = None;

        if self.table.phase(&phase).is_none() {
            tracing::warn!(phase = %phase, "unknown phase; nothing to play");
        }
        self.active = self.queue_steps(&phase);
        self.cursor = 0;
        self.spliced = BTreeSet::from([phase.clone()]);
        self.tail = phase.clone();
        self.phase = phase.clone();

        self.emit(PlayerEvent::PhaseLoaded { phase });
        self.scheduler.schedule(0, self.generation, Task::Advance);
    }

    /// Clears the transcript and goes back to the entry phase. Transcript,
    /// entry ids and sequencer state match a freshly constructed player; the
    /// virtual clock and the generation counter keep counting, so `now_ms`
    /// after a restart is not reset to zero.
    pub fn restart(&mut self) {
        tracing::debug!(phase = %self.phase, "restarting playthrough");
        self.transcript.clear();
        self.next_entry_id = 0;
        self.interacted = false;
        self.events.clear();
        self.typing = false;
        self.host.on_restart();
        self.emit(PlayerEvent::Restarted);
        let entry = self.entry.clone();
        self.load_phase(entry);
    }

    fn queue_steps(&self, phase: &PhaseId) -> Vec<ActiveStep> {
        self.table
            .steps_for(phase)
            .iter()
            .enumerate()
            .map(|(index, step)| ActiveStep {
                phase: phase.clone(),
                index,
                step: step.clone(),
            })
            .collect()
    }

    /// Appends the chained successor of the last queued phase. Returns false
    /// when there is none, or when it was already spliced in this run.
    pub(super) fn splice_chain(&mut self) -> bool {
        let Some(next) = self.table.chain_of(&self.tail).cloned() else {
            return false;
        };
        if !self.spliced.insert(next.clone()) {
            tracing::warn!(from = %self.tail, to = %next, "chain cycle; not splicing again");
            return false;
        }
        if self.table.phase(&next).is_none() {
            tracing::warn!(from = %self.tail, to = %next, "chain names an unknown phase");
        }
        let steps = self.queue_steps(&next);
        self.active.extend(steps);
        let from = std::mem::replace(&mut self.tail, next.clone());
        tracing::debug!(from = %from, to = %next, "spliced chained phase");
        self.emit(PlayerEvent::ChainSpliced { from, to: next });
        true
    }
}

use cf_core::{
    post_display_delay, typing_duration, RenderedElement, Sender, TranscriptEntry,
};

use super::*;
use crate::render::{render_step, step_bindings};

impl FunnelPlayer {
    /// Processes the step under the cursor. Passive steps schedule their own
    /// follow-up; interactive steps halt until resolved.
    pub(super) fn advance(&mut self) {
        if self.pending.is_some() || self.typing {
            return;
        }

        loop {
            let Some(active) = self.active.get(self.cursor).cloned() else {
                if self.splice_chain() {
                    continue;
                }
                tracing::debug!(phase = %self.phase, "sequence finished");
                self.emit(PlayerEvent::Idle);
                return;
            };

            tracing::debug!(
                phase = %active.phase,
                step = active.index,
                kind = active.step.kind_name(),
                "advancing"
            );
            match &active.step {
                StepDescriptor::Message {
                    typing_duration_ms, ..
                } => {
                    self.typing = true;
                    self.emit(PlayerEvent::TypingStarted);
                    self.scheduler.schedule(
                        typing_duration(*typing_duration_ms),
                        self.generation,
                        Task::Reveal {
                            cursor: self.cursor,
                        },
                    );
                }
                StepDescriptor::ChoiceSet { options } => {
                    let entry = self.append_step(&active);
                    self.pending = Some(Pending::Choice {
                        entry,
                        phase: active.phase.clone(),
                        options: options.clone(),
                    });
                    self.emit(PlayerEvent::AwaitingChoice {
                        phase: active.phase.clone(),
                        options: options.clone(),
                    });
                }
                StepDescriptor::ActionPrompt {
                    label,
                    target_phase,
                    ..
                } => {
                    let entry = self.append_step(&active);
                    self.pending = Some(Pending::Action {
                        entry,
                        label: label.clone(),
                        target: target_phase.clone(),
                    });
                    self.emit(PlayerEvent::AwaitingAction {
                        label: label.clone(),
                        target: target_phase.clone(),
                    });
                }
                StepDescriptor::Decorative { block } => {
                    self.append_step(&active);
                    self.scheduler.schedule(
                        block.settle_ms(),
                        self.generation,
                        Task::Settle {
                            cursor: self.cursor,
                        },
                    );
                }
            }
            return;
        }
    }

    pub(super) fn fire(&mut self, generation: u64, task: Task) {
        if generation != self.generation {
            tracing::warn!(
                task_generation = generation,
                current = self.generation,
                "dropping stale task"
            );
            return;
        }

        match task {
            Task::Advance => self.advance(),
            Task::Reveal { cursor } => {
                if !self.at_cursor(cursor) {
                    return;
                }
                let Some(active) = self.active.get(cursor).cloned() else {
                    return;
                };
                self.typing = false;
                self.emit(PlayerEvent::TypingStopped);
                self.append_step(&active);
                let delay = match &active.step {
                    StepDescriptor::Message {
                        post_display_delay_ms,
                        ..
                    } => post_display_delay(*post_display_delay_ms),
                    _ => 0,
                };
                self.scheduler
                    .schedule(delay, self.generation, Task::Settle { cursor });
            }
            Task::Settle { cursor } => {
                if !self.at_cursor(cursor) {
                    return;
                }
                self.cursor = (self.cursor + 1).min(self.active.len());
                self.advance();
            }
            Task::Dispatch { route, choice } => self.dispatch(route, choice),
        }
    }

    fn at_cursor(&self, cursor: usize) -> bool {
        if cursor != self.cursor {
            tracing::warn!(
                expected = self.cursor,
                got = cursor,
                "task does not match cursor; ignoring"
            );
            return false;
        }
        true
    }

    fn append_step(&mut self, active: &ActiveStep) -> EntryId {
        let bindings = step_bindings(&active.step, &self.table.links);
        let element = render_step(&active.step, &bindings);
        self.append_entry(
            Sender::Bot,
            active.phase.clone(),
            Some(active.index),
            element,
        )
    }

    pub(super) fn append_entry(
        &mut self,
        sender: Sender,
        phase: PhaseId,
        step_index: Option<usize>,
        element: RenderedElement,
    ) -> EntryId {
        self.next_entry_id += 1;
        let id = EntryId(self.next_entry_id);
        self.transcript.push(TranscriptEntry {
            id,
            sender,
            phase,
            step_index,
            element,
        });
        self.emit(PlayerEvent::EntryAppended { id });
        id
    }
}

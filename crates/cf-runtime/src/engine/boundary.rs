use cf_core::{Binding, Sender};

use super::*;
use crate::render::render_user_echo;

impl FunnelPlayer {
    /// Answers the pending choice with `option_id`. Ids outside the pending
    /// set are ignored. Returns whether the choice was taken.
    pub fn resolve_choice(&mut self, option_id: &str) -> bool {
        let Some(choice) = self.pending.clone() else {
            tracing::warn!(option = option_id, "no pending choice; ignoring");
            return false;
        };
        let Pending::Choice { phase, options, .. } = &choice else {
            tracing::warn!(option = option_id, "pending halt is an action prompt; ignoring");
            return false;
        };
        let Some(option) = options.iter().find(|option| option.id == option_id) else {
            tracing::warn!(
                phase = %phase,
                option = option_id,
                "option is not part of the pending choice; ignoring"
            );
            return false;
        };

        let phase = phase.clone();
        let echo = render_user_echo(&option.label);
        self.pending = None;
        self.append_entry(Sender::User, phase.clone(), None, echo);
        self.note_interaction();

        match self.table.routes.lookup(&phase, option_id).cloned() {
            Some(route) => {
                tracing::debug!(phase = %phase, option = option_id, ?route, "routing choice");
                self.scheduler.schedule(
                    self.route_delay_ms,
                    self.generation,
                    Task::Dispatch { route, choice },
                );
            }
            None => {
                tracing::warn!(phase = %phase, option = option_id, "option has no route");
                self.emit(PlayerEvent::Idle);
            }
        }
        true
    }

    /// Answers the pending action prompt. An explicit `target` wins over the
    /// prompt's own; with neither the player goes idle.
    pub fn resolve_action(&mut self, target: Option<PhaseId>) -> bool {
        let Some(Pending::Action {
            target: own_target,
            label,
            ..
        }) = self.pending.clone()
        else {
            tracing::warn!("no pending action; ignoring");
            return false;
        };

        self.pending = None;
        self.note_interaction();
        match target.or(own_target) {
            Some(phase) => {
                tracing::debug!(action = %label, phase = %phase, "action resolved");
                self.load_phase(phase);
            }
            None => {
                tracing::warn!(action = %label, "action has no target phase");
                self.emit(PlayerEvent::Idle);
            }
        }
        true
    }

    /// Runs whatever a rendered control is bound to.
    pub fn activate(&mut self, binding: &Binding) -> bool {
        match binding {
            Binding::Choose { option_id } => self.resolve_choice(option_id),
            Binding::Action { target } => self.resolve_action(target.clone()),
            Binding::OpenLink { url } => {
                self.open_url(url);
                true
            }
        }
    }

    /// Fire-and-forget external navigation.
    pub fn open_url(&mut self, url: &str) {
        if let Err(error) = self.host.open_url(url) {
            tracing::warn!(url, %error, "opening link failed");
        }
        self.emit(PlayerEvent::LinkOpened {
            url: url.to_string(),
        });
    }

    pub(super) fn dispatch(&mut self, route: Route, choice: Pending) {
        match route {
            Route::Goto { phase } => self.load_phase(phase),
            Route::OpenLink { link, rearm } => {
                match self.table.link_url(&link).map(str::to_string) {
                    Some(url) => self.open_url(&url),
                    None => tracing::warn!(link = %link, "route names an undeclared link"),
                }
                if rearm {
                    if let Pending::Choice { phase, options, .. } = &choice {
                        self.emit(PlayerEvent::AwaitingChoice {
                            phase: phase.clone(),
                            options: options.clone(),
                        });
                    }
                    self.pending = Some(choice);
                } else {
                    self.emit(PlayerEvent::Idle);
                }
            }
        }
    }

    fn note_interaction(&mut self) {
        if !self.interacted {
            self.interacted = true;
            self.host.on_interaction();
        }
    }
}

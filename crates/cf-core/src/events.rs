use serde::{Deserialize, Serialize};

use crate::types::{ChoiceOption, EntryId, PhaseId};

/// Observable side of the player, drained by whoever presents it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event", rename_all = "camelCase")]
pub enum PlayerEvent {
    PhaseLoaded {
        phase: PhaseId,
    },
    ChainSpliced {
        from: PhaseId,
        to: PhaseId,
    },
    TypingStarted,
    TypingStopped,
    EntryAppended {
        id: EntryId,
    },
    AwaitingChoice {
        phase: PhaseId,
        options: Vec<ChoiceOption>,
    },
    AwaitingAction {
        label: String,
        target: Option<PhaseId>,
    },
    LinkOpened {
        url: String,
    },
    Restarted,
    Idle,
}

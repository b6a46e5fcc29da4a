use std::collections::BTreeMap;

use cf_core::{PhaseId, TranscriptEntry};

#[derive(Debug, Clone)]
pub(crate) struct LoadedFunnels {
    pub(crate) id: String,
    pub(crate) title: String,
    pub(crate) funnels_xml: BTreeMap<String, String>,
    /// Funnel requested with `--funnel`, if any.
    pub(crate) funnel: Option<String>,
    pub(crate) builtin: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum BoundaryEvent {
    Choices,
    Action,
    Idle,
}

/// Everything that happened between two interactive halts.
#[derive(Debug, Clone)]
pub(crate) struct BoundaryResult {
    pub(crate) event: BoundaryEvent,
    pub(crate) phase: PhaseId,
    pub(crate) entries: Vec<TranscriptEntry>,
    pub(crate) opened_links: Vec<String>,
    pub(crate) choices: Vec<(String, String)>,
    pub(crate) action_label: Option<String>,
    pub(crate) clock_ms: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum TuiCommandAction {
    NotHandled,
    Continue,
    RefreshBoundary,
    Quit,
}

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::body::MessageBody;
use crate::element::RenderedElement;
use crate::timing::{
    DEFAULT_POST_DISPLAY_MS, DEFAULT_TYPING_MS, IMAGE_CAROUSEL_SETTLE_MS,
    PRICING_OFFER_SETTLE_MS, TESTIMONIAL_CAROUSEL_SETTLE_MS, VALUE_BREAKDOWN_SETTLE_MS,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceLocation {
    pub line: usize,
    pub column: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceSpan {
    pub start: SourceLocation,
    pub end: SourceLocation,
}

impl SourceSpan {
    pub fn synthetic() -> Self {
        Self {
            start: SourceLocation { line: 1, column: 1 },
            end: SourceLocation { line: 1, column: 1 },
        }
    }
}

/// Phase identifier. Authors use integers ("1", "21") or symbolic keys
/// ("social-proof"); both are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PhaseId(pub String);

impl PhaseId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Display for PhaseId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PhaseId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChoiceOption {
    pub id: String,
    pub label: String,
    pub sublabel: Option<String>,
    pub icon: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ActionStyle {
    #[default]
    Standard,
    Subtle,
    HighImpact,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CarouselSlide {
    pub id: String,
    pub image: Option<String>,
    pub caption: Option<String>,
    pub text: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Testimonial {
    #[serde(rename_all = "camelCase")]
    Quote {
        name: String,
        role: Option<String>,
        image: Option<String>,
        highlight: Option<String>,
        text: String,
    },
    #[serde(rename_all = "camelCase")]
    Authority { image: Option<String>, text: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueItem {
    pub label: String,
    pub value: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PricingOffer {
    pub original_price: String,
    pub current_price: String,
    pub badge: Option<String>,
    pub note: Option<String>,
    pub cta_label: String,
    pub cta_link: Option<String>,
    pub ghost_label: String,
    pub ghost_link: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DecorativeKind {
    ImageCarousel,
    TestimonialCarousel,
    ValueBreakdown,
    PricingOffer,
}

/// Variant-specific payload of a decorative step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DecorativeBlock {
    ImageCarousel { slides: Vec<CarouselSlide> },
    TestimonialCarousel { testimonials: Vec<Testimonial> },
    ValueBreakdown { items: Vec<ValueItem>, total: String },
    PricingOffer(PricingOffer),
}

impl DecorativeBlock {
    pub fn kind(&self) -> DecorativeKind {
        match self {
            Self::ImageCarousel { .. } => DecorativeKind::ImageCarousel,
            Self::TestimonialCarousel { .. } => DecorativeKind::TestimonialCarousel,
            Self::ValueBreakdown { .. } => DecorativeKind::ValueBreakdown,
            Self::PricingOffer(_) => DecorativeKind::PricingOffer,
        }
    }

    pub fn settle_ms(&self) -> u64 {
        match self.kind() {
            DecorativeKind::ImageCarousel => IMAGE_CAROUSEL_SETTLE_MS,
            DecorativeKind::TestimonialCarousel => TESTIMONIAL_CAROUSEL_SETTLE_MS,
            DecorativeKind::ValueBreakdown => VALUE_BREAKDOWN_SETTLE_MS,
            DecorativeKind::PricingOffer => PRICING_OFFER_SETTLE_MS,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum StepDescriptor {
    #[serde(rename_all = "camelCase")]
    Message {
        body: MessageBody,
        #[serde(default)]
        typing_duration_ms: Option<u64>,
        #[serde(default)]
        post_display_delay_ms: Option<u64>,
        #[serde(default)]
        emphasized: bool,
        #[serde(default)]
        icon: Option<String>,
    },
    ChoiceSet {
        options: Vec<ChoiceOption>,
    },
    #[serde(rename_all = "camelCase")]
    ActionPrompt {
        label: String,
        target_phase: Option<PhaseId>,
        #[serde(default)]
        style: ActionStyle,
    },
    Decorative {
        block: DecorativeBlock,
    },
}

impl StepDescriptor {
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message {
            body: MessageBody::plain(text),
            typing_duration_ms: None,
            post_display_delay_ms: None,
            emphasized: false,
            icon: None,
        }
    }

    pub fn is_interactive(&self) -> bool {
        matches!(self, Self::ChoiceSet { .. } | Self::ActionPrompt { .. })
    }

    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Message { .. } => "message",
            Self::ChoiceSet { .. } => "choice",
            Self::ActionPrompt { .. } => "action",
            Self::Decorative { .. } => "decorative",
        }
    }
}

/// Effective typing window of a message, falling back to the default.
pub fn typing_duration(typing_duration_ms: Option<u64>) -> u64 {
    typing_duration_ms.unwrap_or(DEFAULT_TYPING_MS)
}

/// Effective reading window of a message, falling back to the default.
pub fn post_display_delay(post_display_delay_ms: Option<u64>) -> u64 {
    post_display_delay_ms.unwrap_or(DEFAULT_POST_DISPLAY_MS)
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Phase {
    pub id: PhaseId,
    pub title: Option<String>,
    pub steps: Vec<StepDescriptor>,
    pub chain: Option<PhaseId>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Route {
    Goto { phase: PhaseId },
    OpenLink { link: String, rearm: bool },
}

/// Static `(phase, option id) -> route` mapping.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoutingTable {
    pub by_phase: BTreeMap<PhaseId, BTreeMap<String, Route>>,
}

impl RoutingTable {
    pub fn insert(&mut self, phase: PhaseId, option_id: impl Into<String>, route: Route) {
        self.by_phase
            .entry(phase)
            .or_default()
            .insert(option_id.into(), route);
    }

    pub fn lookup(&self, phase: &PhaseId, option_id: &str) -> Option<&Route> {
        self.by_phase
            .get(phase)
            .and_then(|routes| routes.get(option_id))
    }

    pub fn len(&self) -> usize {
        self.by_phase.values().map(BTreeMap::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PhaseId, &String, &Route)> {
        self.by_phase.iter().flat_map(|(phase, routes)| {
            routes
                .iter()
                .map(move |(option_id, route)| (phase, option_id, route))
        })
    }
}

/// The compiled, read-only conversation script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptTable {
    pub name: String,
    pub entry: PhaseId,
    pub phases: BTreeMap<PhaseId, Phase>,
    pub links: BTreeMap<String, String>,
    pub routes: RoutingTable,
}

impl ScriptTable {
    pub fn new(name: impl Into<String>, entry: impl Into<PhaseId>) -> Self {
        Self {
            name: name.into(),
            entry: entry.into(),
            phases: BTreeMap::new(),
            links: BTreeMap::new(),
            routes: RoutingTable::default(),
        }
    }

    pub fn phase(&self, id: &PhaseId) -> Option<&Phase> {
        self.phases.get(id)
    }

    /// Steps of a phase; unknown phases resolve to an empty list.
    pub fn steps_for(&self, id: &PhaseId) -> &[StepDescriptor] {
        self.phases
            .get(id)
            .map(|phase| phase.steps.as_slice())
            .unwrap_or(&[])
    }

    pub fn chain_of(&self, id: &PhaseId) -> Option<&PhaseId> {
        self.phases.get(id).and_then(|phase| phase.chain.as_ref())
    }

    pub fn link_url(&self, link: &str) -> Option<&str> {
        self.links.get(link).map(String::as_str)
    }
}

impl From<String> for PhaseId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Sender {
    Bot,
    User,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntryId(pub u64);

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "msg-{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TranscriptEntry {
    pub id: EntryId,
    pub sender: Sender,
    pub phase: PhaseId,
    pub step_index: Option<usize>,
    pub element: RenderedElement,
}

//! Timing constants shared by the compiler (defaults) and the runtime.

pub const DEFAULT_TYPING_MS: u64 = 800;
pub const DEFAULT_POST_DISPLAY_MS: u64 = 300;

/// Delay between a visitor picking an option and the branch being dispatched.
pub const CHOICE_ROUTE_DELAY_MS: u64 = 500;

pub const IMAGE_CAROUSEL_SETTLE_MS: u64 = 500;
pub const TESTIMONIAL_CAROUSEL_SETTLE_MS: u64 = 500;
pub const VALUE_BREAKDOWN_SETTLE_MS: u64 = 800;
pub const PRICING_OFFER_SETTLE_MS: u64 = 800;

/// Offsets (after a triggering change) at which the transcript is re-pinned
/// to the bottom, so late layout changes are still followed.
pub const AUTOSCROLL_RETRY_OFFSETS_MS: [u64; 4] = [0, 100, 300, 500];

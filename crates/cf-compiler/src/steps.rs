use cf_core::{
    ActionStyle, CarouselSlide, ChoiceOption, DecorativeBlock, FunnelError, PhaseId,
    PricingOffer, Route, StepDescriptor, Testimonial, ValueItem,
};
use cf_parser::MarkupElement;

use crate::attrs::{bool_attr, expect_attributes, millis_attr, optional_attr, required_attr};
use crate::body::compile_message_body;

const DEFAULT_CTA_LABEL: &str = "AMANKAN SLOT SAYA";
const DEFAULT_GHOST_LABEL: &str = "Masih ragu? Masuk Komunitas Gratis dulu biar gak salah arah.";

/// A compiled step plus the routes its options declare.
pub(crate) struct CompiledStep {
    pub(crate) step: StepDescriptor,
    pub(crate) routes: Vec<(String, Route)>,
}

impl From<StepDescriptor> for CompiledStep {
    fn from(step: StepDescriptor) -> Self {
        Self {
            step,
            routes: Vec::new(),
        }
    }
}

pub(crate) fn compile_step(node: &MarkupElement) -> Result<CompiledStep, FunnelError> {
    match node.name.as_str() {
        "message" => compile_message(node).map(CompiledStep::from),
        "choice" => compile_choice(node),
        "action" => compile_action(node).map(CompiledStep::from),
        "carousel" => compile_carousel(node).map(CompiledStep::from),
        "testimonials" => compile_testimonials(node).map(CompiledStep::from),
        "value-breakdown" => compile_value_breakdown(node).map(CompiledStep::from),
        "pricing" => compile_pricing(node).map(CompiledStep::from),
        other => Err(unknown_element(node, other, "phase")),
    }
}

fn unknown_element(node: &MarkupElement, name: &str, parent: &str) -> FunnelError {
    FunnelError::with_span(
        "FUNNEL_UNKNOWN_ELEMENT",
        format!("<{}> is not allowed inside <{}>.", name, parent),
        node.location.clone(),
    )
}

fn reject_text(node: &MarkupElement) -> Result<(), FunnelError> {
    if node.has_non_blank_text() {
        return Err(FunnelError::with_span(
            "FUNNEL_TEXT_NOT_ALLOWED",
            format!("<{}> cannot contain inline text.", node.name),
            node.location.clone(),
        ));
    }
    Ok(())
}

fn required_text(node: &MarkupElement) -> Result<String, FunnelError> {
    let text = node.text_content();
    if text.is_empty() {
        return Err(FunnelError::with_span(
            "FUNNEL_EMPTY_CONTENT",
            format!("<{}> requires non-empty content.", node.name),
            node.location.clone(),
        ));
    }
    Ok(text)
}

fn compile_message(node: &MarkupElement) -> Result<StepDescriptor, FunnelError> {
    expect_attributes(node, &["typing", "delay", "emphasized", "icon"])?;
    Ok(StepDescriptor::Message {
        body: compile_message_body(node)?,
        typing_duration_ms: millis_attr(node, "typing")?,
        post_display_delay_ms: millis_attr(node, "delay")?,
        emphasized: bool_attr(node, "emphasized")?,
        icon: optional_attr(node, "icon"),
    })
}

fn compile_choice(node: &MarkupElement) -> Result<CompiledStep, FunnelError> {
    expect_attributes(node, &[])?;
    reject_text(node)?;

    let mut options = Vec::new();
    let mut routes = Vec::new();
    for child in node.elements() {
        if child.name != "option" {
            return Err(unknown_element(child, &child.name, "choice"));
        }
        expect_attributes(
            child,
            &["id", "label", "sublabel", "icon", "goto", "open", "rearm"],
        )?;
        let id = required_attr(child, "id")?;
        options.push(ChoiceOption {
            id: id.clone(),
            label: required_attr(child, "label")?,
            sublabel: optional_attr(child, "sublabel"),
            icon: optional_attr(child, "icon"),
        });

        let rearm = bool_attr(child, "rearm")?;
        match (optional_attr(child, "goto"), optional_attr(child, "open")) {
            (Some(_), Some(_)) => {
                return Err(FunnelError::with_span(
                    "FUNNEL_OPTION_ROUTE_CONFLICT",
                    format!(
                        "Option \"{}\" declares both goto and open; pick one branch.",
                        id
                    ),
                    child.location.clone(),
                ))
            }
            (Some(_), None) if rearm => {
                return Err(FunnelError::with_span(
                    "FUNNEL_ATTR_INVALID",
                    format!("Option \"{}\" uses rearm without an open branch.", id),
                    child.location.clone(),
                ))
            }
            (Some(phase), None) => routes.push((
                id,
                Route::Goto {
                    phase: PhaseId::new(phase),
                },
            )),
            (None, Some(link)) => routes.push((id, Route::OpenLink { link, rearm })),
            (None, None) => {}
        }
    }

    Ok(CompiledStep {
        step: StepDescriptor::ChoiceSet { options },
        routes,
    })
}

fn compile_action(node: &MarkupElement) -> Result<StepDescriptor, FunnelError> {
    expect_attributes(node, &["label", "goto", "style"])?;
    reject_text(node)?;
    let style = match node.attr_trimmed("style") {
        None | Some("standard") => ActionStyle::Standard,
        Some("subtle") => ActionStyle::Subtle,
        Some("high-impact") => ActionStyle::HighImpact,
        Some(other) => {
            return Err(FunnelError::with_span(
                "FUNNEL_ATTR_INVALID",
                format!(
                    "Unsupported action style \"{}\". Use standard, subtle or high-impact.",
                    other
                ),
                node.location.clone(),
            ))
        }
    };
    Ok(StepDescriptor::ActionPrompt {
        label: required_attr(node, "label")?,
        target_phase: optional_attr(node, "goto").map(PhaseId::new),
        style,
    })
}

fn compile_carousel(node: &MarkupElement) -> Result<StepDescriptor, FunnelError> {
    expect_attributes(node, &[])?;
    reject_text(node)?;
    let mut slides = Vec::new();
    for (index, child) in node.elements().enumerate() {
        if child.name != "slide" {
            return Err(unknown_element(child, &child.name, "carousel"));
        }
        expect_attributes(child, &["id", "image", "caption"])?;
        let text = child.text_content();
        slides.push(CarouselSlide {
            id: optional_attr(child, "id").unwrap_or_else(|| format!("slide-{}", index + 1)),
            image: optional_attr(child, "image"),
            caption: optional_attr(child, "caption"),
            text: (!text.is_empty()).then_some(text),
        });
    }
    Ok(StepDescriptor::Decorative {
        block: DecorativeBlock::ImageCarousel { slides },
    })
}

fn compile_testimonials(node: &MarkupElement) -> Result<StepDescriptor, FunnelError> {
    expect_attributes(node, &[])?;
    reject_text(node)?;
    let mut testimonials = Vec::new();
    for child in node.elements() {
        let testimonial = match child.name.as_str() {
            "testimonial" => {
                expect_attributes(child, &["name", "role", "image", "highlight"])?;
                Testimonial::Quote {
                    name: required_attr(child, "name")?,
                    role: optional_attr(child, "role"),
                    image: optional_attr(child, "image"),
                    highlight: optional_attr(child, "highlight"),
                    text: required_text(child)?,
                }
            }
            "authority" => {
                expect_attributes(child, &["image"])?;
                Testimonial::Authority {
                    image: optional_attr(child, "image"),
                    text: required_text(child)?,
                }
            }
            other => return Err(unknown_element(child, other, "testimonials")),
        };
        testimonials.push(testimonial);
    }
    Ok(StepDescriptor::Decorative {
        block: DecorativeBlock::TestimonialCarousel { testimonials },
    })
}

fn compile_value_breakdown(node: &MarkupElement) -> Result<StepDescriptor, FunnelError> {
    expect_attributes(node, &["total"])?;
    reject_text(node)?;
    let mut items = Vec::new();
    for child in node.elements() {
        if child.name != "item" {
            return Err(unknown_element(child, &child.name, "value-breakdown"));
        }
        expect_attributes(child, &["label", "value"])?;
        items.push(ValueItem {
            label: required_attr(child, "label")?,
            value: required_attr(child, "value")?,
        });
    }
    Ok(StepDescriptor::Decorative {
        block: DecorativeBlock::ValueBreakdown {
            items,
            total: required_attr(node, "total")?,
        },
    })
}

fn compile_pricing(node: &MarkupElement) -> Result<StepDescriptor, FunnelError> {
    expect_attributes(
        node,
        &[
            "original",
            "current",
            "badge",
            "note",
            "cta-label",
            "cta-link",
            "ghost-label",
            "ghost-link",
        ],
    )?;
    reject_text(node)?;
    Ok(StepDescriptor::Decorative {
        block: DecorativeBlock::PricingOffer(PricingOffer {
            original_price: required_attr(node, "original")?,
            current_price: required_attr(node, "current")?,
            badge: optional_attr(node, "badge"),
            note: optional_attr(node, "note"),
            cta_label: optional_attr(node, "cta-label")
                .unwrap_or_else(|| DEFAULT_CTA_LABEL.to_string()),
            cta_link: optional_attr(node, "cta-link"),
            ghost_label: optional_attr(node, "ghost-label")
                .unwrap_or_else(|| DEFAULT_GHOST_LABEL.to_string()),
            ghost_link: optional_attr(node, "ghost-link"),
        }),
    })
}

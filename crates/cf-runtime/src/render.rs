//! Step Renderer: pure mapping from a step descriptor plus the bindings the
//! player supplies to a displayable element.

use std::collections::BTreeMap;

use cf_core::{
    BodySpan, Binding, CarouselSlide, Control, DecorativeBlock, ElementKind, MessageBody,
    PricingOffer, RenderedElement, RenderedLine, RunStyle, StepDescriptor, StyledRun,
    Testimonial, ValueItem,
};

/// Bindings for every control slot a step exposes, in slot order. A `None`
/// slot renders no control.
pub fn step_bindings(step: &StepDescriptor, links: &BTreeMap<String, String>) -> Vec<Option<Binding>> {
    match step {
        StepDescriptor::ChoiceSet { options } => options
            .iter()
            .map(|option| {
                Some(Binding::Choose {
                    option_id: option.id.clone(),
                })
            })
            .collect(),
        StepDescriptor::ActionPrompt { target_phase, .. } => vec![Some(Binding::Action {
            target: target_phase.clone(),
        })],
        StepDescriptor::Decorative {
            block: DecorativeBlock::PricingOffer(offer),
        } => [&offer.cta_link, &offer.ghost_link]
            .into_iter()
            .map(|link| {
                link.as_ref()
                    .and_then(|id| links.get(id))
                    .map(|url| Binding::OpenLink { url: url.clone() })
            })
            .collect(),
        StepDescriptor::Message { .. } | StepDescriptor::Decorative { .. } => Vec::new(),
    }
}

pub fn render_step(step: &StepDescriptor, bindings: &[Option<Binding>]) -> RenderedElement {
    match step {
        StepDescriptor::Message {
            body, emphasized, ..
        } => {
            let mut element = RenderedElement::new(ElementKind::BotBubble {
                emphasized: *emphasized,
            });
            element.lines = render_body(body);
            element
        }
        StepDescriptor::ChoiceSet { options } => {
            let mut element = RenderedElement::new(ElementKind::OptionList);
            element.controls = options
                .iter()
                .zip(bindings)
                .filter_map(|(option, binding)| {
                    binding.clone().map(|binding| Control {
                        label: option.label.clone(),
                        sublabel: option.sublabel.clone(),
                        icon: option.icon.clone(),
                        binding,
                    })
                })
                .collect();
            element
        }
        StepDescriptor::ActionPrompt { label, style, .. } => {
            let mut element = RenderedElement::new(ElementKind::ActionButton { style: *style });
            if let Some(Some(binding)) = bindings.first() {
                element.controls.push(Control {
                    label: label.clone(),
                    sublabel: None,
                    icon: None,
                    binding: binding.clone(),
                });
            }
            element
        }
        StepDescriptor::Decorative { block } => render_decorative(block, bindings),
    }
}

/// Transcript echo of what the visitor picked.
pub fn render_user_echo(label: &str) -> RenderedElement {
    let mut element = RenderedElement::new(ElementKind::UserEcho);
    element.lines.push(RenderedLine::styled(label, RunStyle::Body));
    element
}

fn render_body(body: &MessageBody) -> Vec<RenderedLine> {
    body.lines()
        .into_iter()
        .map(|spans| RenderedLine {
            runs: spans
                .iter()
                .filter_map(|span| {
                    let style = match span {
                        BodySpan::Plain { .. } => RunStyle::Body,
                        BodySpan::Strong { .. } => RunStyle::Strong,
                        BodySpan::Emphasis { .. } => RunStyle::Emphasis,
                        BodySpan::Heading { .. } => RunStyle::Heading,
                        BodySpan::Break => return None,
                    };
                    Some(StyledRun {
                        text: span.text().to_string(),
                        style,
                    })
                })
                .collect(),
        })
        .collect()
}

fn render_decorative(block: &DecorativeBlock, bindings: &[Option<Binding>]) -> RenderedElement {
    match block {
        DecorativeBlock::ImageCarousel { slides } => {
            let mut element = RenderedElement::new(ElementKind::ImageCarousel);
            element.pages = slides.iter().map(slide_page).collect();
            element
        }
        DecorativeBlock::TestimonialCarousel { testimonials } => {
            let mut element = RenderedElement::new(ElementKind::TestimonialCarousel);
            element.pages = testimonials.iter().map(testimonial_page).collect();
            element
        }
        DecorativeBlock::ValueBreakdown { items, total } => {
            let mut element = RenderedElement::new(ElementKind::ValueBreakdown);
            element.lines = items.iter().map(value_line).collect();
            element.lines.push(RenderedLine {
                runs: vec![
                    run("Total value: ", RunStyle::Strong),
                    run(total, RunStyle::Price),
                ],
            });
            element
        }
        DecorativeBlock::PricingOffer(offer) => render_pricing(offer, bindings),
    }
}

fn run(text: impl Into<String>, style: RunStyle) -> StyledRun {
    StyledRun {
        text: text.into(),
        style,
    }
}

fn slide_page(slide: &CarouselSlide) -> Vec<RenderedLine> {
    let mut lines = Vec::new();
    if let Some(image) = &slide.image {
        lines.push(RenderedLine::styled(format!("[image {}]", image), RunStyle::Muted));
    }
    if let Some(caption) = &slide.caption {
        lines.push(RenderedLine::styled(caption, RunStyle::Accent));
    }
    if let Some(text) = &slide.text {
        lines.push(RenderedLine::styled(text, RunStyle::Body));
    }
    lines
}

fn testimonial_page(testimonial: &Testimonial) -> Vec<RenderedLine> {
    match testimonial {
        Testimonial::Quote {
            name,
            role,
            image,
            highlight,
            text,
        } => {
            let mut lines = Vec::new();
            let mut header = vec![run(name, RunStyle::Strong)];
            if let Some(role) = role {
                header.push(run(format!(" · {}", role), RunStyle::Muted));
            }
            lines.push(RenderedLine { runs: header });
            if let Some(highlight) = highlight {
                lines.push(RenderedLine::styled(format!("★ {}", highlight), RunStyle::Accent));
            }
            lines.push(RenderedLine::styled(format!("\"{}\"", text), RunStyle::Emphasis));
            if let Some(image) = image {
                lines.push(RenderedLine::styled(format!("[image {}]", image), RunStyle::Muted));
            }
            lines
        }
        Testimonial::Authority { image, text } => {
            let mut lines = vec![RenderedLine::styled(text, RunStyle::Strong)];
            if let Some(image) = image {
                lines.push(RenderedLine::styled(format!("[image {}]", image), RunStyle::Muted));
            }
            lines
        }
    }
}

fn value_line(item: &ValueItem) -> RenderedLine {
    RenderedLine {
        runs: vec![
            run(format!("✓ {}", item.label), RunStyle::Body),
            run(format!("  {}", item.value), RunStyle::Muted),
        ],
    }
}

fn render_pricing(offer: &PricingOffer, bindings: &[Option<Binding>]) -> RenderedElement {
    let mut element = RenderedElement::new(ElementKind::PricingOffer);
    if let Some(badge) = &offer.badge {
        element.lines.push(RenderedLine::styled(badge, RunStyle::Accent));
    }
    element.lines.push(RenderedLine {
        runs: vec![
            run(&offer.original_price, RunStyle::Struck),
            run("  ", RunStyle::Body),
            run(&offer.current_price, RunStyle::Price),
        ],
    });
    if let Some(note) = &offer.note {
        element.lines.push(RenderedLine::styled(note, RunStyle::Muted));
    }

    let labels = [&offer.cta_label, &offer.ghost_label];
    for (label, binding) in labels.into_iter().zip(bindings) {
        if let Some(binding) = binding {
            element.controls.push(Control {
                label: label.clone(),
                sublabel: None,
                icon: None,
                binding: binding.clone(),
            });
        }
    }
    element
}

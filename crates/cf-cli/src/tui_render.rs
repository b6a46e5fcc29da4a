#![cfg(not(coverage))]

use cf_core::{ElementKind, RenderedLine, RunStyle, Sender, TranscriptEntry};
use cf_runtime::{FunnelPlayer, Pending, WidgetState};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Paragraph, Wrap};
use ratatui::Frame;

use crate::tui_state::{TuiUiState, OPTION_VIEWPORT_ROWS};
use crate::LoadedFunnels;

const ELLIPSIS: &str = "…";
const GUTTER_WIDTH: usize = 2;

pub(crate) fn render_tui(
    frame: &mut Frame<'_>,
    ui: &mut TuiUiState,
    player: &FunnelPlayer,
    loaded: &LoadedFunnels,
    now: u64,
) {
    let terminal_width = frame.area().width as usize;
    let terminal_rows = frame.area().height as usize;
    let content_width = terminal_width.saturating_sub(2).max(16);

    let mut reserved_rows = 3usize + 1 + OPTION_VIEWPORT_ROWS + 1 + 1;
    if ui.help_visible {
        reserved_rows += 1;
    }
    let viewport_rows = terminal_rows.saturating_sub(reserved_rows).max(1);

    let rows = transcript_rows(player, &ui.widgets, content_width, now);
    ui.shell.set_layout(rows.len(), viewport_rows);
    let top = ui.shell.scroll_top();
    let mut visible = rows
        .into_iter()
        .skip(top)
        .take(viewport_rows)
        .collect::<Vec<_>>();
    visible.resize(viewport_rows, Line::from(" "));

    let gray = Style::default().fg(Color::Gray);
    let header = truncate_to_width(
        &format!(
            "{} | {} | phase {}",
            player.table().name,
            loaded.title,
            player.current_phase()
        ),
        content_width,
    );
    let scroll_hint = if ui.shell.is_pinned() {
        String::new()
    } else {
        " | scrolled".to_string()
    };
    let status = truncate_to_width(
        &format!("status: {}{}", ui.status, scroll_hint),
        content_width,
    );
    let divider = "─".repeat(content_width);

    let mut lines_out: Vec<Line<'static>> = Vec::new();
    lines_out.push(Line::from(header));
    lines_out.push(Line::from(Span::styled(status, gray)));
    lines_out.push(Line::from(Span::styled(divider.clone(), gray)));
    lines_out.extend(visible);
    lines_out.push(Line::from(Span::styled(divider, gray)));
    lines_out.extend(interaction_rows(player, ui, content_width));
    lines_out.push(Line::from(Span::styled(
        truncate_to_width(
            "keys: up/down select | enter answer | left/right slides | c/g offer | pgup/pgdn scroll | r restart | h help | q quit",
            content_width,
        ),
        Style::default().fg(Color::Yellow),
    )));
    if ui.help_visible {
        lines_out.push(Line::from(Span::styled(
            truncate_to_width(
                "links are handed to the host and echoed in the status line. arrows scroll when nothing is pending.",
                content_width,
            ),
            Style::default().fg(Color::Magenta),
        )));
    }

    let paragraph = Paragraph::new(lines_out).wrap(Wrap { trim: false });
    frame.render_widget(paragraph, frame.area());
}

/// Fixed-height pane under the transcript: pending options, the action
/// prompt, or the end marker.
pub(crate) fn interaction_rows(
    player: &FunnelPlayer,
    ui: &TuiUiState,
    width: usize,
) -> Vec<Line<'static>> {
    let text_width = width.saturating_sub(2).max(8);
    let mut rows = Vec::with_capacity(OPTION_VIEWPORT_ROWS + 1);

    match player.pending() {
        Some(Pending::Choice { options, .. }) => {
            for row_index in 0..OPTION_VIEWPORT_ROWS {
                let absolute = ui.option_scroll_offset + row_index;
                let Some(option) = options.get(absolute) else {
                    rows.push(Line::from(" "));
                    continue;
                };
                let selected = absolute == ui.selected_option;
                let label = match &option.sublabel {
                    Some(sublabel) => format!("{} · {}", option.label, sublabel),
                    None => option.label.clone(),
                };
                let style = if selected {
                    Style::default().fg(Color::Green)
                } else {
                    Style::default()
                };
                rows.push(Line::from(Span::styled(
                    format!(
                        "{}{}",
                        if selected { "> " } else { "  " },
                        truncate_to_width(&label, text_width)
                    ),
                    style,
                )));
            }
            let window = if options.len() > OPTION_VIEWPORT_ROWS {
                format!(
                    "options {}-{} / {}",
                    ui.option_scroll_offset + 1,
                    (ui.option_scroll_offset + OPTION_VIEWPORT_ROWS).min(options.len()),
                    options.len()
                )
            } else {
                " ".to_string()
            };
            rows.push(Line::from(Span::styled(
                window,
                Style::default().fg(Color::Gray),
            )));
        }
        Some(Pending::Action { label, .. }) => {
            rows.push(Line::from(Span::styled(
                format!("> {} [enter]", truncate_to_width(label, text_width)),
                Style::default().fg(Color::Green),
            )));
        }
        None if player.is_idle() => {
            rows.push(Line::from(Span::styled(
                "[end] r restarts".to_string(),
                Style::default().fg(Color::Green),
            )));
        }
        None => {}
    }

    rows.resize(OPTION_VIEWPORT_ROWS + 1, Line::from(" "));
    rows
}

/// The whole transcript wrapped to `width`, plus the typing indicator.
pub(crate) fn transcript_rows(
    player: &FunnelPlayer,
    widgets: &WidgetState,
    width: usize,
    now: u64,
) -> Vec<Line<'static>> {
    let mut rows = Vec::new();
    for entry in player.transcript() {
        rows.extend(entry_rows(entry, widgets.page(entry.id), width));
        rows.push(Line::from(""));
    }
    if player.is_typing() {
        let dots = ".".repeat((now / 300 % 3 + 1) as usize);
        rows.push(Line::from(vec![
            Span::styled("│ ", Style::default().fg(Color::Gray)),
            Span::styled(
                format!("typing{}", dots),
                Style::default()
                    .fg(Color::Gray)
                    .add_modifier(Modifier::ITALIC),
            ),
        ]));
    }
    rows
}

fn entry_rows(entry: &TranscriptEntry, page: usize, width: usize) -> Vec<Line<'static>> {
    let element = &entry.element;
    let (gutter, base) = match (entry.sender, element.kind) {
        (Sender::User, _) => ("» ", Style::default().fg(Color::Cyan)),
        (Sender::Bot, ElementKind::BotBubble { emphasized: true }) => {
            ("│ ", Style::default().add_modifier(Modifier::BOLD))
        }
        (Sender::Bot, _) => ("│ ", Style::default()),
    };

    let mut rows = Vec::new();
    for line in &element.lines {
        rows.extend(wrap_styled_line(line, width, gutter, base));
    }

    if !element.pages.is_empty() {
        for line in element.page(page) {
            rows.extend(wrap_styled_line(line, width, gutter, base));
        }
        rows.push(Line::from(Span::styled(
            format!("  ‹ {}/{} ›", page + 1, element.pages.len()),
            Style::default().fg(Color::Gray),
        )));
    }

    let keys: &[&str] = match element.kind {
        ElementKind::PricingOffer => &["[c] ", "[g] "],
        ElementKind::ActionButton { .. } => &["▶ "],
        _ => &[],
    };
    for (index, control) in element.controls.iter().enumerate() {
        let marker = keys.get(index).copied().unwrap_or("○ ");
        rows.push(Line::from(Span::styled(
            truncate_to_width(&format!("  {}{}", marker, control.label), width),
            Style::default().fg(Color::Green),
        )));
        if let Some(sublabel) = &control.sublabel {
            rows.push(Line::from(Span::styled(
                truncate_to_width(&format!("    {}", sublabel), width),
                Style::default().fg(Color::Gray),
            )));
        }
    }
    rows
}

pub(crate) fn run_style(style: RunStyle) -> Style {
    match style {
        RunStyle::Body => Style::default(),
        RunStyle::Strong => Style::default().add_modifier(Modifier::BOLD),
        RunStyle::Emphasis => Style::default().add_modifier(Modifier::ITALIC),
        RunStyle::Heading => Style::default()
            .fg(Color::Yellow)
            .add_modifier(Modifier::BOLD),
        RunStyle::Muted => Style::default().fg(Color::Gray),
        RunStyle::Accent => Style::default().fg(Color::Cyan),
        RunStyle::Price => Style::default()
            .fg(Color::Green)
            .add_modifier(Modifier::BOLD),
        RunStyle::Struck => Style::default()
            .fg(Color::Gray)
            .add_modifier(Modifier::CROSSED_OUT),
    }
}

/// Splits a styled line into rows of at most `width` columns, gutter
/// included. Adjacent characters of one style stay in one span.
pub(crate) fn wrap_styled_line(
    line: &RenderedLine,
    width: usize,
    gutter: &str,
    base: Style,
) -> Vec<Line<'static>> {
    let text_width = width.saturating_sub(GUTTER_WIDTH).max(1);
    let chars = line
        .runs
        .iter()
        .flat_map(|run| run.text.chars().map(move |ch| (ch, run.style)))
        .collect::<Vec<_>>();
    let gutter_style = Style::default().fg(Color::Gray);
    if chars.is_empty() {
        return vec![Line::from(Span::styled(gutter.to_string(), gutter_style))];
    }

    chars
        .chunks(text_width)
        .map(|chunk| {
            let mut spans = vec![Span::styled(gutter.to_string(), gutter_style)];
            let mut current = String::new();
            let mut current_style = chunk[0].1;
            for (ch, style) in chunk {
                if *style != current_style {
                    spans.push(Span::styled(
                        std::mem::take(&mut current),
                        base.patch(run_style(current_style)),
                    ));
                    current_style = *style;
                }
                current.push(*ch);
            }
            spans.push(Span::styled(current, base.patch(run_style(current_style))));
            Line::from(spans)
        })
        .collect()
}

fn truncate_to_width(value: &str, width: usize) -> String {
    if width == 0 {
        return String::new();
    }
    let chars = value.chars().collect::<Vec<_>>();
    if chars.len() <= width {
        return value.to_string();
    }
    if width == 1 {
        return ELLIPSIS.to_string();
    }
    let mut out = chars.into_iter().take(width - 1).collect::<String>();
    out.push_str(ELLIPSIS);
    out
}

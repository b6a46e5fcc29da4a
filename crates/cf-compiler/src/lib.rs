use std::collections::BTreeMap;

use cf_core::{FunnelError, Phase, PhaseId, ScriptTable};
use cf_parser::{parse_markup_document, MarkupElement};
use tracing::debug;

mod attrs;
mod body;
mod steps;
mod validate;

use attrs::{expect_attributes, optional_attr, required_attr};
use steps::compile_step;

pub use validate::{collect_table_issues, validate_script_table};

/// Compiles one `<funnel>` document into a script table. The table is not
/// validated; call [`validate_script_table`] for the static checks.
pub fn compile_funnel_from_xml(source: &str) -> Result<ScriptTable, FunnelError> {
    let document = parse_markup_document(source)?;
    compile_funnel(&document.root)
}

/// Compiles a set of funnel sources keyed by file path into tables keyed by
/// funnel name.
pub fn compile_funnels_from_xml_map(
    sources: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, ScriptTable>, FunnelError> {
    let mut tables = BTreeMap::new();
    let mut origins: BTreeMap<String, &str> = BTreeMap::new();
    for (path, source) in sources {
        let table = compile_funnel_from_xml(source).map_err(|error| FunnelError {
            message: format!("{}: {}", path, error.message),
            ..error
        })?;
        if let Some(previous) = origins.insert(table.name.clone(), path.as_str()) {
            return Err(FunnelError::new(
                "FUNNEL_NAME_DUPLICATE",
                format!(
                    "Funnel \"{}\" is declared in both \"{}\" and \"{}\".",
                    table.name, previous, path
                ),
            ));
        }
        tables.insert(table.name.clone(), table);
    }
    Ok(tables)
}

fn compile_funnel(root: &MarkupElement) -> Result<ScriptTable, FunnelError> {
    if root.name != "funnel" {
        return Err(FunnelError::with_span(
            "FUNNEL_ROOT_INVALID",
            format!("Root element must be <funnel>, got <{}>.", root.name),
            root.location.clone(),
        ));
    }
    expect_attributes(root, &["name", "entry"])?;
    if root.has_non_blank_text() {
        return Err(FunnelError::with_span(
            "FUNNEL_TEXT_NOT_ALLOWED",
            "<funnel> cannot contain inline text.",
            root.location.clone(),
        ));
    }

    let name = required_attr(root, "name")?;
    let mut table = ScriptTable::new(name, optional_attr(root, "entry").unwrap_or_default());
    let mut first_phase = None;

    for child in root.elements() {
        match child.name.as_str() {
            "link" => {
                expect_attributes(child, &["id", "href"])?;
                let id = required_attr(child, "id")?;
                let href = required_attr(child, "href")?;
                if table.links.insert(id.clone(), href).is_some() {
                    return Err(FunnelError::with_span(
                        "FUNNEL_LINK_DUPLICATE",
                        format!("Link \"{}\" is declared more than once.", id),
                        child.location.clone(),
                    ));
                }
            }
            "phase" => {
                let phase = compile_phase(child, &mut table)?;
                first_phase.get_or_insert_with(|| phase.id.clone());
                if table.phases.contains_key(&phase.id) {
                    return Err(FunnelError::with_span(
                        "FUNNEL_PHASE_DUPLICATE",
                        format!("Phase \"{}\" is declared more than once.", phase.id),
                        child.location.clone(),
                    ));
                }
                table.phases.insert(phase.id.clone(), phase);
            }
            other => {
                return Err(FunnelError::with_span(
                    "FUNNEL_UNKNOWN_ELEMENT",
                    format!("<{}> is not allowed inside <funnel>.", other),
                    child.location.clone(),
                ))
            }
        }
    }

    if table.entry.as_str().is_empty() {
        match first_phase {
            Some(first) => table.entry = first,
            None => {
                return Err(FunnelError::with_span(
                    "FUNNEL_EMPTY_CONTENT",
                    format!("Funnel \"{}\" declares no phases.", table.name),
                    root.location.clone(),
                ))
            }
        }
    }

    debug!(
        funnel = %table.name,
        phases = table.phases.len(),
        routes = table.routes.len(),
        "compiled funnel"
    );
    Ok(table)
}

fn compile_phase(node: &MarkupElement, table: &mut ScriptTable) -> Result<Phase, FunnelError> {
    expect_attributes(node, &["id", "title", "chain"])?;
    if node.has_non_blank_text() {
        return Err(FunnelError::with_span(
            "FUNNEL_TEXT_NOT_ALLOWED",
            "<phase> cannot contain inline text; wrap it in <message>.",
            node.location.clone(),
        ));
    }

    let id = PhaseId::new(required_attr(node, "id")?);
    let mut steps = Vec::new();
    for child in node.elements() {
        let compiled = compile_step(child)?;
        for (option_id, route) in compiled.routes {
            table.routes.insert(id.clone(), option_id, route);
        }
        steps.push(compiled.step);
    }

    Ok(Phase {
        id,
        title: optional_attr(node, "title"),
        steps,
        chain: optional_attr(node, "chain").map(PhaseId::new),
    })
}

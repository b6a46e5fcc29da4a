use std::collections::{BTreeMap, BTreeSet, HashMap};
use std::sync::OnceLock;

use cf_core::{DecorativeBlock, FunnelError, PhaseId, Route, ScriptTable, StepDescriptor};
use regex::Regex;

fn identifier_regex() -> &'static Regex {
    static IDENTIFIER: OnceLock<Regex> = OnceLock::new();
    IDENTIFIER.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9_.-]+$").expect("identifier regex must compile")
    })
}

/// Every authoring defect found in `table`, in a stable order.
pub fn collect_table_issues(table: &ScriptTable) -> Vec<FunnelError> {
    let mut issues = Vec::new();

    if !table.phases.contains_key(&table.entry) {
        issues.push(FunnelError::new(
            "VALIDATE_ENTRY_MISSING",
            format!(
                "Entry phase \"{}\" of funnel \"{}\" is not declared.",
                table.entry, table.name
            ),
        ));
    }

    check_identifiers(table, &mut issues);

    for (phase_id, phase) in &table.phases {
        if let Some(chain) = &phase.chain {
            check_target(table, phase_id, "chain", chain, &mut issues);
        }
        // routes are keyed by (phase, option), so ids must be unique across
        // every choice set of the phase
        let mut phase_options = BTreeSet::new();
        for step in &phase.steps {
            check_step(table, phase_id, step, &mut phase_options, &mut issues);
        }
    }

    for (phase_id, option_id, route) in table.routes.iter() {
        let declared = table
            .steps_for(phase_id)
            .iter()
            .any(|step| match step {
                StepDescriptor::ChoiceSet { options } => {
                    options.iter().any(|option| &option.id == option_id)
                }
                _ => false,
            });
        if !declared {
            issues.push(FunnelError::new(
                "VALIDATE_ROUTE_ORPHAN",
                format!(
                    "Route for option \"{}\" in phase \"{}\" has no matching option.",
                    option_id, phase_id
                ),
            ));
        }
        match route {
            Route::Goto { phase } => {
                check_target(table, phase_id, "goto", phase, &mut issues)
            }
            Route::OpenLink { link, .. } => check_link(table, phase_id, link, &mut issues),
        }
    }

    if let Err(error) = check_chain_cycles(table) {
        issues.push(error);
    }

    issues
}

/// Strict variant: the first collected issue becomes the error.
pub fn validate_script_table(table: &ScriptTable) -> Result<(), FunnelError> {
    match collect_table_issues(table).into_iter().next() {
        Some(issue) => Err(issue),
        None => Ok(()),
    }
}

fn check_identifiers(table: &ScriptTable, issues: &mut Vec<FunnelError>) {
    let mut check = |kind: &str, value: &str| {
        if !identifier_regex().is_match(value) {
            issues.push(FunnelError::new(
                "VALIDATE_IDENTIFIER_INVALID",
                format!(
                    "{} id \"{}\" must match [A-Za-z0-9_.-]+.",
                    kind, value
                ),
            ));
        }
    };
    for phase_id in table.phases.keys() {
        check("Phase", phase_id.as_str());
    }
    for link in table.links.keys() {
        check("Link", link);
    }
    for phase in table.phases.values() {
        for step in &phase.steps {
            if let StepDescriptor::ChoiceSet { options } = step {
                for option in options {
                    check("Option", &option.id);
                }
            }
        }
    }
}

fn check_step<'a>(
    table: &ScriptTable,
    phase_id: &PhaseId,
    step: &'a StepDescriptor,
    phase_options: &mut BTreeSet<&'a str>,
    issues: &mut Vec<FunnelError>,
) {
    match step {
        StepDescriptor::ChoiceSet { options } => {
            if options.is_empty() {
                issues.push(FunnelError::new(
                    "VALIDATE_CHOICE_EMPTY",
                    format!("Phase \"{}\" declares a choice set without options.", phase_id),
                ));
            }
            for option in options {
                if !phase_options.insert(option.id.as_str()) {
                    issues.push(FunnelError::new(
                        "VALIDATE_OPTION_DUPLICATE",
                        format!(
                            "Option \"{}\" is declared twice in phase \"{}\".",
                            option.id, phase_id
                        ),
                    ));
                }
                if table.routes.lookup(phase_id, &option.id).is_none() {
                    issues.push(FunnelError::new(
                        "VALIDATE_ROUTE_MISSING",
                        format!(
                            "Option \"{}\" in phase \"{}\" has no goto or open branch.",
                            option.id, phase_id
                        ),
                    ));
                }
            }
        }
        StepDescriptor::ActionPrompt {
            target_phase: Some(target),
            ..
        } => check_target(table, phase_id, "action", target, issues),
        StepDescriptor::Decorative {
            block: DecorativeBlock::PricingOffer(offer),
        } => {
            for link in [&offer.cta_link, &offer.ghost_link].into_iter().flatten() {
                check_link(table, phase_id, link, issues);
            }
        }
        _ => {}
    }
}

fn check_target(
    table: &ScriptTable,
    from: &PhaseId,
    via: &str,
    target: &PhaseId,
    issues: &mut Vec<FunnelError>,
) {
    if !table.phases.contains_key(target) {
        issues.push(FunnelError::new(
            "VALIDATE_TARGET_MISSING",
            format!(
                "Phase \"{}\" references unknown phase \"{}\" via {}.",
                from, target, via
            ),
        ));
    }
}

fn check_link(table: &ScriptTable, from: &PhaseId, link: &str, issues: &mut Vec<FunnelError>) {
    if table.link_url(link).is_none() {
        issues.push(FunnelError::new(
            "VALIDATE_LINK_MISSING",
            format!("Phase \"{}\" references undeclared link \"{}\".", from, link),
        ));
    }
}

fn check_chain_cycles(table: &ScriptTable) -> Result<(), FunnelError> {
    #[derive(Debug, Copy, Clone, PartialEq, Eq)]
    enum State {
        Visiting,
        Done,
    }

    fn dfs<'a>(
        node: &'a PhaseId,
        chains: &BTreeMap<&'a PhaseId, &'a PhaseId>,
        states: &mut HashMap<&'a PhaseId, State>,
        stack: &mut Vec<&'a str>,
    ) -> Result<(), FunnelError> {
        if let Some(state) = states.get(node) {
            if *state == State::Visiting {
                stack.push(node.as_str());
                return Err(FunnelError::new(
                    "VALIDATE_CHAIN_CYCLE",
                    format!("Phase chain cycle detected: {}", stack.join(" -> ")),
                ));
            }
            return Ok(());
        }

        states.insert(node, State::Visiting);
        stack.push(node.as_str());
        if let Some(next) = chains.get(node) {
            dfs(next, chains, states, stack)?;
        }
        stack.pop();
        states.insert(node, State::Done);
        Ok(())
    }

    let chains = table
        .phases
        .iter()
        .filter_map(|(id, phase)| phase.chain.as_ref().map(|chain| (id, chain)))
        .collect::<BTreeMap<_, _>>();
    let mut states = HashMap::new();
    for phase_id in table.phases.keys() {
        dfs(phase_id, &chains, &mut states, &mut Vec::new())?;
    }
    Ok(())
}

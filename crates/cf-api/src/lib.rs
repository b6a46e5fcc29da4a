use std::collections::BTreeMap;

use cf_compiler::{compile_funnels_from_xml_map, validate_script_table};
use cf_core::{FunnelError, PhaseId, ScriptTable};
use cf_runtime::{FunnelHost, FunnelPlayer, PlayerOptions};

const MENTORING_FUNNEL_XML: &str = include_str!("../../../funnels/mentoring.funnel.xml");
const QUICKSTART_FUNNEL_XML: &str = include_str!("../../../funnels/quickstart.funnel.xml");

pub struct CreatePlayerFromXmlOptions {
    pub funnels_xml: BTreeMap<String, String>,
    /// Funnel name to play; may be omitted when only one funnel is given.
    pub funnel: Option<String>,
    pub entry_phase: Option<PhaseId>,
    pub route_delay_ms: Option<u64>,
    pub host: Option<Box<dyn FunnelHost>>,
}

/// Built-in funnel sources keyed by their file name.
pub fn builtin_funnel_sources() -> BTreeMap<String, String> {
    BTreeMap::from([
        (
            "mentoring.funnel.xml".to_string(),
            MENTORING_FUNNEL_XML.to_string(),
        ),
        (
            "quickstart.funnel.xml".to_string(),
            QUICKSTART_FUNNEL_XML.to_string(),
        ),
    ])
}

/// Compiles and validates every source; keyed by funnel name.
pub fn compile_funnels(
    funnels_xml: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, ScriptTable>, FunnelError> {
    let tables = compile_funnels_from_xml_map(funnels_xml)?;
    for table in tables.values() {
        validate_script_table(table)?;
    }
    Ok(tables)
}

pub fn builtin_funnels() -> Result<BTreeMap<String, ScriptTable>, FunnelError> {
    compile_funnels(&builtin_funnel_sources())
}

pub fn builtin_funnel(name: &str) -> Result<ScriptTable, FunnelError> {
    let mut tables = builtin_funnels()?;
    tables.remove(name).ok_or_else(|| {
        FunnelError::new(
            "API_FUNNEL_NOT_FOUND",
            format!(
                "Built-in funnel \"{}\" does not exist. Available: {}.",
                name,
                builtin_funnel_names().join(", ")
            ),
        )
    })
}

pub fn builtin_funnel_names() -> Vec<String> {
    vec!["mentoring".to_string(), "quickstart".to_string()]
}

pub fn create_player_from_xml(
    options: CreatePlayerFromXmlOptions,
) -> Result<FunnelPlayer, FunnelError> {
    let mut tables = compile_funnels(&options.funnels_xml)?;
    let name = resolve_funnel_name(&tables, options.funnel)?;
    let table = tables.remove(&name).ok_or_else(|| {
        FunnelError::new(
            "API_FUNNEL_NOT_FOUND",
            format!("Funnel \"{}\" is not registered.", name),
        )
    })?;
    create_player(table, options.entry_phase, options.route_delay_ms, options.host)
}

/// Wraps an already compiled table. An explicit entry phase must exist.
pub fn create_player(
    table: ScriptTable,
    entry_phase: Option<PhaseId>,
    route_delay_ms: Option<u64>,
    host: Option<Box<dyn FunnelHost>>,
) -> Result<FunnelPlayer, FunnelError> {
    if let Some(entry) = &entry_phase {
        if table.phase(entry).is_none() {
            return Err(FunnelError::new(
                "API_ENTRY_PHASE_NOT_FOUND",
                format!(
                    "Entry phase \"{}\" is not declared in funnel \"{}\".",
                    entry, table.name
                ),
            ));
        }
    }

    let defaults = PlayerOptions::default();
    Ok(FunnelPlayer::new(
        table,
        PlayerOptions {
            entry: entry_phase,
            route_delay_ms: route_delay_ms.unwrap_or(defaults.route_delay_ms),
            host,
        },
    ))
}

fn resolve_funnel_name(
    tables: &BTreeMap<String, ScriptTable>,
    explicit: Option<String>,
) -> Result<String, FunnelError> {
    if let Some(name) = explicit {
        if !tables.contains_key(&name) {
            return Err(FunnelError::new(
                "API_FUNNEL_NOT_FOUND",
                format!("Funnel \"{}\" is not registered.", name),
            ));
        }
        return Ok(name);
    }

    let mut names = tables.keys();
    match (names.next(), names.next()) {
        (Some(only), None) => Ok(only.clone()),
        (None, _) => Err(FunnelError::new(
            "API_FUNNEL_EMPTY",
            "No funnel sources were given.",
        )),
        (Some(_), Some(_)) => Err(FunnelError::new(
            "API_FUNNEL_AMBIGUOUS",
            format!(
                "Several funnels are registered ({}); pick one by name.",
                tables.keys().cloned().collect::<Vec<_>>().join(", ")
            ),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_compiler::collect_table_issues;
    use cf_core::{ElementKind, PlayerEvent, Sender};
    use cf_runtime::Pending;

    fn map(entries: &[(&str, &str)]) -> BTreeMap<String, String> {
        entries
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn builtin_funnels_compile_and_validate() {
        let tables = builtin_funnels().expect("built-ins should compile");
        assert_eq!(
            tables.keys().cloned().collect::<Vec<_>>(),
            builtin_funnel_names()
        );
        for table in tables.values() {
            assert!(collect_table_issues(table).is_empty(), "{}", table.name);
        }
        let mentoring = &tables["mentoring"];
        assert_eq!(mentoring.entry, PhaseId::from("1"));
        assert_eq!(mentoring.chain_of(&PhaseId::from("4")), Some(&PhaseId::from("5")));
        assert_eq!(mentoring.chain_of(&PhaseId::from("21")), Some(&PhaseId::from("3")));
        let quickstart = &tables["quickstart"];
        assert_eq!(
            quickstart.chain_of(&PhaseId::from("pillars")),
            Some(&PhaseId::from("social-proof"))
        );
    }

    #[test]
    fn mentoring_plays_through_to_pricing() {
        let mut player = create_player(
            builtin_funnel("mentoring").expect("mentoring"),
            None,
            None,
            None,
        )
        .expect("player");

        player.run_until_idle();
        assert!(player.resolve_choice("serious"));
        player.run_until_idle();
        assert!(player.resolve_choice("skill-no-money"));
        player.run_until_idle();
        assert!(matches!(player.pending(), Some(Pending::Action { .. })));
        assert!(player.resolve_action(None));
        player.run_until_idle();
        assert_eq!(player.current_phase(), &PhaseId::from("4"));
        assert!(matches!(player.pending(), Some(Pending::Action { .. })));
        assert!(player.resolve_action(None));
        player.run_until_idle();

        let last = player.transcript().last().expect("pricing entry");
        assert_eq!(last.element.kind, ElementKind::PricingOffer);
        assert_eq!(last.element.controls.len(), 2);
        let phases_seen = player
            .transcript()
            .iter()
            .map(|entry| entry.phase.as_str())
            .fold(Vec::<&str>::new(), |mut seen, phase| {
                if seen.last() != Some(&phase) {
                    seen.push(phase);
                }
                seen
            });
        assert_eq!(phases_seen, vec!["1", "2", "21", "3", "4", "5", "6"]);
        let users = player
            .transcript()
            .iter()
            .filter(|entry| entry.sender == Sender::User)
            .count();
        assert_eq!(users, 2);
        assert!(player.is_idle());
    }

    #[test]
    fn quickstart_chains_pillars_into_social_proof() {
        let mut player = create_player(
            builtin_funnel("quickstart").expect("quickstart"),
            Some(PhaseId::from("pillars")),
            None,
            None,
        )
        .expect("player");
        player.run_until_idle();
        assert!(player.take_events().contains(&PlayerEvent::ChainSpliced {
            from: PhaseId::from("pillars"),
            to: PhaseId::from("social-proof"),
        }));
        assert!(matches!(player.pending(), Some(Pending::Action { .. })));
    }

    #[test]
    fn create_player_from_xml_resolves_single_funnel() {
        let funnels = map(&[(
            "demo.funnel.xml",
            r#"<funnel name="demo"><phase id="1"><message>Hi</message></phase></funnel>"#,
        )]);
        let mut player = create_player_from_xml(CreatePlayerFromXmlOptions {
            funnels_xml: funnels,
            funnel: None,
            entry_phase: None,
            route_delay_ms: Some(0),
            host: None,
        })
        .expect("player");
        player.run_until_idle();
        assert_eq!(player.transcript().len(), 1);
    }

    #[test]
    fn create_player_reports_lookup_errors() {
        let error = builtin_funnel("nope").err().expect("missing funnel");
        assert_eq!(error.code, "API_FUNNEL_NOT_FOUND");

        let error = create_player_from_xml(CreatePlayerFromXmlOptions {
            funnels_xml: builtin_funnel_sources(),
            funnel: None,
            entry_phase: None,
            route_delay_ms: None,
            host: None,
        })
        .err()
        .expect("ambiguous");
        assert_eq!(error.code, "API_FUNNEL_AMBIGUOUS");

        let error = create_player(
            builtin_funnel("mentoring").expect("mentoring"),
            Some(PhaseId::from("99")),
            None,
            None,
        )
        .err()
        .expect("bad entry");
        assert_eq!(error.code, "API_ENTRY_PHASE_NOT_FOUND");
    }

    #[test]
    fn invalid_funnel_fails_validation() {
        let funnels = map(&[(
            "broken.funnel.xml",
            r#"<funnel name="broken"><phase id="1"><action label="Go" goto="9"/></phase></funnel>"#,
        )]);
        let error = compile_funnels(&funnels).expect_err("dangling target");
        assert_eq!(error.code, "VALIDATE_TARGET_MISSING");
    }

    #[test]
    fn option_id_shared_by_two_choice_sets_blocks_player_creation() {
        let funnels = map(&[(
            "clash.funnel.xml",
            r#"<funnel name="clash" entry="1">
                <phase id="1">
                    <choice><option id="yes" label="Yes" goto="2"/></choice>
                    <choice><option id="yes" label="Sure" goto="3"/></choice>
                </phase>
                <phase id="2"><message>Two</message></phase>
                <phase id="3"><message>Three</message></phase>
            </funnel>"#,
        )]);
        let error = create_player_from_xml(CreatePlayerFromXmlOptions {
            funnels_xml: funnels,
            funnel: None,
            entry_phase: None,
            route_delay_ms: None,
            host: None,
        })
        .err()
        .expect("clashing option ids");
        assert_eq!(error.code, "VALIDATE_OPTION_DUPLICATE");
    }
}

use std::collections::BTreeMap;

use cf_compiler::{collect_table_issues, compile_funnel_from_xml};
use cf_core::FunnelError;

use crate::logging::{init_logging, LogTarget};
use crate::{json_text, load_source, LoadedFunnels, ValidateArgs};

#[derive(Debug, Default)]
pub(crate) struct ValidationReport {
    pub(crate) lines: Vec<String>,
    pub(crate) issue_count: usize,
}

impl ValidationReport {
    fn issue(&mut self, path: &str, error: &FunnelError) {
        let location = match error.position() {
            Some(position) => format!("{}:{}", path, position),
            None => path.to_string(),
        };
        self.lines.push(format!(
            "ISSUE:{}|{}",
            error.code,
            json_text(&format!("{}: {}", location, error.message))
        ));
        self.issue_count += 1;
    }
}

pub(super) fn run_validate(args: ValidateArgs) -> Result<i32, FunnelError> {
    init_logging(&LogTarget::Stderr)?;
    let loaded = load_source(&args.source)?;
    let report = validate_sources(&loaded);
    for line in &report.lines {
        println!("{}", line);
    }
    Ok(if report.issue_count == 0 { 0 } else { 1 })
}

/// Compiles every source on its own so one broken file does not hide the
/// issues of the others.
pub(crate) fn validate_sources(loaded: &LoadedFunnels) -> ValidationReport {
    let mut report = ValidationReport::default();
    let mut seen_names: BTreeMap<String, String> = BTreeMap::new();

    for (path, xml) in &loaded.funnels_xml {
        let table = match compile_funnel_from_xml(xml) {
            Ok(table) => table,
            Err(error) => {
                report.issue(path, &error);
                continue;
            }
        };

        if let Some(filter) = &loaded.funnel {
            if &table.name != filter {
                continue;
            }
        }

        if let Some(first_path) = seen_names.get(&table.name) {
            report.issue(
                path,
                &FunnelError::new(
                    "FUNNEL_NAME_DUPLICATE",
                    format!(
                        "Funnel \"{}\" is already declared in {}.",
                        table.name, first_path
                    ),
                ),
            );
            continue;
        }
        seen_names.insert(table.name.clone(), path.clone());

        let issues = collect_table_issues(&table);
        report.lines.push(format!(
            "FUNNEL:{}|{}|{}",
            table.name,
            path,
            issues.len()
        ));
        for issue in &issues {
            report.issue(path, issue);
        }
    }

    if let Some(filter) = &loaded.funnel {
        if !seen_names.contains_key(filter) {
            report.issue(
                &loaded.id,
                &FunnelError::new(
                    "API_FUNNEL_NOT_FOUND",
                    format!("Funnel \"{}\" is not registered.", filter),
                ),
            );
        }
    }

    let verdict = if report.issue_count == 0 {
        "RESULT:OK"
    } else {
        "RESULT:ISSUES"
    };
    report.lines.insert(0, verdict.to_string());
    report
        .lines
        .push(format!("ISSUE_COUNT:{}", report.issue_count));
    report
}

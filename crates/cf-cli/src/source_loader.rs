use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use cf_api::builtin_funnel_sources;
use cf_core::FunnelError;
use walkdir::WalkDir;

use crate::{
    map_cli_source_path, map_cli_source_read, map_cli_source_scan, LoadedFunnels, SourceArgs,
};

pub(crate) const FUNNEL_FILE_SUFFIX: &str = ".funnel.xml";
pub(crate) const DEFAULT_BUILTIN_FUNNEL: &str = "mentoring";

pub(crate) fn load_source(source: &SourceArgs) -> Result<LoadedFunnels, FunnelError> {
    match &source.scripts_dir {
        Some(scripts_dir) => load_source_by_scripts_dir(scripts_dir, source.funnel.clone()),
        None => Ok(load_builtin_source(source.funnel.clone())),
    }
}

pub(crate) fn load_builtin_source(funnel: Option<String>) -> LoadedFunnels {
    LoadedFunnels {
        id: "builtin".to_string(),
        title: format!(
            "Built-in {}",
            funnel.as_deref().unwrap_or(DEFAULT_BUILTIN_FUNNEL)
        ),
        funnels_xml: builtin_funnel_sources(),
        funnel,
        builtin: true,
    }
}

pub(crate) fn load_source_by_scripts_dir(
    scripts_dir: &str,
    funnel: Option<String>,
) -> Result<LoadedFunnels, FunnelError> {
    let root = resolve_scripts_dir(scripts_dir)?;
    let funnels_xml = read_funnels_xml_from_dir(&root)?;
    let dir_name = root
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| root.display().to_string());

    Ok(LoadedFunnels {
        id: make_scripts_dir_source_id(&root),
        title: format!("Funnels {dir_name}"),
        funnels_xml,
        funnel,
        builtin: false,
    })
}

pub(crate) fn resolve_scripts_dir(scripts_dir: &str) -> Result<PathBuf, FunnelError> {
    let requested = Path::new(scripts_dir);
    let root = if requested.is_absolute() {
        requested.to_path_buf()
    } else {
        std::env::current_dir()
            .map_err(map_cli_source_path)?
            .join(requested)
    };

    match fs::metadata(&root) {
        Ok(meta) if meta.is_dir() => Ok(root),
        Ok(_) => Err(FunnelError::new(
            "CLI_SOURCE_NOT_DIR",
            format!("--scripts-dir {} is a file, expected a directory", root.display()),
        )),
        Err(error) if error.kind() == std::io::ErrorKind::NotFound => Err(FunnelError::new(
            "CLI_SOURCE_NOT_FOUND",
            format!("--scripts-dir {} not found", root.display()),
        )),
        Err(error) => Err(map_cli_source_path(error)),
    }
}

fn is_funnel_file(entry: &walkdir::DirEntry) -> bool {
    entry.file_type().is_file()
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.ends_with(FUNNEL_FILE_SUFFIX))
}

/// Every `*.funnel.xml` below `root`, keyed by its `/`-separated path
/// relative to `root`.
pub(crate) fn read_funnels_xml_from_dir(
    root: &Path,
) -> Result<BTreeMap<String, String>, FunnelError> {
    let files = WalkDir::new(root)
        .sort_by_file_name()
        .into_iter()
        .filter_map(Result::ok)
        .filter(is_funnel_file);

    let mut funnels = BTreeMap::new();
    for file in files {
        let key = file
            .path()
            .strip_prefix(root)
            .map_err(map_cli_source_scan)?
            .components()
            .map(|part| part.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");
        let xml = fs::read_to_string(file.path()).map_err(map_cli_source_read)?;
        funnels.insert(key, xml);
    }

    if funnels.is_empty() {
        return Err(FunnelError::new(
            "CLI_SOURCE_EMPTY",
            format!("no {FUNNEL_FILE_SUFFIX} files under {}", root.display()),
        ));
    }

    tracing::debug!(count = funnels.len(), dir = %root.display(), "loaded funnel sources");
    Ok(funnels)
}

pub(crate) fn make_scripts_dir_source_id(root: &Path) -> String {
    format!("scripts-dir:{}", root.display())
}

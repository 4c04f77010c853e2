//! Source files a contract was compiled from.
//!
//! Brownie stores one artifact per compiled contract or interface, including
//! the ones pulled in from packages (`<build-dir>/contracts/dependencies/..`
//! and `<build-dir>/interfaces/..`). Each of them carries its source file, so
//! the complete set of sources of a compilation can be put back together from
//! the build directory alone.

use {
    crate::Artifact,
    anyhow::{Context, Result, bail},
    serde::Deserialize,
    std::{
        collections::{BTreeMap, BTreeSet},
        io::ErrorKind,
        path::{Path, PathBuf},
    },
    tokio::fs,
};

/// Source contents keyed by their source path.
pub type Sources = BTreeMap<String, String>;

/// Collects the source of `artifact` and of every file it imports.
///
/// Fails if a file of the compilation has no artifact in `build_dir`, or if
/// the source imports other files but the artifact does not name them.
pub async fn collect(build_dir: &Path, artifact: &Artifact) -> Result<Sources> {
    let name = &artifact.contract_name;
    let path = artifact
        .source_path
        .clone()
        .with_context(|| format!("{name} artifact has no source path"))?;
    let source = artifact
        .source
        .clone()
        .with_context(|| format!("{name} artifact has no source"))?;

    let mut missing: BTreeSet<&str> = artifact
        .all_source_paths
        .values()
        .map(String::as_str)
        .filter(|other| *other != path)
        .collect();
    if missing.is_empty() && has_imports(&source) {
        bail!("{path} imports other files but the {name} artifact lists no source paths");
    }

    let mut sources = Sources::from([(path, source)]);
    for unit in read_artifacts(build_dir).await? {
        if missing.remove(unit.source_path.as_str()) {
            sources.insert(unit.source_path, unit.source);
        }
    }

    if let Some(path) = missing.first() {
        bail!(
            "no artifact in {build_dir:?} holds the source of {path}, imported by {name}"
        );
    }
    Ok(sources)
}

fn has_imports(source: &str) -> bool {
    source.lines().any(|line| {
        line.trim_start()
            .strip_prefix("import")
            .is_some_and(|rest| rest.starts_with([' ', '"', '\'', '{']))
    })
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SourceUnit {
    source_path: String,
    source: String,
}

/// Every artifact below the `contracts` and `interfaces` build directories
/// that carries a source file.
async fn read_artifacts(build_dir: &Path) -> Result<Vec<SourceUnit>> {
    let mut pending: Vec<PathBuf> = vec![build_dir.join("contracts"), build_dir.join("interfaces")];
    let mut units = Vec::new();
    while let Some(dir) = pending.pop() {
        let mut entries = match fs::read_dir(&dir).await {
            Ok(entries) => entries,
            Err(err) if err.kind() == ErrorKind::NotFound => continue,
            Err(err) => return Err(err).with_context(|| format!("failed to list {dir:?}")),
        };
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if entry.file_type().await?.is_dir() {
                pending.push(path);
                continue;
            }
            if path.extension().is_none_or(|extension| extension != "json") {
                continue;
            }
            let data = fs::read_to_string(&path)
                .await
                .with_context(|| format!("failed to read build artifact {path:?}"))?;
            // Artifacts without sources, e.g. brownie's deployment maps, are
            // not source units.
            if let Ok(unit) = serde_json::from_str::<SourceUnit>(&data) {
                units.push(unit);
            }
        }
    }
    Ok(units)
}

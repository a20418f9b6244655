//! The whole run over one package: load, extract, resolve, render, write.

use std::path::{Path, PathBuf};

use crate::error::ScaffoldError;
use crate::extract::extract_unit;
use crate::format;
use crate::loader::load_unit;
use crate::model::CompilationUnitInfo;
use crate::output::ScaffoldFile;
use crate::render::ScaffoldStyle;
use crate::resolve::resolve_imports;

/// How the rendered file reaches the disk.
#[derive(Debug, Clone, Copy, Default)]
pub struct OutputOptions {
    pub force: bool,
    pub format: bool,
}

/// A resolved package and the test file rendered from it.
pub struct Generated {
    pub unit: CompilationUnitInfo,
    pub file: ScaffoldFile,
}

pub fn generate(dir: &Path, style: ScaffoldStyle) -> Result<Generated, ScaffoldError> {
    let source = load_unit(dir)?;
    let mut unit = extract_unit(&source);
    let aliases = resolve_imports(&mut unit)?;
    let file = ScaffoldFile::build(&unit, &aliases, style);
    let tests: Vec<&str> = file.tests.iter().map(|t| t.name.as_str()).collect();
    tracing::debug!(
        package = %unit.package_path,
        ?tests,
        ?style,
        "rendered scaffold"
    );
    Ok(Generated { unit, file })
}

/// Write the scaffold next to the package sources.
///
/// Returns `None` when there was nothing to write. An existing file is only
/// replaced with `force`; formatting failures are logged, not returned.
pub fn write_scaffold(
    generated: &Generated,
    dir: &Path,
    opts: &OutputOptions,
) -> Result<Option<PathBuf>, ScaffoldError> {
    if generated.file.is_empty() {
        tracing::warn!(
            package = %generated.unit.package_name,
            "no testable declarations, nothing written"
        );
        return Ok(None);
    }

    let path = dir.join(generated.file.file_name());
    if path.exists() && !opts.force {
        return Err(ScaffoldError::OutputExists(path.display().to_string()));
    }
    std::fs::write(&path, generated.file.to_string()).map_err(|e| ScaffoldError::Io {
        path: path.display().to_string(),
        source: e,
    })?;

    if opts.format {
        if let Err(e) = format::gofmt(&path) {
            tracing::warn!(file = %path.display(), error = %e, "formatting failed");
        }
    }
    Ok(Some(path))
}

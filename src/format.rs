use std::path::Path;
use std::process::Command;

use crate::error::ScaffoldError;

/// Rewrite `path` in place with `gofmt -w`.
pub fn gofmt(path: &Path) -> Result<(), ScaffoldError> {
    let output = Command::new("gofmt")
        .arg("-w")
        .arg(path)
        .output()
        .map_err(|e| ScaffoldError::Formatter(e.to_string()))?;
    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(ScaffoldError::Formatter(stderr.trim().to_string()));
    }
    Ok(())
}

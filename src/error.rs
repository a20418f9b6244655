/// Errors produced by goscaf while loading, resolving or writing a package.
#[derive(Debug, thiserror::Error)]
pub enum ScaffoldError {
    #[error("{path}: {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("parse failed: {0}")]
    ParseFailed(String),

    #[error("no Go package found in {dir}")]
    NoPackage { dir: String },

    #[error("expected one package in {dir}, found {}", .names.join(", "))]
    MultiplePackages { dir: String, names: Vec<String> },

    #[error("{file}:{line}: syntax error")]
    SyntaxError { file: String, line: usize },

    /// A declaration mentions a package the unit itself never imports.
    #[error("{declaration} references package {path:?}, which the package does not import")]
    MissingImport { path: String, declaration: String },

    #[error("{0} already exists (use --force to overwrite)")]
    OutputExists(String),

    #[error("gofmt: {0}")]
    Formatter(String),

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

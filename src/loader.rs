//! Loads one Go package from a directory: parsed files, import tables and
//! module metadata.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::{Component, Path, PathBuf};

use tree_sitter::{Node, Tree};

use crate::error::ScaffoldError;
use crate::parser;
use crate::types::PackageRef;
use crate::util::{field_children, named_children, trim_quotes, txt};

/// One `import_spec`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportSpec {
    pub path: String,
    /// Explicit name: an identifier, `.` or `_`.
    pub alias: Option<String>,
}

/// The names a single file can qualify types with.
#[derive(Debug, Default, Clone)]
pub struct FileImports {
    by_name: HashMap<String, PackageRef>,
    dot: Vec<PackageRef>,
}

impl FileImports {
    pub fn from_specs(specs: &[ImportSpec]) -> Self {
        let mut imports = Self::default();
        for spec in specs {
            match spec.alias.as_deref() {
                Some("_") => {}
                Some(".") => imports.dot.push(PackageRef::from_path(&spec.path)),
                Some(alias) => {
                    imports
                        .by_name
                        .insert(alias.to_string(), PackageRef::new(spec.path.clone(), alias));
                }
                None => {
                    let pkg = PackageRef::from_path(&spec.path);
                    imports.by_name.insert(pkg.name.clone(), pkg);
                }
            }
        }
        imports
    }

    /// Package referred to by `qualifier` in `qualifier.Name`.
    pub fn lookup(&self, qualifier: &str) -> Option<&PackageRef> {
        self.by_name.get(qualifier)
    }

    pub fn has_dot_imports(&self) -> bool {
        !self.dot.is_empty()
    }
}

/// A parsed non-test source file.
#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    pub source: String,
    pub tree: Tree,
    pub imports: FileImports,
}

impl SourceFile {
    pub fn file_name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }
}

/// One Go package, ready for declaration extraction.
#[derive(Debug)]
pub struct SourceUnit {
    pub module: Option<String>,
    pub package: PackageRef,
    pub is_main: bool,
    pub files: Vec<SourceFile>,
    /// Names of types declared anywhere in the package.
    pub local_types: HashSet<String>,
    /// Every import of the package by path; the first explicit alias wins.
    pub imports: BTreeMap<String, PackageRef>,
}

/// Go's convention for test files, which are never scaffolded.
pub fn is_test_file(name: &str) -> bool {
    name.ends_with("_test.go")
}

/// Load the single Go package whose files live directly in `dir`.
pub fn load_unit(dir: &Path) -> Result<SourceUnit, ScaffoldError> {
    let dir = std::fs::canonicalize(dir).map_err(|e| ScaffoldError::Io {
        path: dir.display().to_string(),
        source: e,
    })?;
    let dir_label = dir.display().to_string();

    let mut files = Vec::new();
    let mut package_names: Vec<String> = Vec::new();
    let mut local_types = HashSet::new();
    let mut imports: BTreeMap<String, PackageRef> = BTreeMap::new();

    for path in go_files(&dir)? {
        let (tree, source) = parser::parse_file(&path)?;
        if is_build_ignored(&source) {
            tracing::debug!(file = %path.display(), "skipping file excluded by build constraint");
            continue;
        }
        let root = tree.root_node();
        let src = source.as_bytes();

        let Some(name) = package_clause(root, src) else {
            return Err(ScaffoldError::SyntaxError {
                file: path.display().to_string(),
                line: 1,
            });
        };
        if !package_names.contains(&name) {
            package_names.push(name);
        }

        let specs = import_specs(root, src);
        for spec in &specs {
            merge_import(&mut imports, spec);
        }
        collect_type_names(root, src, &mut local_types);

        files.push(SourceFile {
            imports: FileImports::from_specs(&specs),
            path,
            source,
            tree,
        });
    }

    let package_name = match package_names.len() {
        0 => return Err(ScaffoldError::NoPackage { dir: dir_label }),
        1 => package_names.remove(0),
        _ => {
            return Err(ScaffoldError::MultiplePackages {
                dir: dir_label,
                names: package_names,
            })
        }
    };

    let module = find_module(&dir);
    let package_path = match &module {
        Some((root, module_path)) => join_package_path(module_path, root, &dir),
        None => package_name.clone(),
    };
    tracing::debug!(
        package = %package_name,
        path = %package_path,
        files = files.len(),
        "loaded package"
    );

    Ok(SourceUnit {
        module: module.map(|(_, path)| path),
        is_main: package_name == "main",
        package: PackageRef::new(package_path, package_name),
        files,
        local_types,
        imports,
    })
}

/// Non-test `.go` files directly inside `dir`, sorted by name.
fn go_files(dir: &Path) -> Result<Vec<PathBuf>, ScaffoldError> {
    let entries = std::fs::read_dir(dir).map_err(|e| ScaffoldError::Io {
        path: dir.display().to_string(),
        source: e,
    })?;

    let mut paths = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| ScaffoldError::Io {
            path: dir.display().to_string(),
            source: e,
        })?;
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.ends_with(".go") || is_test_file(name) || !path.is_file() {
            continue;
        }
        paths.push(path);
    }
    paths.sort();
    Ok(paths)
}

/// Files carrying `//go:build ignore` (or the legacy `+build` form) above the
/// package clause are not part of the package.
fn is_build_ignored(source: &str) -> bool {
    for line in source.lines() {
        let line = line.trim();
        if line.starts_with("package ") {
            return false;
        }
        let constraint = line
            .strip_prefix("//go:build")
            .or_else(|| line.strip_prefix("// +build"));
        if let Some(expr) = constraint {
            let mut terms = expr
                .split(|c: char| c.is_whitespace() || matches!(c, '(' | ')' | '&' | '|' | ','))
                .filter(|t| !t.is_empty());
            if terms.any(|t| t == "ignore") {
                return true;
            }
        }
    }
    false
}

fn package_clause(root: Node, src: &[u8]) -> Option<String> {
    named_children(root)
        .into_iter()
        .find(|n| n.kind() == "package_clause")
        .and_then(|clause| named_children(clause).into_iter().next())
        .map(|ident| txt(ident, src).to_string())
}

/// Every `import_spec` of a file, in source order.
pub fn import_specs(root: Node, src: &[u8]) -> Vec<ImportSpec> {
    let mut specs = Vec::new();
    for decl in named_children(root) {
        if decl.kind() != "import_declaration" {
            continue;
        }
        for child in named_children(decl) {
            match child.kind() {
                "import_spec" => specs.extend(import_spec(child, src)),
                "import_spec_list" => {
                    for spec in named_children(child) {
                        if spec.kind() == "import_spec" {
                            specs.extend(import_spec(spec, src));
                        }
                    }
                }
                _ => {}
            }
        }
    }
    specs
}

fn import_spec(node: Node, src: &[u8]) -> Option<ImportSpec> {
    let path = node.child_by_field_name("path")?;
    let path = trim_quotes(txt(path, src)).to_string();
    if path.is_empty() {
        return None;
    }
    let alias = node
        .child_by_field_name("name")
        .map(|n| txt(n, src).to_string());
    Some(ImportSpec { path, alias })
}

pub(crate) fn merge_import(imports: &mut BTreeMap<String, PackageRef>, spec: &ImportSpec) {
    match spec.alias.as_deref() {
        Some("_") => {}
        Some(".") | None => {
            imports
                .entry(spec.path.clone())
                .or_insert_with(|| PackageRef::from_path(&spec.path));
        }
        Some(alias) => {
            let assumed = PackageRef::from_path(&spec.path);
            let entry = imports.entry(spec.path.clone()).or_insert(assumed.clone());
            // An explicit alias replaces an assumed name, never another alias.
            if entry.name == assumed.name {
                entry.name = alias.to_string();
            }
        }
    }
}

pub(crate) fn collect_type_names(root: Node, src: &[u8], out: &mut HashSet<String>) {
    for decl in named_children(root) {
        if decl.kind() != "type_declaration" {
            continue;
        }
        for spec in named_children(decl) {
            if !matches!(spec.kind(), "type_spec" | "type_alias") {
                continue;
            }
            for name in field_children(spec, "name") {
                out.insert(txt(name, src).to_string());
            }
        }
    }
}

/// Nearest `go.mod` at or above `dir`: its directory and module path.
pub fn find_module(dir: &Path) -> Option<(PathBuf, String)> {
    for candidate in dir.ancestors() {
        let gomod = candidate.join("go.mod");
        if !gomod.is_file() {
            continue;
        }
        let content = std::fs::read_to_string(&gomod).ok()?;
        return module_directive(&content).map(|m| (candidate.to_path_buf(), m));
    }
    None
}

/// The module path from a `go.mod` file's `module` directive.
pub fn module_directive(gomod: &str) -> Option<String> {
    for line in gomod.lines() {
        let line = line.split("//").next().unwrap_or("").trim();
        let Some(rest) = line.strip_prefix("module") else {
            continue;
        };
        if !rest.starts_with(|c: char| c.is_whitespace() || c == '"' || c == '`') {
            continue;
        }
        let module = trim_quotes(rest.trim());
        if !module.is_empty() {
            return Some(module.to_string());
        }
    }
    None
}

fn join_package_path(module: &str, module_root: &Path, dir: &Path) -> String {
    let Ok(rel) = dir.strip_prefix(module_root) else {
        return module.to_string();
    };
    let mut path = module.to_string();
    for component in rel.components() {
        if let Component::Normal(part) = component {
            path.push('/');
            path.push_str(&part.to_string_lossy());
        }
    }
    path
}

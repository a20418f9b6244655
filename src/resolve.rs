//! Import resolution: validate what the declarations need against what the
//! package imports, then fix the name each import is written under.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::ScaffoldError;
use crate::model::CompilationUnitInfo;
use crate::types::PackageRef;

/// Packages every scaffold may import itself, by name.
const SCAFFOLD_IMPORTS: &[(&str, &str)] = &[("testing", "testing"), ("reflect", "reflect")];

/// The finalized name of every required import, keyed by import path.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct AliasTable {
    aliases: BTreeMap<String, String>,
}

impl AliasTable {
    /// Assign an alias to each path in order. A name already taken by another
    /// path gets the lowest free numeric suffix, starting at 2.
    pub fn assign<'a, I>(packages: I) -> Self
    where
        I: IntoIterator<Item = &'a PackageRef>,
    {
        let mut taken: BTreeMap<String, String> = SCAFFOLD_IMPORTS
            .iter()
            .map(|(name, path)| (name.to_string(), path.to_string()))
            .collect();
        let mut aliases = BTreeMap::new();

        for pkg in packages {
            let mut alias = pkg.name.clone();
            let mut n = 2;
            while taken.get(&alias).is_some_and(|owner| owner != &pkg.path) {
                alias = format!("{}{n}", pkg.name);
                n += 1;
            }
            taken.insert(alias.clone(), pkg.path.clone());
            aliases.insert(pkg.path.clone(), alias);
        }
        Self { aliases }
    }

    pub fn alias_for(&self, path: &str) -> Option<&str> {
        self.aliases.get(path).map(String::as_str)
    }

    /// Whether `name` is the alias of some required import.
    pub fn is_alias(&self, name: &str) -> bool {
        self.aliases.values().any(|a| a == name)
    }

    /// Required imports under their final names, ordered by path.
    pub fn packages(&self) -> Vec<PackageRef> {
        self.aliases
            .iter()
            .map(|(path, alias)| PackageRef::new(path.clone(), alias.clone()))
            .collect()
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }
}

/// Finalize the unit's imports.
///
/// Recomputes the required set from every declaration, fails on the first
/// required package the unit does not import, and rewrites each simplified
/// name under the resulting alias table.
pub fn resolve_imports(unit: &mut CompilationUnitInfo) -> Result<AliasTable, ScaffoldError> {
    let mut required = BTreeSet::new();
    for decl in &unit.declarations {
        for path in &decl.required_imports {
            if unit.is_self_reference(path) {
                continue;
            }
            if !unit.imports.contains_key(path) {
                return Err(ScaffoldError::MissingImport {
                    path: path.clone(),
                    declaration: decl.display_name(),
                });
            }
            required.insert(path.clone());
        }
    }
    unit.required_imports = required;

    let table = AliasTable::assign(
        unit.required_imports
            .iter()
            .filter_map(|path| unit.imports.get(path)),
    );

    let home = unit.package_path.clone();
    for decl in &mut unit.declarations {
        if let Some(recv) = &mut decl.receiver {
            recv.simplified = recv.ty.simplified_name_with(&home, &table);
        }
        for param in decl.params.iter_mut().chain(decl.results.iter_mut()) {
            param.simplified = param.ty.simplified_name_with(&home, &table);
        }
    }

    tracing::debug!(imports = table.len(), "resolved imports");
    Ok(table)
}

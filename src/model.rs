use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::types::{GoType, PackageRef};

/// One parameter or result of a declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    /// Declared name, or `paramN` / `resultN` when unnamed or blank.
    pub name: String,
    pub qualified: String,
    pub simplified: String,
    /// Import path of the originating package, empty for local or predeclared types.
    pub package: String,
    /// `...T` parameter; `ty` holds `[]T`.
    pub variadic: bool,
    pub ty: GoType,
}

impl Parameter {
    pub fn new(name: String, ty: GoType, variadic: bool, home: &str) -> Self {
        Self {
            name,
            qualified: ty.qualified_name(),
            simplified: ty.simplified_name(home),
            package: ty
                .originating_package(home)
                .map(|p| p.path.clone())
                .unwrap_or_default(),
            variadic,
            ty,
        }
    }
}

/// The receiver of a method declaration.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Receiver {
    pub name: Option<String>,
    pub qualified: String,
    pub simplified: String,
    pub ty: GoType,
}

impl Receiver {
    pub fn new(name: Option<String>, ty: GoType, home: &str) -> Self {
        Self {
            name,
            qualified: ty.qualified_name(),
            simplified: ty.simplified_name(home),
            ty,
        }
    }
}

/// The modeled shape of one function or method.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Declaration {
    pub name: String,
    pub exported: bool,
    pub receiver: Option<Receiver>,
    pub params: Vec<Parameter>,
    /// Results share the parameter shape.
    pub results: Vec<Parameter>,
    pub has_type_params: bool,
    pub required_imports: BTreeSet<String>,
    /// Source file and 1-based line, for diagnostics only.
    pub location: String,
}

impl Declaration {
    pub fn is_method(&self) -> bool {
        self.receiver.is_some()
    }

    /// Whether a scaffold should be generated for the declaration.
    ///
    /// Anything named `init` is skipped whatever its signature; `_` cannot
    /// be referenced.
    pub fn is_testable(&self) -> bool {
        self.name != "init" && self.name != "_"
    }

    /// Human-facing name: `Name` or `Recv.Name`.
    pub fn display_name(&self) -> String {
        match &self.receiver {
            Some(recv) => format!("{}.{}", recv.ty.deref().qualified_name(), self.name),
            None => self.name.clone(),
        }
    }
}

/// Everything known about the package being scaffolded.
#[derive(Debug, Clone, Serialize)]
pub struct CompilationUnitInfo {
    pub module: Option<String>,
    pub is_main: bool,
    pub package_path: String,
    pub package_name: String,
    pub declarations: Vec<Declaration>,
    /// Import paths the generated file needs, self-references excluded.
    pub required_imports: BTreeSet<String>,
    /// Every path the package imports, keyed by import path.
    pub imports: BTreeMap<String, PackageRef>,
    /// Names of types declared in the package.
    pub local_types: BTreeSet<String>,
}

impl CompilationUnitInfo {
    pub fn new(
        module: Option<String>,
        is_main: bool,
        package: PackageRef,
        imports: BTreeMap<String, PackageRef>,
    ) -> Self {
        Self {
            module,
            is_main,
            package_path: package.path,
            package_name: package.name,
            declarations: Vec::new(),
            required_imports: BTreeSet::new(),
            imports,
            local_types: BTreeSet::new(),
        }
    }

    /// Record a declaration and fold its imports into the unit's set.
    pub fn add(&mut self, decl: Declaration) {
        for path in &decl.required_imports {
            if !self.is_self_reference(path) {
                self.required_imports.insert(path.clone());
            }
        }
        self.declarations.push(decl);
    }

    /// The package itself never needs importing: its own path, its module
    /// path, or the module path joined with the package name.
    pub fn is_self_reference(&self, path: &str) -> bool {
        if path == self.package_path {
            return true;
        }
        match &self.module {
            Some(module) => path == module.as_str() || path == format!("{module}/{}", self.package_name),
            None => false,
        }
    }

    /// Declarations that get a scaffold, in source order.
    pub fn testable(&self) -> impl Iterator<Item = &Declaration> {
        self.declarations.iter().filter(|d| d.is_testable())
    }

    pub fn has_generics(&self) -> bool {
        self.testable().any(|d| d.has_type_params)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit() -> CompilationUnitInfo {
        let mut imports = BTreeMap::new();
        imports.insert("strings".to_string(), PackageRef::from_path("strings"));
        CompilationUnitInfo::new(
            Some("example.com/m".to_string()),
            false,
            PackageRef::new("example.com/m/test", "test"),
            imports,
        )
    }

    fn decl(name: &str, imports: &[&str]) -> Declaration {
        Declaration {
            name: name.to_string(),
            exported: false,
            receiver: None,
            params: Vec::new(),
            results: Vec::new(),
            has_type_params: false,
            required_imports: imports.iter().map(|s| s.to_string()).collect(),
            location: "add.go:1".to_string(),
        }
    }

    #[test]
    fn add_unions_imports_and_skips_self_references() {
        let mut unit = unit();
        unit.add(decl("a", &["strings"]));
        unit.add(decl("b", &["example.com/m", "example.com/m/test", "io"]));
        let required: Vec<&str> = unit.required_imports.iter().map(String::as_str).collect();
        assert_eq!(required, vec!["io", "strings"]);
        assert_eq!(unit.declarations.len(), 2);
    }

    #[test]
    fn init_is_not_testable() {
        let mut unit = unit();
        unit.add(decl("init", &[]));
        unit.add(decl("add", &[]));
        unit.add(decl("_", &[]));
        let names: Vec<&str> = unit.testable().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["add"]);
    }

    #[test]
    fn parameter_records_origin_of_its_type() {
        let ty = GoType::pointer(GoType::named(Some(PackageRef::from_path("strings")), "Builder"));
        let param = Parameter::new("sb".to_string(), ty, false, "example.com/m/test");
        assert_eq!(param.simplified, "*strings.Builder");
        assert_eq!(param.qualified, "*strings.Builder");
        assert_eq!(param.package, "strings");
    }
}

use std::collections::HashSet;
use std::fmt;

use crate::model::CompilationUnitInfo;
use crate::render::{render_test, test_name, RenderContext, ScaffoldStyle, TestFunc};
use crate::resolve::AliasTable;
use crate::types::{assumed_package_name, PackageRef};

/// A complete generated test file, ready for display.
pub struct ScaffoldFile {
    pub package_name: String,
    /// Every import of the file under its final name, sorted by path.
    pub imports: Vec<PackageRef>,
    pub tests: Vec<TestFunc>,
}

impl ScaffoldFile {
    /// Render one test per testable declaration of a resolved unit.
    pub fn build(unit: &CompilationUnitInfo, aliases: &AliasTable, style: ScaffoldStyle) -> Self {
        let ctx = RenderContext {
            home: &unit.package_path,
            aliases,
            local_types: &unit.local_types,
            style,
        };
        let mut seen = HashSet::new();
        let tests: Vec<TestFunc> = unit
            .testable()
            .map(|decl| {
                let name = unique_name(test_name(decl), &mut seen);
                render_test(decl, &name, &ctx)
            })
            .collect();

        let mut imports = vec![PackageRef::from_path("testing")];
        if tests.iter().any(|t| t.uses_reflect) {
            imports.push(PackageRef::from_path("reflect"));
        }
        for pkg in aliases.packages() {
            if !imports.iter().any(|p| p.path == pkg.path) {
                imports.push(pkg);
            }
        }
        imports.sort();

        Self {
            package_name: unit.package_name.clone(),
            imports,
            tests,
        }
    }

    /// `<package>_test.go`.
    pub fn file_name(&self) -> String {
        format!("{}_test.go", self.package_name)
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

impl fmt::Display for ScaffoldFile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "package {}", self.package_name)?;
        writeln!(f)?;

        let (std, third_party): (Vec<&PackageRef>, Vec<&PackageRef>) =
            self.imports.iter().partition(|p| p.is_std());
        writeln!(f, "import (")?;
        for pkg in &std {
            write_import(f, pkg)?;
        }
        if !std.is_empty() && !third_party.is_empty() {
            writeln!(f)?;
        }
        for pkg in &third_party {
            write_import(f, pkg)?;
        }
        writeln!(f, ")")?;

        for test in &self.tests {
            writeln!(f)?;
            f.write_str(&test.source)?;
        }
        Ok(())
    }
}

/// The alias is printed only when it differs from the name Go would infer.
fn write_import(f: &mut fmt::Formatter<'_>, pkg: &PackageRef) -> fmt::Result {
    if pkg.name == assumed_package_name(&pkg.path) {
        writeln!(f, "\t{:?}", pkg.path)
    } else {
        writeln!(f, "\t{} {:?}", pkg.name, pkg.path)
    }
}

/// `base`, or `base2`, `base3`... when taken.
fn unique_name(base: String, seen: &mut HashSet<String>) -> String {
    if seen.insert(base.clone()) {
        return base;
    }
    let mut n = 2;
    loop {
        let candidate = format!("{base}{n}");
        if seen.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extract::extract_unit;
    use crate::extract::tests::unit_from_source;
    use crate::resolve::resolve_imports;

    fn scaffold(source: &str, style: ScaffoldStyle) -> ScaffoldFile {
        let mut unit = extract_unit(&unit_from_source(source));
        let aliases = resolve_imports(&mut unit).unwrap();
        ScaffoldFile::build(&unit, &aliases, style)
    }

    const ADD_SRC: &str = r#"package test

import (
	"strings"

	yml "gopkg.in/yaml.v3"
)

func add(a, b int) int {
	return a + b
}

func useStringsBuilder(sb strings.Builder) string {
	return sb.String()
}

func decode(n *yml.Node) error {
	return nil
}

type Adder struct{}

func (adder *Adder) Do(a, b int) int {
	return add(a, b)
}

func init() {}
"#;

    #[test]
    fn file_has_package_imports_and_one_test_per_declaration() {
        let file = scaffold(ADD_SRC, ScaffoldStyle::Plain);
        assert_eq!(file.file_name(), "test_test.go");
        let names: Vec<&str> = file.tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(
            names,
            vec!["TestAdd", "TestUseStringsBuilder", "TestDecode", "TestAdderDo"]
        );

        let out = file.to_string();
        assert!(out.starts_with(
            "package test\n\nimport (\n\t\"strings\"\n\t\"testing\"\n\n\tyml \"gopkg.in/yaml.v3\"\n)\n\nfunc TestAdd(t *testing.T) {\n"
        ));
        assert!(out.contains("\t\tvar n *yml.Node\n"));
        assert!(out.contains("\t\tvar receiver Adder\n"));
        assert!(!out.contains("TestInit"));
        assert!(!out.contains("\"reflect\""));
    }

    #[test]
    fn reflect_is_imported_only_when_needed() {
        let file = scaffold(
            "package p\n\nfunc pair() []int { return nil }\n",
            ScaffoldStyle::Table,
        );
        let out = file.to_string();
        assert!(out.contains("import (\n\t\"reflect\"\n\t\"testing\"\n)\n"));
        assert!(out.contains("reflect.DeepEqual(result0, expect0)"));
    }

    #[test]
    fn output_is_deterministic() {
        let first = scaffold(ADD_SRC, ScaffoldStyle::Table).to_string();
        let second = scaffold(ADD_SRC, ScaffoldStyle::Table).to_string();
        assert_eq!(first, second);
    }

    #[test]
    fn duplicate_test_names_get_suffixes() {
        let file = scaffold(
            "package p\n\ntype A struct{}\n\nfunc (A) Do() {}\n\nfunc aDo() {}\n",
            ScaffoldStyle::Plain,
        );
        let names: Vec<&str> = file.tests.iter().map(|t| t.name.as_str()).collect();
        assert_eq!(names, vec!["TestADo", "TestADo2"]);
    }

    #[test]
    fn unit_without_testable_declarations_is_empty() {
        let file = scaffold("package p\n\nfunc init() {}\n", ScaffoldStyle::Plain);
        assert!(file.is_empty());
    }

    #[test]
    fn array_length_packages_are_imported() {
        let file = scaffold(
            "package p\n\nimport \"crypto/sha256\"\n\nfunc digest(b []byte) [sha256.Size]byte {\n\treturn sha256.Sum256(b)\n}\n",
            ScaffoldStyle::Plain,
        );
        let out = file.to_string();
        assert!(out.contains("\t\"crypto/sha256\"\n"), "{out}");
        assert!(out.contains("\t\tvar expect0 [sha256.Size]byte\n"));
    }

    #[test]
    fn parameters_named_like_package_types_are_renamed() {
        let file = scaffold(
            "package p\n\ntype node struct{}\n\nfunc wrap(node *node) *node { return node }\n",
            ScaffoldStyle::Plain,
        );
        let out = file.to_string();
        assert!(!out.contains("var node *node"), "{out}");
        assert!(out.contains("\t\tvar nodeArg *node\n"));
        assert!(out.contains("result0 := wrap(nodeArg)"));
        assert!(out.contains("\t\tvar expect0 *node\n"));
    }

    #[test]
    fn struct_literal_parameters_keep_field_tags() {
        let file = scaffold(
            "package p\n\nfunc f(v struct{ A int `json:\"a\"` }) {}\n",
            ScaffoldStyle::Plain,
        );
        let out = file.to_string();
        assert!(out.contains("\t\tvar v struct{A int `json:\"a\"`}\n"), "{out}");
        assert!(out.contains("\t\tf(v)\n"));
    }

    #[test]
    fn unique_name_counts_from_two() {
        let mut seen = HashSet::new();
        assert_eq!(unique_name("TestX".to_string(), &mut seen), "TestX");
        assert_eq!(unique_name("TestX".to_string(), &mut seen), "TestX2");
        assert_eq!(unique_name("TestX".to_string(), &mut seen), "TestX3");
    }
}

//! Semantic Go types and the names they print under.
//!
//! Every name is produced by structural recursion over [`GoType`], never by
//! rewriting another name's text. Three views exist:
//!
//! - [`GoType::qualified_name`]: globally unique, every named type prefixed by
//!   its full import path (`*example.com/m/store.Item`).
//! - [`GoType::simplified_name`]: what a file compiled inside `home` writes
//!   (`*store.Item`, or `Item` when declared in `home`).
//! - [`GoType::originating_package`]: the first package other than `home`
//!   that a file must import to mention the type.


use serde::Serialize;

use crate::resolve::AliasTable;

/// A package handle: import path plus the name files refer to it by.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PackageRef {
    pub path: String,
    pub name: String,
}

impl PackageRef {
    pub fn new(path: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: name.into(),
        }
    }

    /// Package named the way an unaliased import of `path` would be.
    pub fn from_path(path: &str) -> Self {
        Self::new(path, assumed_package_name(path))
    }

    pub fn is_std(&self) -> bool {
        is_std_path(&self.path)
    }
}

/// Name a Go file gets for an unaliased `import "path"`.
///
/// Last path element; a trailing `vN` major-version element defers to its
/// parent, a `go-` prefix is dropped and the name stops at the first
/// character that cannot appear in an identifier (`yaml.v3` -> `yaml`).
pub fn assumed_package_name(path: &str) -> String {
    let mut elems = path.rsplit('/');
    let mut base = elems.next().unwrap_or(path);
    if is_major_version(base) {
        if let Some(parent) = elems.next() {
            base = parent;
        }
    }
    let base = base.strip_prefix("go-").unwrap_or(base);
    base.chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect()
}

fn is_major_version(elem: &str) -> bool {
    elem.strip_prefix('v')
        .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_digit()))
}

/// Standard library import paths have no dot in their first element.
pub fn is_std_path(path: &str) -> bool {
    let first = path.split('/').next().unwrap_or(path);
    !first.contains('.')
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChanDir {
    Both,
    Send,
    Recv,
}

/// Parameter and result types of a function type or interface method.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct Signature {
    pub params: Vec<GoType>,
    pub results: Vec<GoType>,
    /// The last parameter is `...T`, stored as `[]T`.
    pub variadic: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StructField {
    /// `None` for an embedded field.
    pub name: Option<String>,
    pub ty: GoType,
    /// Raw tag literal, quotes included.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tag: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InterfaceMethod {
    pub name: String,
    pub sig: Signature,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GoType {
    Basic {
        name: String,
    },
    /// A defined type. `package` is `None` for universe types like `error`.
    Named {
        package: Option<PackageRef>,
        name: String,
        args: Vec<GoType>,
    },
    TypeParam {
        name: String,
    },
    Pointer {
        elem: Box<GoType>,
    },
    Slice {
        elem: Box<GoType>,
    },
    Array {
        /// Length expression; the bare name when `len_package` is set.
        len: String,
        /// Package of a qualified constant length like `sha256.Size`.
        #[serde(skip_serializing_if = "Option::is_none")]
        len_package: Option<PackageRef>,
        elem: Box<GoType>,
    },
    Map {
        key: Box<GoType>,
        value: Box<GoType>,
    },
    Chan {
        dir: ChanDir,
        elem: Box<GoType>,
    },
    Func {
        sig: Signature,
    },
    Struct {
        fields: Vec<StructField>,
    },
    Interface {
        methods: Vec<InterfaceMethod>,
        embeds: Vec<GoType>,
    },
    /// Sentinel for a type that could not be resolved; keeps the source text.
    Unknown {
        text: String,
    },
}

/// How named types are prefixed while printing.
#[derive(Clone, Copy)]
enum Qualifier<'a> {
    Full,
    Relative {
        home: &'a str,
        aliases: Option<&'a AliasTable>,
    },
}

impl GoType {
    pub fn basic(name: &str) -> Self {
        Self::Basic {
            name: name.to_string(),
        }
    }

    pub fn named(package: Option<PackageRef>, name: &str) -> Self {
        Self::Named {
            package,
            name: name.to_string(),
            args: Vec::new(),
        }
    }

    pub fn pointer(elem: GoType) -> Self {
        Self::Pointer {
            elem: Box::new(elem),
        }
    }

    pub fn slice(elem: GoType) -> Self {
        Self::Slice {
            elem: Box::new(elem),
        }
    }

    pub fn unknown(text: &str) -> Self {
        Self::Unknown {
            text: text.to_string(),
        }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Self::Unknown { .. })
    }

    /// Strip one level of pointer indirection.
    pub fn deref(&self) -> &GoType {
        match self {
            Self::Pointer { elem } => elem.as_ref(),
            other => other,
        }
    }

    /// Globally unique textual form.
    pub fn qualified_name(&self) -> String {
        let mut out = String::new();
        self.write_name(&mut out, Qualifier::Full);
        out
    }

    /// Shortest form valid inside `home`, using each package's own name.
    pub fn simplified_name(&self, home: &str) -> String {
        let mut out = String::new();
        self.write_name(
            &mut out,
            Qualifier::Relative {
                home,
                aliases: None,
            },
        );
        out
    }

    /// Shortest form valid inside `home`, using finalized import aliases.
    pub fn simplified_name_with(&self, home: &str, aliases: &AliasTable) -> String {
        let mut out = String::new();
        self.write_name(
            &mut out,
            Qualifier::Relative {
                home,
                aliases: Some(aliases),
            },
        );
        out
    }

    /// First package other than `home` reachable through the type.
    ///
    /// Map keys are examined before values, named types before their type
    /// arguments, parameters before results.
    pub fn originating_package(&self, home: &str) -> Option<&PackageRef> {
        let mut found = Vec::new();
        self.collect_packages(home, false, &mut found);
        found.into_iter().next()
    }

    /// Every package other than `home` the type mentions, in the order
    /// [`GoType::originating_package`] visits them, without repeats.
    ///
    /// Unlike the originating package this includes packages named only in
    /// array lengths.
    pub fn referenced_packages(&self, home: &str) -> Vec<&PackageRef> {
        let mut found = Vec::new();
        self.collect_packages(home, true, &mut found);
        let mut unique: Vec<&PackageRef> = Vec::with_capacity(found.len());
        for pkg in found {
            if !unique.iter().any(|p| p.path == pkg.path) {
                unique.push(pkg);
            }
        }
        unique
    }

    fn collect_packages<'a>(&'a self, home: &str, lengths: bool, out: &mut Vec<&'a PackageRef>) {
        match self {
            Self::Named { package, args, .. } => {
                if let Some(pkg) = package {
                    if pkg.path != home {
                        out.push(pkg);
                    }
                }
                for arg in args {
                    arg.collect_packages(home, lengths, out);
                }
            }
            Self::Pointer { elem } | Self::Slice { elem } | Self::Chan { elem, .. } => {
                elem.collect_packages(home, lengths, out)
            }
            Self::Array {
                len_package, elem, ..
            } => {
                elem.collect_packages(home, lengths, out);
                if let Some(pkg) = len_package.as_ref().filter(|p| lengths && p.path != home) {
                    out.push(pkg);
                }
            }
            Self::Map { key, value } => {
                key.collect_packages(home, lengths, out);
                value.collect_packages(home, lengths, out);
            }
            Self::Func { sig } => {
                for ty in sig_types(sig) {
                    ty.collect_packages(home, lengths, out);
                }
            }
            Self::Struct { fields } => {
                for field in fields {
                    field.ty.collect_packages(home, lengths, out);
                }
            }
            Self::Interface { methods, embeds } => {
                for method in methods {
                    for ty in sig_types(&method.sig) {
                        ty.collect_packages(home, lengths, out);
                    }
                }
                for embed in embeds {
                    embed.collect_packages(home, lengths, out);
                }
            }
            Self::Basic { .. } | Self::TypeParam { .. } | Self::Unknown { .. } => {}
        }
    }

    fn write_name(&self, out: &mut String, q: Qualifier) {
        match self {
            Self::Basic { name } | Self::TypeParam { name } => out.push_str(name),
            Self::Named {
                package,
                name,
                args,
            } => {
                if let Some(pkg) = package {
                    write_qualifier(out, pkg, q);
                }
                out.push_str(name);
                if !args.is_empty() {
                    out.push('[');
                    write_list(out, args, q);
                    out.push(']');
                }
            }
            Self::Pointer { elem } => {
                out.push('*');
                elem.write_name(out, q);
            }
            Self::Slice { elem } => {
                out.push_str("[]");
                elem.write_name(out, q);
            }
            Self::Array {
                len,
                len_package,
                elem,
            } => {
                out.push('[');
                if let Some(pkg) = len_package {
                    write_qualifier(out, pkg, q);
                }
                out.push_str(len);
                out.push(']');
                elem.write_name(out, q);
            }
            Self::Map { key, value } => {
                out.push_str("map[");
                key.write_name(out, q);
                out.push(']');
                value.write_name(out, q);
            }
            Self::Chan { dir, elem } => {
                out.push_str(match dir {
                    ChanDir::Both => "chan ",
                    ChanDir::Send => "chan<- ",
                    ChanDir::Recv => "<-chan ",
                });
                // `chan (<-chan T)` keeps the inner direction attached.
                let parens = *dir == ChanDir::Both
                    && matches!(elem.as_ref(), Self::Chan { dir: ChanDir::Recv, .. });
                if parens {
                    out.push('(');
                }
                elem.write_name(out, q);
                if parens {
                    out.push(')');
                }
            }
            Self::Func { sig } => {
                out.push_str("func");
                write_signature(out, sig, q);
            }
            Self::Struct { fields } => {
                out.push_str("struct{");
                for (i, field) in fields.iter().enumerate() {
                    if i > 0 {
                        out.push_str("; ");
                    }
                    if let Some(name) = &field.name {
                        out.push_str(name);
                        out.push(' ');
                    }
                    field.ty.write_name(out, q);
                    if let Some(tag) = &field.tag {
                        out.push(' ');
                        out.push_str(tag);
                    }
                }
                out.push('}');
            }
            Self::Interface { methods, embeds } => {
                out.push_str("interface{");
                let mut first = true;
                for embed in embeds {
                    if !first {
                        out.push_str("; ");
                    }
                    first = false;
                    embed.write_name(out, q);
                }
                for method in methods {
                    if !first {
                        out.push_str("; ");
                    }
                    first = false;
                    out.push_str(&method.name);
                    write_signature(out, &method.sig, q);
                }
                out.push('}');
            }
            Self::Unknown { text } => match q {
                Qualifier::Full => out.push_str("invalid type"),
                Qualifier::Relative { .. } => out.push_str(text),
            },
        }
    }
}

/// `path.` for the qualified form, `alias.` outside `home`.
fn write_qualifier(out: &mut String, pkg: &PackageRef, q: Qualifier) {
    match q {
        Qualifier::Full => {
            out.push_str(&pkg.path);
            out.push('.');
        }
        Qualifier::Relative { home, aliases } if pkg.path != home => {
            let prefix = aliases
                .and_then(|a| a.alias_for(&pkg.path))
                .unwrap_or(pkg.name.as_str());
            out.push_str(prefix);
            out.push('.');
        }
        Qualifier::Relative { .. } => {}
    }
}

fn sig_types(sig: &Signature) -> impl Iterator<Item = &GoType> {
    sig.params.iter().chain(sig.results.iter())
}

fn write_list(out: &mut String, types: &[GoType], q: Qualifier) {
    for (i, ty) in types.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        ty.write_name(out, q);
    }
}

fn write_signature(out: &mut String, sig: &Signature, q: Qualifier) {
    out.push('(');
    for (i, param) in sig.params.iter().enumerate() {
        if i > 0 {
            out.push_str(", ");
        }
        let last = i + 1 == sig.params.len();
        match param {
            GoType::Slice { elem } if sig.variadic && last => {
                out.push_str("...");
                elem.write_name(out, q);
            }
            _ => param.write_name(out, q),
        }
    }
    out.push(')');
    match sig.results.as_slice() {
        [] => {}
        [single] => {
            out.push(' ');
            single.write_name(out, q);
        }
        many => {
            out.push_str(" (");
            write_list(out, many, q);
            out.push(')');
        }
    }
}

/// Whether values of the type can be compared with `==` in generated code.
///
/// Defined types from the package under test are treated as not comparable
/// since their underlying type is not modeled.
pub fn is_comparable(ty: &GoType) -> bool {
    match ty {
        GoType::Basic { .. } | GoType::Pointer { .. } | GoType::Chan { .. } => true,
        GoType::Named { package: None, .. } => true,
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const HOME: &str = "example.com/m/shop";

    fn local(name: &str) -> GoType {
        GoType::named(Some(PackageRef::new(HOME, "shop")), name)
    }

    fn external(path: &str, name: &str) -> GoType {
        GoType::named(Some(PackageRef::from_path(path)), name)
    }

    #[test]
    fn local_named_types_render_bare() {
        let ty = local("Adder");
        assert_eq!(ty.simplified_name(HOME), "Adder");
        assert_eq!(ty.qualified_name(), "example.com/m/shop.Adder");
        assert_eq!(ty.originating_package(HOME), None);
    }

    #[test]
    fn foreign_named_types_render_with_package_name() {
        let ty = GoType::pointer(external("strings", "Builder"));
        assert_eq!(ty.simplified_name(HOME), "*strings.Builder");
        assert_eq!(ty.qualified_name(), "*strings.Builder");
        assert_eq!(ty.originating_package(HOME).unwrap().path, "strings");
    }

    #[test]
    fn composite_types_keep_their_syntax() {
        let ty = GoType::Map {
            key: Box::new(GoType::basic("string")),
            value: Box::new(GoType::slice(GoType::pointer(external(
                "github.com/acme/store/v2",
                "Item",
            )))),
        };
        assert_eq!(ty.simplified_name(HOME), "map[string][]*store.Item");
        assert_eq!(
            ty.qualified_name(),
            "map[string][]*github.com/acme/store/v2.Item"
        );
    }

    #[test]
    fn element_types_decide_originating_package() {
        let elem = external("io", "Reader");
        for ty in [
            GoType::pointer(elem.clone()),
            GoType::slice(elem.clone()),
            GoType::Array {
                len: "4".to_string(),
                len_package: None,
                elem: Box::new(elem.clone()),
            },
            GoType::Chan {
                dir: ChanDir::Recv,
                elem: Box::new(elem.clone()),
            },
        ] {
            assert_eq!(
                ty.originating_package(HOME),
                elem.originating_package(HOME),
                "{}",
                ty.qualified_name()
            );
        }
    }

    #[test]
    fn map_key_package_wins_over_value_package() {
        let ty = GoType::Map {
            key: Box::new(external("time", "Duration")),
            value: Box::new(external("net/http", "Handler")),
        };
        assert_eq!(ty.originating_package(HOME).unwrap().path, "time");
        let all: Vec<&str> = ty
            .referenced_packages(HOME)
            .iter()
            .map(|p| p.path.as_str())
            .collect();
        assert_eq!(all, vec!["time", "net/http"]);
    }

    #[test]
    fn map_value_package_used_when_key_is_local() {
        let ty = GoType::Map {
            key: Box::new(local("ID")),
            value: Box::new(external("net/http", "Handler")),
        };
        assert_eq!(ty.originating_package(HOME).unwrap().path, "net/http");
    }

    #[test]
    fn channel_directions_render() {
        let int = GoType::basic("int");
        let send = GoType::Chan {
            dir: ChanDir::Send,
            elem: Box::new(int.clone()),
        };
        let recv = GoType::Chan {
            dir: ChanDir::Recv,
            elem: Box::new(int.clone()),
        };
        let nested = GoType::Chan {
            dir: ChanDir::Both,
            elem: Box::new(recv.clone()),
        };
        assert_eq!(send.simplified_name(HOME), "chan<- int");
        assert_eq!(recv.simplified_name(HOME), "<-chan int");
        assert_eq!(nested.simplified_name(HOME), "chan (<-chan int)");
    }

    #[test]
    fn function_types_recurse_into_params_and_results() {
        let ty = GoType::Func {
            sig: Signature {
                params: vec![
                    external("context", "Context"),
                    GoType::slice(GoType::basic("string")),
                ],
                results: vec![local("Result"), GoType::named(None, "error")],
                variadic: true,
            },
        };
        assert_eq!(
            ty.simplified_name(HOME),
            "func(context.Context, ...string) (Result, error)"
        );
        assert_eq!(ty.originating_package(HOME).unwrap().path, "context");
    }

    #[test]
    fn generic_arguments_are_simplified_and_scanned() {
        let ty = GoType::Named {
            package: Some(PackageRef::new(HOME, "shop")),
            name: "List".to_string(),
            args: vec![external("bytes", "Buffer")],
        };
        assert_eq!(ty.simplified_name(HOME), "List[bytes.Buffer]");
        assert_eq!(ty.originating_package(HOME).unwrap().path, "bytes");
    }

    #[test]
    fn struct_and_interface_literals_render() {
        let st = GoType::Struct {
            fields: vec![
                StructField {
                    name: Some("n".to_string()),
                    ty: GoType::basic("int"),
                    tag: None,
                },
                StructField {
                    name: None,
                    ty: external("sync", "Mutex"),
                    tag: None,
                },
            ],
        };
        assert_eq!(st.simplified_name(HOME), "struct{n int; sync.Mutex}");
        let empty = GoType::Interface {
            methods: Vec::new(),
            embeds: Vec::new(),
        };
        assert_eq!(empty.simplified_name(HOME), "interface{}");
    }

    #[test]
    fn unknown_types_keep_source_text() {
        let ty = GoType::unknown("missing.Thing");
        assert_eq!(ty.simplified_name(HOME), "missing.Thing");
        assert_eq!(ty.qualified_name(), "invalid type");
        assert_eq!(ty.originating_package(HOME), None);
    }

    #[test]
    fn assumed_names_follow_import_path_conventions() {
        assert_eq!(assumed_package_name("strings"), "strings");
        assert_eq!(assumed_package_name("net/http"), "http");
        assert_eq!(assumed_package_name("gopkg.in/yaml.v3"), "yaml");
        assert_eq!(assumed_package_name("github.com/acme/store/v2"), "store");
        assert_eq!(assumed_package_name("github.com/mattn/go-sqlite3"), "sqlite3");
    }

    #[test]
    fn std_paths_have_no_dot_in_first_element() {
        assert!(is_std_path("fmt"));
        assert!(is_std_path("net/http"));
        assert!(!is_std_path("github.com/acme/store"));
        assert!(!is_std_path("gopkg.in/yaml.v3"));
    }

    #[test]
    fn comparability_is_conservative() {
        assert!(is_comparable(&GoType::basic("int")));
        assert!(is_comparable(&GoType::pointer(local("Adder"))));
        assert!(is_comparable(&GoType::named(None, "error")));
        assert!(!is_comparable(&GoType::slice(GoType::basic("byte"))));
        assert!(!is_comparable(&local("Adder")));
    }

    #[test]
    fn qualified_array_lengths_are_named_and_required() {
        let sha = PackageRef::from_path("crypto/sha256");
        let ty = GoType::Array {
            len: "Size".to_string(),
            len_package: Some(sha.clone()),
            elem: Box::new(GoType::basic("byte")),
        };
        assert_eq!(ty.simplified_name(HOME), "[sha256.Size]byte");
        assert_eq!(ty.qualified_name(), "[crypto/sha256.Size]byte");
        assert_eq!(ty.referenced_packages(HOME), vec![&sha]);
        // The element alone decides the originating package.
        assert_eq!(ty.originating_package(HOME), None);

        let aliases = AliasTable::assign([&PackageRef::new("crypto/sha256", "sha")]);
        assert_eq!(ty.simplified_name_with(HOME, &aliases), "[sha.Size]byte");
    }

    #[test]
    fn struct_tags_are_part_of_the_type() {
        let ty = GoType::Struct {
            fields: vec![StructField {
                name: Some("A".to_string()),
                ty: GoType::basic("int"),
                tag: Some("`json:\"a\"`".to_string()),
            }],
        };
        assert_eq!(ty.simplified_name(HOME), "struct{A int `json:\"a\"`}");
    }
}

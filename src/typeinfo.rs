//! The `typeOf` query: semantic types for type syntax inside one file.

use std::collections::HashSet;

use tree_sitter::Node;

use crate::loader::FileImports;
use crate::types::{ChanDir, GoType, InterfaceMethod, PackageRef, Signature, StructField};
use crate::util::{field_children, named_children, txt};

const BASIC_TYPES: &[&str] = &[
    "bool",
    "string",
    "int",
    "int8",
    "int16",
    "int32",
    "int64",
    "uint",
    "uint8",
    "uint16",
    "uint32",
    "uint64",
    "uintptr",
    "byte",
    "rune",
    "float32",
    "float64",
    "complex64",
    "complex128",
];

const UNIVERSE_TYPES: &[&str] = &["error", "any", "comparable"];

/// A parameter-list entry after field groups are expanded.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldEntry {
    pub name: Option<String>,
    pub ty: GoType,
    pub variadic: bool,
}

/// Resolves type syntax in the scope of one file of the package.
pub struct TypeInfo<'a> {
    src: &'a [u8],
    home: &'a PackageRef,
    imports: &'a FileImports,
    local_types: &'a HashSet<String>,
    type_params: HashSet<String>,
}

impl<'a> TypeInfo<'a> {
    pub fn new(
        src: &'a [u8],
        home: &'a PackageRef,
        imports: &'a FileImports,
        local_types: &'a HashSet<String>,
    ) -> Self {
        Self {
            src,
            home,
            imports,
            local_types,
            type_params: HashSet::new(),
        }
    }

    /// Bring type parameter names into scope.
    pub fn with_type_params<I>(mut self, names: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        self.type_params.extend(names);
        self
    }

    /// Semantic type of a type syntax node. Never fails: anything that
    /// cannot be resolved becomes [`GoType::Unknown`].
    pub fn type_of(&self, node: Node) -> GoType {
        let ty = self.resolve(node);
        if let GoType::Unknown { text } = &ty {
            tracing::warn!(
                ty = %text,
                line = node.start_position().row + 1,
                dot_imports = self.imports.has_dot_imports(),
                "could not resolve type"
            );
        }
        ty
    }

    fn resolve(&self, node: Node) -> GoType {
        match node.kind() {
            "type_identifier" | "identifier" => self.identifier(txt(node, self.src)),
            "qualified_type" => self.qualified(node),
            "generic_type" => self.generic(node),
            "pointer_type" => match first_named(node) {
                Some(elem) => GoType::pointer(self.resolve(elem)),
                None => self.unknown(node),
            },
            "slice_type" => match node.child_by_field_name("element") {
                Some(elem) => GoType::slice(self.resolve(elem)),
                None => self.unknown(node),
            },
            "array_type" | "implicit_length_array_type" => {
                let Some(elem) = node.child_by_field_name("element") else {
                    return self.unknown(node);
                };
                let (len, len_package) = match node.child_by_field_name("length") {
                    Some(length) => match self.array_length(length) {
                        Some(resolved) => resolved,
                        None => return self.unknown(node),
                    },
                    None => ("...".to_string(), None),
                };
                GoType::Array {
                    len,
                    len_package,
                    elem: Box::new(self.resolve(elem)),
                }
            }
            "map_type" => {
                let (Some(key), Some(value)) = (
                    node.child_by_field_name("key"),
                    node.child_by_field_name("value"),
                ) else {
                    return self.unknown(node);
                };
                GoType::Map {
                    key: Box::new(self.resolve(key)),
                    value: Box::new(self.resolve(value)),
                }
            }
            "channel_type" => match node.child_by_field_name("value") {
                Some(elem) => GoType::Chan {
                    dir: chan_dir(node),
                    elem: Box::new(self.resolve(elem)),
                },
                None => self.unknown(node),
            },
            "function_type" => GoType::Func {
                sig: self.signature(
                    node.child_by_field_name("parameters"),
                    node.child_by_field_name("result"),
                ),
            },
            "struct_type" => self.struct_type(node),
            "interface_type" => self.interface_type(node),
            "parenthesized_type" => match first_named(node) {
                Some(inner) => self.resolve(inner),
                None => self.unknown(node),
            },
            // Type arguments wrap each argument in a `type_elem`; unions
            // only occur in constraints.
            "type_elem" => match named_children(node).as_slice() {
                [single] => self.resolve(*single),
                _ => self.unknown(node),
            },
            _ => self.unknown(node),
        }
    }

    fn unknown(&self, node: Node) -> GoType {
        GoType::unknown(txt(node, self.src))
    }

    /// Length text plus the package of a `pkg.Const` length. Lengths that
    /// mention an imported package any other way are not supported.
    fn array_length(&self, node: Node) -> Option<(String, Option<PackageRef>)> {
        let (qualifier, name) = match node.kind() {
            "selector_expression" => (
                node.child_by_field_name("operand")?,
                node.child_by_field_name("field")?,
            ),
            "qualified_type" => (
                node.child_by_field_name("package")?,
                node.child_by_field_name("name")?,
            ),
            _ if mentions_selector(node) => return None,
            _ => return Some((txt(node, self.src).to_string(), None)),
        };
        let package = self.imports.lookup(txt(qualifier, self.src))?;
        Some((txt(name, self.src).to_string(), Some(package.clone())))
    }

    fn identifier(&self, name: &str) -> GoType {
        if self.type_params.contains(name) {
            return GoType::TypeParam {
                name: name.to_string(),
            };
        }
        if self.local_types.contains(name) {
            return GoType::named(Some(self.home.clone()), name);
        }
        if BASIC_TYPES.contains(&name) {
            return GoType::basic(name);
        }
        if UNIVERSE_TYPES.contains(&name) {
            return GoType::named(None, name);
        }
        // Unqualified names from dot imports are not tracked.
        GoType::unknown(name)
    }

    fn qualified(&self, node: Node) -> GoType {
        let (Some(pkg), Some(name)) = (
            node.child_by_field_name("package"),
            node.child_by_field_name("name"),
        ) else {
            return self.unknown(node);
        };
        match self.imports.lookup(txt(pkg, self.src)) {
            Some(package) => GoType::named(Some(package.clone()), txt(name, self.src)),
            None => self.unknown(node),
        }
    }

    fn generic(&self, node: Node) -> GoType {
        let Some(base) = node.child_by_field_name("type") else {
            return self.unknown(node);
        };
        match self.resolve(base) {
            GoType::Named { package, name, .. } => {
                let args = node
                    .child_by_field_name("type_arguments")
                    .map(|list| {
                        named_children(list)
                            .into_iter()
                            .map(|arg| self.resolve(arg))
                            .collect()
                    })
                    .unwrap_or_default();
                GoType::Named {
                    package,
                    name,
                    args,
                }
            }
            _ => self.unknown(node),
        }
    }

    fn struct_type(&self, node: Node) -> GoType {
        let mut fields = Vec::new();
        let Some(list) = named_children(node)
            .into_iter()
            .find(|n| n.kind() == "field_declaration_list")
        else {
            return GoType::Struct { fields };
        };
        for decl in named_children(list) {
            if decl.kind() != "field_declaration" {
                continue;
            }
            let Some(ty_node) = decl.child_by_field_name("type") else {
                continue;
            };
            let ty = self.resolve(ty_node);
            let tag = decl
                .child_by_field_name("tag")
                .map(|t| txt(t, self.src).to_string());
            let names = field_children(decl, "name");
            if names.is_empty() {
                let ty = if has_token(decl, "*") {
                    GoType::pointer(ty)
                } else {
                    ty
                };
                fields.push(StructField {
                    name: None,
                    ty,
                    tag,
                });
                continue;
            }
            for name in names {
                fields.push(StructField {
                    name: Some(txt(name, self.src).to_string()),
                    ty: ty.clone(),
                    tag: tag.clone(),
                });
            }
        }
        GoType::Struct { fields }
    }

    fn interface_type(&self, node: Node) -> GoType {
        let mut methods = Vec::new();
        let mut embeds = Vec::new();
        for elem in named_children(node) {
            match elem.kind() {
                "method_elem" | "method_spec" => {
                    let Some(name) = elem.child_by_field_name("name") else {
                        continue;
                    };
                    methods.push(InterfaceMethod {
                        name: txt(name, self.src).to_string(),
                        sig: self.signature(
                            elem.child_by_field_name("parameters"),
                            elem.child_by_field_name("result"),
                        ),
                    });
                }
                _ => embeds.push(self.resolve(elem)),
            }
        }
        GoType::Interface { methods, embeds }
    }

    /// Types of a parameter list and result, names dropped.
    pub fn signature(&self, params: Option<Node>, result: Option<Node>) -> Signature {
        let params = params.map(|p| self.fields_of(p)).unwrap_or_default();
        let results = result.map(|r| self.results_of(r)).unwrap_or_default();
        Signature {
            variadic: params.last().is_some_and(|p| p.variadic),
            params: params.into_iter().map(|p| p.ty).collect(),
            results: results.into_iter().map(|r| r.ty).collect(),
        }
    }

    /// Expand a `parameter_list`: one entry per declared name, exactly one
    /// nameless entry for an unnamed field.
    pub fn fields_of(&self, list: Node) -> Vec<FieldEntry> {
        let mut entries = Vec::new();
        for decl in named_children(list) {
            let variadic = match decl.kind() {
                "parameter_declaration" => false,
                "variadic_parameter_declaration" => true,
                _ => continue,
            };
            let ty = match decl.child_by_field_name("type") {
                Some(ty_node) => self.type_of(ty_node),
                None => self.unknown(decl),
            };
            let ty = if variadic { GoType::slice(ty) } else { ty };
            let names = field_children(decl, "name");
            if names.is_empty() {
                entries.push(FieldEntry {
                    name: None,
                    ty,
                    variadic,
                });
                continue;
            }
            for name in names {
                entries.push(FieldEntry {
                    name: Some(txt(name, self.src).to_string()),
                    ty: ty.clone(),
                    variadic,
                });
            }
        }
        entries
    }

    /// A `result` field: either a parameter list or a single bare type.
    pub fn results_of(&self, result: Node) -> Vec<FieldEntry> {
        if result.kind() == "parameter_list" {
            return self.fields_of(result);
        }
        vec![FieldEntry {
            name: None,
            ty: self.type_of(result),
            variadic: false,
        }]
    }
}

fn mentions_selector(node: Node) -> bool {
    node.kind() == "selector_expression"
        || named_children(node).into_iter().any(mentions_selector)
}

fn first_named(node: Node) -> Option<Node> {
    named_children(node).into_iter().next()
}

fn has_token(node: Node, token: &str) -> bool {
    let mut cursor = node.walk();
    let found = node.children(&mut cursor).any(|c| !c.is_named() && c.kind() == token);
    found
}

/// `<-chan T` receives, `chan<- T` sends, `chan T` does both.
fn chan_dir(node: Node) -> ChanDir {
    let mut cursor = node.walk();
    let tokens: Vec<&str> = node
        .children(&mut cursor)
        .filter(|c| !c.is_named())
        .map(|c| c.kind())
        .collect();
    match tokens.as_slice() {
        ["<-", "chan", ..] => ChanDir::Recv,
        ["chan", "<-", ..] => ChanDir::Send,
        _ => ChanDir::Both,
    }
}

/// Names declared by a `type_parameter_list`.
pub fn type_param_names(list: Node, src: &[u8]) -> Vec<String> {
    let mut names = Vec::new();
    for decl in named_children(list) {
        for name in field_children(decl, "name") {
            names.push(txt(name, src).to_string());
        }
    }
    names
}

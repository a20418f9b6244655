//! Declaration extraction: one [`Declaration`] per function or method, in
//! source order.

mod receiver;

use std::collections::BTreeSet;

use tree_sitter::Node;

use crate::loader::{SourceFile, SourceUnit};
use crate::model::{CompilationUnitInfo, Declaration, Parameter, Receiver};
use crate::typeinfo::{type_param_names, FieldEntry, TypeInfo};
use crate::util::{is_exported, named_children, txt};

/// Extract every declaration of the unit into a fresh [`CompilationUnitInfo`].
pub fn extract_unit(unit: &SourceUnit) -> CompilationUnitInfo {
    let mut info = CompilationUnitInfo::new(
        unit.module.clone(),
        unit.is_main,
        unit.package.clone(),
        unit.imports.clone(),
    );
    info.local_types = unit.local_types.iter().cloned().collect();
    for file in &unit.files {
        for decl in extract_declarations(file, unit) {
            info.add(decl);
        }
    }
    tracing::debug!(
        declarations = info.declarations.len(),
        imports = info.required_imports.len(),
        "extracted declarations"
    );
    info
}

/// Walk top-level children of one file and model each function or method.
pub fn extract_declarations(file: &SourceFile, unit: &SourceUnit) -> Vec<Declaration> {
    let root = file.tree.root_node();
    let mut decls = Vec::new();
    for node in named_children(root) {
        if !matches!(node.kind(), "function_declaration" | "method_declaration") {
            continue;
        }
        if let Some(decl) = extract_declaration(node, file, unit) {
            decls.push(decl);
        }
    }
    decls
}

fn extract_declaration(node: Node, file: &SourceFile, unit: &SourceUnit) -> Option<Declaration> {
    let src = file.source.as_bytes();
    let name = txt(node.child_by_field_name("name")?, src).to_string();
    let home = unit.package.path.as_str();

    let mut type_params = node
        .child_by_field_name("type_parameters")
        .map(|list| type_param_names(list, src))
        .unwrap_or_default();

    let recv = node
        .child_by_field_name("receiver")
        .and_then(|list| receiver::receiver_field(list, src));
    if let Some(field) = &recv {
        type_params.extend(field.type_params.iter().cloned());
    }
    let has_type_params = !type_params.is_empty();

    let info = TypeInfo::new(src, &unit.package, &file.imports, &unit.local_types)
        .with_type_params(type_params);

    let receiver = recv.map(|field| Receiver::new(field.name, info.type_of(field.ty), home));

    let params = node
        .child_by_field_name("parameters")
        .map(|list| info.fields_of(list))
        .unwrap_or_default();
    let results = node
        .child_by_field_name("result")
        .map(|result| info.results_of(result))
        .unwrap_or_default();

    let params = name_entries(params, "param", home);
    let results = name_entries(results, "result", home);

    let location = format!("{}:{}", file.file_name(), node.start_position().row + 1);
    let mut required_imports = BTreeSet::new();
    let mut unresolved = 0;
    let receiver_ty = receiver.as_ref().map(|r| &r.ty);
    let types = receiver_ty
        .into_iter()
        .chain(params.iter().map(|p| &p.ty))
        .chain(results.iter().map(|r| &r.ty));
    for ty in types {
        if ty.is_unknown() {
            unresolved += 1;
        }
        for pkg in ty.referenced_packages(home) {
            required_imports.insert(pkg.path.clone());
        }
    }
    if unresolved > 0 {
        tracing::warn!(
            declaration = %name,
            %location,
            unresolved,
            "scaffold will mention unresolved types"
        );
    }

    Some(Declaration {
        exported: is_exported(&name),
        name,
        receiver,
        params,
        results,
        has_type_params,
        required_imports,
        location,
    })
}

/// Turn expanded entries into parameters, synthesizing `{prefix}N` for
/// unnamed and blank entries.
fn name_entries(entries: Vec<FieldEntry>, prefix: &str, home: &str) -> Vec<Parameter> {
    entries
        .into_iter()
        .enumerate()
        .map(|(i, entry)| {
            let name = match entry.name {
                Some(name) if name != "_" => name,
                _ => format!("{prefix}{i}"),
            };
            Parameter::new(name, entry.ty, entry.variadic, home)
        })
        .collect()
}

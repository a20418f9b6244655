use tree_sitter::Node;

use crate::util::{named_children, txt};

/// The single field of a method's receiver list.
pub(super) struct ReceiverField<'a> {
    pub name: Option<String>,
    pub ty: Node<'a>,
    /// Type parameters introduced by a generic receiver, `T` in `*List[T]`.
    pub type_params: Vec<String>,
}

pub(super) fn receiver_field<'a>(list: Node<'a>, src: &[u8]) -> Option<ReceiverField<'a>> {
    let decl = named_children(list)
        .into_iter()
        .find(|n| n.kind() == "parameter_declaration")?;
    let ty = decl.child_by_field_name("type")?;
    let name = decl
        .child_by_field_name("name")
        .map(|n| txt(n, src).to_string())
        .filter(|n| n != "_");
    Some(ReceiverField {
        name,
        type_params: receiver_type_params(ty, src),
        ty,
    })
}

/// Identifiers in the type argument list of a generic receiver base type.
fn receiver_type_params(ty: Node, src: &[u8]) -> Vec<String> {
    let mut base = ty;
    while matches!(base.kind(), "pointer_type" | "parenthesized_type") {
        match named_children(base).into_iter().next() {
            Some(inner) => base = inner,
            None => return Vec::new(),
        }
    }
    if base.kind() != "generic_type" {
        return Vec::new();
    }
    let Some(args) = base.child_by_field_name("type_arguments") else {
        return Vec::new();
    };
    let mut names = Vec::new();
    for arg in named_children(args) {
        let ident = if arg.kind() == "type_elem" {
            named_children(arg).into_iter().next()
        } else {
            Some(arg)
        };
        if let Some(ident) = ident.filter(|n| n.kind() == "type_identifier") {
            names.push(txt(ident, src).to_string());
        }
    }
    names
}

use crate::dsl::ast::{Arg, CompiledNode};
use crate::model::KeywordType;
use crate::registry::{EventSpec, KeywordDefinition, Payload, Registry};

enum Item<'a> {
    Value(String, KeywordType),
    Node(&'a CompiledNode),
}

/// Compiled tree as an indented outline: each node with its bound values,
/// then the node it wraps.
///
/// ```text
/// load -- Event
/// └── create -- Function
///     └── circle -- Shape
/// ```
pub fn describe_node(root: &CompiledNode) -> String {
    let mut lines = vec![node_label(root)];
    push_children(&mut lines, root, "");
    lines.join("\n")
}

fn node_label(node: &CompiledNode) -> String {
    format!("{} -- {}", node.keyword(), node.ty())
}

fn push_children(lines: &mut Vec<String>, node: &CompiledNode, prefix: &str) {
    let mut items: Vec<Item<'_>> = node
        .slots()
        .iter()
        .filter_map(|slot| match &slot.arg {
            Arg::Empty => None,
            Arg::Value(v) => Some(Item::Value(v.to_string(), slot.ty)),
            Arg::Deferred => Some(Item::Value("<produced>".to_string(), slot.ty)),
        })
        .collect();
    if let Some(child) = node.child() {
        items.push(Item::Node(child));
    }

    let count = items.len();
    for (i, item) in items.into_iter().enumerate() {
        let last = i + 1 == count;
        let connector = if last { "└── " } else { "├── " };
        match item {
            Item::Value(text, ty) => lines.push(format!("{prefix}{connector}{text} -- {ty}")),
            Item::Node(child) => {
                lines.push(format!("{prefix}{connector}{}", node_label(child)));
                let nested = format!("{prefix}{}", if last { "    " } else { "│   " });
                push_children(lines, child, &nested);
            }
        }
    }
}

fn type_list(types: &[KeywordType]) -> String {
    types
        .iter()
        .map(|t| t.slug().to_uppercase())
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe_definition(def: &KeywordDefinition) -> String {
    let aliases = def.surface_words().get(1..).unwrap_or_default();
    let mut line = format!("  - {}", def.canonical_id());
    if !aliases.is_empty() {
        line.push_str(&format!(" [{}]", aliases.join(", ")));
    }
    line.push_str(&format!(" -- {}", def.ty()));
    match def.payload() {
        Payload::Function(f) => {
            let mut params = type_list(&f.required);
            if !f.optional.is_empty() {
                if !params.is_empty() {
                    params.push_str("; ");
                }
                params.push_str(&format!("opt {}", type_list(&f.optional)));
            }
            line.push_str(&format!(" ({params})"));
            if let Some(ty) = f.produces {
                line.push_str(&format!(" -> {ty}"));
            }
        }
        Payload::Event(EventSpec::Target(target)) => line.push_str(&format!(" on {target}")),
        Payload::Event(EventSpec::BoundElement) => line.push_str(" on <element>"),
        Payload::Literal => {}
    }
    line
}

/// Human-readable summary of the registry, grouped by type.
pub fn describe_registry(registry: &Registry) -> String {
    let mut lines = vec![format!("Keywords ({})", registry.len())];
    for &ty in KeywordType::all() {
        let defs: Vec<_> = registry.definitions_of(ty).collect();
        if defs.is_empty() {
            continue;
        }
        lines.push(format!("\n{} ({})", ty.label(), defs.len()));
        lines.extend(defs.into_iter().map(|d| describe_definition(d)));
    }
    lines.join("\n")
}
